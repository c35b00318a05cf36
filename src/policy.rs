//! Who may edit or delete a comment.
//!
//! Only the author may. Anyone else who is signed in gets `NotFound`, the same
//! answer as for a comment id that does not exist, so a non-owner cannot tell
//! the two apart.

use crate::models::{Comment, User};

/// The current user of a request
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Anonymous,
    Authenticated(User),
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated(_))
    }
}

/// How an identity relates to one comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Anonymous,
    Author,
    NotAuthor,
}

impl Role {
    pub fn of(identity: &Identity, comment: &Comment) -> Self {
        match identity {
            Identity::Anonymous => Role::Anonymous,
            Identity::Authenticated(user) if user.id == comment.author_id => Role::Author,
            Identity::Authenticated(_) => Role::NotAuthor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// Send the visitor to the login page; the comment is not touched
    LoginRequired,
    /// Refuse as if the comment did not exist
    NotFound,
}

pub fn authorize(role: Role) -> Access {
    match role {
        Role::Author => Access::Granted,
        Role::Anonymous => Access::LoginRequired,
        Role::NotAuthor => Access::NotFound,
    }
}

/// Shorthand for `authorize(Role::of(identity, comment))`
pub fn comment_access(identity: &Identity, comment: &Comment) -> Access {
    authorize(Role::of(identity, comment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: &str, username: &str) -> User {
        User {
            id: id.to_string(),
            username: username.to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    fn comment_by(author_id: &str) -> Comment {
        Comment {
            id: "comment_1".to_string(),
            news_id: "news_1".to_string(),
            author_id: author_id.to_string(),
            text: "Текст комментария".to_string(),
            created: Utc::now(),
        }
    }

    #[test]
    fn test_roles() {
        let comment = comment_by("user_1");

        assert_eq!(Role::of(&Identity::Anonymous, &comment), Role::Anonymous);
        assert_eq!(
            Role::of(&Identity::Authenticated(user("user_1", "Автор")), &comment),
            Role::Author
        );
        assert_eq!(
            Role::of(&Identity::Authenticated(user("user_2", "Не автор")), &comment),
            Role::NotAuthor
        );
    }

    #[test]
    fn test_only_author_is_granted() {
        assert_eq!(authorize(Role::Author), Access::Granted);
        assert_eq!(authorize(Role::NotAuthor), Access::NotFound);
        assert_eq!(authorize(Role::Anonymous), Access::LoginRequired);
    }

    #[test]
    fn test_same_username_different_id_is_not_author() {
        // Ownership is by id, never by display name
        let comment = comment_by("user_1");
        let impostor = Identity::Authenticated(user("user_2", "Автор"));
        assert_eq!(comment_access(&impostor, &comment), Access::NotFound);
    }

    #[test]
    fn test_identity_accessors() {
        assert!(!Identity::Anonymous.is_authenticated());
        assert!(Identity::Anonymous.user().is_none());

        let identity = Identity::Authenticated(user("user_1", "Автор"));
        assert!(identity.is_authenticated());
        assert_eq!(identity.user().map(|u| u.username.as_str()), Some("Автор"));
    }
}
