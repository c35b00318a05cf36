use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::moderation::CommentForm;

/// Maximum length of a News title, in characters
pub const NEWS_TITLE_MAX_LENGTH: usize = 50;

/// User is anyone who can sign in and write comments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// News is a published item that can accumulate comments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct News {
    pub id: String,
    pub title: String,
    pub text: String,
    pub date: NaiveDate,
}

impl News {
    /// A not-yet-stored News item dated today
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            text: text.into(),
            date: Utc::now().date_naive(),
        }
    }
}

/// Comment is a user-authored text attached to one News item.
/// `news_id` and `author_id` never change after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: String,
    pub news_id: String,
    pub author_id: String,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl Comment {
    /// A not-yet-stored Comment; the store assigns `id` and `created`
    pub fn new(news_id: impl Into<String>, author_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            news_id: news_id.into(),
            author_id: author_id.into(),
            text: text.into(),
            created: Utc::now(),
        }
    }
}

// ==================== Page contexts ====================

/// One row of the home listing
#[derive(Debug, Serialize)]
pub struct NewsSummary {
    #[serde(flatten)]
    pub news: News,
    pub comment_count: i64,
}

#[derive(Debug, Serialize)]
pub struct HomeContext {
    pub object_list: Vec<NewsSummary>,
}

/// A comment as shown in a thread
#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: String,
    pub text: String,
    pub author: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct NewsDetail {
    #[serde(flatten)]
    pub news: News,
    pub comments: Vec<CommentView>,
}

/// Detail page. `form` is absent for anonymous visitors.
#[derive(Debug, Serialize)]
pub struct DetailContext {
    pub news: NewsDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<CommentForm>,
}

/// Edit and delete pages share this shape; delete has no form
#[derive(Debug, Serialize)]
pub struct CommentContext {
    pub comment: Comment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<CommentForm>,
}

// ==================== Requests / responses ====================

#[derive(Debug, Deserialize)]
pub struct CommentFormData {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
