use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use uuid::Uuid;

use crate::models::*;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid record: {0}")]
    Invalid(String),
    #[error("Store lock poisoned")]
    Lock,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Thread-safe SQLite store.
///
/// List queries return rows unordered; display order is decided by
/// [`crate::ordering`].
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path
    pub fn new(db_path: &str) -> StoreResult<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store for testing
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Lock)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS news (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                text TEXT NOT NULL,
                date TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS comments (
                id TEXT PRIMARY KEY,
                news_id TEXT NOT NULL,
                author_id TEXT NOT NULL,
                text TEXT NOT NULL,
                created TEXT NOT NULL,
                FOREIGN KEY (news_id) REFERENCES news(id) ON DELETE CASCADE,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_comments_news_id ON comments(news_id);
            "#,
        )?;
        Ok(())
    }

    // ==================== User Operations ====================

    pub fn create_user(&self, user: &mut User) -> StoreResult<()> {
        let conn = self.conn()?;
        user.id = Uuid::new_v4().to_string();
        user.created_at = Utc::now();

        conn.execute(
            r#"INSERT INTO users (id, username, password_hash, created_at)
               VALUES (?1, ?2, ?3, ?4)"#,
            params![
                &user.id,
                &user.username,
                &user.password_hash,
                user.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, id: &str) -> StoreResult<User> {
        let conn = self.conn()?;
        conn.query_row("SELECT * FROM users WHERE id = ?1", params![id], row_to_user)
            .map_err(|e| not_found_or(e, format!("User {}", id)))
    }

    pub fn get_user_by_username(&self, username: &str) -> StoreResult<User> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT * FROM users WHERE username = ?1",
            params![username],
            row_to_user,
        )
        .map_err(|e| not_found_or(e, format!("User {}", username)))
    }

    pub fn count_users(&self) -> StoreResult<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Map user ids to usernames. Unknown ids are left out.
    pub fn usernames(&self, ids: &[&str]) -> StoreResult<HashMap<String, String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT username FROM users WHERE id = ?1")?;

        let mut names = HashMap::new();
        for id in ids {
            if names.contains_key(*id) {
                continue;
            }
            match stmt.query_row(params![id], |row| row.get::<_, String>(0)) {
                Ok(name) => {
                    names.insert(id.to_string(), name);
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(names)
    }

    // ==================== News Operations ====================

    pub fn create_news(&self, news: &mut News) -> StoreResult<()> {
        check_news(news)?;
        let conn = self.conn()?;
        news.id = Uuid::new_v4().to_string();

        conn.execute(
            "INSERT INTO news (id, title, text, date) VALUES (?1, ?2, ?3, ?4)",
            params![
                &news.id,
                &news.title,
                &news.text,
                news.date.format(DATE_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// Insert many News items in one transaction, keeping their dates
    pub fn bulk_create_news(&self, news: &mut [News]) -> StoreResult<()> {
        if news.is_empty() {
            return Ok(());
        }
        for item in news.iter() {
            check_news(item)?;
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        for item in news.iter_mut() {
            item.id = Uuid::new_v4().to_string();
            tx.execute(
                "INSERT INTO news (id, title, text, date) VALUES (?1, ?2, ?3, ?4)",
                params![
                    &item.id,
                    &item.title,
                    &item.text,
                    item.date.format(DATE_FORMAT).to_string(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn get_news(&self, id: &str) -> StoreResult<News> {
        let conn = self.conn()?;
        conn.query_row("SELECT * FROM news WHERE id = ?1", params![id], row_to_news)
            .map_err(|e| not_found_or(e, format!("News {}", id)))
    }

    pub fn list_news(&self) -> StoreResult<Vec<News>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT * FROM news")?;
        let news = stmt
            .query_map([], row_to_news)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(news)
    }

    /// Removes the item together with its comments
    pub fn delete_news(&self, id: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM news WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("News {}", id)));
        }
        Ok(())
    }

    // ==================== Comment Operations ====================

    pub fn create_comment(&self, comment: &mut Comment) -> StoreResult<()> {
        let conn = self.conn()?;
        comment.id = Uuid::new_v4().to_string();
        comment.created = Utc::now();

        conn.execute(
            r#"INSERT INTO comments (id, news_id, author_id, text, created)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![
                &comment.id,
                &comment.news_id,
                &comment.author_id,
                &comment.text,
                comment.created.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Insert many comments in one transaction. Unlike `create_comment`, the
    /// supplied `created` timestamps are kept.
    pub fn bulk_create_comments(&self, comments: &mut [Comment]) -> StoreResult<()> {
        if comments.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        for comment in comments.iter_mut() {
            comment.id = Uuid::new_v4().to_string();
            tx.execute(
                r#"INSERT INTO comments (id, news_id, author_id, text, created)
                   VALUES (?1, ?2, ?3, ?4, ?5)"#,
                params![
                    &comment.id,
                    &comment.news_id,
                    &comment.author_id,
                    &comment.text,
                    comment.created.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn get_comment(&self, id: &str) -> StoreResult<Comment> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT * FROM comments WHERE id = ?1",
            params![id],
            row_to_comment,
        )
        .map_err(|e| not_found_or(e, format!("Comment {}", id)))
    }

    pub fn list_comments_for_news(&self, news_id: &str) -> StoreResult<Vec<Comment>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT * FROM comments WHERE news_id = ?1")?;
        let comments = stmt
            .query_map(params![news_id], row_to_comment)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    /// Persist a new text. The owning news item and author are never rewritten.
    pub fn update_comment(&self, comment: &Comment) -> StoreResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE comments SET text = ?1 WHERE id = ?2",
            params![&comment.text, &comment.id],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("Comment {}", comment.id)));
        }
        Ok(())
    }

    pub fn delete_comment(&self, id: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("Comment {}", id)));
        }
        Ok(())
    }

    pub fn count_comments(&self) -> StoreResult<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn count_comments_for_news(&self, news_id: &str) -> StoreResult<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE news_id = ?1",
            params![news_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn check_news(news: &News) -> StoreResult<()> {
    if news.title.chars().count() > NEWS_TITLE_MAX_LENGTH {
        return Err(StoreError::Invalid(format!(
            "News title exceeds maximum length of {} characters",
            NEWS_TITLE_MAX_LENGTH
        )));
    }
    Ok(())
}

fn not_found_or(e: rusqlite::Error, what: String) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(what),
        _ => StoreError::Database(e),
    }
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        created_at: parse_datetime(row.get("created_at")?)?,
    })
}

fn row_to_news(row: &rusqlite::Row) -> rusqlite::Result<News> {
    Ok(News {
        id: row.get("id")?,
        title: row.get("title")?,
        text: row.get("text")?,
        date: parse_date(row.get("date")?)?,
    })
}

fn row_to_comment(row: &rusqlite::Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get("id")?,
        news_id: row.get("news_id")?,
        author_id: row.get("author_id")?,
        text: row.get("text")?,
        created: parse_datetime(row.get("created")?)?,
    })
}

fn parse_datetime(s: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

fn parse_date(s: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&s, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}
