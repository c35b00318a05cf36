#![allow(dead_code)]

use chrono::{Duration, Utc};
use std::sync::Arc;

use news_board::api::AppState;
use news_board::auth::AuthService;
use news_board::config::Settings;
use news_board::models::{Comment, News, User};
use news_board::store::Store;

pub const COMMENT_TEXT: &str = "Текст комментария";
pub const NEW_COMMENT_TEXT: &str = "Обновлённый комментарий";

pub struct TestEnv {
    pub store: Arc<Store>,
    pub auth_service: Arc<AuthService>,
    pub settings: Arc<Settings>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let store = Arc::new(Store::new(":memory:").unwrap());
        let auth_service = Arc::new(AuthService::new("test_secret".to_string(), store.clone()));
        Self {
            store,
            auth_service,
            settings: Arc::new(settings),
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(self.store.clone(), self.auth_service.clone(), self.settings.clone())
    }

    pub fn page_size(&self) -> usize {
        self.settings.news_count_on_home_page
    }
}

/// Build the service the way main does
macro_rules! init_app {
    ($env:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($env.auth_service.clone()))
                .app_data(actix_web::web::Data::new($env.app_state()))
                .configure(news_board::api::configure_routes),
        )
        .await
    };
}

/// Helper to create a user and return their bearer token
pub fn create_user_with_token(env: &TestEnv, username: &str) -> (User, String) {
    let mut user = User {
        id: String::new(),
        username: username.to_string(),
        password_hash: env.auth_service.hash_password("testpass123").unwrap(),
        created_at: Utc::now(),
    };
    env.store.create_user(&mut user).unwrap();
    let token = env.auth_service.generate_token(&user.id).unwrap();
    (user, token)
}

pub fn author(env: &TestEnv) -> (User, String) {
    create_user_with_token(env, "Автор")
}

pub fn not_author(env: &TestEnv) -> (User, String) {
    create_user_with_token(env, "Не автор")
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub fn create_news(env: &TestEnv) -> News {
    let mut news = News::new("Заголовок", "Текст");
    env.store.create_news(&mut news).unwrap();
    news
}

/// One more news item than fits on the home page, one per day going back
pub fn create_many_news(env: &TestEnv) -> Vec<News> {
    let today = Utc::now().date_naive();
    // Inserted oldest first so storage order differs from display order
    let mut all: Vec<News> = (0..=env.page_size() as i64)
        .rev()
        .map(|index| News {
            id: String::new(),
            title: format!("Новость {}", index),
            text: "Просто текст.".to_string(),
            date: today - Duration::days(index),
        })
        .collect();
    env.store.bulk_create_news(&mut all).unwrap();
    all
}

pub fn create_comment(env: &TestEnv, news: &News, author: &User) -> Comment {
    let mut comment = Comment::new(&news.id, &author.id, COMMENT_TEXT);
    env.store.create_comment(&mut comment).unwrap();
    comment
}

/// Ten comments whose timestamps do not follow insertion order
pub fn create_many_comments(env: &TestEnv, news: &News, author: &User) -> Vec<Comment> {
    let now = Utc::now();
    let mut comments: Vec<Comment> = [7, 2, 9, 0, 5, 1, 8, 3, 6, 4]
        .into_iter()
        .map(|index: i64| {
            let mut comment = Comment::new(&news.id, &author.id, format!("Tекст {}", index));
            comment.created = now + Duration::days(index);
            comment
        })
        .collect();
    env.store.bulk_create_comments(&mut comments).unwrap();
    comments
}
