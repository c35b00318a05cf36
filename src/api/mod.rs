use actix_web::http::header;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use std::sync::Arc;

use crate::auth::{login_redirect, AuthError, AuthService};
use crate::config::Settings;
use crate::models::*;
use crate::moderation::{CommentForm, ModerationPolicy};
use crate::ordering;
use crate::policy::{comment_access, Access, Identity};
use crate::store::{Store, StoreError};

pub struct AppState {
    pub store: Arc<Store>,
    pub auth_service: Arc<AuthService>,
    pub settings: Arc<Settings>,
    pub moderation: ModerationPolicy,
}

impl AppState {
    pub fn new(store: Arc<Store>, auth_service: Arc<AuthService>, settings: Arc<Settings>) -> Self {
        let moderation = settings.moderation_policy();
        Self {
            store,
            auth_service,
            settings,
            moderation,
        }
    }
}

// ==================== URLs ====================

pub fn news_detail_url(news_id: &str) -> String {
    format!("/news/{}/", news_id)
}

/// Where a successful comment write lands
pub fn comments_url(news_id: &str) -> String {
    format!("{}#comments", news_detail_url(news_id))
}

pub fn edit_comment_url(comment_id: &str) -> String {
    format!("/edit_comment/{}/", comment_id)
}

pub fn delete_comment_url(comment_id: &str) -> String {
    format!("/delete_comment/{}/", comment_id)
}

fn redirect(location: String) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn server_error(action: &str, e: StoreError) -> HttpResponse {
    log::error!("Failed to {}: {}", action, e);
    HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Internal server error"))
}

fn news_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::<()>::error("News not found"))
}

fn comment_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::<()>::error("Comment not found"))
}

// ==================== Health Check ====================

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

// ==================== Auth Endpoints ====================

pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<SignupRequest>,
) -> impl Responder {
    let username = body.username.trim();
    if username.is_empty() || body.password.is_empty() {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error("Username and password are required"));
    }

    let password_hash = match state.auth_service.hash_password(&body.password) {
        Ok(hash) => hash,
        Err(_) => return HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to hash password")),
    };

    let mut user = User {
        id: String::new(),
        username: username.to_string(),
        password_hash,
        created_at: Utc::now(),
    };

    if let Err(e) = state.store.create_user(&mut user) {
        log::info!("Signup for {} refused: {}", username, e);
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error("Username is already taken"));
    }

    let token = match state.auth_service.generate_token(&user.id) {
        Ok(t) => t,
        Err(_) => return HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to generate token")),
    };

    log::info!("Created user {}", user.username);
    HttpResponse::Created().json(ApiResponse::success(LoginResponse { token, user }))
}

pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> impl Responder {
    let user = match state.auth_service.authenticate(&body.username, &body.password) {
        Ok(u) => u,
        Err(AuthError::InvalidCredentials) => {
            return HttpResponse::Unauthorized().json(ApiResponse::<()>::error("Invalid credentials"));
        }
        Err(e) => {
            log::error!("Login failed: {}", e);
            return HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Internal server error"));
        }
    };

    let token = match state.auth_service.generate_token(&user.id) {
        Ok(t) => t,
        Err(_) => return HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to generate token")),
    };

    HttpResponse::Ok().json(ApiResponse::success(LoginResponse { token, user }))
}

// ==================== News Endpoints ====================

pub async fn home(state: web::Data<AppState>) -> impl Responder {
    let news = match state.store.list_news() {
        Ok(n) => n,
        Err(e) => return server_error("list news", e),
    };

    let page = ordering::home_page(news, state.settings.news_count_on_home_page);

    let mut object_list = Vec::with_capacity(page.len());
    for news in page {
        let comment_count = match state.store.count_comments_for_news(&news.id) {
            Ok(c) => c,
            Err(e) => return server_error("count comments", e),
        };
        object_list.push(NewsSummary { news, comment_count });
    }

    HttpResponse::Ok().json(ApiResponse::success(HomeContext { object_list }))
}

/// News item with its thread in display order
fn load_news_detail(store: &Store, news_id: &str) -> Result<NewsDetail, StoreError> {
    let news = store.get_news(news_id)?;
    let comments = ordering::comment_thread(store.list_comments_for_news(news_id)?);

    let author_ids: Vec<&str> = comments.iter().map(|c| c.author_id.as_str()).collect();
    let usernames = store.usernames(&author_ids)?;

    let comments = comments
        .into_iter()
        .map(|c| CommentView {
            author: usernames.get(&c.author_id).cloned().unwrap_or_default(),
            id: c.id,
            text: c.text,
            created: c.created,
        })
        .collect();

    Ok(NewsDetail { news, comments })
}

fn render_detail(store: &Store, news_id: &str, form: Option<CommentForm>) -> HttpResponse {
    match load_news_detail(store, news_id) {
        Ok(news) => HttpResponse::Ok().json(ApiResponse::success(DetailContext { news, form })),
        Err(StoreError::NotFound(_)) => news_not_found(),
        Err(e) => server_error("load news", e),
    }
}

pub async fn news_detail(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> impl Responder {
    let news_id = path.into_inner();
    // Anonymous visitors get no form at all
    let form = identity.is_authenticated().then(CommentForm::empty);
    render_detail(&state.store, &news_id, form)
}

pub async fn create_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Form<CommentFormData>,
) -> impl Responder {
    let news_id = path.into_inner();

    let user = match identity.user() {
        Some(u) => u,
        None => return login_redirect(&news_detail_url(&news_id)),
    };

    match state.store.get_news(&news_id) {
        Ok(_) => {}
        Err(StoreError::NotFound(_)) => return news_not_found(),
        Err(e) => return server_error("load news", e),
    }

    let mut form = CommentForm::bound(body.into_inner().text);
    if !form.validate(&state.moderation) {
        return render_detail(&state.store, &news_id, Some(form));
    }

    let mut comment = Comment::new(&news_id, &user.id, form.text);
    if let Err(e) = state.store.create_comment(&mut comment) {
        return server_error("create comment", e);
    }

    log::info!("User {} commented on news {}", user.username, news_id);
    redirect(comments_url(&news_id))
}

// ==================== Comment Endpoints ====================

/// Load a comment the current user may change, or the response that refuses it.
/// Anonymous visitors are sent to login before any lookup, so they learn
/// nothing about which ids exist.
fn authorized_comment(
    store: &Store,
    identity: &Identity,
    comment_id: &str,
    here: &str,
) -> Result<Comment, HttpResponse> {
    if !identity.is_authenticated() {
        return Err(login_redirect(here));
    }

    let comment = match store.get_comment(comment_id) {
        Ok(c) => c,
        Err(StoreError::NotFound(_)) => return Err(comment_not_found()),
        Err(e) => return Err(server_error("load comment", e)),
    };

    match comment_access(identity, &comment) {
        Access::Granted => Ok(comment),
        Access::NotFound => {
            log::debug!("Refusing comment {} to a non-author", comment_id);
            Err(comment_not_found())
        }
        Access::LoginRequired => Err(login_redirect(here)),
    }
}

pub async fn edit_comment_page(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> impl Responder {
    let comment_id = path.into_inner();
    let comment = match authorized_comment(&state.store, &identity, &comment_id, &edit_comment_url(&comment_id)) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let form = Some(CommentForm::bound(comment.text.clone()));
    HttpResponse::Ok().json(ApiResponse::success(CommentContext { comment, form }))
}

pub async fn edit_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Form<CommentFormData>,
) -> impl Responder {
    let comment_id = path.into_inner();
    let mut comment = match authorized_comment(&state.store, &identity, &comment_id, &edit_comment_url(&comment_id)) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let mut form = CommentForm::bound(body.into_inner().text);
    if !form.validate(&state.moderation) {
        return HttpResponse::Ok().json(ApiResponse::success(CommentContext { comment, form: Some(form) }));
    }

    comment.text = form.text;
    match state.store.update_comment(&comment) {
        Ok(_) => redirect(comments_url(&comment.news_id)),
        Err(StoreError::NotFound(_)) => comment_not_found(),
        Err(e) => server_error("update comment", e),
    }
}

pub async fn delete_comment_page(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> impl Responder {
    let comment_id = path.into_inner();
    match authorized_comment(&state.store, &identity, &comment_id, &delete_comment_url(&comment_id)) {
        Ok(comment) => HttpResponse::Ok().json(ApiResponse::success(CommentContext { comment, form: None })),
        Err(resp) => resp,
    }
}

pub async fn delete_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> impl Responder {
    let comment_id = path.into_inner();
    let comment = match authorized_comment(&state.store, &identity, &comment_id, &delete_comment_url(&comment_id)) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match state.store.delete_comment(&comment.id) {
        Ok(_) => redirect(comments_url(&comment.news_id)),
        Err(StoreError::NotFound(_)) => comment_not_found(),
        Err(e) => server_error("delete comment", e),
    }
}

// ==================== Route Configuration ====================

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(health))

        // Auth
        .route("/auth/signup/", web::post().to(signup))
        .route("/auth/login/", web::post().to(login))

        // News
        .route("/", web::get().to(home))
        .route("/news/{id}/", web::get().to(news_detail))
        .route("/news/{id}/", web::post().to(create_comment))

        // Comments
        .route("/edit_comment/{id}/", web::get().to(edit_comment_page))
        .route("/edit_comment/{id}/", web::post().to(edit_comment))
        .route("/delete_comment/{id}/", web::get().to(delete_comment_page))
        .route("/delete_comment/{id}/", web::post().to(delete_comment))
        .route("/delete_comment/{id}/", web::delete().to(delete_comment));
}
