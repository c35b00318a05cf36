use actix_web::dev::Payload;
use actix_web::error::ErrorInternalServerError;
use actix_web::http::header;
use actix_web::{web, Error, FromRequest, HttpRequest, HttpResponse};
use chrono::{Duration, Utc};
use futures_util::future::{ready, Ready};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::models::User;
use crate::policy::Identity;
use crate::store::{Store, StoreError};

pub const LOGIN_URL: &str = "/auth/login/";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // user_id
    pub exp: i64,         // expiration timestamp
    pub iat: i64,         // issued at
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct AuthService {
    jwt_secret: String,
    store: Arc<Store>,
}

impl AuthService {
    pub fn new(jwt_secret: String, store: Arc<Store>) -> Self {
        Self { jwt_secret, store }
    }

    /// Hash a password using bcrypt
    pub fn hash_password(&self, password: &str) -> Result<String, bcrypt::BcryptError> {
        bcrypt::hash(password, 10)
    }

    /// Verify a password against a bcrypt hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
        bcrypt::verify(password, hash)
    }

    /// Generate a JWT token for a user
    pub fn generate_token(&self, user_id: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let exp = now + Duration::days(7);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
    }

    /// Validate a JWT token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Look up a user by name and check the password.
    /// Unknown users and wrong passwords give the same error.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let user = match self.store.get_user_by_username(username) {
            Ok(u) => u,
            Err(StoreError::NotFound(_)) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        if !self.verify_password(password, &user.password_hash).unwrap_or(false) {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(user)
    }

    /// Resolve the user a bearer token speaks for. Bad, expired or orphaned
    /// tokens resolve to `Anonymous`.
    pub fn identify(&self, token: &str) -> Result<Identity, StoreError> {
        let claims = match self.validate_token(token) {
            Ok(c) => c,
            Err(e) => {
                log::debug!("Rejected bearer token: {}", e);
                return Ok(Identity::Anonymous);
            }
        };

        match self.store.get_user(&claims.sub) {
            Ok(user) => Ok(Identity::Authenticated(user)),
            Err(StoreError::NotFound(_)) => Ok(Identity::Anonymous),
            Err(e) => Err(e),
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The current user, taken from `Authorization: Bearer <jwt>`.
/// Requests without a usable token are anonymous rather than rejected; the
/// handlers decide what anonymous visitors may do.
impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(token) = bearer_token(req) else {
            return ready(Ok(Identity::Anonymous));
        };

        let Some(auth_service) = req.app_data::<web::Data<Arc<AuthService>>>() else {
            log::error!("AuthService is not registered as app data");
            return ready(Err(ErrorInternalServerError("Authentication unavailable")));
        };

        ready(auth_service.identify(token).map_err(|e| {
            log::error!("Failed to resolve identity: {}", e);
            ErrorInternalServerError("Authentication unavailable")
        }))
    }
}

/// Redirect an anonymous visitor to the login page, remembering where they were
pub fn login_redirect(next: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, format!("{}?next={}", LOGIN_URL, next)))
        .finish()
}
