use std::env;
use thiserror::Error;

use crate::moderation::{ModerationPolicy, DEFAULT_BANNED_WORDS, DEFAULT_WARNING};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATABASE_PATH: &str = "news.db";
pub const DEFAULT_NEWS_COUNT_ON_HOME_PAGE: usize = 10;
const INSECURE_JWT_SECRET: &str = "default_jwt_secret_change_me";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Runtime settings, read once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub database_path: String,
    pub jwt_secret: String,
    pub news_count_on_home_page: usize,
    pub banned_words: Vec<String>,
    pub moderation_warning: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            jwt_secret: INSECURE_JWT_SECRET.to_string(),
            news_count_on_home_page: DEFAULT_NEWS_COUNT_ON_HOME_PAGE,
            banned_words: DEFAULT_BANNED_WORDS.iter().map(|w| w.to_string()).collect(),
            moderation_warning: DEFAULT_WARNING.to_string(),
        }
    }
}

impl Settings {
    /// Build settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(port) = lookup("PORT") {
            settings.port = parse_number("PORT", port)?;
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            settings.database_path = path;
        }
        match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => settings.jwt_secret = secret,
            _ => log::warn!("JWT_SECRET not set, using default (not secure for production!)"),
        }
        if let Some(count) = lookup("NEWS_COUNT_ON_HOME_PAGE") {
            settings.news_count_on_home_page = parse_number("NEWS_COUNT_ON_HOME_PAGE", count)?;
        }
        if let Some(words) = lookup("BANNED_WORDS") {
            settings.banned_words = words.split(',').map(|w| w.to_string()).collect();
        }
        if let Some(warning) = lookup("MODERATION_WARNING") {
            settings.moderation_warning = warning;
        }

        Ok(settings)
    }

    pub fn moderation_policy(&self) -> ModerationPolicy {
        ModerationPolicy::new(self.banned_words.clone(), self.moderation_warning.clone())
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber { name, value })
}
