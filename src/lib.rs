// Library entry point for news-board
// Exposes modules for testing

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod moderation;
pub mod ordering;
pub mod policy;
pub mod store;
