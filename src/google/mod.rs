//! Google OAuth and Calendar API clients.
//!
//! Everything here talks to Google's documented REST endpoints with
//! `reqwest` directly. The endpoint URLs are configurable so tests can
//! point them at a local mock server.

pub mod gcal;
pub mod oauth;

use crate::core::AppConfig;

/// OAuth2 scopes requested during authorization.
pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar"];

#[derive(Debug, Clone, PartialEq)]
pub struct GoogleEndpoints {
    pub api_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub redirect_uri: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            api_url: "https://www.googleapis.com/calendar/v3".to_string(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            redirect_uri: "http://localhost".to_string(),
        }
    }
}

impl From<&AppConfig> for GoogleEndpoints {
    fn from(config: &AppConfig) -> Self {
        Self {
            api_url: config.google_api_url.clone(),
            auth_url: config.google_auth_url.clone(),
            token_url: config.google_token_url.clone(),
            redirect_uri: config.google_redirect_uri.clone(),
        }
    }
}
