use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::FixedOffset;

const DEFAULT_SYSTEM_MESSAGE: &str = "You are a planning assistant. You turn the user's plans into calendar events and always answer with the events as JSON when asked to.";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub token_path: PathBuf,
    pub credentials_path: PathBuf,
    pub openai_api_hostname: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_temperature: Option<f32>,
    pub system_message: String,
    pub utc_offset: FixedOffset,
    pub calendar_id: String,
    pub max_repair_attempts: usize,
    pub google_api_url: String,
    pub google_auth_url: String,
    pub google_token_url: String,
    pub google_redirect_uri: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let storage_path = env::var("PLANCAL_STORAGE_PATH").unwrap_or("./".to_string());
        let token_path = env::var("PLANCAL_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(&storage_path).join("token.json"));
        let credentials_path = env::var("PLANCAL_CREDENTIALS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(&storage_path).join("credentials.json"));
        let openai_api_hostname = env::var("PLANCAL_LLM_HOST")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let openai_api_key =
            env::var("OPENAI_API_KEY").unwrap_or_else(|_| "thiswontworkforopenai".to_string());
        let openai_model =
            env::var("PLANCAL_LLM_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string());
        let openai_temperature = match env::var("PLANCAL_LLM_TEMPERATURE") {
            Ok(v) => Some(
                v.parse::<f32>()
                    .with_context(|| format!("Invalid PLANCAL_LLM_TEMPERATURE: {}", v))?,
            ),
            Err(_) => None,
        };
        let system_message = env::var("PLANCAL_SYSTEM_MESSAGE")
            .unwrap_or_else(|_| DEFAULT_SYSTEM_MESSAGE.to_string());
        let utc_offset =
            parse_utc_offset(&env::var("PLANCAL_UTC_OFFSET").unwrap_or("+02:00".to_string()))?;
        let calendar_id = env::var("PLANCAL_CALENDAR_ID").unwrap_or("primary".to_string());
        let max_repair_attempts = match env::var("PLANCAL_MAX_REPAIR_ATTEMPTS") {
            Ok(v) => v
                .parse::<usize>()
                .with_context(|| format!("Invalid PLANCAL_MAX_REPAIR_ATTEMPTS: {}", v))?,
            Err(_) => 1,
        };
        let google_api_url = env::var("PLANCAL_GOOGLE_API_URL")
            .unwrap_or_else(|_| "https://www.googleapis.com/calendar/v3".to_string());
        let google_auth_url = env::var("PLANCAL_GOOGLE_AUTH_URL")
            .unwrap_or_else(|_| "https://accounts.google.com/o/oauth2/v2/auth".to_string());
        let google_token_url = env::var("PLANCAL_GOOGLE_TOKEN_URL")
            .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_string());
        let google_redirect_uri = env::var("PLANCAL_GOOGLE_REDIRECT_URI")
            .unwrap_or_else(|_| "http://localhost".to_string());

        Ok(Self {
            token_path,
            credentials_path,
            openai_api_hostname,
            openai_api_key,
            openai_model,
            openai_temperature,
            system_message,
            utc_offset,
            calendar_id,
            max_repair_attempts,
            google_api_url,
            google_auth_url,
            google_token_url,
            google_redirect_uri,
        })
    }
}

/// Parses an offset like `+02:00`, `-0530` or `Z` into a `FixedOffset`.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or(anyhow!("Invalid UTC offset: {}", s));
    }
    s.parse::<FixedOffset>()
        .map_err(|e| anyhow!("Invalid UTC offset {}: {}", s, e))
}
