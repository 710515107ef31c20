//! OAuth2 credentials for the Google Calendar API.
//!
//! The saved credential uses the same `authorized_user` JSON shape
//! Google's client libraries write, so a token file produced by
//! those can be reused here and vice versa.

use std::path::{Path, PathBuf};

use anyhow::{Context, Error, Result, anyhow};
use serde::{Deserialize, Serialize};

use super::{GoogleEndpoints, SCOPES};

const AUTHORIZED_USER: &str = "authorized_user";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Credential {
    #[serde(rename = "type")]
    pub kind: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl Credential {
    pub fn authorized_user(client_id: &str, client_secret: &str, refresh_token: &str) -> Self {
        Self {
            kind: AUTHORIZED_USER.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            refresh_token: refresh_token.to_string(),
        }
    }

    /// Whether this looks like something that can be exchanged for an
    /// access token. Nothing here checks with Google.
    pub fn is_valid_shape(&self) -> bool {
        self.kind == AUTHORIZED_USER
            && !self.client_id.is_empty()
            && !self.refresh_token.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationKey {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

/// The OAuth client file downloaded from the Google Cloud console.
/// Desktop clients nest the keys under `installed`, web clients under
/// `web`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationCredentials {
    installed: Option<ApplicationKey>,
    web: Option<ApplicationKey>,
}

impl ApplicationCredentials {
    pub fn key(&self) -> Result<&ApplicationKey> {
        self.installed
            .as_ref()
            .or(self.web.as_ref())
            .ok_or(anyhow!("Application credentials have neither `installed` nor `web` keys"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

/// Reads and writes the credential file. Single user, single file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    token_path: PathBuf,
    credentials_path: PathBuf,
}

impl CredentialStore {
    pub fn new(token_path: impl Into<PathBuf>, credentials_path: impl Into<PathBuf>) -> Self {
        Self {
            token_path: token_path.into(),
            credentials_path: credentials_path.into(),
        }
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    /// Returns the saved credential if there is one with a usable shape.
    pub async fn load(&self) -> Option<Credential> {
        let content = match tokio::fs::read_to_string(&self.token_path).await {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!("No saved credential at {}: {}", self.token_path.display(), e);
                return None;
            }
        };
        match serde_json::from_str::<Credential>(&content) {
            Ok(credential) if credential.is_valid_shape() => Some(credential),
            Ok(_) => {
                tracing::warn!("Ignoring malformed credential at {}", self.token_path.display());
                None
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse credential at {}: {}",
                    self.token_path.display(),
                    e
                );
                None
            }
        }
    }

    pub async fn save(&self, credential: &Credential) -> Result<()> {
        let payload = serde_json::to_string(credential)?;
        tokio::fs::write(&self.token_path, payload)
            .await
            .with_context(|| format!("Failed to write {}", self.token_path.display()))?;
        tracing::info!("Credential saved to {}", self.token_path.display());
        Ok(())
    }

    pub async fn application_credentials(&self) -> Result<ApplicationCredentials> {
        let content = tokio::fs::read_to_string(&self.credentials_path)
            .await
            .with_context(|| format!("Failed to read {}", self.credentials_path.display()))?;
        let creds = serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", self.credentials_path.display()))?;
        Ok(creds)
    }
}

pub fn authorization_url(endpoints: &GoogleEndpoints, client_id: &str) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
        endpoints.auth_url,
        urlencoding::encode(client_id),
        urlencoding::encode(&endpoints.redirect_uri),
        urlencoding::encode(&SCOPES.join(" "))
    )
}

/// Accepts either the bare authorization code or the whole URL the
/// browser was redirected to.
pub fn parse_authorization_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if !input.starts_with("http://") && !input.starts_with("https://") {
        return Some(input.to_string());
    }

    let url = reqwest::Url::parse(input).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

pub async fn exchange_code_for_token(
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<OAuthToken, Error> {
    let token = reqwest::Client::new()
        .post(token_url)
        .form(&[
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?
        .error_for_status()
        .context("Token exchange failed")?
        .json()
        .await?;
    Ok(token)
}

pub async fn refresh_access_token(
    token_url: &str,
    credential: &Credential,
) -> Result<OAuthToken, Error> {
    let token = reqwest::Client::new()
        .post(token_url)
        .form(&[
            ("client_id", credential.client_id.as_str()),
            ("client_secret", credential.client_secret.as_str()),
            ("refresh_token", credential.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await?
        .error_for_status()
        .context("Refreshing the access token failed")?
        .json()
        .await?;
    Ok(token)
}

/// Asks the user to visit the consent URL and hand back the
/// authorization code (or the redirected URL containing it).
pub type CodePrompt = Box<dyn Fn(&str) -> Result<String> + Send + Sync + 'static>;

/// Runs the consent flow unconditionally and saves the result.
pub async fn run_authorization_flow(
    store: &CredentialStore,
    endpoints: &GoogleEndpoints,
    prompt: &CodePrompt,
) -> Result<Credential> {
    let app_creds = store.application_credentials().await?;
    let key = app_creds.key()?;

    let url = authorization_url(endpoints, &key.client_id);
    let answer = prompt(&url)?;
    let code = parse_authorization_code(&answer).ok_or(anyhow!("No authorization code given"))?;

    let token = exchange_code_for_token(
        &endpoints.token_url,
        &key.client_id,
        &key.client_secret,
        &code,
        &endpoints.redirect_uri,
    )
    .await?;
    let refresh_token = token
        .refresh_token
        .ok_or(anyhow!("No refresh token in response"))?;

    let credential = Credential::authorized_user(&key.client_id, &key.client_secret, &refresh_token);
    store.save(&credential).await?;
    Ok(credential)
}

/// Load the saved credential or run the consent flow to get one.
pub async fn authorize(
    store: &CredentialStore,
    endpoints: &GoogleEndpoints,
    prompt: &CodePrompt,
) -> Result<Credential> {
    if let Some(credential) = store.load().await {
        return Ok(credential);
    }
    tracing::info!("No saved credential, starting authorization");
    run_authorization_flow(store, endpoints, prompt).await
}
