//! Google Calendar API v3: listing calendars and inserting events.

use anyhow::{Error, Result};
use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use super::GoogleEndpoints;
use super::oauth::{CodePrompt, Credential, CredentialStore, authorize, refresh_access_token};
use crate::ai::events::EventDraft;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarSummary {
    pub id: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Deserialize)]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarSummary>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CreatedEvent {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(rename = "htmlLink", default)]
    pub html_link: Option<String>,
}

/// The calendar operations the planner needs. Each slot in the result
/// of `create_events` corresponds to the draft at the same index.
#[async_trait]
pub trait CalendarGateway {
    async fn authorize(&self) -> Result<Credential, Error>;

    async fn list_calendars(&self, credential: &Credential)
    -> Result<Vec<CalendarSummary>, Error>;

    async fn create_events(
        &self,
        credential: &Credential,
        drafts: &[EventDraft],
        calendar_id: &str,
    ) -> Result<Vec<Result<CreatedEvent, Error>>, Error>;
}

pub type BoxedCalendarGateway = Box<dyn CalendarGateway + Send + Sync + 'static>;

pub async fn list_calendars(api_url: &str, access_token: &str) -> Result<Vec<CalendarSummary>> {
    let client = reqwest::Client::new();
    let url = format!("{}/users/me/calendarList", api_url.trim_end_matches('/'));
    let mut calendars = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut request = client.get(&url).bearer_auth(access_token);
        if let Some(token) = &page_token {
            request = request.query(&[("pageToken", token)]);
        }
        let resp: CalendarListResponse = request.send().await?.error_for_status()?.json().await?;
        calendars.extend(resp.items);

        match resp.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok(calendars)
}

pub async fn insert_event(
    api_url: &str,
    access_token: &str,
    calendar_id: &str,
    draft: &EventDraft,
) -> Result<CreatedEvent> {
    let url = format!(
        "{}/calendars/{}/events",
        api_url.trim_end_matches('/'),
        urlencoding::encode(calendar_id)
    );
    let resp = reqwest::Client::new()
        .post(url)
        .bearer_auth(access_token)
        .json(draft)
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Calendar insert failed with {}: {}", status, body);
    }

    Ok(resp.json().await?)
}

/// Google Calendar behind the `CalendarGateway` trait. Authorization
/// goes through the credential store and asks the user for a code via
/// `prompt` when nothing is saved yet.
pub struct GoogleCalendar {
    store: CredentialStore,
    endpoints: GoogleEndpoints,
    prompt: CodePrompt,
}

impl GoogleCalendar {
    pub fn new(store: CredentialStore, endpoints: GoogleEndpoints, prompt: CodePrompt) -> Self {
        Self {
            store,
            endpoints,
            prompt,
        }
    }

    async fn access_token(&self, credential: &Credential) -> Result<String> {
        let token = refresh_access_token(&self.endpoints.token_url, credential).await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl CalendarGateway for GoogleCalendar {
    async fn authorize(&self) -> Result<Credential, Error> {
        authorize(&self.store, &self.endpoints, &self.prompt).await
    }

    async fn list_calendars(
        &self,
        credential: &Credential,
    ) -> Result<Vec<CalendarSummary>, Error> {
        let access_token = self.access_token(credential).await?;
        list_calendars(&self.endpoints.api_url, &access_token).await
    }

    async fn create_events(
        &self,
        credential: &Credential,
        drafts: &[EventDraft],
        calendar_id: &str,
    ) -> Result<Vec<Result<CreatedEvent, Error>>, Error> {
        let access_token = self.access_token(credential).await?;
        let api_url = &self.endpoints.api_url;

        // Inserts are independent so run them together, one failure
        // is recorded in its own slot and doesn't affect the others
        let futures = drafts.iter().map(|draft| {
            let access_token = &access_token;
            async move {
                let result = insert_event(api_url, access_token, calendar_id, draft).await;
                match &result {
                    Ok(event) => tracing::info!(
                        "Event created: {}",
                        event.html_link.as_deref().unwrap_or(&event.id)
                    ),
                    Err(e) => tracing::error!("Error creating event {:?}: {}", draft.summary, e),
                }
                result
            }
        });

        Ok(join_all(futures).await)
    }
}
