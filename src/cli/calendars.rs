use anyhow::Result;

use super::auth::{credential_store, stdin_prompt};
use crate::core::AppConfig;
use crate::google::GoogleEndpoints;
use crate::google::gcal::{CalendarGateway, GoogleCalendar};

pub async fn run(config: &AppConfig) -> Result<()> {
    let calendar = GoogleCalendar::new(
        credential_store(config),
        GoogleEndpoints::from(config),
        stdin_prompt(),
    );
    let credential = calendar.authorize().await?;

    for cal in calendar.list_calendars(&credential).await? {
        let marker = if cal.id == config.calendar_id { "*" } else { " " };
        println!("{} {}\t{}", marker, cal.id, cal.summary);
    }

    Ok(())
}
