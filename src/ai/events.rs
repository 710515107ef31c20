//! Turns the loosely-typed event objects a model produces into Google
//! Calendar event resources.
//!
//! Models are inconsistent about shapes (`"start": "2024-05-15"` vs
//! `"start": {"date": "2024-05-15"}`, `color` vs `colour`, reminders
//! as a list or as an object) so everything is read from a
//! `serde_json::Value` and normalized here rather than deserialized
//! into a strict struct.

use anyhow::{Result, anyhow};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

use super::color::resolve_color;

/// Prepended to the summary of events that already started.
pub const COMPLETED_MARKER: &str = "\u{2705} ";

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";
const NAIVE_DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];
const OFFSET_DATE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M%z",
];

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    fn date(date: String) -> Self {
        Self {
            date: Some(date),
            date_time: None,
            time_zone: None,
        }
    }

    fn date_time(date_time: String, time_zone: Option<String>) -> Self {
        Self {
            date: None,
            date_time: Some(date_time),
            time_zone,
        }
    }

    /// Whichever of `date` or `dateTime` is set.
    pub fn value(&self) -> Option<&str> {
        self.date.as_deref().or(self.date_time.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReminderOverride {
    pub method: String,
    pub minutes: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    pub use_default: bool,
    pub overrides: Vec<ReminderOverride>,
}

/// An event ready to be sent to the calendar insert endpoint.
/// `start` and `end` are `None` when the model gave a date that
/// couldn't be understood.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    #[serde(skip)]
    pub all_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Reminders>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
}

fn raw_time<'a>(value: &'a Value, preferred: &str, fallback: &str) -> Option<&'a str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(_) => value[preferred].as_str().or(value[fallback].as_str()),
        _ => None,
    }
}

/// Normalize to `YYYY-MM-DD`, dropping any time portion after `T`.
pub fn normalize_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    let candidate = raw.split('T').next().unwrap_or(raw);
    if candidate.len() != 10 {
        return Err(anyhow!("Not a YYYY-MM-DD date: {}", raw));
    }
    NaiveDate::parse_from_str(candidate, DATE_FORMAT)
        .map_err(|e| anyhow!("Invalid date {}: {}", raw, e))
}

/// Normalize to a date time in `offset`. Values without an offset are
/// taken to already be in `offset`, values with one are converted.
pub fn normalize_date_time(raw: &str, offset: &FixedOffset) -> Result<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(offset));
    }
    for format in OFFSET_DATE_TIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Ok(dt.with_timezone(offset));
        }
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return offset
                .from_local_datetime(&naive)
                .single()
                .ok_or(anyhow!("Ambiguous date time: {}", raw));
        }
    }

    Err(anyhow!("Invalid date time: {}", raw))
}

fn start_of_day(date: &NaiveDate, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    date.and_hms_opt(0, 0, 0)
        .and_then(|naive| offset.from_local_datetime(&naive).single())
}

fn optional_string(item: &Value, key: &str) -> Option<String> {
    item[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Without an explicit flag an event is all day when its start is a
/// bare date.
fn is_all_day(item: &Value) -> bool {
    let flag = if item["allDay"].is_null() {
        &item["all_day"]
    } else {
        &item["allDay"]
    };
    match flag {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        Value::Null => is_bare_date(&item["start"]),
        _ => false,
    }
}

fn is_bare_date(start: &Value) -> bool {
    match start {
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).is_ok(),
        Value::Object(_) => start["dateTime"].is_null() && start["date"].is_string(),
        _ => false,
    }
}

fn recurrence(item: &Value) -> Option<Vec<String>> {
    let rules: Vec<String> = match &item["recurrence"] {
        Value::String(rule) => vec![rule.to_string()],
        Value::Array(rules) => rules
            .iter()
            .filter_map(|r| r.as_str())
            .map(str::to_string)
            .collect(),
        _ => return None,
    };
    if rules.is_empty() { None } else { Some(rules) }
}

fn reminder_override(value: &Value) -> Option<ReminderOverride> {
    let minutes = value["minutes"]
        .as_i64()
        .or(value["minutesBefore"].as_i64())
        .or(value["minutes"].as_str().and_then(|s| s.trim().parse().ok()))?;
    let method = value["method"].as_str().unwrap_or("popup").to_string();
    Some(ReminderOverride { method, minutes })
}

fn reminders(item: &Value) -> Option<Reminders> {
    let overrides = match &item["reminders"] {
        Value::Array(list) => list,
        Value::Object(obj) => obj.get("overrides")?.as_array()?,
        _ => return None,
    };
    let overrides = overrides
        .iter()
        .filter_map(|o| {
            let parsed = reminder_override(o);
            if parsed.is_none() {
                tracing::warn!("Dropping reminder without minutes: {}", o);
            }
            parsed
        })
        .collect();
    Some(Reminders {
        use_default: false,
        overrides,
    })
}

fn color_id(item: &Value) -> Option<String> {
    let raw = ["color", "colour", "colorId"]
        .iter()
        .map(|key| &item[*key])
        .find(|v| !v.is_null())?;
    let raw = match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let resolved = resolve_color(&raw);
    if resolved.is_none() {
        tracing::warn!("Dropping unknown event color: {}", raw);
    }
    resolved.map(|id| id.to_string())
}

/// Build a single event. Bad dates are logged and left as `None`.
pub fn build_event(item: &Value, offset: &FixedOffset, now: &DateTime<Utc>) -> EventDraft {
    let all_day = is_all_day(item);
    let mut summary = optional_string(item, "summary").unwrap_or_else(|| "(no title)".to_string());

    let (start, end, started_at) = if all_day {
        let normalize = |key: &str| -> (Option<EventTime>, Option<NaiveDate>) {
            match raw_time(&item[key], "date", "dateTime").map(normalize_date) {
                Some(Ok(date)) => (
                    Some(EventTime::date(date.format(DATE_FORMAT).to_string())),
                    Some(date),
                ),
                Some(Err(e)) => {
                    tracing::error!("Bad {} for event {:?}: {}", key, summary, e);
                    (None, None)
                }
                None => {
                    tracing::error!("Missing {} for event {:?}", key, summary);
                    (None, None)
                }
            }
        };
        let (start, start_date) = normalize("start");
        let (end, _) = normalize("end");
        let started_at = start_date.and_then(|d| start_of_day(&d, offset));
        (start, end, started_at)
    } else {
        let time_zone = optional_string(item, "timeZone");
        let normalize = |key: &str| -> (Option<EventTime>, Option<DateTime<FixedOffset>>) {
            match raw_time(&item[key], "dateTime", "date").map(|raw| normalize_date_time(raw, offset)) {
                Some(Ok(dt)) => (
                    Some(EventTime::date_time(
                        dt.format(DATE_TIME_FORMAT).to_string(),
                        time_zone.clone(),
                    )),
                    Some(dt),
                ),
                Some(Err(e)) => {
                    tracing::error!("Bad {} for event {:?}: {}", key, summary, e);
                    (None, None)
                }
                None => {
                    tracing::error!("Missing {} for event {:?}", key, summary);
                    (None, None)
                }
            }
        };
        let (start, started_at) = normalize("start");
        let (end, _) = normalize("end");
        (start, end, started_at)
    };

    if let Some(started_at) = started_at
        && started_at <= *now
        && !summary.starts_with(COMPLETED_MARKER)
    {
        summary = format!("{}{}", COMPLETED_MARKER, summary);
    }

    EventDraft {
        summary,
        description: optional_string(item, "description"),
        location: optional_string(item, "location"),
        start,
        end,
        all_day,
        recurrence: recurrence(item),
        reminders: reminders(item),
        color_id: color_id(item),
    }
}

/// Build events from the model's objects, keeping their order.
/// Anything that isn't an object is skipped.
pub fn build_events(items: &[Value], offset: &FixedOffset, now: &DateTime<Utc>) -> Vec<EventDraft> {
    items
        .iter()
        .filter(|item| {
            if !item.is_object() {
                tracing::warn!("Skipping event that isn't an object: {}", item);
            }
            item.is_object()
        })
        .map(|item| build_event(item, offset, now))
        .collect()
}
