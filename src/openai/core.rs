use std::{fmt, str::FromStr, time::Duration};
use tokio::sync::mpsc;

use anyhow::{Error, Result, anyhow};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::Assistant => "assistant",
            Role::User => "user",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "assistant" => Ok(Role::Assistant),
            "user" => Ok(Role::User),
            other => Err(anyhow!("Invalid message role: {}", other)),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Delta {
    Content { content: String },

    Reasoning { reasoning: String },

    // Role-only openers and the final chunk carry no text
    Empty {},
}

#[derive(Debug, Deserialize)]
struct CompletionChunkChoice {
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[allow(dead_code)]
    id: Option<String>,
    #[allow(dead_code)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionChunkChoice>,
}

/// Request a streaming chat completion from an OpenAI compatible
/// API. Each content delta is forwarded to `tx` as it arrives and
/// the assembled content is returned once the stream finishes.
pub async fn completion_stream(
    tx: mpsc::UnboundedSender<String>,
    messages: &[Message],
    api_hostname: &str,
    api_key: &str,
    model: &str,
    temperature: Option<f32>,
) -> Result<String, Error> {
    let mut payload = json!({
        "model": model,
        "messages": messages,
        "stream": true,
    });
    if let Some(temperature) = temperature {
        payload["temperature"] = json!(temperature);
    }
    let url = format!("{}/v1/chat/completions", api_hostname.trim_end_matches("/"));
    let response = reqwest::Client::new()
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .timeout(Duration::from_secs(60 * 5))
        .json(&payload)
        .send()
        .await?
        .error_for_status()?;

    let mut stream = response.bytes_stream();

    let mut content_buf = String::new();
    // Bytes rather than a String so a multi-byte character split
    // across two network chunks is not rejected.
    let mut buffer: Vec<u8> = Vec::new();
    let mut done = false;

    'outer: while let Some(chunk) = stream.next().await {
        let chunk = chunk?;

        // SSE events can be fragmented across HTTP frames. Carriage
        // returns only ever appear in line endings since the payload is
        // JSON, so dropping them turns CRLF framing into LF framing.
        buffer.extend(chunk.iter().filter(|b| **b != b'\r'));

        while let Some(event_end) = buffer.windows(2).position(|w| w == b"\n\n") {
            let event_bytes: Vec<u8> = buffer.drain(..event_end + 2).collect();
            if handle_event(&event_bytes, &mut content_buf, &tx)? == StreamStatus::Done {
                done = true;
                break 'outer;
            }
        }
    }

    // The last event isn't always followed by a blank line
    if !done && !buffer.is_empty() {
        handle_event(&buffer, &mut content_buf, &tx)?;
    }

    Ok(content_buf)
}

#[derive(Debug, PartialEq)]
enum StreamStatus {
    Continue,
    Done,
}

fn handle_event(
    event_bytes: &[u8],
    content_buf: &mut String,
    tx: &mpsc::UnboundedSender<String>,
) -> Result<StreamStatus, Error> {
    let event_data = String::from_utf8_lossy(event_bytes);
    let Some(data) = event_data.trim().strip_prefix("data:") else {
        return Ok(StreamStatus::Continue);
    };
    let data = data.trim();
    if data.is_empty() {
        return Ok(StreamStatus::Continue);
    }
    if data == "[DONE]" {
        return Ok(StreamStatus::Done);
    }

    let chunk = serde_json::from_str::<CompletionChunk>(data).inspect_err(|e| {
        tracing::error!("Parsing completion chunk failed for {}\nError:{}", data, e)
    })?;

    // The usage chunk at the end of a stream has no choices
    let Some(choice) = chunk.choices.first() else {
        return Ok(StreamStatus::Continue);
    };

    match &choice.delta {
        Delta::Content { content } => {
            if !content.is_empty() {
                content_buf.push_str(content);
                // The receiver going away shouldn't stop the
                // response from being assembled
                let _ = tx.send(content.clone());
            }
        }
        Delta::Reasoning { reasoning } => {
            tracing::debug!("Reasoning: {}", reasoning);
        }
        Delta::Empty {} => {}
    }

    if choice.finish_reason.is_some() {
        return Ok(StreamStatus::Done);
    }
    Ok(StreamStatus::Continue)
}
