use anyhow::{Error, Result, bail};
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::openai::{Message, completion_stream};

/// Something that can answer a transcript with the next assistant
/// message, streaming the text through `tx` while it's generated.
#[async_trait]
pub trait CompletionGateway {
    async fn stream(
        &self,
        messages: &[Message],
        tx: mpsc::UnboundedSender<String>,
    ) -> Result<String, Error>;
}

pub type BoxedCompletionGateway = Box<dyn CompletionGateway + Send + Sync + 'static>;

/// Streaming chat completions against an OpenAI compatible API.
#[derive(Debug, Clone)]
pub struct OpenAiCompletion {
    api_hostname: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
}

impl OpenAiCompletion {
    pub fn new(
        api_hostname: &str,
        api_key: &str,
        model: &str,
        temperature: Option<f32>,
    ) -> Result<Self, Error> {
        let model = model.trim();
        if model.is_empty() || model.contains(char::is_whitespace) {
            bail!("Unsupported model name: {:?}", model);
        }
        if let Some(t) = temperature
            && !(0.0..=2.0).contains(&t)
        {
            bail!("Temperature must be between 0 and 2, got {}", t);
        }

        Ok(Self {
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionGateway for OpenAiCompletion {
    async fn stream(
        &self,
        messages: &[Message],
        tx: mpsc::UnboundedSender<String>,
    ) -> Result<String, Error> {
        tracing::debug!(
            "Requesting completion from {} with {} messages",
            self.model,
            messages.len()
        );
        completion_stream(
            tx,
            messages,
            &self.api_hostname,
            &self.api_key,
            &self.model,
            self.temperature,
        )
        .await
    }
}
