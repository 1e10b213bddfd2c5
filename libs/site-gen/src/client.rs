use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::Client;
use url::Url;

use task_api::types::task::Attachment;

use crate::error::GenerationError;
use crate::parse::{parse_file_set, FileSet};
use crate::prompt::build_prompt;
use crate::requests::{CompletionRequest, CompletionResponse, Message};

pub static GEMINI_CHAT_COMPLETIONS_URL: Lazy<Url> = Lazy::new(|| {
    Url::parse("https://generativelanguage.googleapis.com/v1beta/openai/chat/completions")
        .expect("Failed to parse Gemini chat completions URL")
});

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const ROUNDTRIP_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const ERROR_BODY_EXCERPT: usize = 200;

pub struct GeneratorConfig {
    pub api_key: String,
    pub endpoint: Url,
    pub model: String,
}

impl GeneratorConfig {
    /// Gemini through its OpenAI-compatible endpoint.
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: GEMINI_CHAT_COMPLETIONS_URL.clone(),
            model: DEFAULT_MODEL.to_owned(),
        }
    }
}

/// Asks a chat completions API for a static site.
pub struct Generator {
    config: GeneratorConfig,
    client: Client,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GenerationError> {
        // Generation is slow, so timeouts are lenient.
        let client = reqwest::Client::builder()
            .timeout(ROUNDTRIP_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Generate the files of a site described by `brief`.
    pub async fn generate(
        &self,
        brief: &str,
        checks: &[String],
        attachments: &[Attachment],
    ) -> Result<FileSet, GenerationError> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![Message::user(build_prompt(brief, checks, attachments))],
            stream: false,
        };

        log::debug!(
            "Requesting site from {} with model {}",
            self.config.endpoint,
            self.config.model
        );

        let resp = self
            .client
            .post(self.config.endpoint.clone())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            log::error!("Upstream error: status={} body={}", status, body);
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_EXCERPT).collect(),
            });
        }

        let text = resp
            .json::<CompletionResponse>()
            .await?
            .into_text()
            .ok_or(GenerationError::EmptyResponse)?;

        log::trace!("Model answered: {text}");

        parse_file_set(&text)
    }
}
