use serde::{Deserialize, Serialize};

/// OpenAI-compatible completion request, trimmed to what generation needs.
///
/// References:
/// * https://platform.openai.com/docs/api-reference/chat
/// * https://ai.google.dev/gemini-api/docs/openai
#[derive(Debug, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,

    /// Always false, the whole answer is needed before parsing.
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct Message {
    /// "user" | "assistant" | "system"
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: String) -> Self {
        Self {
            role: "user".to_owned(),
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionResponse {
    /// Text of the first choice, if the model produced any.
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
    }
}
