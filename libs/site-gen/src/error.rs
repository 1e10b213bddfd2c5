use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("generation service returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("generation service returned no content")]
    EmptyResponse,

    #[error("model output is not a JSON object of file contents: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("model output is missing {0}")]
    MissingEntryDocument(&'static str),

    #[error("model output contains an invalid file name: {0:?}")]
    InvalidFileName(String),
}
