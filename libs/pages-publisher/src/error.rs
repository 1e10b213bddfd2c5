use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("failed to create repository ({status}): {body}")]
    RepoCreate { status: u16, body: String },

    #[error("failed to commit {file} ({status}): {body}")]
    FileCommit {
        file: String,
        status: u16,
        body: String,
    },

    #[error("failed to enable pages ({status}): {body}")]
    PagesEnable { status: u16, body: String },

    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("request to GitHub failed: {0}")]
    Request(#[from] reqwest::Error),
}
