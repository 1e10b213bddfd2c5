use reqwest::Url;

use crate::result::Result;
use crate::types::task::*;

/// Client for a running pagesmith server.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    client: reqwest::Client,
}

impl Client {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub async fn submit(&self, submission: &TaskSubmission) -> Result<TaskAccepted> {
        let url = self.base_url.join("ready")?;
        let response = self
            .client
            .post(url)
            .json(submission)
            .send()
            .await?
            .error_for_status()?
            .json::<TaskAccepted>()
            .await?;
        Ok(response)
    }

    pub async fn status(&self, task_id: &str) -> Result<TaskRecord> {
        let url = self
            .base_url
            .join(&format!("status/{}", urlencoding::encode(task_id)))?;
        let response = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<TaskRecord>()
            .await?;
        Ok(response)
    }
}
