use std::time::Duration;

use async_trait::async_trait;

use task_api::types::task::CallbackPayload;

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Delivers the result of a completed task to the submitter.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Best effort: failures are logged, never returned.
    async fn notify(&self, url: &str, payload: &CallbackPayload);
}

/// POSTs the payload as JSON. One attempt, no retries.
pub struct HttpNotifier {
    client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(CALLBACK_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, url: &str, payload: &CallbackPayload) {
        match self.client.post(url).json(payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                log::info!("Notified {url} about task {}", payload.task_id);
            }
            Ok(resp) => {
                log::warn!(
                    "Callback to {url} for task {} returned {}",
                    payload.task_id,
                    resp.status()
                );
            }
            Err(err) => {
                log::warn!("Callback to {url} for task {} failed: {err}", payload.task_id);
            }
        }
    }
}
