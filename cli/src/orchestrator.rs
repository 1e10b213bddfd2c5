use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use pages_publisher::{Deployment, PagesPublisher, PublishError};
use site_gen::{FileSet, GenerationError, Generator};
use task_api::types::task::{Attachment, CallbackPayload, TaskRecord, TaskStatus};

use crate::notifier::Notifier;
use crate::store::TaskStore;

#[async_trait]
pub trait SiteGenerator: Send + Sync {
    async fn generate(
        &self,
        brief: &str,
        checks: &[String],
        attachments: &[Attachment],
    ) -> Result<FileSet, GenerationError>;
}

#[async_trait]
impl SiteGenerator for Generator {
    async fn generate(
        &self,
        brief: &str,
        checks: &[String],
        attachments: &[Attachment],
    ) -> Result<FileSet, GenerationError> {
        Generator::generate(self, brief, checks, attachments).await
    }
}

#[async_trait]
pub trait SitePublisher: Send + Sync {
    async fn publish(
        &self,
        brief: &str,
        files: &FileSet,
        repo_name: &str,
    ) -> Result<Deployment, PublishError>;
}

#[async_trait]
impl SitePublisher for PagesPublisher {
    async fn publish(
        &self,
        brief: &str,
        files: &FileSet,
        repo_name: &str,
    ) -> Result<Deployment, PublishError> {
        PagesPublisher::publish(self, brief, files, repo_name).await
    }
}

/// Runs the generate, publish and notify stages of a task in order,
/// recording every status change in the store.
pub struct Orchestrator {
    store: TaskStore,
    generator: Arc<dyn SiteGenerator>,
    publisher: Arc<dyn SitePublisher>,
    notifier: Arc<dyn Notifier>,
}

impl Orchestrator {
    pub fn new(
        store: TaskStore,
        generator: Arc<dyn SiteGenerator>,
        publisher: Arc<dyn SitePublisher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            generator,
            publisher,
            notifier,
        }
    }

    /// Start the run for `task_id` in the background. Nobody has to await it.
    pub fn spawn(self: &Arc<Self>, task_id: String) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { orchestrator.run(&task_id).await })
    }

    pub async fn run(&self, task_id: &str) {
        let record = match self.store.get(task_id).await {
            Ok(record) => record,
            Err(err) => {
                log::error!("Cannot run task: {err}");
                return;
            }
        };

        let deployment = match self.stages(&record).await {
            Ok(deployment) => deployment,
            Err(err) => {
                log::error!("Task {task_id} failed: {err:#}");
                let message = format!("{err:#}");
                if let Err(err) = self
                    .store
                    .update(task_id, |r| {
                        r.status = TaskStatus::Failed;
                        r.error = Some(message);
                    })
                    .await
                {
                    log::error!("Could not record failure: {err}");
                }
                return;
            }
        };

        if let Err(err) = self
            .store
            .update(task_id, |r| {
                r.status = TaskStatus::Completed;
                r.live_url = Some(deployment.live_url.clone());
                r.repo_url = Some(deployment.repo_url.clone());
            })
            .await
        {
            log::error!("Could not record completion: {err}");
            return;
        }
        log::info!("Task {task_id} completed: {}", deployment.live_url);

        if let Some(url) = &record.evaluation_url {
            let payload = CallbackPayload {
                nonce: record.nonce.clone(),
                repo_url: deployment.repo_url,
                live_url: deployment.live_url,
                task_id: task_id.to_owned(),
            };
            self.notifier.notify(url, &payload).await;
        }
    }

    async fn stages(&self, record: &TaskRecord) -> anyhow::Result<Deployment> {
        let id = &record.id;

        self.store.transition(id, TaskStatus::Generating).await?;
        log::info!("Task {id}: generating");
        let files = self
            .generator
            .generate(&record.brief, &record.checks, &record.attachments)
            .await?;
        log::debug!("Task {id}: generated {} file(s)", files.len());

        self.store.transition(id, TaskStatus::Deploying).await?;
        log::info!("Task {id}: deploying to {}", record.repo_name);
        let deployment = self
            .publisher
            .publish(&record.brief, &files, &record.repo_name)
            .await?;

        Ok(deployment)
    }
}
