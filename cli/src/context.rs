use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::notifier::HttpNotifier;
use crate::orchestrator::Orchestrator;
use crate::store::TaskStore;

pub struct Context {
    /// Secret every submission has to present.
    pub shared_secret: String,
    /// All known tasks.
    pub store: TaskStore,
    /// Runs submitted tasks.
    /// `None` when generation or GitHub credentials are missing; submissions
    /// are then refused, but status lookups keep working.
    pub orchestrator: Option<Arc<Orchestrator>>,
    /// HTML served at `/`.
    pub dashboard_path: PathBuf,
}

impl Context {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let shared_secret = config.shared_secret()?;
        let store = TaskStore::new();

        let orchestrator = match (config.generator()?, config.publisher()?) {
            (Some(generator), Some(publisher)) => {
                log::info!(
                    "Generating with {} and publishing as {}",
                    generator.model(),
                    publisher.owner()
                );
                Some(Arc::new(Orchestrator::new(
                    store.clone(),
                    Arc::new(generator),
                    Arc::new(publisher),
                    Arc::new(HttpNotifier::new()?),
                )))
            }
            (generator, publisher) => {
                if generator.is_none() {
                    log::warn!("GEMINI_API_KEY is not set; submissions will be refused");
                }
                if publisher.is_none() {
                    log::warn!(
                        "GITHUB_TOKEN or GITHUB_USERNAME is not set; submissions will be refused"
                    );
                }
                None
            }
        };

        Ok(Self {
            shared_secret,
            store,
            orchestrator,
            dashboard_path: config.dashboard_path(),
        })
    }
}
