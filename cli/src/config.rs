use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _};
use serde::{Deserialize, Serialize};
use url::Url;

use pages_publisher::{PagesPublisher, PublisherConfig, GITHUB_API_URL};
use site_gen::{Generator, GeneratorConfig};

const DEFAULT_DASHBOARD_PATH: &str = "static/index.html";

/// Server configuration.
///
/// Read from `config.toml` in the user's config directory (or `--config`),
/// then overridden by environment variables.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub generation_endpoint: Option<Url>,
    pub github_token: Option<String>,
    pub github_username: Option<String>,
    pub github_api_url: Option<Url>,
    /// Shared secret every submission must carry.
    pub student_secret: Option<String>,
    pub require_pages: Option<bool>,
    pub dashboard_path: Option<PathBuf>,
}

impl Config {
    /// Load the config file at `path`, or the default location, and apply
    /// environment overrides. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::filepath()?,
        };
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            log::debug!("No config file at {}", path.display());
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn filepath() -> anyhow::Result<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or(anyhow!("Failed to locate appropriate config directory"))?
            .join("pagesmith")
            .join("config.toml"))
    }

    /// Override fields with any variables `lookup` knows about.
    /// Blank values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let url = |key: &str| -> anyhow::Result<Option<Url>> {
            var(key)
                .map(|value| Url::parse(&value).with_context(|| format!("{key} is not a URL")))
                .transpose()
        };

        if let Some(value) = var("GEMINI_API_KEY") {
            self.gemini_api_key = Some(value);
        }
        if let Some(value) = var("GEMINI_MODEL") {
            self.gemini_model = Some(value);
        }
        if let Some(value) = url("GENERATION_ENDPOINT")? {
            self.generation_endpoint = Some(value);
        }
        if let Some(value) = var("GITHUB_TOKEN") {
            self.github_token = Some(value);
        }
        if let Some(value) = var("GITHUB_USERNAME") {
            self.github_username = Some(value);
        }
        if let Some(value) = url("GITHUB_API_URL")? {
            self.github_api_url = Some(value);
        }
        if let Some(value) = var("STUDENT_SECRET") {
            self.student_secret = Some(value);
        }
        if let Some(value) = var("REQUIRE_PAGES") {
            let flag = value
                .parse::<bool>()
                .with_context(|| format!("REQUIRE_PAGES must be true or false, got {value:?}"))?;
            self.require_pages = Some(flag);
        }
        if let Some(value) = var("DASHBOARD_PATH") {
            self.dashboard_path = Some(PathBuf::from(value));
        }
        Ok(())
    }

    /// The submission secret. Errors when unset or blank.
    pub fn shared_secret(&self) -> anyhow::Result<String> {
        self.student_secret
            .clone()
            .filter(|secret| !secret.trim().is_empty())
            .ok_or(anyhow!(
                "STUDENT_SECRET is not set; refusing to accept submissions with a default secret"
            ))
    }

    pub fn dashboard_path(&self) -> PathBuf {
        self.dashboard_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DASHBOARD_PATH))
    }

    /// The generator, if a generation API key is configured.
    pub fn generator(&self) -> anyhow::Result<Option<Generator>> {
        let Some(api_key) = &self.gemini_api_key else {
            return Ok(None);
        };
        let mut config = GeneratorConfig::gemini(api_key.clone());
        if let Some(model) = &self.gemini_model {
            config.model = model.clone();
        }
        if let Some(endpoint) = &self.generation_endpoint {
            config.endpoint = endpoint.clone();
        }
        Ok(Some(Generator::new(config)?))
    }

    /// The publisher, if GitHub credentials are configured.
    pub fn publisher(&self) -> anyhow::Result<Option<PagesPublisher>> {
        let (Some(token), Some(owner)) = (&self.github_token, &self.github_username) else {
            return Ok(None);
        };
        let api_base_url = match &self.github_api_url {
            Some(url) => url.clone(),
            None => Url::parse(GITHUB_API_URL)?,
        };
        let mut config = PublisherConfig::new(api_base_url, token.clone(), owner.clone());
        config.require_pages = self.require_pages.unwrap_or(false);
        Ok(Some(PagesPublisher::new(config)?))
    }
}
