//! Publishes a set of static files as a GitHub Pages site.
//!
//! # How it Works
//!
//! 1. A public repository is created for the authenticated user.
//! 2. After the repository settles, every file is committed to the root of the
//!    repository's default branch through the contents API. The first failing commit
//!    aborts the rest.
//! 3. Pages is enabled for that branch at `/`. A rejected enable is retried once as an
//!    update.
//! 4. After Pages settles, the repository and live URLs are returned. They are derived
//!    from the owner and repository names, not read back from GitHub. A skipped Pages
//!    setup still waits out the initial Pages delay.
//!
//! Nothing is rolled back on failure.
//!
//! # References
//!
//! - [Repositories](https://docs.github.com/en/rest/repos/repos)
//! - [Contents](https://docs.github.com/en/rest/repos/contents)
//! - [Pages](https://docs.github.com/en/rest/pages/pages)

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use url::Url;

mod error;
mod settle;

pub use error::PublishError;
pub use settle::SettlePolicy;

pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Branch used when GitHub does not report the new repository's default branch.
const FALLBACK_BRANCH: &str = "main";
/// GitHub rejects longer repository descriptions.
const DESCRIPTION_MAX_CHARS: usize = 350;
const ERROR_BODY_EXCERPT: usize = 200;

pub struct PublisherConfig {
    /// Base of the REST API, e.g. `https://api.github.com`.
    pub api_base_url: Url,
    pub token: String,
    /// Account that owns the created repositories.
    pub owner: String,
    /// Treat a failure to enable Pages as a failed publish.
    pub require_pages: bool,
    pub repo_settle: SettlePolicy,
    pub pages_settle: SettlePolicy,
}

impl PublisherConfig {
    pub fn new(api_base_url: Url, token: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            api_base_url,
            token: token.into(),
            owner: owner.into(),
            require_pages: false,
            repo_settle: SettlePolicy::REPOSITORY,
            pages_settle: SettlePolicy::PAGES,
        }
    }
}

/// Where a published site can be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub repo_url: String,
    pub live_url: String,
}

#[derive(Deserialize)]
struct CreatedRepo {
    default_branch: Option<String>,
}

#[derive(Deserialize)]
struct PagesBuild {
    status: String,
}

pub struct PagesPublisher {
    config: PublisherConfig,
    client: Client,
}

impl PagesPublisher {
    pub fn new(config: PublisherConfig) -> Result<Self, PublishError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("pagesmith"));
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { config, client })
    }

    pub fn owner(&self) -> &str {
        &self.config.owner
    }

    pub fn repo_url(&self, repo_name: &str) -> String {
        format!("https://github.com/{}/{repo_name}", self.config.owner)
    }

    pub fn live_url(&self, repo_name: &str) -> String {
        format!("https://{}.github.io/{repo_name}", self.config.owner)
    }

    /// Create `repo_name`, commit `files` to it and serve them with Pages.
    pub async fn publish(
        &self,
        brief: &str,
        files: &BTreeMap<String, String>,
        repo_name: &str,
    ) -> Result<Deployment, PublishError> {
        let branch = self.create_repo(brief, repo_name).await?;

        self.config
            .repo_settle
            .wait_until(&format!("repository {repo_name}"), || {
                self.repo_exists(repo_name)
            })
            .await;

        for (file, content) in files {
            self.commit_file(repo_name, &branch, file, content).await?;
        }

        match self.enable_pages(repo_name, &branch).await {
            Ok(()) => {
                self.config
                    .pages_settle
                    .wait_until(&format!("pages for {repo_name}"), || {
                        self.pages_built(repo_name)
                    })
                    .await;
            }
            Err(err) if !self.config.require_pages => {
                log::warn!("Continuing without pages for {repo_name}: {err}");
                // Nothing to probe, only the pause remains.
                let pause = SettlePolicy {
                    max_attempts: 0,
                    ..self.config.pages_settle
                };
                pause
                    .wait_until(&format!("pages for {repo_name}"), || async { false })
                    .await;
            }
            Err(err) => return Err(err),
        }

        Ok(Deployment {
            repo_url: self.repo_url(repo_name),
            live_url: self.live_url(repo_name),
        })
    }

    /// Create the repository and return its default branch.
    async fn create_repo(&self, brief: &str, repo_name: &str) -> Result<String, PublishError> {
        let description: String = brief.chars().take(DESCRIPTION_MAX_CHARS).collect();
        let resp = self
            .client
            .post(self.endpoint(&["user", "repos"])?)
            .bearer_auth(&self.config.token)
            .json(&json!({
                "name": repo_name,
                "description": description,
                "private": false,
                "auto_init": false,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let (status, body) = excerpt(resp).await;
            return Err(PublishError::RepoCreate { status, body });
        }
        let branch = match resp.json::<CreatedRepo>().await {
            Ok(CreatedRepo {
                default_branch: Some(branch),
            }) if !branch.is_empty() => branch,
            _ => FALLBACK_BRANCH.to_owned(),
        };
        log::info!(
            "Created repository {}/{repo_name} on branch {branch}",
            self.config.owner
        );
        Ok(branch)
    }

    async fn repo_exists(&self, repo_name: &str) -> bool {
        let Ok(url) = self.endpoint(&["repos", &self.config.owner, repo_name]) else {
            return false;
        };
        match self
            .client
            .get(url)
            .bearer_auth(&self.config.token)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                log::debug!("Probing repository {repo_name} failed: {err}");
                false
            }
        }
    }

    async fn commit_file(
        &self,
        repo_name: &str,
        branch: &str,
        file: &str,
        content: &str,
    ) -> Result<(), PublishError> {
        let url = self.endpoint(&["repos", &self.config.owner, repo_name, "contents", file])?;
        let resp = self
            .client
            .put(url)
            .bearer_auth(&self.config.token)
            .json(&json!({
                "message": format!("Add {file}"),
                "content": STANDARD.encode(content.as_bytes()),
                "branch": branch,
            }))
            .send()
            .await?;

        if let Some((status, body)) = failure(resp).await {
            return Err(PublishError::FileCommit {
                file: file.to_owned(),
                status,
                body,
            });
        }
        log::debug!("Committed {file} to {repo_name}");
        Ok(())
    }

    async fn enable_pages(&self, repo_name: &str, branch: &str) -> Result<(), PublishError> {
        let url = self.endpoint(&["repos", &self.config.owner, repo_name, "pages"])?;
        let source = json!({ "source": { "branch": branch, "path": "/" } });

        let resp = self
            .client
            .post(url.clone())
            .bearer_auth(&self.config.token)
            .json(&source)
            .send()
            .await?;
        let Some((status, body)) = failure(resp).await else {
            log::info!("Enabled pages for {repo_name}");
            return Ok(());
        };

        // Most likely already configured; update the source instead.
        log::debug!("Enabling pages for {repo_name} was rejected ({status}): {body}");
        let resp = self
            .client
            .put(url)
            .bearer_auth(&self.config.token)
            .json(&source)
            .send()
            .await?;
        match failure(resp).await {
            None => {
                log::info!("Updated pages source for {repo_name}");
                Ok(())
            }
            Some((status, body)) => Err(PublishError::PagesEnable { status, body }),
        }
    }

    async fn pages_built(&self, repo_name: &str) -> bool {
        let Ok(url) = self.endpoint(&[
            "repos",
            &self.config.owner,
            repo_name,
            "pages",
            "builds",
            "latest",
        ]) else {
            return false;
        };
        let resp = match self
            .client
            .get(url)
            .bearer_auth(&self.config.token)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(_) => return false,
            Err(err) => {
                log::debug!("Probing pages build for {repo_name} failed: {err}");
                return false;
            }
        };
        matches!(resp.json::<PagesBuild>().await, Ok(build) if build.status == "built")
    }

    /// Append path segments to the API base, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, PublishError> {
        let mut url = self.config.api_base_url.clone();
        url.path_segments_mut()
            .map_err(|()| PublishError::InvalidUrl(self.config.api_base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Status and a body excerpt of an unsuccessful response, `None` on success.
async fn failure(resp: Response) -> Option<(u16, String)> {
    if resp.status().is_success() {
        return None;
    }
    Some(excerpt(resp).await)
}

async fn excerpt(resp: Response) -> (u16, String) {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    (status, body.chars().take(ERROR_BODY_EXCERPT).collect())
}

#[cfg(test)]
mod tests;
