//! Fixtures and stub collaborators shared by the unit tests.
#![cfg(test)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::Json;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Extension, Router};
use serde_json::{json, Value};
use tokio::sync::{Mutex, Semaphore};
use url::Url;

use pages_publisher::{Deployment, PublishError};
use site_gen::{parse_file_set, FileSet, GenerationError};
use task_api::types::task::{Attachment, CallbackPayload, TaskRecord, TaskStatus, TaskSubmission};

use crate::notifier::Notifier;
use crate::orchestrator::{SiteGenerator, SitePublisher};
use crate::store::TaskStore;

pub const TODO_APP: &str = r#"{"index.html": "<html><body>todo</body></html>", "README.md": "todo app"}"#;

pub fn submission(task: &str, secret: &str) -> TaskSubmission {
    TaskSubmission {
        task: task.to_owned(),
        email: "someone@example.com".to_owned(),
        secret: secret.to_owned(),
        round: 1,
        nonce: "nonce".to_owned(),
        brief: "a todo list app".to_owned(),
        checks: vec![],
        evaluation_url: String::new(),
        attachments: vec![],
    }
}

pub fn record(id: &str) -> TaskRecord {
    TaskRecord::accepted(submission(id, ""), format!("{id}-r1"))
}

/// Poll the store until `id` reaches `status`. Panics after a few seconds.
pub async fn wait_for_status(store: &TaskStore, id: &str, status: TaskStatus) -> TaskRecord {
    for _ in 0..500 {
        if let Ok(record) = store.get(id).await {
            if record.status == status {
                return record;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {id} never reached {status}");
}

/// Answers every request with the same raw model output.
pub struct ScriptedGenerator {
    pub answer: String,
    pub gate: Option<Arc<Semaphore>>,
}

impl ScriptedGenerator {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_owned(),
            gate: None,
        }
    }

    /// Hold every call until the gate hands out a permit.
    pub fn gated(answer: &str, gate: Arc<Semaphore>) -> Self {
        Self {
            answer: answer.to_owned(),
            gate: Some(gate),
        }
    }
}

#[async_trait]
impl SiteGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        _brief: &str,
        _checks: &[String],
        _attachments: &[Attachment],
    ) -> Result<FileSet, GenerationError> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        parse_file_set(&self.answer)
    }
}

/// Publishes nothing; returns the conventional URLs for `owner`.
pub struct StubPublisher {
    pub owner: String,
    pub fail_with_status: Option<u16>,
    pub gate: Option<Arc<Semaphore>>,
    pub calls: AtomicUsize,
}

impl StubPublisher {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_owned(),
            fail_with_status: None,
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SitePublisher for StubPublisher {
    async fn publish(
        &self,
        _brief: &str,
        files: &FileSet,
        repo_name: &str,
    ) -> Result<Deployment, PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if let Some(status) = self.fail_with_status {
            let file = files.keys().next().cloned().unwrap_or_default();
            return Err(PublishError::FileCommit {
                file,
                status,
                body: "stubbed failure".to_owned(),
            });
        }
        Ok(Deployment {
            repo_url: format!("https://github.com/{}/{repo_name}", self.owner),
            live_url: format!("https://{}.github.io/{repo_name}", self.owner),
        })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, CallbackPayload)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, url: &str, payload: &CallbackPayload) {
        self.sent.lock().await.push((url.to_owned(), payload.clone()));
    }
}

/// Bind a throwaway server on a free local port.
pub async fn serve(app: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    Url::parse(&format!("http://{addr}/")).unwrap()
}

/// Collects callback payloads.
pub struct CallbackSink {
    pub url: String,
    received: Arc<Mutex<Vec<CallbackPayload>>>,
}

impl CallbackSink {
    pub async fn spawn(status: StatusCode) -> Self {
        let received: Arc<Mutex<Vec<CallbackPayload>>> = Arc::default();
        let app = Router::new().route(
            "/callback",
            post({
                let received = received.clone();
                move |Json(payload): Json<CallbackPayload>| {
                    let received = received.clone();
                    async move {
                        received.lock().await.push(payload);
                        status
                    }
                }
            }),
        );
        let base = serve(app).await;
        Self {
            url: base.join("callback").unwrap().to_string(),
            received,
        }
    }

    pub async fn received(&self) -> Vec<CallbackPayload> {
        self.received.lock().await.clone()
    }
}

/// A GitHub REST API that accepts everything and counts file commits.
pub async fn accepting_github() -> (Url, Arc<AtomicUsize>) {
    let commits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/user/repos",
            post(|Json(body): Json<Value>| async move {
                (StatusCode::CREATED, Json(json!({ "name": body["name"] })))
            }),
        )
        .route("/repos/{owner}/{repo}", get(|| async { StatusCode::OK }))
        .route(
            "/repos/{owner}/{repo}/contents/{file}",
            put(
                |Extension(commits): Extension<Arc<AtomicUsize>>| async move {
                    commits.fetch_add(1, Ordering::SeqCst);
                    StatusCode::CREATED
                },
            ),
        )
        .route(
            "/repos/{owner}/{repo}/pages",
            post(|| async { StatusCode::CREATED }),
        )
        .route(
            "/repos/{owner}/{repo}/pages/builds/latest",
            get(|| async { Json(json!({ "status": "built" })) }),
        )
        .layer(Extension(commits.clone()));
    (serve(app).await, commits)
}
