//! Publishing against a stubbed GitHub REST API.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Json, Path};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Extension, Router};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use url::Url;

use super::*;

/// Records every call and answers with the configured statuses.
struct FakeGitHub {
    create_status: StatusCode,
    default_branch: Option<&'static str>,
    fail_file: Option<String>,
    pages_post_status: StatusCode,
    pages_put_status: StatusCode,
    calls: Mutex<Vec<String>>,
    commits: Mutex<Vec<(String, Value)>>,
    repo_bodies: Mutex<Vec<Value>>,
    pages_bodies: Mutex<Vec<Value>>,
    auth_headers: Mutex<Vec<String>>,
}

impl Default for FakeGitHub {
    fn default() -> Self {
        Self {
            create_status: StatusCode::CREATED,
            default_branch: Some("main"),
            fail_file: None,
            pages_post_status: StatusCode::CREATED,
            pages_put_status: StatusCode::NO_CONTENT,
            calls: Mutex::default(),
            commits: Mutex::default(),
            repo_bodies: Mutex::default(),
            pages_bodies: Mutex::default(),
            auth_headers: Mutex::default(),
        }
    }
}

impl FakeGitHub {
    async fn record(&self, call: String, headers: &HeaderMap) {
        self.calls.lock().await.push(call);
        if let Some(auth) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            self.auth_headers.lock().await.push(auth.to_owned());
        }
    }

    async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

async fn create_repo(
    Extension(gh): Extension<Arc<FakeGitHub>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    gh.record("POST /user/repos".to_owned(), &headers).await;
    gh.repo_bodies.lock().await.push(body.clone());
    if gh.create_status.is_success() {
        (
            gh.create_status,
            Json(json!({ "name": body["name"], "default_branch": gh.default_branch })),
        )
    } else {
        (
            gh.create_status,
            Json(json!({ "message": "Repository creation failed.", "errors": [{"message": "name already exists on this account"}] })),
        )
    }
}

async fn get_repo(
    Extension(gh): Extension<Arc<FakeGitHub>>,
    headers: HeaderMap,
    Path((owner, repo)): Path<(String, String)>,
) -> StatusCode {
    gh.record(format!("GET /repos/{owner}/{repo}"), &headers)
        .await;
    StatusCode::OK
}

async fn put_contents(
    Extension(gh): Extension<Arc<FakeGitHub>>,
    headers: HeaderMap,
    Path((_owner, _repo, file)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> StatusCode {
    gh.record(format!("PUT contents/{file}"), &headers).await;
    if gh.fail_file.as_deref() == Some(file.as_str()) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    gh.commits.lock().await.push((file, body));
    StatusCode::CREATED
}

async fn post_pages(
    Extension(gh): Extension<Arc<FakeGitHub>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    gh.record("POST pages".to_owned(), &headers).await;
    gh.pages_bodies.lock().await.push(body);
    gh.pages_post_status
}

async fn put_pages(
    Extension(gh): Extension<Arc<FakeGitHub>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    gh.record("PUT pages".to_owned(), &headers).await;
    gh.pages_bodies.lock().await.push(body);
    gh.pages_put_status
}

async fn latest_build(
    Extension(gh): Extension<Arc<FakeGitHub>>,
    headers: HeaderMap,
) -> Json<Value> {
    gh.record("GET pages/builds/latest".to_owned(), &headers)
        .await;
    Json(json!({ "status": "built" }))
}

async fn serve(gh: Arc<FakeGitHub>) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/user/repos", post(create_repo))
        .route("/repos/{owner}/{repo}", get(get_repo))
        .route("/repos/{owner}/{repo}/contents/{file}", put(put_contents))
        .route("/repos/{owner}/{repo}/pages", post(post_pages).put(put_pages))
        .route("/repos/{owner}/{repo}/pages/builds/latest", get(latest_build))
        .layer(Extension(gh));
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    Url::parse(&format!("http://{addr}")).unwrap()
}

fn publisher(api_base_url: Url) -> PagesPublisher {
    let mut config = PublisherConfig::new(api_base_url, "gh-token", "octocat");
    config.repo_settle = SettlePolicy::immediate();
    config.pages_settle = SettlePolicy::immediate();
    PagesPublisher::new(config).unwrap()
}

fn files(names: &[&str]) -> BTreeMap<String, String> {
    names
        .iter()
        .map(|name| (name.to_string(), format!("<!-- {name} -->")))
        .collect()
}

#[tokio::test]
async fn publishes_and_derives_urls() {
    let gh = Arc::new(FakeGitHub::default());
    let publisher = publisher(serve(gh.clone()).await);

    let deployment = publisher
        .publish("a todo list app", &files(&["README.md", "index.html"]), "todo-r1")
        .await
        .unwrap();

    assert_eq!(deployment.repo_url, "https://github.com/octocat/todo-r1");
    assert_eq!(deployment.live_url, "https://octocat.github.io/todo-r1");
    assert_eq!(
        gh.calls().await,
        vec![
            "POST /user/repos",
            "GET /repos/octocat/todo-r1",
            "PUT contents/README.md",
            "PUT contents/index.html",
            "POST pages",
            "GET pages/builds/latest",
        ]
    );
    assert!(gh
        .auth_headers
        .lock()
        .await
        .iter()
        .all(|auth| auth == "Bearer gh-token"));
}

#[tokio::test]
async fn commits_are_base64_encoded() {
    let gh = Arc::new(FakeGitHub::default());
    let publisher = publisher(serve(gh.clone()).await);

    publisher
        .publish("app", &files(&["index.html"]), "app-r1")
        .await
        .unwrap();

    let commits = gh.commits.lock().await;
    let (file, body) = &commits[0];
    assert_eq!(file, "index.html");
    assert_eq!(body["message"], "Add index.html");
    let decoded = STANDARD.decode(body["content"].as_str().unwrap()).unwrap();
    assert_eq!(String::from_utf8(decoded).unwrap(), "<!-- index.html -->");
}

#[tokio::test]
async fn long_brief_is_truncated_in_description() {
    let gh = Arc::new(FakeGitHub::default());
    let publisher = publisher(serve(gh.clone()).await);
    let brief = "é".repeat(1000);

    publisher
        .publish(&brief, &files(&["index.html"]), "long-r1")
        .await
        .unwrap();

    let bodies = gh.repo_bodies.lock().await;
    let description = bodies[0]["description"].as_str().unwrap();
    assert_eq!(description.chars().count(), DESCRIPTION_MAX_CHARS);
    assert_eq!(bodies[0]["name"], "long-r1");
}

#[tokio::test]
async fn failed_commit_stops_remaining_files() {
    let gh = Arc::new(FakeGitHub {
        fail_file: Some("b.html".to_owned()),
        ..Default::default()
    });
    let publisher = publisher(serve(gh.clone()).await);

    let err = publisher
        .publish("app", &files(&["a.html", "b.html", "c.html"]), "abc-r1")
        .await
        .unwrap_err();

    assert!(
        matches!(err, PublishError::FileCommit { ref file, status: 500, .. } if file == "b.html"),
        "unexpected error: {err}"
    );
    let calls = gh.calls().await;
    let commits: Vec<_> = calls.iter().filter(|c| c.starts_with("PUT contents")).collect();
    assert_eq!(commits, vec!["PUT contents/a.html", "PUT contents/b.html"]);
    assert!(!calls.iter().any(|c| c.contains("pages")));
}

#[tokio::test]
async fn failed_create_reports_status_and_body() {
    let gh = Arc::new(FakeGitHub {
        create_status: StatusCode::UNPROCESSABLE_ENTITY,
        ..Default::default()
    });
    let publisher = publisher(serve(gh.clone()).await);

    let err = publisher
        .publish("app", &files(&["index.html"]), "taken-r1")
        .await
        .unwrap_err();

    match err {
        PublishError::RepoCreate { status, body } => {
            assert_eq!(status, 422);
            assert!(body.contains("Repository creation failed."));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(gh.calls().await, vec!["POST /user/repos"]);
}

#[tokio::test]
async fn rejected_pages_enable_falls_back_to_update() {
    let gh = Arc::new(FakeGitHub {
        pages_post_status: StatusCode::CONFLICT,
        ..Default::default()
    });
    let publisher = publisher(serve(gh.clone()).await);

    publisher
        .publish("app", &files(&["index.html"]), "pages-r1")
        .await
        .unwrap();

    let calls = gh.calls().await;
    assert_eq!(
        &calls[calls.len() - 3..],
        ["POST pages", "PUT pages", "GET pages/builds/latest"]
    );
}

#[tokio::test]
async fn pages_failure_is_not_fatal_by_default() {
    let gh = Arc::new(FakeGitHub {
        pages_post_status: StatusCode::CONFLICT,
        pages_put_status: StatusCode::FORBIDDEN,
        ..Default::default()
    });
    let publisher = publisher(serve(gh.clone()).await);

    let deployment = publisher
        .publish("app", &files(&["index.html"]), "nopages-r1")
        .await
        .unwrap();

    assert_eq!(deployment.live_url, "https://octocat.github.io/nopages-r1");
    assert!(!gh.calls().await.iter().any(|c| c.contains("builds")));
}

#[tokio::test]
async fn pages_failure_is_fatal_when_required() {
    let gh = Arc::new(FakeGitHub {
        pages_post_status: StatusCode::CONFLICT,
        pages_put_status: StatusCode::FORBIDDEN,
        ..Default::default()
    });
    let mut config = PublisherConfig::new(serve(gh).await, "gh-token", "octocat");
    config.repo_settle = SettlePolicy::immediate();
    config.pages_settle = SettlePolicy::immediate();
    config.require_pages = true;
    let publisher = PagesPublisher::new(config).unwrap();

    let err = publisher
        .publish("app", &files(&["index.html"]), "nopages-r1")
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::PagesEnable { status: 403, .. }));
}

#[tokio::test]
async fn commits_and_pages_follow_the_default_branch() {
    let gh = Arc::new(FakeGitHub {
        default_branch: Some("master"),
        pages_post_status: StatusCode::CONFLICT,
        ..Default::default()
    });
    let publisher = publisher(serve(gh.clone()).await);

    publisher
        .publish("app", &files(&["README.md", "index.html"]), "legacy-r1")
        .await
        .unwrap();

    let commits = gh.commits.lock().await;
    assert_eq!(commits.len(), 2);
    assert!(commits.iter().all(|(_, body)| body["branch"] == "master"));
    let pages = gh.pages_bodies.lock().await;
    assert_eq!(pages.len(), 2);
    for body in pages.iter() {
        assert_eq!(body["source"], json!({ "branch": "master", "path": "/" }));
    }
}

#[tokio::test]
async fn unreported_default_branch_falls_back_to_main() {
    let gh = Arc::new(FakeGitHub {
        default_branch: None,
        ..Default::default()
    });
    let publisher = publisher(serve(gh.clone()).await);

    publisher
        .publish("app", &files(&["index.html"]), "app-r1")
        .await
        .unwrap();

    assert_eq!(gh.commits.lock().await[0].1["branch"], "main");
    assert_eq!(gh.pages_bodies.lock().await[0]["source"]["branch"], "main");
}

#[tokio::test]
async fn skipped_pages_still_waits_out_the_pause() {
    let gh = Arc::new(FakeGitHub {
        pages_post_status: StatusCode::CONFLICT,
        pages_put_status: StatusCode::FORBIDDEN,
        ..Default::default()
    });
    let mut config = PublisherConfig::new(serve(gh.clone()).await, "gh-token", "octocat");
    config.repo_settle = SettlePolicy::immediate();
    config.pages_settle = SettlePolicy {
        initial_delay: Duration::from_millis(100),
        poll_interval: Duration::ZERO,
        max_attempts: 3,
    };
    let publisher = PagesPublisher::new(config).unwrap();

    let started = Instant::now();
    publisher
        .publish("app", &files(&["index.html"]), "nopages-r1")
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(100));
    assert!(!gh.calls().await.iter().any(|c| c.contains("builds")));
}

#[test]
fn endpoint_keeps_base_path_and_encodes_segments() {
    let publisher = publisher(Url::parse("https://ghe.example.com/api/v3/").unwrap());
    let url = publisher
        .endpoint(&["repos", "octocat", "app", "contents", "my page.html"])
        .unwrap();
    assert_eq!(
        url.as_str(),
        "https://ghe.example.com/api/v3/repos/octocat/app/contents/my%20page.html"
    );
}
