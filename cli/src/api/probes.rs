use axum::routing::get;
use axum::Router;

/// `GET /ready` lives next to the submission route in `tasks`.
pub fn router() -> Router {
    Router::new().route("/healthz", get(healthz))
}

pub async fn readiness() -> &'static str {
    "Ready"
}

async fn healthz() -> &'static str {
    "Healthy"
}
