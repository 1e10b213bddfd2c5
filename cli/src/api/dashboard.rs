use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Extension;
use axum::Router;

use crate::context::Context;

pub fn router() -> Router {
    Router::new().route("/", get(dashboard))
}

/// Serve the dashboard page, if one is installed.
async fn dashboard(Extension(ctx): Extension<Arc<Context>>) -> Response {
    match tokio::fs::read_to_string(&ctx.dashboard_path).await {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            log::debug!(
                "No dashboard at {}: {err}",
                ctx.dashboard_path.display()
            );
            (StatusCode::NOT_FOUND, "Dashboard not found").into_response()
        }
    }
}
