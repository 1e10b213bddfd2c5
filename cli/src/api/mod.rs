use std::sync::Arc;

use axum::Extension;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;

use crate::context::Context;

mod dashboard;
mod error;
mod probes;
mod tasks;

pub use error::ApiError;

pub fn router(ctx: Arc<Context>) -> Router {
    Router::new()
        .merge(tasks::router())
        .merge(dashboard::router())
        .merge(probes::router())
        .layer(Extension(ctx))
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(TraceLayer::new_for_http())
}

/// Serve the API until ctrl-c. Background task runs are abandoned on exit.
pub async fn run_server(listener: TcpListener, ctx: Context) -> anyhow::Result<()> {
    let app = router(Arc::new(ctx));

    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {err}");
                std::future::pending::<()>().await;
            }
            log::info!("Shutting down");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
pub async fn wait_until_ready(base_url: &url::Url) -> Result<(), reqwest::Error> {
    loop {
        match reqwest::get(base_url.join("ready").expect("valid base URL")).await {
            Ok(res) if res.status().is_success() => return Ok(()),
            _ => tokio::time::sleep(std::time::Duration::from_millis(20)).await,
        }
    }
}
