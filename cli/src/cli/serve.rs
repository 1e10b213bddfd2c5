use std::path::Path;

use anyhow::Context as _;

use crate::config::Config;
use crate::context::Context;

pub async fn serve(config_path: Option<&Path>, bind: &str) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    let ctx = Context::from_config(&config)?;

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Could not bind to {bind}"))?;

    crate::api::run_server(listener, ctx).await
}
