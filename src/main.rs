use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use disaster_atlas::api;
use disaster_atlas::config::Config;
use disaster_atlas::data::store::DatasetStore;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    // Both datasets are loaded before the listener binds; failures only mark
    // the affected dataset unavailable.
    let store = Arc::new(DatasetStore::load(&config.data_path, &config.geojson_path));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    log::info!("Serving on http://{}", config.bind);

    axum::serve(listener, api::server::router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    log::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
}
