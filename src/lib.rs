pub mod api;
pub mod config;
pub mod models;
pub mod triage;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::TriageConfig;
use crate::triage::{ResourceStore, TriagePipeline};

/// Install the global tracing subscriber. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}

/// Start the HTTP service and block until Ctrl-C.
pub async fn run() -> Result<(), String> {
    init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let resources = Arc::new(ResourceStore::new());
    let pipeline = Arc::new(TriagePipeline::with_baseline(
        resources.clone(),
        TriageConfig::default(),
    ));
    tracing::info!(classifier = pipeline.classifier_name(), "Triage pipeline ready");

    let mut server = api::server::start_api_server(pipeline, resources, config::bind_addr()).await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for shutdown signal: {e}"))?;
    server.shutdown();
    server.stopped().await;
    Ok(())
}
