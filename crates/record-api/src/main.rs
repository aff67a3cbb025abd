//! Record approval workflow REST API server.

use record_api::config::ApiConfig;
use record_api::server::{self, AppState};
use record_store::InMemoryRecordStore;
use record_types::RecordWorkflow;
use record_workflow::{LevelPolicy, WorkflowService};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type SharedWorkflow = Arc<dyn RecordWorkflow + Send + Sync>;

#[cfg(feature = "sqlite")]
fn sqlite_workflow(config: &ApiConfig) -> Result<Option<SharedWorkflow>, BoxError> {
    let Some(ref path) = config.sqlite_path else {
        return Ok(None);
    };
    let store = record_store::SqliteRecordStore::new(path)?;
    tracing::info!(path = %path.display(), "using SQLite record store");
    Ok(Some(Arc::new(WorkflowService::with_policies(
        store,
        LevelPolicy::standard(),
        config.approval.clone(),
    ))))
}

#[cfg(not(feature = "sqlite"))]
fn sqlite_workflow(config: &ApiConfig) -> Result<Option<SharedWorkflow>, BoxError> {
    if config.sqlite_path.is_some() {
        tracing::warn!("RECORDS_SQLITE_PATH is set but the sqlite feature is disabled; using in-memory store");
    }
    Ok(None)
}

fn build_workflow(config: &ApiConfig) -> Result<SharedWorkflow, BoxError> {
    if let Some(workflow) = sqlite_workflow(config)? {
        return Ok(workflow);
    }
    Ok(Arc::new(WorkflowService::with_policies(
        InMemoryRecordStore::new(),
        LevelPolicy::standard(),
        config.approval.clone(),
    )))
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;
    tracing::info!(
        required_levels = ?config.approval.required_levels(),
        "approval policy loaded"
    );
    let workflow = build_workflow(&config)?;
    let app = server::router(Arc::new(AppState { workflow }));

    tracing::info!("record API listening on {}", config.listen);
    axum::serve(
        tokio::net::TcpListener::bind(config.listen).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}
