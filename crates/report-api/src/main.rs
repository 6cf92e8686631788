//! Report API server.

use report_api::config::ApiConfig;
use report_api::server::{self, AppState};
use report_store::InMemoryReportStore;
use report_types::ReportStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env();
    let store: Arc<dyn ReportStore + Send + Sync> = Arc::new(InMemoryReportStore::new());
    let state = Arc::new(AppState::from_config(store, &config));
    state.attachments.ensure_dir().await?;
    tracing::info!(
        upload_dir = %config.upload_dir.display(),
        users = config.users.len(),
        "report store ready"
    );

    let app = server::router(state);
    let addr: SocketAddr = config.listen.parse()?;
    tracing::info!("Report API listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}
