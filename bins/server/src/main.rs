//! StaffDesk API Server
//!
//! Main entry point for the StaffDesk backend service.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use staffdesk_api::ocr::OcrClient;
use staffdesk_api::{AppState, create_router};
use staffdesk_db::{SessionRepository, connect_with_pool};
use staffdesk_shared::{AppConfig, JwtService};

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staffdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let db = connect_with_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let jwt_service = JwtService::new(&config.jwt);

    let ocr = OcrClient::new(&config.ocr)?;
    info!(base_url = %config.ocr.base_url, "OCR client configured");

    // Expired refresh-token sessions
    let sessions = SessionRepository::new(db.clone());
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match sessions.cleanup_expired().await {
                Ok(removed) if removed > 0 => info!(removed, "expired sessions removed"),
                Ok(_) => {}
                Err(e) => error!(error = %e, "session cleanup failed"),
            }
        }
    });

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        ocr: Arc::new(ocr),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
