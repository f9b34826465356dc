//! Campus API Server
//!
//! Main entry point for the Campus backend service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_api::{AppState, create_router};
use campus_core::attachment::{AttachmentPolicy, MAX_FILE_SIZE_MB};
use campus_core::storage::{StorageConfig, StorageService};
use campus_db::connect_with;
use campus_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect to database
    let db = connect_with(&config.database).await?;
    info!("Connected to database");

    let jwt_service = JwtService::new(JwtConfig::from(&config.jwt));

    // Attachments are optional; without storage their routes answer 503
    let (storage, policy) = match &config.storage {
        Some(settings) => {
            let storage_config = StorageConfig::try_from(settings)?;
            let storage = StorageService::from_config(storage_config)?;
            info!(
                provider = storage.provider_name(),
                bucket = storage.bucket(),
                max_file_size_mb = settings.max_file_size_mb,
                "Storage configured"
            );
            (
                Some(Arc::new(storage)),
                AttachmentPolicy::new(settings.max_file_size_mb),
            )
        }
        None => {
            warn!("No storage configured, attachment uploads are disabled");
            (None, AttachmentPolicy::new(MAX_FILE_SIZE_MB))
        }
    };

    if config.auth.admin_emails.is_empty() {
        warn!("auth.admin_emails is empty, nobody can register as admin");
    }

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        storage,
        policy,
        auth: Arc::new(config.auth.clone()),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
