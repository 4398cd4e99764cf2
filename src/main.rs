mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod storage;

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::DeviceStore;
use crate::routes::{create_router, AppState};
use crate::services::{FirestoreService, LoggingScheduler, ReminderScheduler, TokenVerifier};
use crate::storage::{CloudinaryStorage, LocalStorage, StorageBackend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "farmabeth365=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");

    if config.testing_mode {
        tracing::warn!("TESTING MODE - Admin authentication is relaxed");
    }

    // Create database connection for the per-customer device store
    let db = db::create_database(&config.database_url, config.database_token.as_deref())
        .await
        .expect("Failed to create database");

    let conn = db.connect().expect("Failed to connect to database");
    DeviceStore::init(&conn)
        .await
        .expect("Failed to initialize device store");

    tracing::info!("Connected to database");

    // Initialize services
    let firestore = FirestoreService::new(&config.firebase_project_id, &config.firebase_api_key);
    let verifier = TokenVerifier::new(&config.firebase_jwks_url, &config.firebase_project_id);

    // Initialize JWKS cache (fetch keys on startup)
    if let Err(e) = verifier.initialize().await {
        tracing::warn!(
            "Failed to initialize JWKS cache: {} - will retry on first request",
            e
        );
    } else {
        tracing::info!("JWKS cache initialized");
    }

    // Initialize storage
    let storage: Arc<dyn StorageBackend> = if config.storage_type == "cloudinary" {
        tracing::info!("Using Cloudinary storage");
        Arc::new(CloudinaryStorage::new(
            &config.cloudinary_cloud_name,
            &config.cloudinary_upload_preset,
        ))
    } else {
        tracing::info!("Using local storage");
        let local = LocalStorage::new(&config.upload_dir, &config.base_url);
        local
            .ensure_dir()
            .await
            .expect("Failed to create upload directory");
        Arc::new(local)
    };

    let scheduler: Arc<dyn ReminderScheduler> = Arc::new(LoggingScheduler);

    // Create app state
    let state = AppState {
        db: Arc::new(db),
        config: config.clone(),
        firestore,
        verifier,
        storage,
        scheduler,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
