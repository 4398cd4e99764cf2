pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod reminders;
pub mod support;

use axum::{middleware, Router};
use libsql::Database;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::middleware::auth::auth_middleware;
use crate::services::{FirestoreService, ReminderScheduler, TokenVerifier};
use crate::storage::StorageBackend;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub firestore: FirestoreService,
    pub verifier: TokenVerifier,
    pub storage: Arc<dyn StorageBackend>,
    pub scheduler: Arc<dyn ReminderScheduler>,
}

pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .merge(catalog::routes())
        .merge(support::routes());

    let protected_routes = Router::new()
        .merge(cart::routes())
        .merge(checkout::routes())
        .merge(orders::routes())
        .merge(reminders::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = admin::routes(state.clone());

    if state.config.testing_mode {
        tracing::warn!("⚠️  TESTING MODE ENABLED - Admin auth is disabled!");
    }

    Router::new()
        .nest("/api", public_routes)
        .nest("/api", protected_routes)
        .nest("/api/admin", admin_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
