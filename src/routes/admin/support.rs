use axum::{
    extract::State,
    routing::{delete, put},
    Json, Router,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::SupportConfig;
use crate::routes::AppState;

#[derive(Deserialize)]
pub struct WhatsappRequest {
    pub numero: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/support/whatsapp", put(set_whatsapp))
        .route("/support/whatsapp", delete(delete_whatsapp))
}

async fn set_whatsapp(
    State(state): State<AppState>,
    Json(payload): Json<WhatsappRequest>,
) -> AppResult<Json<SupportConfig>> {
    let numero = payload.numero.trim();
    if numero.is_empty() {
        return Err(AppError::BadRequest("numero is required".to_string()));
    }

    let config = SupportConfig::set(&state.firestore, numero).await?;
    Ok(Json(config))
}

async fn delete_whatsapp(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    SupportConfig::delete(&state.firestore).await?;
    Ok(Json(serde_json::json!({"deleted": true})))
}
