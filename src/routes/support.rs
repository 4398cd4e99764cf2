use axum::{extract::State, routing::get, Json, Router};

use crate::error::{AppError, AppResult};
use crate::models::SupportConfig;
use crate::routes::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/support/whatsapp", get(get_whatsapp))
}

async fn get_whatsapp(State(state): State<AppState>) -> AppResult<Json<SupportConfig>> {
    let config = SupportConfig::fetch(&state.firestore)
        .await?
        .ok_or_else(|| AppError::NotFound("Support number not configured".to_string()))?;

    Ok(Json(config))
}
