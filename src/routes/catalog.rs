use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::{AppError, AppResult};
use crate::models::{Category, Medication};
use crate::routes::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/medications", get(list_medications))
        .route("/medications/{id}", get(get_medication))
        .route("/categories", get(list_categories))
        .route("/categories/{id}/medications", get(list_by_category))
}

async fn list_medications(State(state): State<AppState>) -> AppResult<Json<Vec<Medication>>> {
    let medications = Medication::fetch_all(&state.firestore).await?;
    Ok(Json(medications))
}

async fn get_medication(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Medication>> {
    let medication = Medication::fetch_one(&state.firestore, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Medication not found".to_string()))?;

    Ok(Json(medication))
}

async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    let categories = Category::fetch_all(&state.firestore).await?;
    Ok(Json(categories))
}

async fn list_by_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Medication>>> {
    let medications = Medication::fetch_by_category(&state.firestore, &id).await?;
    Ok(Json(medications))
}
