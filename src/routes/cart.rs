use axum::{
    extract::{Extension, Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Cart, CartLine, Medication};
use crate::routes::AppState;
use crate::services::pricing::{self, PricedCart};

#[derive(Deserialize)]
pub struct SaveCartRequest {
    pub lines: Vec<CartLine>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart).put(save_cart).delete(clear_cart))
        .route("/cart/items/{id}/increment", post(increment_item))
        .route("/cart/items/{id}/decrement", post(decrement_item))
        .route("/cart/items/{id}", delete(remove_item))
}

/// The cart joined against the catalog: per-line prices and subtotals,
/// the running total, and the ids of any lines that no longer resolve
/// to a product.
async fn get_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<PricedCart>> {
    let conn = state.db.connect().map_err(AppError::from)?;
    let lines = Cart::load(&conn, &user.uid).await;

    let catalog = Medication::fetch_all(&state.firestore).await?;
    let priced = pricing::price_cart(&lines, &catalog);

    if !priced.unresolved.is_empty() {
        tracing::warn!(
            "Cart for {} references unknown products: {:?}",
            user.uid,
            priced.unresolved
        );
    }

    Ok(Json(priced))
}

async fn save_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SaveCartRequest>,
) -> AppResult<Json<Vec<CartLine>>> {
    if payload.lines.iter().any(|line| line.cantidad == 0) {
        return Err(AppError::BadRequest(
            "Line quantities must be at least 1".to_string(),
        ));
    }

    let conn = state.db.connect().map_err(AppError::from)?;
    Cart::save(&conn, &user.uid, &payload.lines).await?;

    Ok(Json(payload.lines))
}

async fn increment_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<CartLine>>> {
    let conn = state.db.connect().map_err(AppError::from)?;
    let lines = Cart::increment(&conn, &user.uid, &id).await?;
    Ok(Json(lines))
}

async fn decrement_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<CartLine>>> {
    let conn = state.db.connect().map_err(AppError::from)?;
    let lines = Cart::decrement(&conn, &user.uid, &id).await?;
    Ok(Json(lines))
}

async fn remove_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<CartLine>>> {
    let conn = state.db.connect().map_err(AppError::from)?;
    let lines = Cart::remove(&conn, &user.uid, &id).await?;
    Ok(Json(lines))
}

async fn clear_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.connect().map_err(AppError::from)?;
    Cart::clear(&conn, &user.uid).await?;
    Ok(Json(serde_json::json!({"cleared": true})))
}
