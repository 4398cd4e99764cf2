use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::{Order, OrderStatus, TransitionPolicy};
use crate::routes::AppState;

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub estado: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{id}/status", put(update_status))
}

async fn list_orders(State(state): State<AppState>) -> AppResult<Json<Vec<Order>>> {
    let orders = Order::list_all(&state.firestore).await?;
    Ok(Json(orders))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<Order>> {
    let to = OrderStatus::from_str(&payload.estado).ok_or_else(|| {
        AppError::BadRequest(format!("Unknown order status: {}", payload.estado))
    })?;

    let order =
        Order::update_status(&state.firestore, &id, to, TransitionPolicy::default()).await?;

    Ok(Json(order))
}
