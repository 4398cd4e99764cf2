use axum::{
    extract::{Extension, Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Medication, Order};
use crate::routes::AppState;

/// One order line joined against the catalog. Lines whose product no
/// longer exists keep their id and quantity but render without price
/// information.
#[derive(Serialize)]
pub struct OrderLineDetail {
    pub id: String,
    pub cantidad: u32,
    pub nombre: Option<String>,
    pub precio: Option<f64>,
    pub subtotal: Option<f64>,
}

#[derive(Serialize)]
pub struct OrderDetailResponse {
    pub order: Order,
    pub lines: Vec<OrderLineDetail>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
}

async fn list_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = Order::list_by_customer(&state.firestore, &user.uid).await?;
    Ok(Json(orders))
}

async fn get_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<Json<OrderDetailResponse>> {
    let order = Order::fetch_one(&state.firestore, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?;

    if order.cliente_id != user.uid {
        return Err(AppError::Forbidden(
            "Order belongs to another user".to_string(),
        ));
    }

    let catalog = Medication::fetch_all(&state.firestore).await?;
    let lines = order
        .carrito
        .iter()
        .map(|line| {
            let product = catalog.iter().find(|p| p.id == line.id);
            OrderLineDetail {
                id: line.id.clone(),
                cantidad: line.cantidad,
                nombre: product.map(|p| p.nombre.clone()),
                precio: product.map(|p| p.precio),
                subtotal: product.map(|p| p.precio * f64::from(line.cantidad)),
            }
        })
        .collect();

    Ok(Json(OrderDetailResponse { order, lines }))
}
