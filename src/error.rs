use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Parse error: {0}")]
    Parse(String),

    // Checkout preconditions carry the alert texts the mobile app shows.
    #[error("El carrito está vacío")]
    EmptyCart,

    #[error("Selecciona una imagen de comprobante")]
    MissingProof,

    #[error("No se detectó el tipo de entrega")]
    MissingDeliveryType,

    #[error("Perfil de cliente no encontrado")]
    ProfileNotFound,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string()),
            AppError::Remote(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Upload(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Parse(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Invalid stored data".to_string()),
            AppError::EmptyCart
            | AppError::MissingProof
            | AppError::MissingDeliveryType
            | AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::ProfileNotFound | AppError::NotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        tracing::error!("Error response: {} - {}", status, self);

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
