use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::Profile;
use crate::routes::AppState;

/// The verified caller. `uid` is the Firebase uid and doubles as
/// `cliente_id` everywhere downstream.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let token = match auth_header {
        Some(t) => t,
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Missing authorization header"})),
            )
                .into_response();
        }
    };

    let claims = match state.verifier.verify_token(token).await {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("Rejected ID token: {}", e);
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Invalid token"})),
            )
                .into_response();
        }
    };

    req.extensions_mut().insert(AuthUser {
        uid: claims.sub,
        email: claims.email,
    });
    next.run(req).await
}

/// Admin gate: the caller's profile document must carry the admin role.
/// Runs after `auth_middleware`.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let user = match req.extensions().get::<AuthUser>() {
        Some(user) => user.clone(),
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Authentication required"})),
            )
                .into_response();
        }
    };

    match Profile::fetch(&state.firestore, &user.uid).await {
        Ok(Some(profile)) if profile.is_admin() => next.run(req).await,
        Ok(_) => (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "Admin access required"})),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Role lookup failed for {}: {}", user.uid, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to verify role"})),
            )
                .into_response()
        }
    }
}
