use axum::{
    extract::{Extension, Path, State},
    routing::{delete, get, put},
    Json, Router,
};

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::{Reminder, ReminderInput};
use crate::routes::AppState;
use crate::services::reminders::{interval_seconds, reminder_body, REMINDER_TITLE};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reminders", get(list_reminders).post(create_reminder))
        .route("/reminders/{id}", put(update_reminder))
        .route("/reminders/{id}", delete(delete_reminder))
}

async fn list_reminders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<Vec<Reminder>>> {
    let reminders = Reminder::list_for_user(&state.firestore, &user.uid).await?;
    Ok(Json(reminders))
}

async fn create_reminder(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ReminderInput>,
) -> AppResult<Json<Reminder>> {
    let reminder = Reminder::create(&state.firestore, &user.uid, &payload).await?;
    schedule_if_active(&state, &reminder).await;
    Ok(Json(reminder))
}

async fn update_reminder(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<ReminderInput>,
) -> AppResult<Json<Reminder>> {
    let reminder = Reminder::update(&state.firestore, &user.uid, &id, &payload).await?;
    schedule_if_active(&state, &reminder).await;
    Ok(Json(reminder))
}

async fn delete_reminder(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    Reminder::delete(&state.firestore, &user.uid, &id).await?;
    Ok(Json(serde_json::json!({"deleted": true})))
}

/// Register the repeating notification for an active reminder. The write
/// already happened; a scheduler failure is only logged.
async fn schedule_if_active(state: &AppState, reminder: &Reminder) {
    if !reminder.activo {
        return;
    }

    let result = state
        .scheduler
        .schedule_repeating(
            interval_seconds(reminder.frecuencia_dias),
            REMINDER_TITLE,
            &reminder_body(&reminder.id_medicamento),
        )
        .await;

    if let Err(e) = result {
        tracing::warn!("Failed to schedule reminder {}: {}", reminder.id, e);
    }
}
