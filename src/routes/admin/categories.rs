use axum::{
    extract::{Multipart, Path, State},
    routing::{delete, post, put},
    Json, Router,
};

use crate::error::{AppError, AppResult};
use crate::models::{Category, CategoryInput};
use crate::routes::AppState;
use crate::services::image;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", post(create_category))
        .route("/categories/{id}", put(update_category))
        .route("/categories/{id}", delete(delete_category))
}

#[derive(Default)]
struct CategoryForm {
    nombre: Option<String>,
    descripcion: Option<String>,
    imagen_url: Option<String>,
}

impl CategoryForm {
    fn into_input(self) -> AppResult<CategoryInput> {
        let nombre = self
            .nombre
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing field: nombre".to_string()))?;

        Ok(CategoryInput {
            nombre,
            descripcion: self.descripcion.unwrap_or_default(),
            imagen_url: self.imagen_url,
        })
    }
}

async fn read_form(state: &AppState, multipart: &mut Multipart) -> AppResult<CategoryForm> {
    let mut form = CategoryForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to process upload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "imagen" {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

            if data.is_empty() {
                continue;
            }

            let processed = image::process_image(&data)
                .map_err(|e| AppError::BadRequest(format!("Invalid image: {}", e)))?;
            let filename = format!("categoria.{}", processed.extension);
            let url = state
                .storage
                .upload(&filename, &processed.data)
                .await
                .map_err(|e| AppError::Storage(e.to_string()))?;

            form.imagen_url = Some(url);
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read field {}: {}", name, e)))?;

        match name.as_str() {
            "nombre" => form.nombre = Some(value),
            "descripcion" => form.descripcion = Some(value),
            _ => {}
        }
    }

    Ok(form)
}

async fn create_category(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<Category>> {
    let form = read_form(&state, &mut multipart).await?;
    let input = form.into_input()?;

    let category = Category::create(&state.firestore, &input).await?;
    Ok(Json(category))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<Category>> {
    let current = Category::fetch_one(&state.firestore, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let mut form = read_form(&state, &mut multipart).await?;

    if form.imagen_url.is_none() {
        form.imagen_url = current.imagen_url.clone();
    }

    let input = form.into_input()?;
    let category = Category::update(&state.firestore, &id, &input).await?;
    Ok(Json(category))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    Category::fetch_one(&state.firestore, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    Category::delete(&state.firestore, &id).await?;
    Ok(Json(serde_json::json!({"deleted": true})))
}
