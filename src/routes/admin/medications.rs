use axum::{
    extract::{Multipart, Path, State},
    routing::{delete, post, put},
    Json, Router,
};

use crate::error::{AppError, AppResult};
use crate::models::{Medication, MedicationInput};
use crate::routes::AppState;
use crate::services::image;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/medications", post(create_medication))
        .route("/medications/{id}", put(update_medication))
        .route("/medications/{id}", delete(delete_medication))
}

/// Multipart form for the product screens: plain text fields plus an
/// optional `imagen` file, uploaded before the document is written.
#[derive(Default)]
struct MedicationForm {
    nombre: Option<String>,
    descripcion: Option<String>,
    dosis: Option<String>,
    precio: Option<String>,
    id_categoria: Option<String>,
    receta: Option<String>,
    fecha_vencimiento: Option<String>,
    stock: Option<String>,
    imagen_url: Option<String>,
}

impl MedicationForm {
    fn into_input(self) -> AppResult<MedicationInput> {
        let precio_raw = require(self.precio, "precio")?;
        let precio = precio_raw
            .parse::<f64>()
            .map_err(|_| AppError::BadRequest(format!("Invalid precio: {}", precio_raw)))?;

        let stock_raw = require(self.stock, "stock")?;
        let stock = stock_raw
            .parse::<i64>()
            .map_err(|_| AppError::BadRequest(format!("Invalid stock: {}", stock_raw)))?;

        let receta = match self.receta {
            Some(raw) => raw
                .parse::<bool>()
                .map_err(|_| AppError::BadRequest(format!("Invalid receta: {}", raw)))?,
            None => false,
        };

        Ok(MedicationInput {
            nombre: require(self.nombre, "nombre")?,
            descripcion: require(self.descripcion, "descripcion")?,
            dosis: require(self.dosis, "dosis")?,
            precio,
            id_categoria: require(self.id_categoria, "id_categoria")?,
            receta,
            imagen_url: self.imagen_url,
            fecha_vencimiento: require(self.fecha_vencimiento, "fecha_vencimiento")?,
            stock,
        })
    }
}

fn require(value: Option<String>, name: &str) -> AppResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing field: {}", name)))
}

async fn read_form(state: &AppState, multipart: &mut Multipart) -> AppResult<MedicationForm> {
    let mut form = MedicationForm::default();

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
            let filename = format!("medicamento.{}", processed.extension);
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
            "dosis" => form.dosis = Some(value),
            "precio" => form.precio = Some(value),
            "id_categoria" => form.id_categoria = Some(value),
            "receta" => form.receta = Some(value),
            "fecha_vencimiento" => form.fecha_vencimiento = Some(value),
            "stock" => form.stock = Some(value),
            _ => {}
        }
    }

    Ok(form)
}

async fn create_medication(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<Medication>> {
    let form = read_form(&state, &mut multipart).await?;
    let input = form.into_input()?;

    let medication = Medication::create(&state.firestore, &input).await?;
    Ok(Json(medication))
}

async fn update_medication(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<Medication>> {
    let current = Medication::fetch_one(&state.firestore, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Medication not found".to_string()))?;

    let mut form = read_form(&state, &mut multipart).await?;

    // An edit without a new image keeps the stored one.
    if form.imagen_url.is_none() {
        form.imagen_url = current.imagen_url.clone();
    }

    let input = form.into_input()?;
    let medication = Medication::update(&state.firestore, &id, &input).await?;
    Ok(Json(medication))
}

async fn delete_medication(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    Medication::fetch_one(&state.firestore, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Medication not found".to_string()))?;

    Medication::delete(&state.firestore, &id).await?;
    Ok(Json(serde_json::json!({"deleted": true})))
}
