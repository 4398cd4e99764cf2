use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::services::firestore::{fields_from_json, FirestoreService, FirestoreValue};

pub const COLLECTION: &str = "medicamento";

/// A catalog product. `id`, `nombre` and `precio` are required; documents
/// missing them are quarantined during decode rather than surfaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub nombre: String,
    pub precio: f64,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub dosis: Option<String>,
    #[serde(default)]
    pub id_categoria: Option<String>,
    #[serde(default)]
    pub receta: bool,
    #[serde(default)]
    pub imagen_url: Option<String>,
    #[serde(default)]
    pub fecha_vencimiento: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
}

/// Admin create/update payload; the full field set is written every time.
#[derive(Debug, Serialize, Deserialize)]
pub struct MedicationInput {
    pub nombre: String,
    pub descripcion: String,
    pub dosis: String,
    pub precio: f64,
    pub id_categoria: String,
    pub receta: bool,
    pub imagen_url: Option<String>,
    pub fecha_vencimiento: String,
    pub stock: i64,
}

impl Medication {
    pub async fn fetch_all(fs: &FirestoreService) -> AppResult<Vec<Self>> {
        let docs = fs.list(COLLECTION).await?;
        Ok(super::decode_documents(COLLECTION, docs))
    }

    pub async fn fetch_by_category(
        fs: &FirestoreService,
        category_id: &str,
    ) -> AppResult<Vec<Self>> {
        let docs = fs
            .query_equal(
                COLLECTION,
                "id_categoria",
                FirestoreValue::StringValue(category_id.to_string()),
            )
            .await?;
        Ok(super::decode_documents(COLLECTION, docs))
    }

    pub async fn fetch_one(fs: &FirestoreService, id: &str) -> AppResult<Option<Self>> {
        let doc = match fs.get(COLLECTION, id).await? {
            Some(doc) => doc,
            None => return Ok(None),
        };

        doc.decode()
            .map(Some)
            .map_err(|e| AppError::Parse(format!("medicamento {}: {}", id, e)))
    }

    pub async fn create(fs: &FirestoreService, input: &MedicationInput) -> AppResult<Self> {
        let fields = fields_from_json(&serde_json::to_value(input)?)?;
        let doc = fs.create(COLLECTION, fields).await?;

        doc.decode()
            .map_err(|e| AppError::Parse(format!("medicamento {}: {}", doc.doc_id(), e)))
    }

    pub async fn update(
        fs: &FirestoreService,
        id: &str,
        input: &MedicationInput,
    ) -> AppResult<Self> {
        let fields = fields_from_json(&serde_json::to_value(input)?)?;
        let doc = fs.update(COLLECTION, id, fields).await?;

        doc.decode()
            .map_err(|e| AppError::Parse(format!("medicamento {}: {}", id, e)))
    }

    pub async fn delete(fs: &FirestoreService, id: &str) -> AppResult<()> {
        fs.delete(COLLECTION, id).await
    }
}
