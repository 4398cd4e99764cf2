use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::services::firestore::{fields_from_json, FirestoreService};

pub const COLLECTION: &str = "categoria";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub nombre: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub imagen_url: Option<String>,
    // Original wire name, camelCase unlike every other field.
    #[serde(default, rename = "fechaCreacion")]
    pub fecha_creacion: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryInput {
    pub nombre: String,
    pub descripcion: String,
    pub imagen_url: Option<String>,
}

impl Category {
    pub async fn fetch_all(fs: &FirestoreService) -> AppResult<Vec<Self>> {
        let docs = fs.list(COLLECTION).await?;
        Ok(super::decode_documents(COLLECTION, docs))
    }

    pub async fn fetch_one(fs: &FirestoreService, id: &str) -> AppResult<Option<Self>> {
        let doc = match fs.get(COLLECTION, id).await? {
            Some(doc) => doc,
            None => return Ok(None),
        };

        doc.decode()
            .map(Some)
            .map_err(|e| AppError::Parse(format!("categoria {}: {}", id, e)))
    }

    pub async fn create(fs: &FirestoreService, input: &CategoryInput) -> AppResult<Self> {
        let mut fields = fields_from_json(&serde_json::to_value(input)?)?;
        fields.insert(
            "fechaCreacion".to_string(),
            crate::services::firestore::FirestoreValue::TimestampValue(
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        );

        let doc = fs.create(COLLECTION, fields).await?;
        doc.decode()
            .map_err(|e| AppError::Parse(format!("categoria {}: {}", doc.doc_id(), e)))
    }

    /// Update keeps the creation date untouched; only the editable fields
    /// are in the mask.
    pub async fn update(fs: &FirestoreService, id: &str, input: &CategoryInput) -> AppResult<Self> {
        let fields = fields_from_json(&serde_json::to_value(input)?)?;
        let doc = fs.update(COLLECTION, id, fields).await?;

        doc.decode()
            .map_err(|e| AppError::Parse(format!("categoria {}: {}", id, e)))
    }

    pub async fn delete(fs: &FirestoreService, id: &str) -> AppResult<()> {
        fs.delete(COLLECTION, id).await
    }
}
