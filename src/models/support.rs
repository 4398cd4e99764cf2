use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::services::firestore::{Fields, FirestoreService, FirestoreValue};

pub const COLLECTION: &str = "config";

pub const DOCUMENT: &str = "whatsapp";

/// The WhatsApp number customers contact support on, held in the single
/// document `config/whatsapp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportConfig {
    pub numero: String,
}

impl SupportConfig {
    pub async fn fetch(fs: &FirestoreService) -> AppResult<Option<Self>> {
        let doc = match fs.get(COLLECTION, DOCUMENT).await? {
            Some(doc) => doc,
            None => return Ok(None),
        };

        doc.decode()
            .map(Some)
            .map_err(|e| AppError::Parse(format!("config {}: {}", DOCUMENT, e)))
    }

    /// Upsert: the document is created on first write.
    pub async fn set(fs: &FirestoreService, numero: &str) -> AppResult<Self> {
        let mut fields = Fields::new();
        fields.insert(
            "numero".to_string(),
            FirestoreValue::StringValue(numero.to_string()),
        );

        let doc = fs.set(COLLECTION, DOCUMENT, fields).await?;
        doc.decode()
            .map_err(|e| AppError::Parse(format!("config {}: {}", DOCUMENT, e)))
    }

    pub async fn delete(fs: &FirestoreService) -> AppResult<()> {
        fs.delete(COLLECTION, DOCUMENT).await
    }
}
