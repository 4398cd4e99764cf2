use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::services::firestore::{fields_from_json, FirestoreService, FirestoreValue};

pub const COLLECTION: &str = "recordatorio";

/// A medication reminder. `hora_toma` is `HH:MM:SS`, `fecha_inicio` is
/// `YYYY-MM-DD`, both kept as the client writes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub id_usuario: String,
    pub id_medicamento: String,
    pub hora_toma: String,
    pub fecha_inicio: String,
    pub frecuencia_dias: i64,
    pub activo: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReminderInput {
    pub id_medicamento: String,
    pub hora_toma: String,
    pub fecha_inicio: String,
    pub frecuencia_dias: i64,
    pub activo: bool,
}

impl Reminder {
    pub async fn list_for_user(fs: &FirestoreService, uid: &str) -> AppResult<Vec<Self>> {
        let docs = fs
            .query_equal(
                COLLECTION,
                "id_usuario",
                FirestoreValue::StringValue(uid.to_string()),
            )
            .await?;
        Ok(super::decode_documents(COLLECTION, docs))
    }

    pub async fn create(fs: &FirestoreService, uid: &str, input: &ReminderInput) -> AppResult<Self> {
        let mut fields = fields_from_json(&serde_json::to_value(input)?)?;
        fields.insert(
            "id_usuario".to_string(),
            FirestoreValue::StringValue(uid.to_string()),
        );

        let doc = fs.create(COLLECTION, fields).await?;
        doc.decode()
            .map_err(|e| AppError::Parse(format!("recordatorio {}: {}", doc.doc_id(), e)))
    }

    /// Fetch one reminder and check it belongs to the caller.
    async fn fetch_owned(fs: &FirestoreService, uid: &str, id: &str) -> AppResult<Self> {
        let doc = fs
            .get(COLLECTION, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reminder {} not found", id)))?;

        let reminder: Self = doc
            .decode()
            .map_err(|e| AppError::Parse(format!("recordatorio {}: {}", id, e)))?;

        if reminder.id_usuario != uid {
            return Err(AppError::Forbidden(
                "Reminder belongs to another user".to_string(),
            ));
        }

        Ok(reminder)
    }

    pub async fn update(
        fs: &FirestoreService,
        uid: &str,
        id: &str,
        input: &ReminderInput,
    ) -> AppResult<Self> {
        Self::fetch_owned(fs, uid, id).await?;

        let fields = fields_from_json(&serde_json::to_value(input)?)?;
        let doc = fs.update(COLLECTION, id, fields).await?;

        doc.decode()
            .map_err(|e| AppError::Parse(format!("recordatorio {}: {}", id, e)))
    }

    pub async fn delete(fs: &FirestoreService, uid: &str, id: &str) -> AppResult<()> {
        Self::fetch_owned(fs, uid, id).await?;
        fs.delete(COLLECTION, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_a_reminder_document() {
        let reminder: Reminder = serde_json::from_value(json!({
            "id": "r1",
            "id_usuario": "uid-1",
            "id_medicamento": "Paracetamol",
            "hora_toma": "08:30:00",
            "fecha_inicio": "2025-06-01",
            "frecuencia_dias": 8,
            "activo": true,
        }))
        .unwrap();

        assert_eq!(reminder.hora_toma, "08:30:00");
        assert_eq!(reminder.frecuencia_dias, 8);
        assert!(reminder.activo);
    }

    #[test]
    fn missing_owner_is_rejected() {
        let result = serde_json::from_value::<Reminder>(json!({
            "id": "r2",
            "id_medicamento": "Ibuprofeno",
            "hora_toma": "08:00:00",
            "fecha_inicio": "2025-06-01",
            "frecuencia_dias": 12,
            "activo": false,
        }));

        assert!(result.is_err());
    }
}
