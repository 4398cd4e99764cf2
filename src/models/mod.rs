use serde::de::DeserializeOwned;

use crate::services::firestore::Document;

pub mod cart;
pub mod category;
pub mod checkout;
pub mod medication;
pub mod order;
pub mod profile;
pub mod reminder;
pub mod support;

pub use cart::{Cart, CartLine};
pub use category::{Category, CategoryInput};
pub use checkout::{CheckoutSession, CheckoutStage, Coordinates};
pub use medication::{Medication, MedicationInput};
pub use order::{Order, OrderDraft, OrderStatus, TransitionPolicy};
pub use profile::Profile;
pub use reminder::{Reminder, ReminderInput};
pub use support::SupportConfig;

/// Decode a batch of documents, quarantining the ones that do not match
/// the expected shape. Bad documents are logged with their id and skipped;
/// one broken record must not take a whole listing down.
pub(crate) fn decode_documents<T: DeserializeOwned>(
    collection: &str,
    docs: Vec<Document>,
) -> Vec<T> {
    let mut decoded = Vec::with_capacity(docs.len());
    for doc in docs {
        match doc.decode() {
            Ok(item) => decoded.push(item),
            Err(e) => {
                tracing::warn!(
                    "Quarantining malformed {} document {}: {}",
                    collection,
                    doc.doc_id(),
                    e
                );
            }
        }
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::medication::Medication;
    use serde_json::json;

    #[test]
    fn malformed_documents_are_skipped_not_fatal() {
        let docs: Vec<Document> = vec![
            serde_json::from_value(json!({
                "name": "projects/p/databases/(default)/documents/medicamento/good",
                "fields": {
                    "nombre": { "stringValue": "Paracetamol" },
                    "precio": { "doubleValue": 10.5 },
                },
            }))
            .unwrap(),
            serde_json::from_value(json!({
                "name": "projects/p/databases/(default)/documents/medicamento/bad",
                "fields": {
                    "nombre": { "stringValue": "Sin precio" },
                },
            }))
            .unwrap(),
        ];

        let meds: Vec<Medication> = decode_documents("medicamento", docs);

        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0].id, "good");
    }
}
