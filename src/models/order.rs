use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::cart::CartLine;
use crate::models::checkout::DELIVERY_HOME;
use crate::services::firestore::{fields_from_json, FirestoreService, FirestoreValue};

pub const COLLECTION: &str = "pedidos";

pub const PAYMENT_CASH: &str = "efectivo";
pub const PAYMENT_QR: &str = "Qr";

/// Order states with their exact wire strings. Anything else found in a
/// stored document is treated as unknown, not coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "En revisión")]
    EnRevision,
    #[serde(rename = "Aceptado")]
    Aceptado,
    #[serde(rename = "Rechazado")]
    Rechazado,
    #[serde(rename = "Entregado")]
    Entregado,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::EnRevision => "En revisión",
            OrderStatus::Aceptado => "Aceptado",
            OrderStatus::Rechazado => "Rechazado",
            OrderStatus::Entregado => "Entregado",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "En revisión" => Some(OrderStatus::EnRevision),
            "Aceptado" => Some(OrderStatus::Aceptado),
            "Rechazado" => Some(OrderStatus::Rechazado),
            "Entregado" => Some(OrderStatus::Entregado),
            _ => None,
        }
    }
}

/// Who may move an order between states. `Permissive` reproduces the
/// observed behavior of the review screen: any state to any state.
/// `Strict` encodes the intended lifecycle and stays available behind the
/// same interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPolicy {
    Permissive,
    Strict,
}

impl TransitionPolicy {
    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => matches!(
                (from, to),
                (OrderStatus::EnRevision, OrderStatus::Aceptado)
                    | (OrderStatus::EnRevision, OrderStatus::Rechazado)
                    | (OrderStatus::Aceptado, OrderStatus::Entregado)
            ),
        }
    }
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        TransitionPolicy::Permissive
    }
}

/// A stored order. `estado` stays a plain string so that listing never
/// chokes on a value written outside the known set; `status()` parses it
/// on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub carrito: Vec<CartLine>,
    #[serde(default)]
    pub total: f64,
    pub estado: String,
    #[serde(default)]
    pub tipo_pago: Option<String>,
    #[serde(default)]
    pub tipo_entrega: Option<String>,
    #[serde(default)]
    pub direccion_entrega: Option<String>,
    #[serde(default)]
    pub referencia_ubicacion: Option<String>,
    pub cliente_id: String,
    #[serde(default)]
    pub cliente_nombre: Option<String>,
    #[serde(default)]
    pub cliente_telefono: Option<String>,
    #[serde(default)]
    pub imagen_url: Option<String>,
    #[serde(default)]
    pub creado_en: Option<DateTime<Utc>>,
}

impl Order {
    pub fn status(&self) -> Option<OrderStatus> {
        OrderStatus::from_str(&self.estado)
    }
}

/// Everything needed to write a new order document. The draft is built by
/// the submit flows from the cart snapshot, the checkout session, and the
/// customer profile.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDraft {
    pub carrito: Vec<CartLine>,
    pub total: f64,
    pub tipo_pago: String,
    pub tipo_entrega: String,
    pub direccion_entrega: Option<String>,
    pub referencia_ubicacion: Option<String>,
    pub cliente_id: String,
    pub cliente_nombre: String,
    pub cliente_telefono: String,
    pub imagen_url: Option<String>,
}

impl OrderDraft {
    /// Wire fields for the new document. The address fields are nulled
    /// unless the order is a home delivery, proof images only appear when
    /// present, and every order starts in review with a creation stamp.
    pub fn to_fields(&self) -> AppResult<crate::services::firestore::Fields> {
        let mut fields = fields_from_json(&serde_json::to_value(self)?)?;

        if self.tipo_entrega != DELIVERY_HOME {
            fields.insert(
                "direccion_entrega".to_string(),
                FirestoreValue::NullValue(()),
            );
            fields.insert(
                "referencia_ubicacion".to_string(),
                FirestoreValue::NullValue(()),
            );
        }

        if self.imagen_url.is_none() {
            fields.remove("imagen_url");
        }

        fields.insert(
            "estado".to_string(),
            FirestoreValue::StringValue(OrderStatus::EnRevision.as_str().to_string()),
        );
        fields.insert(
            "creado_en".to_string(),
            FirestoreValue::TimestampValue(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        Ok(fields)
    }
}

impl Order {
    pub async fn create(fs: &FirestoreService, draft: &OrderDraft) -> AppResult<Self> {
        let doc = fs.create(COLLECTION, draft.to_fields()?).await?;

        doc.decode()
            .map_err(|e| AppError::Parse(format!("pedidos {}: {}", doc.doc_id(), e)))
    }

    pub async fn list_all(fs: &FirestoreService) -> AppResult<Vec<Self>> {
        let docs = fs.list(COLLECTION).await?;
        Ok(super::decode_documents(COLLECTION, docs))
    }

    pub async fn list_by_customer(fs: &FirestoreService, cliente_id: &str) -> AppResult<Vec<Self>> {
        let docs = fs
            .query_equal(
                COLLECTION,
                "cliente_id",
                FirestoreValue::StringValue(cliente_id.to_string()),
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
            .map_err(|e| AppError::Parse(format!("pedidos {}: {}", id, e)))
    }

    /// Move an order to a new state if the policy permits it. Only the
    /// `estado` field is patched; nothing else on the document moves.
    pub async fn update_status(
        fs: &FirestoreService,
        id: &str,
        to: OrderStatus,
        policy: TransitionPolicy,
    ) -> AppResult<Self> {
        let current = Self::fetch_one(fs, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?;

        let from = current
            .status()
            .ok_or_else(|| AppError::BadRequest(format!("Unknown order status: {}", current.estado)))?;

        if !policy.allows(from, to) {
            return Err(AppError::BadRequest(format!(
                "Invalid status transition: {} -> {}",
                from.as_str(),
                to.as_str()
            )));
        }

        let mut fields = crate::services::firestore::Fields::new();
        fields.insert(
            "estado".to_string(),
            FirestoreValue::StringValue(to.as_str().to_string()),
        );

        let doc = fs.update(COLLECTION, id, fields).await?;
        doc.decode()
            .map_err(|e| AppError::Parse(format!("pedidos {}: {}", id, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft(tipo_entrega: &str, imagen_url: Option<&str>) -> OrderDraft {
        OrderDraft {
            carrito: vec![CartLine {
                id: "abc".to_string(),
                cantidad: 2,
            }],
            total: 25.0,
            tipo_pago: PAYMENT_CASH.to_string(),
            tipo_entrega: tipo_entrega.to_string(),
            direccion_entrega: Some("Av. Siempre Viva 123".to_string()),
            referencia_ubicacion: Some("La Paz".to_string()),
            cliente_id: "uid-1".to_string(),
            cliente_nombre: "María Quispe".to_string(),
            cliente_telefono: "70000000".to_string(),
            imagen_url: imagen_url.map(|s| s.to_string()),
        }
    }

    #[test]
    fn status_wire_strings_round_trip() {
        for status in [
            OrderStatus::EnRevision,
            OrderStatus::Aceptado,
            OrderStatus::Rechazado,
            OrderStatus::Entregado,
        ] {
            assert_eq!(OrderStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::from_str("En revision"), None);
        assert_eq!(OrderStatus::EnRevision.as_str(), "En revisión");
    }

    #[test]
    fn permissive_policy_allows_any_transition() {
        let policy = TransitionPolicy::Permissive;
        assert!(policy.allows(OrderStatus::Entregado, OrderStatus::EnRevision));
        assert!(policy.allows(OrderStatus::Rechazado, OrderStatus::Aceptado));
        assert!(policy.allows(OrderStatus::EnRevision, OrderStatus::Entregado));
    }

    #[test]
    fn strict_policy_follows_the_lifecycle() {
        let policy = TransitionPolicy::Strict;

        assert!(policy.allows(OrderStatus::EnRevision, OrderStatus::Aceptado));
        assert!(policy.allows(OrderStatus::EnRevision, OrderStatus::Rechazado));
        assert!(policy.allows(OrderStatus::Aceptado, OrderStatus::Entregado));

        // No skipping the acceptance step, no leaving terminal states.
        assert!(!policy.allows(OrderStatus::EnRevision, OrderStatus::Entregado));
        assert!(!policy.allows(OrderStatus::Rechazado, OrderStatus::Aceptado));
        assert!(!policy.allows(OrderStatus::Entregado, OrderStatus::EnRevision));
        assert!(!policy.allows(OrderStatus::Aceptado, OrderStatus::Aceptado));
    }

    #[test]
    fn branch_orders_null_the_address_fields() {
        let fields = draft("sucursal", None).to_fields().unwrap();

        assert_eq!(
            fields["direccion_entrega"],
            FirestoreValue::NullValue(())
        );
        assert_eq!(
            fields["referencia_ubicacion"],
            FirestoreValue::NullValue(())
        );
    }

    #[test]
    fn home_orders_keep_the_address_fields() {
        let fields = draft("domicilio", None).to_fields().unwrap();

        assert_eq!(
            fields["direccion_entrega"],
            FirestoreValue::StringValue("Av. Siempre Viva 123".to_string())
        );
    }

    #[test]
    fn cash_drafts_have_no_proof_field() {
        let fields = draft("domicilio", None).to_fields().unwrap();
        assert!(!fields.contains_key("imagen_url"));
    }

    #[test]
    fn qr_drafts_carry_the_proof_url() {
        let fields = draft("domicilio", Some("https://res.cloudinary.com/x.jpg"))
            .to_fields()
            .unwrap();

        assert_eq!(
            fields["imagen_url"],
            FirestoreValue::StringValue("https://res.cloudinary.com/x.jpg".to_string())
        );
    }

    #[test]
    fn every_draft_starts_in_review_with_a_timestamp() {
        let fields = draft("sucursal", None).to_fields().unwrap();

        assert_eq!(
            fields["estado"],
            FirestoreValue::StringValue("En revisión".to_string())
        );
        assert!(matches!(
            fields["creado_en"],
            FirestoreValue::TimestampValue(_)
        ));
    }

    #[test]
    fn orders_decode_from_snapshot_json() {
        let order: Order = serde_json::from_value(json!({
            "id": "p1",
            "carrito": [{ "id": "abc", "cantidad": 3 }],
            "total": 37.5,
            "estado": "En revisión",
            "tipo_pago": "Qr",
            "tipo_entrega": "sucursal",
            "direccion_entrega": null,
            "referencia_ubicacion": null,
            "cliente_id": "uid-1",
            "cliente_nombre": "María Quispe",
            "cliente_telefono": "70000000",
            "imagen_url": "https://res.cloudinary.com/x.jpg",
            "creado_en": "2025-03-01T12:00:00.000Z",
        }))
        .unwrap();

        assert_eq!(order.status(), Some(OrderStatus::EnRevision));
        assert_eq!(order.carrito.len(), 1);
        assert!(order.direccion_entrega.is_none());
    }

    #[test]
    fn unknown_status_decodes_but_does_not_parse() {
        let order: Order = serde_json::from_value(json!({
            "id": "p2",
            "estado": "Pendiente",
            "cliente_id": "uid-1",
        }))
        .unwrap();

        assert_eq!(order.status(), None);
    }
}
