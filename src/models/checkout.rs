use libsql::Connection;
use serde::{Deserialize, Serialize};

use crate::db::device_store::{keys, DeviceStore};
use crate::error::{AppError, AppResult};

pub const DELIVERY_HOME: &str = "domicilio";
pub const DELIVERY_BRANCH: &str = "sucursal";

const SESSION_VERSION: u32 = 1;

/// Where the customer is in the checkout funnel. Stages only move through
/// the methods below, so the session can never hold a delivery address
/// without a delivery type or similar orphaned fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckoutStage {
    SelectingDelivery,
    SelectingPayment,
    AwaitingProof,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// The in-progress checkout, stored as one versioned record under a single
/// key. Replaces the older client layout of one key per fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub version: u32,
    pub stage: CheckoutStage,
    pub tipo_entrega: Option<String>,
    pub direccion_entrega: Option<String>,
    pub referencia: Option<String>,
    pub coordenadas: Option<Coordinates>,
}

impl CheckoutSession {
    pub fn new() -> Self {
        Self {
            version: SESSION_VERSION,
            stage: CheckoutStage::SelectingDelivery,
            tipo_entrega: None,
            direccion_entrega: None,
            referencia: None,
            coordenadas: None,
        }
    }

    /// Load the session, converting any legacy per-key layout found on the
    /// way. A malformed stored session is discarded with a warning.
    pub async fn load(conn: &Connection, cliente_id: &str) -> AppResult<Self> {
        if let Some(json) = DeviceStore::get(conn, cliente_id, keys::CHECKOUT_SESSION).await? {
            match serde_json::from_str(&json) {
                Ok(session) => return Ok(session),
                Err(e) => {
                    tracing::warn!(
                        "Discarding malformed checkout session for {}: {}",
                        cliente_id,
                        e
                    );
                    return Ok(Self::new());
                }
            }
        }

        Self::migrate_legacy(conn, cliente_id).await
    }

    async fn migrate_legacy(conn: &Connection, cliente_id: &str) -> AppResult<Self> {
        let tipo = DeviceStore::get(conn, cliente_id, keys::LEGACY_DELIVERY_TYPE).await?;
        let direccion = DeviceStore::get(conn, cliente_id, keys::LEGACY_DELIVERY_ADDRESS).await?;
        let referencia = DeviceStore::get(conn, cliente_id, keys::LEGACY_REFERENCE).await?;
        let coordenadas = DeviceStore::get(conn, cliente_id, keys::LEGACY_COORDINATES).await?;

        if tipo.is_none() && direccion.is_none() && referencia.is_none() && coordenadas.is_none() {
            return Ok(Self::new());
        }

        let mut session = Self::new();
        match tipo.as_deref() {
            Some(DELIVERY_HOME) => {
                let coordenadas = coordenadas.and_then(|json| {
                    serde_json::from_str(&json)
                        .map_err(|e| {
                            tracing::warn!(
                                "Ignoring malformed legacy coordinates for {}: {}",
                                cliente_id,
                                e
                            );
                        })
                        .ok()
                });
                session.choose_home_delivery(
                    direccion.unwrap_or_default(),
                    referencia.unwrap_or_default(),
                    coordenadas,
                );
            }
            Some(DELIVERY_BRANCH) => session.choose_branch_pickup(),
            Some(other) => {
                tracing::warn!(
                    "Ignoring unknown legacy delivery type {:?} for {}",
                    other,
                    cliente_id
                );
            }
            None => {}
        }

        tracing::info!("Migrated legacy checkout keys for {}", cliente_id);
        session.save(conn, cliente_id).await?;
        DeviceStore::remove_many(
            conn,
            cliente_id,
            &[
                keys::LEGACY_DELIVERY_TYPE,
                keys::LEGACY_DELIVERY_ADDRESS,
                keys::LEGACY_REFERENCE,
                keys::LEGACY_COORDINATES,
            ],
        )
        .await?;

        Ok(session)
    }

    pub async fn save(&self, conn: &Connection, cliente_id: &str) -> AppResult<()> {
        let json = serde_json::to_string(self)?;
        DeviceStore::set(conn, cliente_id, keys::CHECKOUT_SESSION, &json).await
    }

    /// Remove the session and any legacy fragments an old client left.
    pub async fn clear(conn: &Connection, cliente_id: &str) -> AppResult<()> {
        DeviceStore::remove_many(
            conn,
            cliente_id,
            &[
                keys::CHECKOUT_SESSION,
                keys::LEGACY_DELIVERY_TYPE,
                keys::LEGACY_DELIVERY_ADDRESS,
                keys::LEGACY_REFERENCE,
                keys::LEGACY_COORDINATES,
            ],
        )
        .await
    }

    /// Home delivery: address fields and stage move together.
    pub fn choose_home_delivery(
        &mut self,
        direccion: String,
        referencia: String,
        coordenadas: Option<Coordinates>,
    ) {
        self.tipo_entrega = Some(DELIVERY_HOME.to_string());
        self.direccion_entrega = Some(direccion);
        self.referencia = Some(referencia);
        self.coordenadas = coordenadas;
        self.stage = CheckoutStage::SelectingPayment;
    }

    /// Branch pickup clears whatever address was chosen before.
    pub fn choose_branch_pickup(&mut self) {
        self.tipo_entrega = Some(DELIVERY_BRANCH.to_string());
        self.direccion_entrega = None;
        self.referencia = None;
        self.coordenadas = None;
        self.stage = CheckoutStage::SelectingPayment;
    }

    pub fn require_delivery_type(&self) -> AppResult<&str> {
        self.tipo_entrega
            .as_deref()
            .ok_or(AppError::MissingDeliveryType)
    }

    /// QR payments wait for a proof image; there is nothing to wait for
    /// until a delivery type exists.
    pub fn begin_awaiting_proof(&mut self) -> AppResult<()> {
        self.require_delivery_type()?;
        self.stage = CheckoutStage::AwaitingProof;
        Ok(())
    }

    pub fn mark_submitted(&mut self) {
        self.stage = CheckoutStage::Submitted;
    }
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_conn() -> Connection {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap();
        let conn = db.connect().unwrap();
        DeviceStore::init(&conn).await.unwrap();
        conn
    }

    #[tokio::test]
    async fn load_without_stored_state_gives_a_fresh_session() {
        let conn = test_conn().await;
        let session = CheckoutSession::load(&conn, "uid-1").await.unwrap();

        assert_eq!(session, CheckoutSession::new());
        assert_eq!(session.stage, CheckoutStage::SelectingDelivery);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let conn = test_conn().await;
        let mut session = CheckoutSession::new();
        session.choose_home_delivery(
            "Av. Siempre Viva 123".to_string(),
            "La Paz".to_string(),
            Some(Coordinates {
                latitude: -16.5,
                longitude: -68.15,
            }),
        );
        session.save(&conn, "uid-1").await.unwrap();

        let loaded = CheckoutSession::load(&conn, "uid-1").await.unwrap();
        assert_eq!(loaded, session);
        assert_eq!(loaded.stage, CheckoutStage::SelectingPayment);
    }

    #[tokio::test]
    async fn branch_pickup_clears_address_fields() {
        let mut session = CheckoutSession::new();
        session.choose_home_delivery("Calle 1".to_string(), "Zona Sur".to_string(), None);
        session.choose_branch_pickup();

        assert_eq!(session.tipo_entrega.as_deref(), Some("sucursal"));
        assert!(session.direccion_entrega.is_none());
        assert!(session.referencia.is_none());
        assert!(session.coordenadas.is_none());
    }

    #[tokio::test]
    async fn legacy_home_delivery_keys_migrate_into_a_session() {
        let conn = test_conn().await;
        DeviceStore::set(&conn, "uid-1", keys::LEGACY_DELIVERY_TYPE, "domicilio")
            .await
            .unwrap();
        DeviceStore::set(&conn, "uid-1", keys::LEGACY_DELIVERY_ADDRESS, "Calle Falsa 123")
            .await
            .unwrap();
        DeviceStore::set(&conn, "uid-1", keys::LEGACY_REFERENCE, "El Alto")
            .await
            .unwrap();
        DeviceStore::set(
            &conn,
            "uid-1",
            keys::LEGACY_COORDINATES,
            "{\"latitude\":-16.5,\"longitude\":-68.15}",
        )
        .await
        .unwrap();

        let session = CheckoutSession::load(&conn, "uid-1").await.unwrap();

        assert_eq!(session.version, 1);
        assert_eq!(session.stage, CheckoutStage::SelectingPayment);
        assert_eq!(session.tipo_entrega.as_deref(), Some("domicilio"));
        assert_eq!(session.direccion_entrega.as_deref(), Some("Calle Falsa 123"));
        assert_eq!(session.referencia.as_deref(), Some("El Alto"));
        assert_eq!(
            session.coordenadas,
            Some(Coordinates {
                latitude: -16.5,
                longitude: -68.15,
            })
        );

        // Legacy keys are gone; the session itself is now stored.
        assert!(DeviceStore::get(&conn, "uid-1", keys::LEGACY_DELIVERY_TYPE)
            .await
            .unwrap()
            .is_none());
        assert!(DeviceStore::get(&conn, "uid-1", keys::CHECKOUT_SESSION)
            .await
            .unwrap()
            .is_some());

        let again = CheckoutSession::load(&conn, "uid-1").await.unwrap();
        assert_eq!(again, session);
    }

    #[tokio::test]
    async fn legacy_branch_keys_migrate_without_address() {
        let conn = test_conn().await;
        DeviceStore::set(&conn, "uid-1", keys::LEGACY_DELIVERY_TYPE, "sucursal")
            .await
            .unwrap();
        // A stray address from an interrupted earlier flow.
        DeviceStore::set(&conn, "uid-1", keys::LEGACY_DELIVERY_ADDRESS, "Calle 1")
            .await
            .unwrap();

        let session = CheckoutSession::load(&conn, "uid-1").await.unwrap();

        assert_eq!(session.tipo_entrega.as_deref(), Some("sucursal"));
        assert!(session.direccion_entrega.is_none());
    }

    #[tokio::test]
    async fn unknown_legacy_delivery_type_is_dropped() {
        let conn = test_conn().await;
        DeviceStore::set(&conn, "uid-1", keys::LEGACY_DELIVERY_TYPE, "drone")
            .await
            .unwrap();

        let session = CheckoutSession::load(&conn, "uid-1").await.unwrap();

        assert!(session.tipo_entrega.is_none());
        assert_eq!(session.stage, CheckoutStage::SelectingDelivery);
    }

    #[tokio::test]
    async fn malformed_session_is_replaced_with_a_fresh_one() {
        let conn = test_conn().await;
        DeviceStore::set(&conn, "uid-1", keys::CHECKOUT_SESSION, "{broken")
            .await
            .unwrap();

        let session = CheckoutSession::load(&conn, "uid-1").await.unwrap();
        assert_eq!(session, CheckoutSession::new());
    }

    #[tokio::test]
    async fn proof_stage_requires_a_delivery_type() {
        let mut session = CheckoutSession::new();

        let err = session.begin_awaiting_proof().unwrap_err();
        assert!(matches!(err, AppError::MissingDeliveryType));

        session.choose_branch_pickup();
        session.begin_awaiting_proof().unwrap();
        assert_eq!(session.stage, CheckoutStage::AwaitingProof);
    }

    #[tokio::test]
    async fn clear_removes_session_and_legacy_keys() {
        let conn = test_conn().await;
        let session = CheckoutSession::new();
        session.save(&conn, "uid-1").await.unwrap();
        DeviceStore::set(&conn, "uid-1", keys::LEGACY_REFERENCE, "La Paz")
            .await
            .unwrap();

        CheckoutSession::clear(&conn, "uid-1").await.unwrap();

        assert!(DeviceStore::get(&conn, "uid-1", keys::CHECKOUT_SESSION)
            .await
            .unwrap()
            .is_none());
        assert!(DeviceStore::get(&conn, "uid-1", keys::LEGACY_REFERENCE)
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn stage_names_use_kebab_case_on_the_wire() {
        let json = serde_json::to_string(&CheckoutStage::SelectingDelivery).unwrap();
        assert_eq!(json, "\"selecting-delivery\"");

        let stage: CheckoutStage = serde_json::from_str("\"awaiting-proof\"").unwrap();
        assert_eq!(stage, CheckoutStage::AwaitingProof);
    }
}
