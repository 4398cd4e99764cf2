use libsql::Connection;

use crate::error::{AppError, AppResult};

/// Keys used by the mobile client for its device-local state. The cart and
/// the legacy checkout keys keep their original spellings so existing
/// devices keep working after a sync.
pub mod keys {
    pub const CART: &str = "carrito";
    pub const CHECKOUT_SESSION: &str = "checkout";

    // Pre-session checkout state, one key per fragment. Read once during
    // migration, then removed.
    pub const LEGACY_DELIVERY_TYPE: &str = "tipo_entrega";
    pub const LEGACY_DELIVERY_ADDRESS: &str = "direccion_entrega";
    pub const LEGACY_REFERENCE: &str = "referencia";
    pub const LEGACY_COORDINATES: &str = "coordenadas";
}

/// Per-device key/value storage, the server-side equivalent of the app's
/// on-device store. Values are opaque strings (usually JSON).
pub struct DeviceStore;

impl DeviceStore {
    pub async fn init(conn: &Connection) -> AppResult<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS device_store (
                device_id TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (device_id, key)
            )
            "#,
            (),
        )
        .await
        .map_err(AppError::from)?;

        Ok(())
    }

    pub async fn get(conn: &Connection, device_id: &str, key: &str) -> AppResult<Option<String>> {
        let mut rows = conn
            .query(
                "SELECT value FROM device_store WHERE device_id = ? AND key = ?",
                [device_id, key],
            )
            .await
            .map_err(AppError::from)?;

        match rows.next().await.map_err(AppError::from)? {
            Some(row) => Ok(Some(row.get(0).map_err(AppError::from)?)),
            None => Ok(None),
        }
    }

    pub async fn set(
        conn: &Connection,
        device_id: &str,
        key: &str,
        value: &str,
    ) -> AppResult<()> {
        conn.execute(
            r#"
            INSERT INTO device_store (device_id, key, value, updated_at)
            VALUES (?, ?, ?, datetime('now'))
            ON CONFLICT (device_id, key)
            DO UPDATE SET value = excluded.value, updated_at = datetime('now')
            "#,
            libsql::params![device_id.to_string(), key.to_string(), value.to_string()],
        )
        .await
        .map_err(AppError::from)?;

        Ok(())
    }

    pub async fn remove(conn: &Connection, device_id: &str, key: &str) -> AppResult<()> {
        conn.execute(
            "DELETE FROM device_store WHERE device_id = ? AND key = ?",
            [device_id, key],
        )
        .await
        .map_err(AppError::from)?;

        Ok(())
    }

    pub async fn remove_many(conn: &Connection, device_id: &str, keys: &[&str]) -> AppResult<()> {
        for key in keys {
            Self::remove(conn, device_id, key).await?;
        }
        Ok(())
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
    async fn get_missing_key_returns_none() {
        let conn = test_conn().await;
        let value = DeviceStore::get(&conn, "device-1", keys::CART).await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let conn = test_conn().await;
        DeviceStore::set(&conn, "device-1", keys::CART, "[]").await.unwrap();

        let value = DeviceStore::get(&conn, "device-1", keys::CART).await.unwrap();
        assert_eq!(value.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn set_overwrites_existing_value() {
        let conn = test_conn().await;
        DeviceStore::set(&conn, "device-1", keys::LEGACY_DELIVERY_TYPE, "domicilio")
            .await
            .unwrap();
        DeviceStore::set(&conn, "device-1", keys::LEGACY_DELIVERY_TYPE, "sucursal")
            .await
            .unwrap();

        let value = DeviceStore::get(&conn, "device-1", keys::LEGACY_DELIVERY_TYPE)
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("sucursal"));
    }

    #[tokio::test]
    async fn remove_is_a_no_op_for_missing_keys() {
        let conn = test_conn().await;
        DeviceStore::remove(&conn, "device-1", keys::LEGACY_REFERENCE)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn devices_are_isolated() {
        let conn = test_conn().await;
        DeviceStore::set(&conn, "device-1", keys::CART, "[{\"cantidad\":1}]")
            .await
            .unwrap();

        let other = DeviceStore::get(&conn, "device-2", keys::CART).await.unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn remove_many_clears_all_listed_keys() {
        let conn = test_conn().await;
        DeviceStore::set(&conn, "device-1", keys::CART, "[]").await.unwrap();
        DeviceStore::set(&conn, "device-1", keys::LEGACY_DELIVERY_TYPE, "domicilio")
            .await
            .unwrap();
        DeviceStore::set(&conn, "device-1", keys::LEGACY_REFERENCE, "La Paz")
            .await
            .unwrap();

        DeviceStore::remove_many(
            &conn,
            "device-1",
            &[keys::CART, keys::LEGACY_DELIVERY_TYPE, keys::LEGACY_REFERENCE],
        )
        .await
        .unwrap();

        assert!(DeviceStore::get(&conn, "device-1", keys::CART).await.unwrap().is_none());
        assert!(DeviceStore::get(&conn, "device-1", keys::LEGACY_DELIVERY_TYPE)
            .await
            .unwrap()
            .is_none());
        assert!(DeviceStore::get(&conn, "device-1", keys::LEGACY_REFERENCE)
            .await
            .unwrap()
            .is_none());
    }
}
