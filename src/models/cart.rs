use libsql::Connection;
use serde::{Deserialize, Serialize};

use crate::db::device_store::{keys, DeviceStore};
use crate::error::AppResult;

/// One cart line as the client stores it: product id plus quantity.
/// Product names and prices are resolved against the catalog when needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub cantidad: u32,
}

pub struct Cart;

impl Cart {
    /// Read the cart. A missing value, malformed JSON or a storage failure
    /// all come back as an empty cart; the caller never sees an error.
    pub async fn load(conn: &Connection, cliente_id: &str) -> Vec<CartLine> {
        let raw = match DeviceStore::get(conn, cliente_id, keys::CART).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Cart read failed for {}: {}", cliente_id, e);
                return Vec::new();
            }
        };

        match raw {
            Some(json) => match serde_json::from_str(&json) {
                Ok(lines) => lines,
                Err(e) => {
                    tracing::warn!("Discarding malformed cart for {}: {}", cliente_id, e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        }
    }

    /// Overwrite the whole cart. Last write wins.
    pub async fn save(conn: &Connection, cliente_id: &str, lines: &[CartLine]) -> AppResult<()> {
        let json = serde_json::to_string(lines)?;
        DeviceStore::set(conn, cliente_id, keys::CART, &json).await
    }

    /// Add one unit of a product. A product not yet in the cart starts at
    /// quantity 1 and is appended, keeping insertion order.
    pub async fn increment(
        conn: &Connection,
        cliente_id: &str,
        product_id: &str,
    ) -> AppResult<Vec<CartLine>> {
        let mut lines = Self::load(conn, cliente_id).await;

        match lines.iter_mut().find(|line| line.id == product_id) {
            Some(line) => line.cantidad += 1,
            None => lines.push(CartLine {
                id: product_id.to_string(),
                cantidad: 1,
            }),
        }

        Self::save(conn, cliente_id, &lines).await?;
        Ok(lines)
    }

    /// Remove one unit of a product. Going below quantity 1 removes the
    /// line entirely.
    pub async fn decrement(
        conn: &Connection,
        cliente_id: &str,
        product_id: &str,
    ) -> AppResult<Vec<CartLine>> {
        let mut lines = Self::load(conn, cliente_id).await;

        if let Some(pos) = lines.iter().position(|line| line.id == product_id) {
            if lines[pos].cantidad > 1 {
                lines[pos].cantidad -= 1;
            } else {
                lines.remove(pos);
            }
        }

        Self::save(conn, cliente_id, &lines).await?;
        Ok(lines)
    }

    /// Drop a line regardless of quantity.
    pub async fn remove(
        conn: &Connection,
        cliente_id: &str,
        product_id: &str,
    ) -> AppResult<Vec<CartLine>> {
        let mut lines = Self::load(conn, cliente_id).await;
        lines.retain(|line| line.id != product_id);

        Self::save(conn, cliente_id, &lines).await?;
        Ok(lines)
    }

    pub async fn clear(conn: &Connection, cliente_id: &str) -> AppResult<()> {
        DeviceStore::remove(conn, cliente_id, keys::CART).await
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

    fn line(id: &str, cantidad: u32) -> CartLine {
        CartLine {
            id: id.to_string(),
            cantidad,
        }
    }

    #[tokio::test]
    async fn load_returns_empty_for_a_new_customer() {
        let conn = test_conn().await;
        assert!(Cart::load(&conn, "uid-1").await.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let conn = test_conn().await;
        let lines = vec![line("abc", 2), line("def", 1)];

        Cart::save(&conn, "uid-1", &lines).await.unwrap();
        assert_eq!(Cart::load(&conn, "uid-1").await, lines);
    }

    #[tokio::test]
    async fn malformed_cart_loads_as_empty() {
        let conn = test_conn().await;
        DeviceStore::set(&conn, "uid-1", keys::CART, "{not json")
            .await
            .unwrap();

        assert!(Cart::load(&conn, "uid-1").await.is_empty());
    }

    #[tokio::test]
    async fn increment_appends_new_lines_at_quantity_one() {
        let conn = test_conn().await;
        Cart::save(&conn, "uid-1", &[line("abc", 3)]).await.unwrap();

        let lines = Cart::increment(&conn, "uid-1", "def").await.unwrap();
        assert_eq!(lines, vec![line("abc", 3), line("def", 1)]);
    }

    #[tokio::test]
    async fn increment_bumps_existing_quantity_in_place() {
        let conn = test_conn().await;
        Cart::save(&conn, "uid-1", &[line("abc", 1), line("def", 1)])
            .await
            .unwrap();

        let lines = Cart::increment(&conn, "uid-1", "abc").await.unwrap();
        assert_eq!(lines, vec![line("abc", 2), line("def", 1)]);
    }

    #[tokio::test]
    async fn decrement_at_quantity_one_removes_the_line() {
        let conn = test_conn().await;
        Cart::save(&conn, "uid-1", &[line("abc", 1), line("def", 2)])
            .await
            .unwrap();

        let lines = Cart::decrement(&conn, "uid-1", "abc").await.unwrap();
        assert_eq!(lines, vec![line("def", 2)]);

        let lines = Cart::decrement(&conn, "uid-1", "def").await.unwrap();
        assert_eq!(lines, vec![line("def", 1)]);
    }

    #[tokio::test]
    async fn decrement_of_unknown_product_changes_nothing() {
        let conn = test_conn().await;
        Cart::save(&conn, "uid-1", &[line("abc", 2)]).await.unwrap();

        let lines = Cart::decrement(&conn, "uid-1", "zzz").await.unwrap();
        assert_eq!(lines, vec![line("abc", 2)]);
    }

    #[tokio::test]
    async fn remove_drops_the_whole_line() {
        let conn = test_conn().await;
        Cart::save(&conn, "uid-1", &[line("abc", 5), line("def", 1)])
            .await
            .unwrap();

        let lines = Cart::remove(&conn, "uid-1", "abc").await.unwrap();
        assert_eq!(lines, vec![line("def", 1)]);
    }

    #[tokio::test]
    async fn clear_empties_the_cart() {
        let conn = test_conn().await;
        Cart::save(&conn, "uid-1", &[line("abc", 5)]).await.unwrap();

        Cart::clear(&conn, "uid-1").await.unwrap();
        assert!(Cart::load(&conn, "uid-1").await.is_empty());
    }
}
