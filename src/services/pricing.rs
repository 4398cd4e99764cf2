use serde::Serialize;

use crate::models::cart::CartLine;
use crate::models::medication::Medication;

/// A cart line joined with its catalog product.
#[derive(Debug, Clone, Serialize)]
pub struct PricedLine {
    pub id: String,
    pub nombre: String,
    pub precio: f64,
    pub cantidad: u32,
    pub subtotal: f64,
}

/// A fully priced cart. `unresolved` lists the product ids that did not
/// resolve against the catalog and therefore contributed nothing to the
/// total; callers decide whether to warn about them. `total` is the raw
/// running sum, `total_display` the two-decimal display string.
#[derive(Debug, Clone, Serialize)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub unresolved: Vec<String>,
    pub total: f64,
    pub total_display: String,
}

/// Sum of `precio × cantidad` over the lines whose product exists in the
/// catalog. Lines with an unknown id contribute 0. The running sum is
/// never rounded.
pub fn compute_total(cart: &[CartLine], catalog: &[Medication]) -> f64 {
    cart.iter().fold(0.0, |acc, line| {
        match catalog.iter().find(|p| p.id == line.id) {
            Some(product) => acc + product.precio * f64::from(line.cantidad),
            None => acc,
        }
    })
}

pub fn price_cart(cart: &[CartLine], catalog: &[Medication]) -> PricedCart {
    let mut lines = Vec::new();
    let mut unresolved = Vec::new();
    let mut total = 0.0;

    for line in cart {
        match catalog.iter().find(|p| p.id == line.id) {
            Some(product) => {
                let subtotal = product.precio * f64::from(line.cantidad);
                total += subtotal;
                lines.push(PricedLine {
                    id: line.id.clone(),
                    nombre: product.nombre.clone(),
                    precio: product.precio,
                    cantidad: line.cantidad,
                    subtotal,
                });
            }
            None => unresolved.push(line.id.clone()),
        }
    }

    PricedCart {
        lines,
        unresolved,
        total_display: format_bs(total),
        total,
    }
}

/// Display string for an amount in bolivianos: truncated to two decimals,
/// never rounded up. Stored totals stay unrounded; only presentation goes
/// through here.
pub fn format_bs(amount: f64) -> String {
    let truncated = (amount * 100.0).trunc() / 100.0;
    format!("{:.2}", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, precio: f64) -> Medication {
        Medication {
            id: id.to_string(),
            nombre: format!("Producto {}", id),
            precio,
            descripcion: None,
            dosis: None,
            id_categoria: None,
            receta: false,
            imagen_url: None,
            fecha_vencimiento: None,
            stock: None,
        }
    }

    fn line(id: &str, cantidad: u32) -> CartLine {
        CartLine {
            id: id.to_string(),
            cantidad,
        }
    }

    #[test]
    fn total_of_a_known_product_is_price_times_quantity() {
        let total = compute_total(&[line("p1", 2)], &[product("p1", 3.00)]);
        assert_eq!(total, 6.00);
    }

    #[test]
    fn unknown_products_contribute_zero() {
        let total = compute_total(
            &[line("p1", 1), line("p2", 1)],
            &[product("p1", 5.0)],
        );
        assert_eq!(total, 5.0);
    }

    #[test]
    fn empty_cart_totals_zero() {
        assert_eq!(compute_total(&[], &[product("p1", 5.0)]), 0.0);
        assert_eq!(compute_total(&[line("p1", 1)], &[]), 0.0);
    }

    #[test]
    fn total_sums_every_resolved_line() {
        let catalog = [product("p1", 12.5), product("p2", 0.5)];
        let cart = [line("p1", 2), line("p2", 3)];

        assert_eq!(compute_total(&cart, &catalog), 26.5);
    }

    #[test]
    fn price_cart_reports_unresolved_ids() {
        let catalog = [product("p1", 5.0)];
        let cart = [line("p1", 2), line("gone", 4)];

        let priced = price_cart(&cart, &catalog);

        assert_eq!(priced.total, 10.0);
        assert_eq!(priced.total_display, "10.00");
        assert_eq!(priced.unresolved, vec!["gone".to_string()]);
        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.lines[0].subtotal, 10.0);
        assert_eq!(priced.lines[0].nombre, "Producto p1");
    }

    #[test]
    fn price_cart_total_matches_compute_total() {
        let catalog = [product("p1", 3.3), product("p2", 7.15)];
        let cart = [line("p1", 3), line("p2", 1), line("missing", 9)];

        let priced = price_cart(&cart, &catalog);
        assert_eq!(priced.total, compute_total(&cart, &catalog));
    }

    #[test]
    fn the_running_sum_is_not_rounded() {
        // Three lines of 0.1 accumulate the usual binary error; the raw
        // total keeps it, only formatting hides it.
        let catalog = [product("p1", 0.1)];
        let cart = [line("p1", 3)];

        let total = compute_total(&cart, &catalog);
        assert!(total != 0.3);
        assert!((total - 0.3).abs() < 1e-12);
    }

    #[test]
    fn display_truncates_instead_of_rounding() {
        assert_eq!(format_bs(6.0), "6.00");
        assert_eq!(format_bs(5.999), "5.99");
        assert_eq!(format_bs(12.555), "12.55");
        assert_eq!(format_bs(0.1 + 0.2), "0.30");
    }
}
