use axum::{
    extract::{Extension, Multipart, State},
    routing::{get, post, put},
    Json, Router,
};
use libsql::Connection;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::checkout::{DELIVERY_BRANCH, DELIVERY_HOME};
use crate::models::order::{PAYMENT_CASH, PAYMENT_QR};
use crate::models::{Cart, CartLine, CheckoutSession, Coordinates, Medication, Order, OrderDraft, Profile};
use crate::routes::AppState;
use crate::services::image;
use crate::services::pricing::{self, PricedCart};

#[derive(Deserialize)]
pub struct DeliveryRequest {
    pub tipo_entrega: String,
    pub direccion_entrega: Option<String>,
    pub referencia: Option<String>,
    pub coordenadas: Option<Coordinates>,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub order_id: String,
    pub estado: String,
    pub total: f64,
    pub total_display: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", get(get_session))
        .route("/checkout/delivery", put(set_delivery))
        .route("/checkout/cash", post(submit_cash))
        .route("/checkout/qr", post(submit_qr))
}

async fn get_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<CheckoutSession>> {
    let conn = state.db.connect().map_err(AppError::from)?;
    let session = CheckoutSession::load(&conn, &user.uid).await?;
    Ok(Json(session))
}

/// Pick home delivery or branch pickup. The address fields only stick for
/// home delivery; choosing the branch wipes them.
async fn set_delivery(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<DeliveryRequest>,
) -> AppResult<Json<CheckoutSession>> {
    let conn = state.db.connect().map_err(AppError::from)?;
    let mut session = CheckoutSession::load(&conn, &user.uid).await?;

    match payload.tipo_entrega.as_str() {
        DELIVERY_HOME => {
            let direccion = payload
                .direccion_entrega
                .filter(|d| !d.trim().is_empty())
                .ok_or_else(|| {
                    AppError::BadRequest(
                        "direccion_entrega is required for home delivery".to_string(),
                    )
                })?;

            session.choose_home_delivery(
                direccion,
                payload.referencia.unwrap_or_default(),
                payload.coordenadas,
            );
        }
        DELIVERY_BRANCH => session.choose_branch_pickup(),
        other => {
            return Err(AppError::BadRequest(format!(
                "Unknown delivery type: {}",
                other
            )));
        }
    }

    session.save(&conn, &user.uid).await?;
    Ok(Json(session))
}

/// Cash order: no proof image, paid on delivery or at the counter.
async fn submit_cash(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<SubmitResponse>> {
    let conn = state.db.connect().map_err(AppError::from)?;

    let lines = Cart::load(&conn, &user.uid).await;
    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let session = CheckoutSession::load(&conn, &user.uid).await?;
    session.require_delivery_type()?;

    let profile = Profile::fetch(&state.firestore, &user.uid)
        .await?
        .ok_or(AppError::ProfileNotFound)?;

    let catalog = Medication::fetch_all(&state.firestore).await?;
    let priced = pricing::price_cart(&lines, &catalog);
    warn_unresolved(&user.uid, &priced);

    let draft = build_draft(
        &user.uid,
        &profile,
        &session,
        lines,
        priced.total,
        PAYMENT_CASH,
        None,
    )?;
    let order = Order::create(&state.firestore, &draft).await?;

    finish_checkout(&conn, &user.uid).await;

    Ok(Json(SubmitResponse {
        order_id: order.id,
        estado: order.estado,
        total_display: pricing::format_bs(order.total),
        total: order.total,
    }))
}

/// QR order: the proof image must be in the request, and it is uploaded
/// before the order document is written. A failed upload leaves the
/// session in `awaiting-proof` so the client can retry.
async fn submit_qr(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> AppResult<Json<SubmitResponse>> {
    let proof = read_proof(&mut multipart).await?;

    let conn = state.db.connect().map_err(AppError::from)?;

    let lines = Cart::load(&conn, &user.uid).await;
    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let mut session = CheckoutSession::load(&conn, &user.uid).await?;
    session.begin_awaiting_proof()?;
    session.save(&conn, &user.uid).await?;

    let profile = Profile::fetch(&state.firestore, &user.uid)
        .await?
        .ok_or(AppError::ProfileNotFound)?;

    let catalog = Medication::fetch_all(&state.firestore).await?;
    let priced = pricing::price_cart(&lines, &catalog);
    warn_unresolved(&user.uid, &priced);

    let processed = image::process_image(&proof)
        .map_err(|e| AppError::BadRequest(format!("Invalid proof image: {}", e)))?;
    let filename = format!("comprobante.{}", processed.extension);
    let imagen_url = state
        .storage
        .upload(&filename, &processed.data)
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?;

    let draft = build_draft(
        &user.uid,
        &profile,
        &session,
        lines,
        priced.total,
        PAYMENT_QR,
        Some(imagen_url),
    )?;
    let order = Order::create(&state.firestore, &draft).await?;

    finish_checkout(&conn, &user.uid).await;

    Ok(Json(SubmitResponse {
        order_id: order.id,
        estado: order.estado,
        total_display: pricing::format_bs(order.total),
        total: order.total,
    }))
}

/// Pull the proof image out of the multipart body. The client sends one
/// file field named `comprobante`.
async fn read_proof(multipart: &mut Multipart) -> AppResult<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to process upload: {}", e)))?
    {
        if field.name() == Some("comprobante") || field.file_name().is_some() {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

            if !data.is_empty() {
                return Ok(data.to_vec());
            }
        }
    }

    Err(AppError::MissingProof)
}

fn build_draft(
    uid: &str,
    profile: &Profile,
    session: &CheckoutSession,
    lines: Vec<CartLine>,
    total: f64,
    tipo_pago: &str,
    imagen_url: Option<String>,
) -> AppResult<OrderDraft> {
    let tipo_entrega = session.require_delivery_type()?;

    Ok(OrderDraft {
        carrito: lines,
        total,
        tipo_pago: tipo_pago.to_string(),
        tipo_entrega: tipo_entrega.to_string(),
        direccion_entrega: session.direccion_entrega.clone(),
        referencia_ubicacion: session.referencia.clone(),
        cliente_id: uid.to_string(),
        cliente_nombre: profile.full_name(),
        cliente_telefono: profile.telefono.clone().unwrap_or_default(),
        imagen_url,
    })
}

fn warn_unresolved(uid: &str, priced: &PricedCart) {
    if !priced.unresolved.is_empty() {
        tracing::warn!(
            "Order for {} excludes unresolved product ids from the total: {:?}",
            uid,
            priced.unresolved
        );
    }
}

/// Clearing is best-effort once the order document exists; a local store
/// failure here must not turn a placed order into an error.
async fn finish_checkout(conn: &Connection, uid: &str) {
    if let Err(e) = Cart::clear(conn, uid).await {
        tracing::warn!("Failed to clear cart for {}: {}", uid, e);
    }
    if let Err(e) = CheckoutSession::clear(conn, uid).await {
        tracing::warn!("Failed to clear checkout session for {}: {}", uid, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile {
            id: "uid-1".to_string(),
            nombres: "Ana María".to_string(),
            primer_apellido: "Flores".to_string(),
            segundo_apellido: None,
            email: Some("ana@example.com".to_string()),
            telefono: Some("70012345".to_string()),
            direccion: None,
            fecha_nacimiento: None,
            id_rol: None,
        }
    }

    #[test]
    fn draft_takes_customer_fields_from_the_profile() {
        let mut session = CheckoutSession::new();
        session.choose_home_delivery("Av. Arce 123".to_string(), "Portón azul".to_string(), None);

        let lines = vec![CartLine {
            id: "med-1".to_string(),
            cantidad: 2,
        }];

        let draft = build_draft(
            "uid-1",
            &profile(),
            &session,
            lines,
            12.5,
            PAYMENT_CASH,
            None,
        )
        .unwrap();

        assert_eq!(draft.cliente_id, "uid-1");
        assert_eq!(draft.cliente_nombre, "Ana María Flores");
        assert_eq!(draft.cliente_telefono, "70012345");
        assert_eq!(draft.tipo_entrega, "domicilio");
        assert_eq!(draft.direccion_entrega.as_deref(), Some("Av. Arce 123"));
        assert_eq!(draft.referencia_ubicacion.as_deref(), Some("Portón azul"));
        assert_eq!(draft.total, 12.5);
    }

    #[test]
    fn draft_for_branch_pickup_has_no_address() {
        let mut session = CheckoutSession::new();
        session.choose_branch_pickup();

        let draft = build_draft(
            "uid-1",
            &profile(),
            &session,
            vec![],
            0.0,
            PAYMENT_QR,
            Some("https://res.cloudinary.com/demo/comprobante.jpg".to_string()),
        )
        .unwrap();

        assert_eq!(draft.tipo_entrega, "sucursal");
        assert!(draft.direccion_entrega.is_none());
        assert!(draft.referencia_ubicacion.is_none());
        assert!(draft.imagen_url.is_some());
    }

    #[test]
    fn draft_without_delivery_type_is_rejected() {
        let session = CheckoutSession::new();

        let err = build_draft("uid-1", &profile(), &session, vec![], 0.0, PAYMENT_CASH, None)
            .unwrap_err();

        assert!(matches!(err, AppError::MissingDeliveryType));
    }

    #[test]
    fn missing_phone_becomes_an_empty_string() {
        let mut session = CheckoutSession::new();
        session.choose_branch_pickup();

        let mut profile = profile();
        profile.telefono = None;

        let draft =
            build_draft("uid-1", &profile, &session, vec![], 0.0, PAYMENT_CASH, None).unwrap();

        assert_eq!(draft.cliente_telefono, "");
    }
}
