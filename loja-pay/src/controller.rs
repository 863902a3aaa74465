use rocket::{
    get,
    http::Status,
    post,
    response::status::Custom,
    serde::json::Json,
};

use loja_core::*;

// JSON APIs

/// Charge a pending order. The submitted amount is verified
///
/// against the stored order before the gateway sees it.
#[post("/create", data = "<req_charge>")]
pub async fn create_charge(
    req_charge: Json<reqres::ChargeRequest>,
    _token: auth::BearerToken,
) -> Custom<Json<models::Payment>> {
    match payment::create_charge(req_charge).await {
        Ok(p) => Custom(Status::Created, Json(p)),
        Err(_) => Custom(Status::BadRequest, Json(Default::default())),
    }
}

/// Get a payment by passing id
#[get("/<payid>")]
pub async fn get_payment(
    payid: String,
    _token: auth::BearerToken,
) -> Custom<Json<models::Payment>> {
    let m_payment = payment::find(&payid);
    Custom(Status::Ok, Json(m_payment.unwrap_or_default()))
}

/// Generate a shipping label for a paid order
#[post("/label/<orid>")]
pub async fn create_label(
    orid: String,
    _token: auth::BearerToken,
) -> Custom<Json<reqres::LabelResponse>> {
    match shipping::create_label(&orid).await {
        Ok(l) => Custom(Status::Created, Json(l)),
        Err(_) => Custom(Status::BadRequest, Json(Default::default())),
    }
}

/// Carrier tracking for an order
#[get("/track/<orid>")]
pub async fn track_order(
    orid: String,
    _token: auth::BearerToken,
) -> Custom<Json<reqres::TrackingResponse>> {
    match shipping::track(&orid).await {
        Ok(t) => Custom(Status::Ok, Json(t)),
        Err(_) => Custom(Status::BadRequest, Json(Default::default())),
    }
}

/// Mercado Pago payment notifications.
///
/// The signature covers the notified data id, the delivery id in
///
/// `x-request-id` feeds the replay log, and the payment status is
///
/// fetched back from the gateway rather than trusted from the body.
#[post("/mercadopago", data = "<payload>")]
pub async fn mp_webhook(
    sig: webhook::MpSignature,
    payload: Json<reqres::MpWebhookPayload>,
) -> Custom<Json<reqres::WebhookAck>> {
    let now = chrono::offset::Utc::now().timestamp();
    if webhook::verify_mercadopago(&sig.signature, &sig.request_id, &payload.data.id, now).is_err()
    {
        return Custom(Status::Unauthorized, Json(Default::default()));
    }
    let fresh = webhook::register_event(&sig.request_id, webhook::Sender::MercadoPago)
        .unwrap_or_default();
    if !fresh {
        // replayed delivery, already handled
        return Custom(Status::Ok, Json(reqres::WebhookAck { received: true }));
    }
    let remote = payment::fetch_remote_status(&payload.data.id).await;
    if remote.id == 0 {
        return Custom(Status::BadRequest, Json(Default::default()));
    }
    match payment::apply_status(&payload.data.id, &remote.status).await {
        Ok(_) => Custom(Status::Ok, Json(reqres::WebhookAck { received: true })),
        Err(_) => Custom(Status::BadRequest, Json(Default::default())),
    }
}

/// MelhorEnvio tracking notifications. The signature is the keyed
///
/// digest of the raw body, so the body is deserialized only after
///
/// verification.
#[post("/melhorenvio", data = "<body>")]
pub async fn me_webhook(
    sig: webhook::MeSignature,
    body: String,
) -> Custom<Json<reqres::WebhookAck>> {
    let now = chrono::offset::Utc::now().timestamp();
    if webhook::verify_melhorenvio(&sig.signature, &sig.timestamp, body.as_bytes(), now).is_err() {
        return Custom(Status::Unauthorized, Json(Default::default()));
    }
    let payload: reqres::MeWebhookPayload = match serde_json::from_str(&body) {
        Ok(p) => p,
        Err(_) => return Custom(Status::BadRequest, Json(Default::default())),
    };
    let fresh = webhook::register_event(&payload.id, webhook::Sender::MelhorEnvio)
        .unwrap_or_default();
    if !fresh {
        return Custom(Status::Ok, Json(reqres::WebhookAck { received: true }));
    }
    let f_order = match shipping::find_order_by_tracking(&payload.data.tracking) {
        Ok(o) => o,
        Err(_) => return Custom(Status::BadRequest, Json(Default::default())),
    };
    let applied = match payload.event.as_str() {
        "tracking.delivered" => {
            order::update_status(&f_order.orid, order::StatusType::Delivered)
        }
        _ => {
            log::debug!("ignoring carrier event {}", &payload.event);
            Ok(f_order)
        }
    };
    match applied {
        Ok(_) => Custom(Status::Ok, Json(reqres::WebhookAck { received: true })),
        Err(_) => Custom(Status::BadRequest, Json(Default::default())),
    }
}
// END JSON APIs
