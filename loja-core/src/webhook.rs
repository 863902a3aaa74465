//! Webhook signature verification and replay suppression

use crate::{
    db::{
        self,
        DATABASE_LOCK,
    },
    error::LojaError,
    models::*,
    utils,
};
use log::{
    debug,
    error,
    info,
};
use rocket::{
    http::Status,
    outcome::Outcome,
    request,
    request::FromRequest,
    Request,
};

use hmac::{
    Hmac,
    Mac,
};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub enum Sender {
    MercadoPago,
    MelhorEnvio,
}

impl Sender {
    pub fn value(&self) -> String {
        match *self {
            Sender::MercadoPago => String::from("mercadopago"),
            Sender::MelhorEnvio => String::from("melhorenvio"),
        }
    }
}

fn get_mp_webhook_secret() -> String {
    std::env::var(crate::MP_WEBHOOK_SECRET).unwrap_or_default()
}

fn get_me_webhook_secret() -> String {
    std::env::var(crate::ME_WEBHOOK_SECRET).unwrap_or_default()
}

/// Compare a hex signature against the keyed digest of `manifest`
fn verify_hmac(secret: &str, manifest: &[u8], signature_hex: &str) -> Result<(), LojaError> {
    if secret.is_empty() {
        error!("webhook secret is not configured");
        return Err(LojaError::Webhook);
    }
    let mut mac: HmacSha256 =
        Hmac::new_from_slice(secret.as_bytes()).expect("hmac can take a key of any size");
    mac.update(manifest);
    let sig = hex::decode(signature_hex).map_err(|_| LojaError::Webhook)?;
    mac.verify_slice(&sig).map_err(|_| LojaError::Webhook)
}

/// Reject senders whose clock claim falls outside the tolerance
/// window on either side.
fn verify_window(ts: i64, now: i64) -> Result<(), LojaError> {
    let tolerance = utils::get_webhook_tolerance();
    if (now - ts).abs() > tolerance {
        error!("webhook timestamp {} outside tolerance window", ts);
        return Err(LojaError::Webhook);
    }
    Ok(())
}

/// Verify the Mercado Pago `x-signature` header. The header carries
///
/// `ts=<unix>,v1=<hex>` and the signed manifest is
///
/// `id:{data_id};request-id:{request_id};ts:{ts};`.
pub fn verify_mercadopago(
    signature_header: &str,
    request_id: &str,
    data_id: &str,
    now: i64,
) -> Result<(), LojaError> {
    let mut ts: String = String::new();
    let mut v1: String = String::new();
    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("ts", value)) => ts = String::from(value),
            Some(("v1", value)) => v1 = String::from(value),
            _ => {}
        }
    }
    if ts.is_empty() || v1.is_empty() {
        error!("malformed x-signature header");
        return Err(LojaError::Webhook);
    }
    let parsed_ts = ts.parse::<i64>().map_err(|_| LojaError::Webhook)?;
    verify_window(parsed_ts, now)?;
    let manifest = format!("id:{};request-id:{};ts:{};", data_id, request_id, ts);
    verify_hmac(&get_mp_webhook_secret(), manifest.as_bytes(), &v1)
}

/// Verify the MelhorEnvio `x-hook-signature` header, the hex
///
/// HMAC-SHA256 of the raw body, plus its timestamp header.
pub fn verify_melhorenvio(
    signature_header: &str,
    timestamp_header: &str,
    body: &[u8],
    now: i64,
) -> Result<(), LojaError> {
    let parsed_ts = timestamp_header.parse::<i64>().map_err(|_| LojaError::Webhook)?;
    verify_window(parsed_ts, now)?;
    verify_hmac(&get_me_webhook_secret(), body, signature_header)
}

fn event_key(wid: &str) -> String {
    format!("{}-{}", crate::WEBHOOK_DB_KEY, wid)
}

/// Replay suppression. Returns false when the id was already seen
///
/// inside the TTL window, true after recording a fresh delivery.
pub fn register_event(wid: &String, sender: Sender) -> Result<bool, LojaError> {
    let db = &DATABASE_LOCK;
    let k = event_key(wid);
    let now = chrono::offset::Utc::now().timestamp();
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &k.as_bytes().to_vec())?;
    if !r.is_empty() {
        let seen: WebhookEvent = bincode::deserialize(&r[..]).unwrap_or_default();
        if now - seen.received < crate::WEBHOOK_SEEN_TTL {
            info!("suppressing replayed webhook id {}", wid);
            return Ok(false);
        }
        db::DatabaseEnvironment::delete(&db.env, &db.handle, k.as_bytes())?;
    }
    let event = WebhookEvent {
        wid: String::from(wid),
        sender: sender.value(),
        received: now,
    };
    let v = bincode::serialize(&event).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, k.as_bytes(), &v)?;
    // keep the log iterable for the sweep thread
    let list_key = crate::WEBHOOK_LIST_DB_KEY;
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &list_key.as_bytes().to_vec())?;
    let old: String = bincode::deserialize(&r[..]).unwrap_or_default();
    if !old.split(",").any(|w| w == wid.as_str()) {
        let event_list = if old.is_empty() {
            String::from(wid)
        } else {
            [old, String::from(wid)].join(",")
        };
        let s_list = bincode::serialize(&event_list).unwrap_or_default();
        db::DatabaseEnvironment::delete(&db.env, &db.handle, list_key.as_bytes())?;
        db::write_chunks(&db.env, &db.handle, list_key.as_bytes(), &s_list)?;
    }
    Ok(true)
}

/// Drop expired rows from the replay log and rewrite its index
pub fn sweep_expired() -> Result<(), LojaError> {
    let db = &DATABASE_LOCK;
    let list_key = crate::WEBHOOK_LIST_DB_KEY;
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &list_key.as_bytes().to_vec())?;
    let de: String = bincode::deserialize(&r[..]).unwrap_or_default();
    if de.is_empty() {
        return Ok(());
    }
    let now = chrono::offset::Utc::now().timestamp();
    let mut kept: Vec<String> = Vec::new();
    for wid in de.split(",").filter(|w| !w.is_empty()) {
        let k = event_key(wid);
        let row = db::DatabaseEnvironment::read(&db.env, &db.handle, &k.as_bytes().to_vec())?;
        if row.is_empty() {
            continue;
        }
        let event: WebhookEvent = bincode::deserialize(&row[..]).unwrap_or_default();
        if now - event.received < crate::WEBHOOK_SEEN_TTL {
            kept.push(String::from(wid));
        } else {
            debug!("sweeping expired webhook id {}", wid);
            db::DatabaseEnvironment::delete(&db.env, &db.handle, k.as_bytes())?;
        }
    }
    let joined = kept.join(",");
    let s_list = bincode::serialize(&joined).unwrap_or_default();
    db::DatabaseEnvironment::delete(&db.env, &db.handle, list_key.as_bytes())?;
    db::write_chunks(&db.env, &db.handle, list_key.as_bytes(), &s_list)?;
    Ok(())
}

/// Periodic replay-log sweep, run from a dedicated thread
pub fn sweep_event_log() {
    let tick: std::sync::mpsc::Receiver<()> =
        schedule_recv::periodic_ms(crate::WEBHOOK_SWEEP_INTERVAL);
    loop {
        if tick.recv().is_err() {
            error!("webhook sweep timer failed");
            return;
        }
        debug!("running webhook replay-log sweep");
        if let Err(e) = sweep_expired() {
            error!("webhook sweep failed: {}", e);
        }
    }
}

/// Remove every row of the replay log, `--clear-webhook-log`
pub fn clear_event_log() -> Result<(), LojaError> {
    info!("clearing webhook replay log");
    let db = &DATABASE_LOCK;
    let list_key = crate::WEBHOOK_LIST_DB_KEY;
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &list_key.as_bytes().to_vec())?;
    let de: String = bincode::deserialize(&r[..]).unwrap_or_default();
    for wid in de.split(",").filter(|w| !w.is_empty()) {
        let k = event_key(wid);
        db::DatabaseEnvironment::delete(&db.env, &db.handle, k.as_bytes()).unwrap_or(());
    }
    if !de.is_empty() {
        db::DatabaseEnvironment::delete(&db.env, &db.handle, list_key.as_bytes())?;
    }
    Ok(())
}

/// Mercado Pago notification headers
#[derive(Debug)]
pub struct MpSignature {
    pub signature: String,
    pub request_id: String,
}

#[derive(Debug)]
pub enum SignatureError {
    Missing,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for MpSignature {
    type Error = SignatureError;

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let signature = request.headers().get_one("x-signature");
        let request_id = request.headers().get_one("x-request-id");
        match (signature, request_id) {
            (Some(signature), Some(request_id)) => Outcome::Success(MpSignature {
                signature: String::from(signature),
                request_id: String::from(request_id),
            }),
            _ => Outcome::Error((Status::Unauthorized, SignatureError::Missing)),
        }
    }
}

/// MelhorEnvio notification headers
#[derive(Debug)]
pub struct MeSignature {
    pub signature: String,
    pub timestamp: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for MeSignature {
    type Error = SignatureError;

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let signature = request.headers().get_one("x-hook-signature");
        let timestamp = request.headers().get_one("x-hook-timestamp");
        match (signature, timestamp) {
            (Some(signature), Some(timestamp)) => Outcome::Success(MeSignature {
                signature: String::from(signature),
                timestamp: String::from(timestamp),
            }),
            _ => Outcome::Error((Status::Unauthorized, SignatureError::Missing)),
        }
    }
}

// Tests
//-------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MP_SECRET: &str = "mp_test_secret";
    const ME_SECRET: &str = "me_test_secret";

    fn sign(secret: &str, manifest: &[u8]) -> String {
        let mut mac: HmacSha256 = Hmac::new_from_slice(secret.as_bytes()).expect("hmac");
        mac.update(manifest);
        hex::encode(mac.finalize().into_bytes())
    }

    fn set_secrets() {
        std::env::set_var(crate::MP_WEBHOOK_SECRET, MP_SECRET);
        std::env::set_var(crate::ME_WEBHOOK_SECRET, ME_SECRET);
    }

    #[test]
    fn mercadopago_valid_signature_test() {
        set_secrets();
        let now = chrono::offset::Utc::now().timestamp();
        let manifest = format!("id:12345;request-id:req-1;ts:{};", now);
        let header = format!("ts={},v1={}", now, sign(MP_SECRET, manifest.as_bytes()));
        let ok = verify_mercadopago(&header, "req-1", "12345", now);
        assert!(ok.is_ok());
    }

    #[test]
    fn mercadopago_tampered_id_test() {
        set_secrets();
        let now = chrono::offset::Utc::now().timestamp();
        let manifest = format!("id:12345;request-id:req-1;ts:{};", now);
        let header = format!("ts={},v1={}", now, sign(MP_SECRET, manifest.as_bytes()));
        // signed for payment 12345, delivered for 99999
        let tampered = verify_mercadopago(&header, "req-1", "99999", now);
        assert!(tampered.is_err());
    }

    #[test]
    fn mercadopago_stale_timestamp_test() {
        set_secrets();
        let now = chrono::offset::Utc::now().timestamp();
        let old = now - utils::get_webhook_tolerance() - 60;
        let manifest = format!("id:12345;request-id:req-1;ts:{};", old);
        let header = format!("ts={},v1={}", old, sign(MP_SECRET, manifest.as_bytes()));
        let stale = verify_mercadopago(&header, "req-1", "12345", now);
        assert!(stale.is_err());
    }

    #[test]
    fn mercadopago_malformed_header_test() {
        set_secrets();
        let now = chrono::offset::Utc::now().timestamp();
        let missing = verify_mercadopago("v1=abcd", "req-1", "12345", now);
        assert!(missing.is_err());
        let garbage = verify_mercadopago("ts=xx,v1=zz", "req-1", "12345", now);
        assert!(garbage.is_err());
    }

    #[test]
    fn melhorenvio_signature_test() {
        set_secrets();
        let now = chrono::offset::Utc::now().timestamp();
        let body = br#"{"id":"ev-1","event":"tracking.posted"}"#;
        let header = sign(ME_SECRET, body);
        let ok = verify_melhorenvio(&header, &now.to_string(), body, now);
        assert!(ok.is_ok());
        // modified payload fails
        let modified = br#"{"id":"ev-1","event":"tracking.delivered"}"#;
        let tampered = verify_melhorenvio(&header, &now.to_string(), modified, now);
        assert!(tampered.is_err());
    }

    #[test]
    fn replay_suppression_test() -> Result<(), LojaError> {
        let wid = format!("req-{}", utils::generate_rnd());
        let first = register_event(&wid, Sender::MercadoPago)?;
        assert!(first);
        let replay = register_event(&wid, Sender::MercadoPago)?;
        assert!(!replay);
        // cleanup
        let db = &DATABASE_LOCK;
        db::DatabaseEnvironment::delete(&db.env, &db.handle, event_key(&wid).as_bytes())?;
        Ok(())
    }

    #[test]
    fn sweep_expired_test() -> Result<(), LojaError> {
        let wid = format!("req-{}", utils::generate_rnd());
        // forge a row already past the TTL
        let db = &DATABASE_LOCK;
        let expired = WebhookEvent {
            wid: String::from(&wid),
            sender: Sender::MelhorEnvio.value(),
            received: chrono::offset::Utc::now().timestamp() - crate::WEBHOOK_SEEN_TTL - 1,
        };
        let v = bincode::serialize(&expired).unwrap_or_default();
        db::write_chunks(&db.env, &db.handle, event_key(&wid).as_bytes(), &v)?;
        let list_key = crate::WEBHOOK_LIST_DB_KEY;
        let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &list_key.as_bytes().to_vec())?;
        let old: String = bincode::deserialize(&r[..]).unwrap_or_default();
        let joined = if old.is_empty() {
            String::from(&wid)
        } else {
            [old, String::from(&wid)].join(",")
        };
        let s_list = bincode::serialize(&joined).unwrap_or_default();
        db::DatabaseEnvironment::delete(&db.env, &db.handle, list_key.as_bytes())?;
        db::write_chunks(&db.env, &db.handle, list_key.as_bytes(), &s_list)?;
        sweep_expired()?;
        let gone =
            db::DatabaseEnvironment::read(&db.env, &db.handle, &event_key(&wid).as_bytes().to_vec())?;
        assert!(gone.is_empty());
        // an expired id is accepted again as a fresh delivery
        let fresh = register_event(&wid, Sender::MelhorEnvio)?;
        assert!(fresh);
        db::DatabaseEnvironment::delete(&db.env, &db.handle, event_key(&wid).as_bytes())?;
        Ok(())
    }
}
