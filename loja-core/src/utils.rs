use crate::{
    args,
    db::{
        self,
        DATABASE_LOCK,
    },
    error::LojaError,
    models,
    reqres,
    webhook,
};
use clap::Parser;
use log::{
    error,
    info,
};
use rand_core::RngCore;
use rocket::serde::json::Json;

#[derive(Debug, PartialEq)]
pub enum ReleaseEnvironment {
    Development,
    Production,
}

impl ReleaseEnvironment {
    pub fn value(&self) -> String {
        match *self {
            ReleaseEnvironment::Development => String::from("development"),
            ReleaseEnvironment::Production => String::from("production"),
        }
    }
}

/// Random data generation for primary keys and salts
pub fn generate_rnd() -> String {
    let mut data = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut data);
    hex::encode(data)
}

/// Helper for separation of dev and prod concerns
pub fn get_release_env() -> ReleaseEnvironment {
    let args = args::Args::parse();
    let env = String::from(args.release_env);
    if env == "prod" {
        ReleaseEnvironment::Production
    } else {
        ReleaseEnvironment::Development
    }
}

/// storefront port
pub fn get_app_port() -> u16 {
    let args = args::Args::parse();
    args.port
}

/// app auth port
pub fn get_app_auth_port() -> u16 {
    let args = args::Args::parse();
    args.auth_port
}

/// app account port
pub fn get_app_account_port() -> u16 {
    let args = args::Args::parse();
    args.account_port
}

/// app market admin port
pub fn get_app_market_port() -> u16 {
    let args = args::Args::parse();
    args.market_port
}

/// app payment port
pub fn get_app_pay_port() -> u16 {
    let args = args::Args::parse();
    args.pay_port
}

/// Mercado Pago API host
pub fn get_mercado_pago_host() -> String {
    let args = args::Args::parse();
    args.mercado_pago_host
}

/// MelhorEnvio API host
pub fn get_melhor_envio_host() -> String {
    let args = args::Args::parse();
    args.melhor_envio_host
}

/// webhook timestamp tolerance in seconds
pub fn get_webhook_tolerance() -> i64 {
    let args = args::Args::parse();
    args.webhook_tolerance * 60
}

/// warehouse postal code used as quote origin
pub fn get_origin_postal_code() -> String {
    let args = args::Args::parse();
    args.origin_postal_code
}

// DoS prevention
pub const fn string_limit() -> usize {
    512
}
pub const fn image_limit() -> usize {
    4096
}

/// Round a BRL amount to cents
pub fn round_brl(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// convert customer to json so only core module does the work
pub fn customer_to_json(c: &models::Customer) -> Json<reqres::CustomerResponse> {
    let r_customer: reqres::CustomerResponse = reqres::CustomerResponse {
        cid: String::from(&c.cid),
        email: String::from(&c.email),
        name: String::from(&c.name),
        phone: String::from(&c.phone),
        created: c.created,
    };
    Json(r_customer)
}

/// convert card to json, masking everything but the last four digits
pub fn card_to_json(c: &models::Card) -> Json<reqres::CardResponse> {
    let r_card: reqres::CardResponse = reqres::CardResponse {
        ccid: String::from(&c.ccid),
        brand: String::from(&c.brand),
        holder: String::from(&c.holder),
        masked_number: format!("**** **** **** {}", c.last4),
        exp_month: c.exp_month,
        exp_year: c.exp_year,
    };
    Json(r_card)
}

/// Secret key for signing auth tokens, generated once and persisted
pub fn gen_signing_keys() -> Result<(), LojaError> {
    info!("generating signing keys");
    let jwt = get_jwt_secret_key();
    if jwt.unwrap_or_default().is_empty() {
        let rnd_jwt = generate_rnd();
        let db = &DATABASE_LOCK;
        let v = bincode::serialize(&rnd_jwt).unwrap_or_default();
        db::write_chunks(&db.env, &db.handle, crate::LOJA_JWT_SECRET_KEY.as_bytes(), &v)?;
    }
    Ok(())
}

pub fn get_jwt_secret_key() -> Result<String, LojaError> {
    let db = &DATABASE_LOCK;
    let r = db::DatabaseEnvironment::read(
        &db.env,
        &db.handle,
        &crate::LOJA_JWT_SECRET_KEY.as_bytes().to_vec(),
    )?;
    if r.is_empty() {
        error!("JWT key not found");
        return Ok(Default::default());
    }
    let key: String = bincode::deserialize(&r[..]).unwrap_or_default();
    Ok(key)
}

/// Bootstrap signing keys and startup maintenance
pub async fn start_up() -> Result<(), LojaError> {
    info!("{} is starting up", crate::APP_NAME);
    gen_signing_keys()?;
    let args = args::Args::parse();
    if args.clear_webhook_log {
        webhook::clear_event_log()?;
    }
    info!("{} startup complete", crate::APP_NAME);
    Ok(())
}

// Tests
//-------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_brl_test() {
        assert_eq!(round_brl(10.006), 10.01);
        assert_eq!(round_brl(10.004), 10.0);
        assert_eq!(round_brl(0.1 + 0.2), 0.3);
    }

    #[test]
    fn card_to_json_test() {
        let card = models::Card {
            ccid: String::from("cc123"),
            cid: String::from("c123"),
            token: String::from("tok_secret"),
            brand: String::from("visa"),
            holder: String::from("MARIA SILVA"),
            last4: String::from("4242"),
            exp_month: 11,
            exp_year: 2030,
        };
        let masked = card_to_json(&card);
        assert_eq!(masked.masked_number, "**** **** **** 4242");
        // the gateway token never leaves the model
        let raw = serde_json::to_string(&masked.0).unwrap();
        assert!(!raw.contains("tok_secret"));
    }

    #[test]
    fn generate_rnd_test() {
        let a = generate_rnd();
        let b = generate_rnd();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
