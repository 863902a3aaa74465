pub mod address;
pub mod args;
pub mod auth;
pub mod cache;
pub mod card;
pub mod coupon;
pub mod customer;
pub mod db;
pub mod error;
pub mod favorite;
pub mod models;
pub mod order;
pub mod payment;
pub mod product;
pub mod reqres;
pub mod review;
pub mod shipping;
pub mod testimonial;
pub mod utils;
pub mod webhook;

pub const APP_NAME: &str = "loja";
pub const LOJA_JWT_SECRET_KEY: &str = "LOJA_JWT_SECRET_KEY";

// LMDB Keys
pub const ADDRESS_DB_KEY:               &str = "ad";
pub const ADDRESS_LIST_DB_KEY:          &str = "adl";
pub const CACHE_DB_KEY:                 &str = "cache";
pub const CARD_DB_KEY:                  &str = "cc";
pub const CARD_LIST_DB_KEY:             &str = "ccl";
pub const COUPON_DB_KEY:                &str = "cpn";
pub const COUPON_LIST_DB_KEY:           &str = "cpnl";
pub const CUSTOMER_DB_KEY:              &str = "c";
pub const CUSTOMER_EMAIL_DB_KEY:        &str = "email";
pub const CUSTOMER_ORDER_LIST_DB_KEY:   &str = "olc";
pub const FAVORITE_LIST_DB_KEY:         &str = "favl";
pub const MP_PAYMENT_DB_KEY:            &str = "mp";
pub const ORDER_DB_KEY:                 &str = "o";
pub const ORDER_LIST_DB_KEY:            &str = "ol";
pub const PAYMENT_DB_KEY:               &str = "pay";
pub const PAYMENT_LIST_DB_KEY:          &str = "payl";
pub const PRODUCT_DB_KEY:               &str = "p";
pub const PRODUCT_LIST_DB_KEY:          &str = "pl";
pub const REVIEW_DB_KEY:                &str = "rev";
pub const REVIEW_LIST_DB_KEY:           &str = "revl";
pub const TESTIMONIAL_DB_KEY:           &str = "t";
pub const TESTIMONIAL_LIST_DB_KEY:      &str = "tl";
pub const TRACKING_DB_KEY:              &str = "trk";
pub const WEBHOOK_DB_KEY:               &str = "wh";
pub const WEBHOOK_LIST_DB_KEY:          &str = "whl";
// End LMDB Keys

/// Cache key for the public catalog listing
pub const CATALOG_CACHE_KEY: &str = "catalog";

/// Environment variable for the Mercado Pago access token
pub const MP_ACCESS_TOKEN: &str = "MP_ACCESS_TOKEN";
/// Environment variable for the Mercado Pago webhook secret
pub const MP_WEBHOOK_SECRET: &str = "MP_WEBHOOK_SECRET";
/// Environment variable for the MelhorEnvio access token
pub const ME_ACCESS_TOKEN: &str = "ME_ACCESS_TOKEN";
/// Environment variable for the MelhorEnvio webhook secret
pub const ME_WEBHOOK_SECRET: &str = "ME_WEBHOOK_SECRET";

/// Seconds a processed webhook id stays in the replay log
pub const WEBHOOK_SEEN_TTL: i64 = 60 * 30;
/// Webhook replay log sweep interval
pub const WEBHOOK_SWEEP_INTERVAL: u32 = 1000 * 60 * 5;
/// Seconds a cached catalog listing stays fresh
pub const CATALOG_CACHE_TTL: i64 = 60 * 5;
/// Absolute tolerance in BRL when comparing a submitted charge
/// amount against the recomputed order total
pub const PAYMENT_AMOUNT_TOLERANCE: f64 = 0.02;
/// Default app port
pub const DEFAULT_APP_PORT: u16 = 8000;
// DO NOT EDIT BELOW THIS LINE
