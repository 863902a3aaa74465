//! core command line arguments
use clap::Parser;

/// cmd line args
#[derive(Parser, Default, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// set release environment
    #[arg(
        short,
        long,
        help = "Set release environment (dev, prod)",
        default_value = "dev"
    )]
    pub release_env: String,
    /// Token expiration in minutes
    #[arg(
        short,
        long,
        help = "Set the token expiration limit in minutes.",
        default_value = "60"
    )]
    pub token_timeout: i64,
    /// Application port
    #[arg(long, help = "Set app port", default_value = "8000")]
    pub port: u16,
    /// Auth port
    #[arg(long, help = "Set app auth port", default_value = "8043")]
    pub auth_port: u16,
    /// Account port
    #[arg(long, help = "Set app account port", default_value = "8044")]
    pub account_port: u16,
    /// Market admin port
    #[arg(long, help = "Set app market admin port", default_value = "8045")]
    pub market_port: u16,
    /// Payment and webhook port
    #[arg(long, help = "Set app payment port", default_value = "8046")]
    pub pay_port: u16,
    /// Mercado Pago API host
    #[arg(
        long,
        help = "Mercado Pago API host.",
        default_value = "https://api.mercadopago.com"
    )]
    pub mercado_pago_host: String,
    /// MelhorEnvio API host
    #[arg(
        long,
        help = "MelhorEnvio API host.",
        default_value = "https://sandbox.melhorenvio.com.br"
    )]
    pub melhor_envio_host: String,
    /// Webhook timestamp tolerance in minutes
    #[arg(
        long,
        help = "Reject webhooks with timestamps older than this many minutes.",
        default_value = "5"
    )]
    pub webhook_tolerance: i64,
    /// Origin postal code for shipping quotes
    #[arg(
        long,
        help = "Warehouse postal code used as origin for shipping quotes.",
        default_value = "01310-100"
    )]
    pub origin_postal_code: String,
    /// Remove all entries from the webhook replay log on app startup
    #[arg(
        long,
        help = "this will clear the webhook replay log from the database",
        default_value = "false"
    )]
    pub clear_webhook_log: bool,
}
