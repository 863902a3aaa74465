//! Structs for all http requests

use serde::{
    Deserialize,
    Serialize,
};

// All http requests and responses are here

// START Auth Structs

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct TokenResponse {
    pub cid: String,
    pub token: String,
}

// END Auth Structs

// START Customer-facing Structs

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct CustomerResponse {
    pub cid: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub created: i64,
}

/// Masked card as rendered back to the customer
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct CardResponse {
    pub ccid: String,
    pub brand: String,
    pub holder: String,
    pub masked_number: String,
    pub exp_month: u32,
    pub exp_year: u32,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct CartItem {
    pub pid: String,
    pub quantity: u64,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct OrderRequest {
    pub cid: String,
    pub aid: String,
    pub items: Vec<CartItem>,
    pub coupon_code: String,
    pub shipping_service: String,
    pub shipping_cost: f64,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct CouponCheckRequest {
    pub code: String,
    pub subtotal: f64,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct CouponCheckResponse {
    pub code: String,
    pub valid: bool,
    pub discount: f64,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct FavoriteRequest {
    pub cid: String,
    pub pid: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct RatingSummary {
    pub pid: String,
    pub count: u64,
    pub average: f64,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct HealthResponse {
    pub up: bool,
}

// END Customer-facing Structs

// START Payment Structs
// Reference: https://www.mercadopago.com.br/developers/en/reference/payments/_payments/post

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct ChargeRequest {
    pub orid: String,
    /// total the client believes it is paying, verified server-side
    pub amount: f64,
    pub card_token: String,
    pub payment_method_id: String,
    pub installments: u32,
    pub email: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MpPayer {
    pub email: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MpPaymentRequest {
    pub transaction_amount: f64,
    pub token: String,
    pub description: String,
    pub installments: u32,
    pub payment_method_id: String,
    pub payer: MpPayer,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MpPaymentResponse {
    pub id: u64,
    pub status: String,
    pub status_detail: String,
    pub transaction_amount: f64,
}

/// Notification body posted by Mercado Pago
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MpWebhookData {
    pub id: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MpWebhookPayload {
    pub action: String,
    pub data: MpWebhookData,
}

// END Payment Structs

// START Shipping Structs
// Reference: https://docs.melhorenvio.com.br/reference/calculo-de-fretes-por-produtos

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct QuoteRequest {
    pub to_postal_code: String,
    pub items: Vec<CartItem>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct ShippingService {
    pub id: u32,
    pub name: String,
    pub price: f64,
    pub delivery_days: u32,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MePostal {
    pub postal_code: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MeProductDims {
    pub id: String,
    pub width: u64,
    pub height: u64,
    pub length: u64,
    /// kilograms
    pub weight: f64,
    pub insurance_value: f64,
    pub quantity: u64,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MeCalculateRequest {
    pub from: MePostal,
    pub to: MePostal,
    pub products: Vec<MeProductDims>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MeCalculateResponse {
    pub id: u32,
    pub name: String,
    /// decimal string, e.g. "21.03"
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub delivery_time: u32,
    #[serde(default)]
    pub error: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MeCartItemRequest {
    pub service: u32,
    pub from: MePostal,
    pub to: MePostal,
    pub products: Vec<MeProductDims>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MeCartItemResponse {
    pub id: String,
    #[serde(default)]
    pub protocol: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MeCheckoutRequest {
    pub orders: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MeCheckoutOrder {
    pub id: String,
    #[serde(default)]
    pub tracking: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MeCheckoutPurchase {
    #[serde(default)]
    pub orders: Vec<MeCheckoutOrder>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MeCheckoutResponse {
    #[serde(default)]
    pub purchase: MeCheckoutPurchase,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MeTrackingResponse {
    pub id: String,
    #[serde(default)]
    pub tracking: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct TrackingResponse {
    pub orid: String,
    pub tracking_code: String,
    pub status: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct LabelResponse {
    pub orid: String,
    pub label_id: String,
    pub tracking_code: String,
}

/// Notification body posted by MelhorEnvio
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MeWebhookData {
    pub tracking: String,
    pub status: String,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct MeWebhookPayload {
    pub id: String,
    pub event: String,
    pub data: MeWebhookData,
}

// END Shipping Structs

/// Ack body returned to webhook senders
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct WebhookAck {
    pub received: bool,
}
