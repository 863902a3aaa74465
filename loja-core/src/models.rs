//! Structs stored in LMDB with bincode

use rocket::serde::{
    json::Json,
    Deserialize,
    Serialize,
};

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Customer {
    pub cid: String,
    pub created: i64,
    pub email: String,
    pub name: String,
    pub phone: String,
    /// hex-encoded random salt for the credential digest
    pub salt: String,
    /// hex-encoded HMAC-SHA384 of the password
    pub digest: String,
}

impl Customer {
    pub fn update(c: Customer, name: String, phone: String) -> Customer {
        Customer {
            cid: c.cid,
            created: c.created,
            email: c.email,
            name,
            phone,
            salt: c.salt,
            digest: c.digest,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Product {
    pub pid: String,
    pub category: String,
    pub description: String,
    pub image: Vec<u8>,
    pub in_stock: bool,
    pub name: String,
    pub price: f64,
    pub qty: u64,
    /// grams, for shipping quotes
    pub weight: u64,
    /// centimeters, for shipping quotes
    pub width: u64,
    pub height: u64,
    pub length: u64,
}

impl Product {
    pub fn update(p: Product, jp: &Json<Product>) -> Product {
        Product {
            pid: p.pid,
            category: String::from(&jp.category),
            description: String::from(&jp.description),
            image: jp.image.to_vec(),
            in_stock: jp.in_stock,
            name: String::from(&jp.name),
            price: jp.price,
            qty: jp.qty,
            weight: jp.weight,
            width: jp.width,
            height: jp.height,
            length: jp.length,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Address {
    pub aid: String,
    pub cid: String,
    pub label: String,
    pub street: String,
    pub number: String,
    pub complement: String,
    pub district: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub is_default: bool,
}

impl Address {
    pub fn update(a: Address, ja: &Json<Address>) -> Address {
        Address {
            aid: a.aid,
            cid: a.cid,
            label: String::from(&ja.label),
            street: String::from(&ja.street),
            number: String::from(&ja.number),
            complement: String::from(&ja.complement),
            district: String::from(&ja.district),
            city: String::from(&ja.city),
            state: String::from(&ja.state),
            postal_code: String::from(&ja.postal_code),
            is_default: ja.is_default,
        }
    }
}

/// Only the gateway token and display data are kept. The primary
/// account number never reaches this struct.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Card {
    pub ccid: String,
    pub cid: String,
    pub token: String,
    pub brand: String,
    pub holder: String,
    pub last4: String,
    pub exp_month: u32,
    pub exp_year: u32,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Coupon {
    pub code: String,
    /// "percent" or "fixed"
    pub kind: String,
    pub value: f64,
    pub min_subtotal: f64,
    pub expires_at: i64,
    pub usage_limit: u64,
    pub used: u64,
    pub active: bool,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct OrderItem {
    pub pid: String,
    pub name: String,
    /// unit price in BRL at placement time
    pub price: f64,
    pub quantity: u64,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Order {
    pub orid: String,
    pub cid: String,
    /// shipping address id
    pub aid: String,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    pub coupon_code: String,
    pub discount: f64,
    pub shipping_service: String,
    pub shipping_cost: f64,
    pub total: f64,
    pub status: String,
    pub payid: String,
    /// MelhorEnvio label id once generated
    pub label_id: String,
    pub tracking_code: String,
    pub created: i64,
    pub updated: i64,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Review {
    pub rid: String,
    pub cid: String,
    pub pid: String,
    pub rating: u32,
    pub comment: String,
    pub created: i64,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Testimonial {
    pub tid: String,
    pub cid: String,
    pub author: String,
    pub body: String,
    pub approved: bool,
    pub created: i64,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Payment {
    pub payid: String,
    pub orid: String,
    /// id assigned by Mercado Pago
    pub mp_id: String,
    pub status: String,
    pub amount: f64,
    pub payment_method: String,
    pub created: i64,
}

impl Payment {
    pub fn update_status(p: Payment, status: String) -> Payment {
        Payment {
            payid: p.payid,
            orid: p.orid,
            mp_id: p.mp_id,
            status,
            amount: p.amount,
            payment_method: p.payment_method,
            created: p.created,
        }
    }
}

/// One row of the webhook replay log
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct WebhookEvent {
    pub wid: String,
    pub sender: String,
    pub received: i64,
}
