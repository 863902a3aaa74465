//! Mercado Pago charge processing and order integrity checks

use crate::{
    coupon,
    db::{
        self,
        DATABASE_LOCK,
    },
    error::LojaError,
    models::*,
    order,
    reqres,
    utils,
};
use kn0sys_lmdb_rs::MdbError;
use log::{
    debug,
    error,
    info,
};
use rocket::serde::json::Json;

enum MpFields {
    Payments,
}

impl MpFields {
    pub fn value(&self) -> String {
        match *self {
            MpFields::Payments => String::from("/v1/payments"),
        }
    }
}

pub enum MpStatus {
    Approved,
    Cancelled,
    Rejected,
}

impl MpStatus {
    pub fn value(&self) -> String {
        match *self {
            MpStatus::Approved => String::from("approved"),
            MpStatus::Cancelled => String::from("cancelled"),
            MpStatus::Rejected => String::from("rejected"),
        }
    }
}

fn get_mp_access_token() -> String {
    std::env::var(crate::MP_ACCESS_TOKEN).unwrap_or_default()
}

/// Server-side recomputation of the order amounts prior to charging.
///
/// The subtotal comes from the stored item rows, the discount is
///
/// recomputed from the stored coupon and the total adds the stored
///
/// shipping cost. The submitted amount must match the recomputed
///
/// total within `PAYMENT_AMOUNT_TOLERANCE`.
pub fn verify_charge_amount(f_order: &Order, submitted: f64) -> bool {
    let mut subtotal: f64 = 0.0;
    for item in &f_order.items {
        subtotal += item.price * item.quantity as f64;
    }
    subtotal = utils::round_brl(subtotal);
    let discount = if f_order.coupon_code.is_empty() {
        0.0
    } else {
        coupon::validate(&f_order.coupon_code, subtotal).unwrap_or(0.0)
    };
    let total = utils::round_brl(subtotal - discount + f_order.shipping_cost);
    let delta = (total - submitted).abs();
    if delta > crate::PAYMENT_AMOUNT_TOLERANCE {
        error!(
            "charge amount mismatch for order {}: submitted {} recomputed {}",
            &f_order.orid, submitted, total
        );
        return false;
    }
    true
}

/// Charge an order through Mercado Pago. The submitted amount is
///
/// verified against the stored order before any network call and
///
/// the recomputed total is what gets charged.
pub async fn create_charge(j: Json<reqres::ChargeRequest>) -> Result<Payment, LojaError> {
    info!("creating charge for order: {}", &j.orid);
    let f_order: Order = order::find(&j.orid)?;
    if f_order.status != order::StatusType::Pending.value() {
        error!("order {} is not awaiting payment", &f_order.orid);
        return Err(LojaError::Payment);
    }
    if !verify_charge_amount(&f_order, j.amount) {
        return Err(LojaError::Payment);
    }
    let req = reqres::MpPaymentRequest {
        transaction_amount: f_order.total,
        token: String::from(&j.card_token),
        description: format!("order {}", &f_order.orid),
        installments: j.installments,
        payment_method_id: String::from(&j.payment_method_id),
        payer: reqres::MpPayer {
            email: String::from(&j.email),
        },
    };
    let host = utils::get_mercado_pago_host();
    let client = reqwest::Client::new();
    let res = match client
        .post(format!("{}{}", host, MpFields::Payments.value()))
        .bearer_auth(get_mp_access_token())
        .header("X-Idempotency-Key", utils::generate_rnd())
        .json(&req)
        .send()
        .await
    {
        Ok(response) => {
            let res = response.json::<reqres::MpPaymentResponse>().await;
            debug!("{} response: {:?}", MpFields::Payments.value(), res);
            match res {
                Ok(res) => res,
                _ => Default::default(),
            }
        }
        Err(e) => {
            error!("failed to create charge due to: {:?}", e);
            return Err(LojaError::Payment);
        }
    };
    if res.id == 0 {
        error!("gateway rejected the charge for order {}", &f_order.orid);
        return Err(LojaError::Payment);
    }
    let payid: String = format!("{}{}", crate::PAYMENT_DB_KEY, utils::generate_rnd());
    let new_payment = Payment {
        payid: String::from(&payid),
        orid: String::from(&f_order.orid),
        mp_id: res.id.to_string(),
        status: String::from(&res.status),
        amount: f_order.total,
        payment_method: String::from(&j.payment_method_id),
        created: chrono::offset::Utc::now().timestamp(),
    };
    debug!("insert payment: {}", &new_payment.payid);
    let db = &DATABASE_LOCK;
    let v = bincode::serialize(&new_payment).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, new_payment.payid.as_bytes(), &v)?;
    // secondary key so webhooks can find the payment by gateway id
    let mp_k = format!("{}-{}", crate::MP_PAYMENT_DB_KEY, &new_payment.mp_id);
    let mp_v = bincode::serialize(&payid).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, mp_k.as_bytes(), &mp_v)?;
    let list_key = crate::PAYMENT_LIST_DB_KEY;
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &list_key.as_bytes().to_vec())?;
    let old: String = bincode::deserialize(&r[..]).unwrap_or_default();
    let payment_list = if old.is_empty() {
        String::from(&payid)
    } else {
        [old, String::from(&payid)].join(",")
    };
    let s_list = bincode::serialize(&payment_list).unwrap_or_default();
    db::DatabaseEnvironment::delete(&db.env, &db.handle, list_key.as_bytes())?;
    db::write_chunks(&db.env, &db.handle, list_key.as_bytes(), &s_list)?;
    order::attach_payment(&f_order.orid, &payid)?;
    // synchronous approval, e.g. test cards
    if res.status == MpStatus::Approved.value() {
        apply_status(&new_payment.mp_id, &res.status).await?;
    }
    Ok(new_payment)
}

/// Payment lookup
pub fn find(payid: &String) -> Result<Payment, LojaError> {
    let db = &DATABASE_LOCK;
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &payid.as_bytes().to_vec())?;
    if r.is_empty() {
        error!("payment not found");
        return Err(LojaError::Database(MdbError::NotFound));
    }
    let result: Payment = bincode::deserialize(&r[..]).unwrap_or_default();
    Ok(result)
}

/// Payment lookup through the gateway id secondary key
pub fn find_by_mp_id(mp_id: &String) -> Result<Payment, LojaError> {
    let db = &DATABASE_LOCK;
    let mp_k = format!("{}-{}", crate::MP_PAYMENT_DB_KEY, mp_id);
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &mp_k.as_bytes().to_vec())?;
    if r.is_empty() {
        error!("no payment for gateway id {}", mp_id);
        return Err(LojaError::Database(MdbError::NotFound));
    }
    let payid: String = bincode::deserialize(&r[..]).unwrap_or_default();
    find(&payid)
}

/// Query the gateway for the current status of a payment
pub async fn fetch_remote_status(mp_id: &String) -> reqres::MpPaymentResponse {
    let host = utils::get_mercado_pago_host();
    let client = reqwest::Client::new();
    match client
        .get(format!("{}{}/{}", host, MpFields::Payments.value(), mp_id))
        .bearer_auth(get_mp_access_token())
        .send()
        .await
    {
        Ok(response) => {
            let res = response.json::<reqres::MpPaymentResponse>().await;
            debug!("payment status response: {:?}", res);
            match res {
                Ok(res) => res,
                _ => Default::default(),
            }
        }
        Err(e) => {
            error!("failed to fetch payment status due to: {:?}", e);
            Default::default()
        }
    }
}

/// Apply a gateway status to the stored payment and its order.
///
/// Approval marks the order paid and burns the coupon.
pub async fn apply_status(mp_id: &String, status: &str) -> Result<Payment, LojaError> {
    info!("applying status {} to gateway payment {}", status, mp_id);
    let f_payment: Payment = find_by_mp_id(mp_id)?;
    if f_payment.status == MpStatus::Approved.value() {
        // already settled, nothing to apply
        return Ok(f_payment);
    }
    let u_payment = Payment::update_status(f_payment, String::from(status));
    let db = &DATABASE_LOCK;
    db::DatabaseEnvironment::delete(&db.env, &db.handle, u_payment.payid.as_bytes())?;
    let v = bincode::serialize(&u_payment).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, u_payment.payid.as_bytes(), &v)?;
    if status == MpStatus::Approved.value() {
        let u_order = order::update_status(&u_payment.orid, order::StatusType::Paid)?;
        if !u_order.coupon_code.is_empty() {
            coupon::redeem(&u_order.coupon_code)?;
        }
    } else if status == MpStatus::Cancelled.value() {
        order::cancel(&u_payment.orid)?;
    }
    Ok(u_payment)
}

// Tests
//-------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_order(subtotal_items: Vec<(f64, u64)>, shipping: f64) -> Order {
        let items = subtotal_items
            .iter()
            .map(|(price, quantity)| OrderItem {
                pid: String::from("p-test"),
                name: String::from("item"),
                price: *price,
                quantity: *quantity,
            })
            .collect();
        Order {
            orid: String::from("o-test"),
            items,
            shipping_cost: shipping,
            ..Default::default()
        }
    }

    #[test]
    fn verify_charge_amount_test() {
        let f_order = stored_order(vec![(35.5, 2), (10.0, 1)], 19.9);
        // 71.0 + 10.0 + 19.9
        assert!(verify_charge_amount(&f_order, 100.9));
        assert!(verify_charge_amount(&f_order, 100.91));
        assert!(verify_charge_amount(&f_order, 100.89));
        assert!(!verify_charge_amount(&f_order, 100.93));
        assert!(!verify_charge_amount(&f_order, 90.0));
        assert!(!verify_charge_amount(&f_order, 0.0));
    }

    #[test]
    fn tampered_amount_test() {
        // client claims a lower total than the stored rows produce
        let f_order = stored_order(vec![(199.0, 1)], 0.0);
        assert!(!verify_charge_amount(&f_order, 1.99));
    }

    #[test]
    fn charge_rejects_tampered_request_test() -> Result<(), LojaError> {
        use tokio::runtime::Runtime;
        let rt = Runtime::new().expect("Unable to create Runtime for test");
        let p = crate::product::create(Json(Product {
            name: String::from("Mochila"),
            description: String::from("Mochila impermeavel 20L"),
            price: 120.0,
            qty: 3,
            in_stock: true,
            ..Default::default()
        }))?;
        let f_order = crate::order::create(Json(reqres::OrderRequest {
            cid: format!("c{}", utils::generate_rnd()),
            items: vec![reqres::CartItem {
                pid: String::from(&p.pid),
                quantity: 1,
            }],
            ..Default::default()
        }))?;
        // the gateway is never reached, the amount check fails first
        let tampered = rt.block_on(create_charge(Json(reqres::ChargeRequest {
            orid: String::from(&f_order.orid),
            amount: 1.2,
            card_token: String::from("tok_test"),
            payment_method_id: String::from("visa"),
            installments: 1,
            email: String::from("maria@example.com.br"),
        })));
        assert!(tampered.is_err());
        // cancelled orders can't be charged either
        crate::order::cancel(&f_order.orid)?;
        let settled = rt.block_on(create_charge(Json(reqres::ChargeRequest {
            orid: String::from(&f_order.orid),
            amount: f_order.total,
            card_token: String::from("tok_test"),
            payment_method_id: String::from("visa"),
            installments: 1,
            email: String::from("maria@example.com.br"),
        })));
        assert!(settled.is_err());
        let db = &DATABASE_LOCK;
        db::DatabaseEnvironment::delete(&db.env, &db.handle, f_order.orid.as_bytes())?;
        db::DatabaseEnvironment::delete(&db.env, &db.handle, p.pid.as_bytes())?;
        Ok(())
    }
}
