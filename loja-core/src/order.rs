//! Order placement and lifecycle module

use crate::{
    coupon,
    db::{
        self,
        DATABASE_LOCK,
    },
    error::LojaError,
    models::*,
    product,
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

pub enum StatusType {
    Cancelled,
    Delivered,
    Paid,
    Pending,
    Shipped,
}

impl StatusType {
    pub fn value(&self) -> String {
        match *self {
            StatusType::Cancelled => String::from("Cancelled"),
            StatusType::Delivered => String::from("Delivered"),
            StatusType::Paid => String::from("Paid"),
            StatusType::Pending => String::from("Pending"),
            StatusType::Shipped => String::from("Shipped"),
        }
    }
}

/// Create an initial order. Item prices always come from the
///
/// catalog, never from the client. Stock is decremented here and
///
/// restored on cancellation.
pub fn create(j_order: Json<reqres::OrderRequest>) -> Result<Order, LojaError> {
    info!("creating order");
    if j_order.items.is_empty() {
        error!("order has no items");
        return Err(LojaError::Order);
    }
    let ts = chrono::offset::Utc::now().timestamp();
    let orid: String = format!("{}{}", crate::ORDER_DB_KEY, utils::generate_rnd());
    let mut items: Vec<OrderItem> = Vec::new();
    let mut subtotal: f64 = 0.0;
    for item in &j_order.items {
        let f_prod: Product = product::find(&item.pid)?;
        if !f_prod.in_stock || f_prod.qty < item.quantity || item.quantity == 0 {
            error!("product {} unavailable in qty {}", &item.pid, item.quantity);
            return Err(LojaError::Order);
        }
        subtotal += f_prod.price * item.quantity as f64;
        items.push(OrderItem {
            pid: String::from(&f_prod.pid),
            name: String::from(&f_prod.name),
            price: f_prod.price,
            quantity: item.quantity,
        });
    }
    subtotal = utils::round_brl(subtotal);
    let discount = if j_order.coupon_code.is_empty() {
        0.0
    } else {
        coupon::validate(&j_order.coupon_code, subtotal)?
    };
    let total = utils::round_brl(subtotal - discount + j_order.shipping_cost);
    // all items are available, take the stock
    for item in &items {
        product::adjust_qty(&item.pid, -(item.quantity as i64))?;
    }
    let new_order = Order {
        orid: String::from(&orid),
        cid: String::from(&j_order.cid),
        aid: String::from(&j_order.aid),
        items,
        subtotal,
        coupon_code: j_order.coupon_code.to_uppercase(),
        discount,
        shipping_service: String::from(&j_order.shipping_service),
        shipping_cost: j_order.shipping_cost,
        total,
        status: StatusType::Pending.value(),
        created: ts,
        updated: ts,
        ..Default::default()
    };
    debug!("insert order: {}", &new_order.orid);
    let db = &DATABASE_LOCK;
    let v = bincode::serialize(&new_order).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, new_order.orid.as_bytes(), &v)?;
    // in order to retrieve all orders, write keys to with ol
    let list_key = crate::ORDER_LIST_DB_KEY;
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &list_key.as_bytes().to_vec())?;
    if r.is_empty() {
        debug!("creating order index");
    }
    let old: String = bincode::deserialize(&r[..]).unwrap_or_default();
    let order_list = if old.is_empty() {
        String::from(&orid)
    } else {
        [old, String::from(&orid)].join(",")
    };
    debug!("writing order index {} for id: {}", order_list, list_key);
    let s_order_list = bincode::serialize(&order_list).unwrap_or_default();
    db::DatabaseEnvironment::delete(&db.env, &db.handle, list_key.as_bytes())?;
    db::write_chunks(&db.env, &db.handle, list_key.as_bytes(), &s_order_list)?;
    // per-customer index
    let c_list_key = format!("{}-{}", crate::CUSTOMER_ORDER_LIST_DB_KEY, &new_order.cid);
    let c_r = db::DatabaseEnvironment::read(&db.env, &db.handle, &c_list_key.as_bytes().to_vec())?;
    let c_old: String = bincode::deserialize(&c_r[..]).unwrap_or_default();
    let c_order_list = if c_old.is_empty() {
        String::from(&orid)
    } else {
        [c_old, String::from(&orid)].join(",")
    };
    let s_c_order_list = bincode::serialize(&c_order_list).unwrap_or_default();
    db::DatabaseEnvironment::delete(&db.env, &db.handle, c_list_key.as_bytes())?;
    db::write_chunks(&db.env, &db.handle, c_list_key.as_bytes(), &s_c_order_list)?;
    Ok(new_order)
}

/// Lookup order
pub fn find(orid: &String) -> Result<Order, LojaError> {
    let db = &DATABASE_LOCK;
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &orid.as_bytes().to_vec())?;
    if r.is_empty() {
        error!("order not found");
        return Err(LojaError::Database(MdbError::NotFound));
    }
    let result: Order = bincode::deserialize(&r[..]).unwrap_or_default();
    Ok(result)
}

/// Lookup all orders from the admin server
pub fn find_all() -> Result<Vec<Order>, LojaError> {
    let db = &DATABASE_LOCK;
    let i_list_key = crate::ORDER_LIST_DB_KEY;
    let i_r = db::DatabaseEnvironment::read(&db.env, &db.handle, &i_list_key.as_bytes().to_vec())?;
    if i_r.is_empty() {
        error!("order index not found");
    }
    let de: String = bincode::deserialize(&i_r[..]).unwrap_or_default();
    let i_v: Vec<String> = de.split(",").map(String::from).collect();
    let mut orders: Vec<Order> = Vec::new();
    for o in i_v {
        let order: Order = find(&o).unwrap_or_default();
        if !order.orid.is_empty() {
            orders.push(order);
        }
    }
    Ok(orders)
}

/// Lookup all orders for a customer
pub fn find_all_customer_orders(cid: &String) -> Result<Vec<Order>, LojaError> {
    info!("lookup orders for customer: {}", cid);
    let db = &DATABASE_LOCK;
    let i_list_key = format!("{}-{}", crate::CUSTOMER_ORDER_LIST_DB_KEY, cid);
    let i_r = db::DatabaseEnvironment::read(&db.env, &db.handle, &i_list_key.as_bytes().to_vec())?;
    let de: String = bincode::deserialize(&i_r[..]).unwrap_or_default();
    let i_v: Vec<String> = de.split(",").map(String::from).collect();
    let mut orders: Vec<Order> = Vec::new();
    for o in i_v {
        let order: Order = find(&o).unwrap_or_default();
        if !order.orid.is_empty() {
            orders.push(order);
        }
    }
    Ok(orders)
}

/// Persist a changed order, delete-then-write to drop stale chunks
fn save(order: &Order) -> Result<(), LojaError> {
    let db = &DATABASE_LOCK;
    db::DatabaseEnvironment::delete(&db.env, &db.handle, order.orid.as_bytes())?;
    let v = bincode::serialize(order).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, order.orid.as_bytes(), &v)?;
    Ok(())
}

/// Move an order through its lifecycle. Valid transitions:
///
/// Pending -> Paid | Cancelled, Paid -> Shipped | Cancelled,
///
/// Shipped -> Delivered.
pub fn update_status(orid: &String, status: StatusType) -> Result<Order, LojaError> {
    let f_order: Order = find(orid)?;
    let next = status.value();
    let current = String::from(&f_order.status);
    let allowed = match current.as_str() {
        "Pending" => next == StatusType::Paid.value() || next == StatusType::Cancelled.value(),
        "Paid" => next == StatusType::Shipped.value() || next == StatusType::Cancelled.value(),
        "Shipped" => next == StatusType::Delivered.value(),
        _ => false,
    };
    if !allowed {
        error!("illegal order transition {} -> {}", current, next);
        return Err(LojaError::Order);
    }
    info!("order {} transition {} -> {}", orid, current, next);
    let u_order = Order {
        status: next,
        updated: chrono::offset::Utc::now().timestamp(),
        ..f_order
    };
    save(&u_order)?;
    Ok(u_order)
}

/// Attach the processed payment id to an order
pub fn attach_payment(orid: &String, payid: &String) -> Result<Order, LojaError> {
    let f_order: Order = find(orid)?;
    let u_order = Order {
        payid: String::from(payid),
        updated: chrono::offset::Utc::now().timestamp(),
        ..f_order
    };
    save(&u_order)?;
    Ok(u_order)
}

/// Attach the shipping label and tracking code to an order
pub fn attach_label(orid: &String, label_id: &String, tracking: &String) -> Result<Order, LojaError> {
    let f_order: Order = find(orid)?;
    let u_order = Order {
        label_id: String::from(label_id),
        tracking_code: String::from(tracking),
        updated: chrono::offset::Utc::now().timestamp(),
        ..f_order
    };
    save(&u_order)?;
    Ok(u_order)
}

/// Cancel an order and restore the stock it was holding
pub fn cancel(orid: &String) -> Result<Order, LojaError> {
    let u_order = update_status(orid, StatusType::Cancelled)?;
    for item in &u_order.items {
        product::adjust_qty(&item.pid, item.quantity as i64)?;
    }
    Ok(u_order)
}

// Tests
//-------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_product(price: f64, qty: u64) -> Result<Product, LojaError> {
        product::create(Json(Product {
            name: String::from("Camiseta"),
            description: String::from("Camiseta algodao M"),
            price,
            qty,
            in_stock: true,
            weight: 200,
            width: 20,
            height: 4,
            length: 30,
            ..Default::default()
        }))
    }

    fn cleanup(k: &String) {
        let db = &DATABASE_LOCK;
        let _ = db::DatabaseEnvironment::delete(&db.env, &db.handle, k.as_bytes());
    }

    #[test]
    fn create_prices_from_catalog_test() -> Result<(), LojaError> {
        let p = seed_product(35.5, 10)?;
        let cid = format!("c{}", utils::generate_rnd());
        let order = create(Json(reqres::OrderRequest {
            cid: String::from(&cid),
            aid: String::from("ad-test"),
            items: vec![reqres::CartItem {
                pid: String::from(&p.pid),
                quantity: 2,
            }],
            coupon_code: String::new(),
            shipping_service: String::from("SEDEX"),
            shipping_cost: 22.5,
        }))?;
        assert_eq!(order.subtotal, 71.0);
        assert_eq!(order.discount, 0.0);
        assert_eq!(order.total, 93.5);
        assert_eq!(order.status, StatusType::Pending.value());
        // stock was taken
        let f_prod = product::find(&p.pid)?;
        assert_eq!(f_prod.qty, 8);
        cleanup(&order.orid);
        cleanup(&p.pid);
        Ok(())
    }

    #[test]
    fn insufficient_stock_test() -> Result<(), LojaError> {
        let p = seed_product(10.0, 1)?;
        let r = create(Json(reqres::OrderRequest {
            cid: String::from("c-test"),
            items: vec![reqres::CartItem {
                pid: String::from(&p.pid),
                quantity: 2,
            }],
            ..Default::default()
        }));
        assert!(r.is_err());
        cleanup(&p.pid);
        Ok(())
    }

    #[test]
    fn lifecycle_test() -> Result<(), LojaError> {
        let p = seed_product(10.0, 5)?;
        let order = create(Json(reqres::OrderRequest {
            cid: format!("c{}", utils::generate_rnd()),
            items: vec![reqres::CartItem {
                pid: String::from(&p.pid),
                quantity: 1,
            }],
            ..Default::default()
        }))?;
        // can't ship an unpaid order
        let premature = update_status(&order.orid, StatusType::Shipped);
        assert!(premature.is_err());
        update_status(&order.orid, StatusType::Paid)?;
        update_status(&order.orid, StatusType::Shipped)?;
        let delivered = update_status(&order.orid, StatusType::Delivered)?;
        assert_eq!(delivered.status, StatusType::Delivered.value());
        // delivered orders can't be cancelled
        let late_cancel = cancel(&order.orid);
        assert!(late_cancel.is_err());
        cleanup(&order.orid);
        cleanup(&p.pid);
        Ok(())
    }

    #[test]
    fn cancel_restores_stock_test() -> Result<(), LojaError> {
        let p = seed_product(10.0, 5)?;
        let order = create(Json(reqres::OrderRequest {
            cid: format!("c{}", utils::generate_rnd()),
            items: vec![reqres::CartItem {
                pid: String::from(&p.pid),
                quantity: 3,
            }],
            ..Default::default()
        }))?;
        assert_eq!(product::find(&p.pid)?.qty, 2);
        cancel(&order.orid)?;
        assert_eq!(product::find(&p.pid)?.qty, 5);
        cleanup(&order.orid);
        cleanup(&p.pid);
        Ok(())
    }
}
