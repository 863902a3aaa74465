use rocket::{
    get,
    http::Status,
    patch,
    post,
    response::status::Custom,
    serde::json::Json,
};

use loja_core::*;

// JSON APIs

/// Create a product by passing json product
#[post("/create", data = "<req_product>")]
pub async fn create_product(
    req_product: Json<models::Product>,
    _token: auth::BearerToken,
) -> Custom<Json<models::Product>> {
    let m_product = product::create(req_product);
    Custom(Status::Created, Json(m_product.unwrap_or_default()))
}

/// Get a product by passing id
#[get("/<pid>")]
pub async fn get_product(pid: String, _token: auth::BearerToken) -> Custom<Json<models::Product>> {
    let m_product = product::find(&pid);
    Custom(Status::Ok, Json(m_product.unwrap_or_default()))
}

/// Update product information
#[patch("/update", data = "<req_product>")]
pub async fn update_product(
    req_product: Json<models::Product>,
    _token: auth::BearerToken,
) -> Custom<Json<models::Product>> {
    let m_product = product::modify(req_product);
    Custom(Status::Ok, Json(m_product.unwrap_or_default()))
}

/// Return all products
#[get("/")]
pub async fn get_products(_token: auth::BearerToken) -> Custom<Json<Vec<models::Product>>> {
    let m_products = product::find_all();
    Custom(Status::Ok, Json(m_products.unwrap_or_default()))
}

/// Create a coupon
#[post("/create", data = "<req_coupon>")]
pub async fn create_coupon(
    req_coupon: Json<models::Coupon>,
    _token: auth::BearerToken,
) -> Custom<Json<models::Coupon>> {
    match coupon::create(req_coupon) {
        Ok(c) => Custom(Status::Created, Json(c)),
        Err(_) => Custom(Status::BadRequest, Json(Default::default())),
    }
}

/// Return all coupons
#[get("/")]
pub async fn get_coupons(_token: auth::BearerToken) -> Custom<Json<Vec<models::Coupon>>> {
    let m_coupons = coupon::find_all();
    Custom(Status::Ok, Json(m_coupons.unwrap_or_default()))
}

/// Place an order from cart items
#[post("/create", data = "<req_order>")]
pub async fn create_order(
    req_order: Json<reqres::OrderRequest>,
    _token: auth::BearerToken,
) -> Custom<Json<models::Order>> {
    match order::create(req_order) {
        Ok(o) => Custom(Status::Created, Json(o)),
        Err(_) => Custom(Status::BadRequest, Json(Default::default())),
    }
}

/// Get an order by passing id
#[get("/<orid>")]
pub async fn get_order(orid: String, _token: auth::BearerToken) -> Custom<Json<models::Order>> {
    let m_order = order::find(&orid);
    Custom(Status::Ok, Json(m_order.unwrap_or_default()))
}

/// Get all orders
#[get("/")]
pub async fn get_orders(_token: auth::BearerToken) -> Custom<Json<Vec<models::Order>>> {
    let m_orders = order::find_all();
    Custom(Status::Ok, Json(m_orders.unwrap_or_default()))
}

/// Get all orders of a customer
#[get("/customer/<cid>")]
pub async fn get_customer_orders(
    cid: String,
    _token: auth::BearerToken,
) -> Custom<Json<Vec<models::Order>>> {
    let m_orders = order::find_all_customer_orders(&cid);
    Custom(Status::Ok, Json(m_orders.unwrap_or_default()))
}

/// Cancel an order, restoring stock
#[post("/cancel/<orid>")]
pub async fn cancel_order(orid: String, _token: auth::BearerToken) -> Custom<Json<models::Order>> {
    match order::cancel(&orid) {
        Ok(o) => Custom(Status::Ok, Json(o)),
        Err(_) => Custom(Status::BadRequest, Json(Default::default())),
    }
}

/// Mark a shipped order as delivered
#[post("/deliver/<orid>")]
pub async fn deliver_order(orid: String, _token: auth::BearerToken) -> Custom<Json<models::Order>> {
    match order::update_status(&orid, order::StatusType::Delivered) {
        Ok(o) => Custom(Status::Ok, Json(o)),
        Err(_) => Custom(Status::BadRequest, Json(Default::default())),
    }
}

/// Create a review for a purchased product
#[post("/create", data = "<req_review>")]
pub async fn create_review(
    req_review: Json<models::Review>,
    _token: auth::BearerToken,
) -> Custom<Json<models::Review>> {
    match review::create(req_review) {
        Ok(r) => Custom(Status::Created, Json(r)),
        Err(_) => Custom(Status::BadRequest, Json(Default::default())),
    }
}

/// Create a testimonial, pending approval
#[post("/create", data = "<req_testimonial>")]
pub async fn create_testimonial(
    req_testimonial: Json<models::Testimonial>,
    _token: auth::BearerToken,
) -> Custom<Json<models::Testimonial>> {
    match testimonial::create(req_testimonial) {
        Ok(t) => Custom(Status::Created, Json(t)),
        Err(_) => Custom(Status::BadRequest, Json(Default::default())),
    }
}

/// Approve a testimonial for the public listing
#[post("/approve/<tid>")]
pub async fn approve_testimonial(
    tid: String,
    _token: auth::BearerToken,
) -> Custom<Json<models::Testimonial>> {
    match testimonial::approve(&tid) {
        Ok(t) => Custom(Status::Ok, Json(t)),
        Err(_) => Custom(Status::NotFound, Json(Default::default())),
    }
}
// END JSON APIs
