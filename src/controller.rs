use rocket::{
    get,
    http::Status,
    post,
    response::status::Custom,
    serde::json::Json,
};

use loja_core::*;

// Public storefront JSON APIs

/// This also functions as a health check
///
/// Protected: false
#[get("/")]
pub async fn health() -> Custom<Json<reqres::HealthResponse>> {
    Custom(Status::Ok, Json(reqres::HealthResponse { up: true }))
}

/// Catalog listing, served through the TTL cache
///
/// Protected: false
#[get("/")]
pub async fn get_products() -> Custom<Json<Vec<models::Product>>> {
    let m_products = product::find_all();
    Custom(Status::Ok, Json(m_products.unwrap_or_default()))
}

/// Product detail with images
///
/// Protected: false
#[get("/<pid>")]
pub async fn get_product(pid: String) -> Custom<Json<models::Product>> {
    match product::find(&pid) {
        Ok(p) => Custom(Status::Ok, Json(p)),
        Err(_) => Custom(Status::NotFound, Json(Default::default())),
    }
}

/// All reviews of a product
///
/// Protected: false
#[get("/<pid>")]
pub async fn get_product_reviews(pid: String) -> Custom<Json<Vec<models::Review>>> {
    let m_reviews = review::find_all_product_reviews(&pid);
    Custom(Status::Ok, Json(m_reviews.unwrap_or_default()))
}

/// Review count and average rating of a product
///
/// Protected: false
#[get("/summary/<pid>")]
pub async fn get_rating_summary(pid: String) -> Custom<Json<reqres::RatingSummary>> {
    let m_summary = review::rating_summary(&pid);
    Custom(Status::Ok, Json(m_summary.unwrap_or_default()))
}

/// Approved testimonials only
///
/// Protected: false
#[get("/")]
pub async fn get_testimonials() -> Custom<Json<Vec<models::Testimonial>>> {
    let m_testimonials = testimonial::find_all(true);
    Custom(Status::Ok, Json(m_testimonials.unwrap_or_default()))
}

/// Check coupon eligibility against a cart subtotal
///
/// Protected: false
#[post("/validate", data = "<req_check>")]
pub async fn validate_coupon(
    req_check: Json<reqres::CouponCheckRequest>,
) -> Custom<Json<reqres::CouponCheckResponse>> {
    let code = req_check.code.to_uppercase();
    match coupon::validate(&code, req_check.subtotal) {
        Ok(discount) => Custom(
            Status::Ok,
            Json(reqres::CouponCheckResponse {
                code,
                valid: true,
                discount,
            }),
        ),
        Err(_) => Custom(
            Status::Ok,
            Json(reqres::CouponCheckResponse {
                code,
                valid: false,
                discount: 0.0,
            }),
        ),
    }
}

/// Quote shipping services for a cart
///
/// Protected: false
#[post("/quote", data = "<req_quote>")]
pub async fn quote_shipping(
    req_quote: Json<reqres::QuoteRequest>,
) -> Custom<Json<Vec<reqres::ShippingService>>> {
    match shipping::quote(req_quote).await {
        Ok(services) => Custom(Status::Ok, Json(services)),
        Err(_) => Custom(Status::BadRequest, Json(Default::default())),
    }
}
// END JSON APIs
