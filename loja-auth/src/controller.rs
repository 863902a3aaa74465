use rocket::{
    http::Status,
    post,
    response::status::Custom,
    serde::json::Json,
};

use loja_core::*;

// JSON APIs

/// Create a customer account
#[post("/register", data = "<req_register>")]
pub async fn register(
    req_register: Json<reqres::RegisterRequest>,
) -> Custom<Json<reqres::CustomerResponse>> {
    match auth::register(req_register) {
        Ok(c) => Custom(Status::Created, utils::customer_to_json(&c)),
        Err(_) => Custom(Status::BadRequest, Json(Default::default())),
    }
}

/// Exchange credentials for a bearer token
#[post("/login", data = "<req_login>")]
pub async fn login(req_login: Json<reqres::LoginRequest>) -> Custom<Json<reqres::TokenResponse>> {
    match auth::login(req_login) {
        Ok(t) => Custom(Status::Ok, Json(t)),
        Err(_) => Custom(Status::Unauthorized, Json(Default::default())),
    }
}
// END JSON APIs
