use rocket::{
    delete,
    get,
    http::Status,
    patch,
    post,
    response::status::Custom,
    serde::json::Json,
};

use loja_core::*;

// JSON APIs

/// Get a customer profile by passing id
#[get("/<cid>")]
pub async fn get_customer(
    cid: String,
    _token: auth::BearerToken,
) -> Custom<Json<reqres::CustomerResponse>> {
    match customer::find(&cid) {
        Ok(c) => Custom(Status::Ok, utils::customer_to_json(&c)),
        Err(_) => Custom(Status::NotFound, Json(Default::default())),
    }
}

/// Update customer profile information
#[patch("/update", data = "<req_customer>")]
pub async fn update_customer(
    req_customer: Json<models::Customer>,
    _token: auth::BearerToken,
) -> Custom<Json<reqres::CustomerResponse>> {
    match customer::modify(req_customer) {
        Ok(c) => Custom(Status::Ok, utils::customer_to_json(&c)),
        Err(_) => Custom(Status::BadRequest, Json(Default::default())),
    }
}

/// Create an address by passing json address
#[post("/create", data = "<req_address>")]
pub async fn create_address(
    req_address: Json<models::Address>,
    _token: auth::BearerToken,
) -> Custom<Json<models::Address>> {
    let m_address = address::create(req_address);
    Custom(Status::Created, Json(m_address.unwrap_or_default()))
}

/// Update address information
#[patch("/update", data = "<req_address>")]
pub async fn update_address(
    req_address: Json<models::Address>,
    _token: auth::BearerToken,
) -> Custom<Json<models::Address>> {
    let m_address = address::modify(req_address);
    Custom(Status::Ok, Json(m_address.unwrap_or_default()))
}

/// Remove an address
#[delete("/<aid>")]
pub async fn delete_address(aid: String, _token: auth::BearerToken) -> Custom<Json<models::Address>> {
    match address::delete(&aid) {
        Ok(_) => Custom(Status::Ok, Json(Default::default())),
        Err(_) => Custom(Status::NotFound, Json(Default::default())),
    }
}

/// Return all addresses of a customer
#[get("/<cid>")]
pub async fn get_addresses(
    cid: String,
    _token: auth::BearerToken,
) -> Custom<Json<Vec<models::Address>>> {
    let m_addresses = address::find_all_customer_addresses(&cid);
    Custom(Status::Ok, Json(m_addresses.unwrap_or_default()))
}

/// Save a tokenized card
#[post("/create", data = "<req_card>")]
pub async fn create_card(
    req_card: Json<models::Card>,
    _token: auth::BearerToken,
) -> Custom<Json<reqres::CardResponse>> {
    match card::create(req_card) {
        Ok(c) => Custom(Status::Created, utils::card_to_json(&c)),
        Err(_) => Custom(Status::BadRequest, Json(Default::default())),
    }
}

/// Remove a stored card
#[delete("/<ccid>")]
pub async fn delete_card(
    ccid: String,
    _token: auth::BearerToken,
) -> Custom<Json<reqres::CardResponse>> {
    match card::delete(&ccid) {
        Ok(_) => Custom(Status::Ok, Json(Default::default())),
        Err(_) => Custom(Status::NotFound, Json(Default::default())),
    }
}

/// Return all cards of a customer, masked
#[get("/<cid>")]
pub async fn get_cards(
    cid: String,
    _token: auth::BearerToken,
) -> Custom<Json<Vec<reqres::CardResponse>>> {
    let m_cards = card::find_all_customer_cards(&cid).unwrap_or_default();
    let masked: Vec<reqres::CardResponse> =
        m_cards.iter().map(|c| utils::card_to_json(c).0).collect();
    Custom(Status::Ok, Json(masked))
}

/// Favorite a product
#[post("/add", data = "<req_favorite>")]
pub async fn add_favorite(
    req_favorite: Json<reqres::FavoriteRequest>,
    _token: auth::BearerToken,
) -> Custom<Json<Vec<String>>> {
    let m_favorites = favorite::add(&req_favorite.cid, &req_favorite.pid);
    Custom(Status::Ok, Json(m_favorites.unwrap_or_default()))
}

/// Unfavorite a product
#[post("/remove", data = "<req_favorite>")]
pub async fn remove_favorite(
    req_favorite: Json<reqres::FavoriteRequest>,
    _token: auth::BearerToken,
) -> Custom<Json<Vec<String>>> {
    let m_favorites = favorite::remove(&req_favorite.cid, &req_favorite.pid);
    Custom(Status::Ok, Json(m_favorites.unwrap_or_default()))
}

/// Return the favorited products of a customer
#[get("/<cid>")]
pub async fn get_favorites(
    cid: String,
    _token: auth::BearerToken,
) -> Custom<Json<Vec<models::Product>>> {
    let m_favorites = favorite::find_all_customer_favorites(&cid);
    Custom(Status::Ok, Json(m_favorites.unwrap_or_default()))
}
// END JSON APIs
