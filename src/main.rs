#[macro_use]
extern crate rocket;

use loja::*;
use loja_core::*;

// The only changes in here should be mounting new controller methods

#[launch]
async fn rocket() -> _ {
    let config = rocket::Config {
        ident: rocket::config::Ident::none(),
        ip_header: None,
        port: utils::get_app_port(),
        ..rocket::Config::debug_default()
    };
    env_logger::init();
    if let Err(e) = utils::start_up().await {
        log::error!("startup maintenance failed: {}", e);
    }
    rocket::custom(&config)
        .mount("/health", routes![controller::health])
        .mount(
            "/products",
            routes![controller::get_products, controller::get_product],
        )
        .mount(
            "/reviews",
            routes![controller::get_product_reviews, controller::get_rating_summary],
        )
        .mount("/testimonials", routes![controller::get_testimonials])
        .mount("/coupon", routes![controller::validate_coupon])
        .mount("/shipping", routes![controller::quote_shipping])
}
