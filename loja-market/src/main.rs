#[macro_use]
extern crate rocket;

use loja_core::*;
use loja_market::*;

// The only changes in here should be mounting new controller methods

#[launch]
async fn rocket() -> _ {
    let config = rocket::Config {
        port: utils::get_app_market_port(),
        ..rocket::Config::debug_default()
    };
    env_logger::init();
    log::info!("loja-market is online");
    rocket::custom(&config)
        .mount(
            "/product",
            routes![controller::create_product, controller::update_product, controller::get_product],
        )
        .mount("/products", routes![controller::get_products])
        .mount(
            "/coupon",
            routes![controller::create_coupon],
        )
        .mount("/coupons", routes![controller::get_coupons])
        .mount(
            "/order",
            routes![
                controller::create_order,
                controller::get_order,
                controller::cancel_order,
                controller::deliver_order
            ],
        )
        .mount(
            "/orders",
            routes![controller::get_orders, controller::get_customer_orders],
        )
        .mount("/review", routes![controller::create_review])
        .mount(
            "/testimonial",
            routes![controller::create_testimonial, controller::approve_testimonial],
        )
}
