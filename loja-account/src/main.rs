#[macro_use]
extern crate rocket;

use loja_account::*;
use loja_core::*;

// The only changes in here should be mounting new controller methods

#[launch]
async fn rocket() -> _ {
    let config = rocket::Config {
        port: utils::get_app_account_port(),
        ..rocket::Config::debug_default()
    };
    env_logger::init();
    log::info!("loja-account is online");
    rocket::custom(&config)
        .mount(
            "/customer",
            routes![controller::get_customer, controller::update_customer],
        )
        .mount(
            "/address",
            routes![
                controller::create_address,
                controller::update_address,
                controller::delete_address
            ],
        )
        .mount("/addresses", routes![controller::get_addresses])
        .mount(
            "/card",
            routes![controller::create_card, controller::delete_card],
        )
        .mount("/cards", routes![controller::get_cards])
        .mount(
            "/favorite",
            routes![controller::add_favorite, controller::remove_favorite],
        )
        .mount("/favorites", routes![controller::get_favorites])
}
