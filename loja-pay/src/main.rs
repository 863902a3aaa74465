#[macro_use]
extern crate rocket;

use loja_core::*;
use loja_pay::*;

// The only changes in here should be mounting new controller methods

#[launch]
async fn rocket() -> _ {
    let config = rocket::Config {
        port: utils::get_app_pay_port(),
        ..rocket::Config::debug_default()
    };
    env_logger::init();
    // replay log maintenance
    std::thread::spawn(webhook::sweep_event_log);
    log::info!("loja-pay is online");
    rocket::custom(&config)
        .mount(
            "/payment",
            routes![controller::create_charge, controller::get_payment],
        )
        .mount(
            "/shipment",
            routes![controller::create_label, controller::track_order],
        )
        .mount(
            "/webhook",
            routes![controller::mp_webhook, controller::me_webhook],
        )
}
