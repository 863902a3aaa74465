#[macro_use]
extern crate rocket;

use loja_auth::*;
use loja_core::*;

// The only changes in here should be mounting new controller methods

#[launch]
async fn rocket() -> _ {
    let config = rocket::Config {
        port: utils::get_app_auth_port(),
        ..rocket::Config::debug_default()
    };
    env_logger::init();
    if let Err(e) = utils::gen_signing_keys() {
        log::error!("could not bootstrap signing keys: {}", e);
    }
    log::info!("loja-auth is online");
    rocket::custom(&config).mount("/", routes![controller::register, controller::login])
}
