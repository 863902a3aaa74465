//! MelhorEnvio shipping integration

use crate::{
    error::LojaError,
    models::*,
    order,
    product,
    reqres,
    utils,
};
use log::{
    debug,
    error,
    info,
};
use rocket::serde::json::Json;

enum MeFields {
    Calculate,
    Cart,
    Checkout,
    Tracking,
}

impl MeFields {
    pub fn value(&self) -> String {
        match *self {
            MeFields::Calculate => String::from("/api/v2/me/shipment/calculate"),
            MeFields::Cart => String::from("/api/v2/me/cart"),
            MeFields::Checkout => String::from("/api/v2/me/shipment/checkout"),
            MeFields::Tracking => String::from("/api/v2/me/shipment/tracking"),
        }
    }
}

fn get_me_access_token() -> String {
    std::env::var(crate::ME_ACCESS_TOKEN).unwrap_or_default()
}

/// Build the dimension rows MelhorEnvio expects from catalog data
fn build_dims(items: &[reqres::CartItem]) -> Result<Vec<reqres::MeProductDims>, LojaError> {
    let mut dims: Vec<reqres::MeProductDims> = Vec::new();
    for item in items {
        let f_prod: Product = product::find(&item.pid)?;
        dims.push(reqres::MeProductDims {
            id: String::from(&f_prod.pid),
            width: f_prod.width,
            height: f_prod.height,
            length: f_prod.length,
            weight: f_prod.weight as f64 / 1000.0,
            insurance_value: f_prod.price,
            quantity: item.quantity,
        });
    }
    Ok(dims)
}

/// Quote shipping services for a cart
pub async fn quote(j: Json<reqres::QuoteRequest>) -> Result<Vec<reqres::ShippingService>, LojaError> {
    info!("quoting shipment to {}", &j.to_postal_code);
    let req = reqres::MeCalculateRequest {
        from: reqres::MePostal {
            postal_code: utils::get_origin_postal_code(),
        },
        to: reqres::MePostal {
            postal_code: String::from(&j.to_postal_code),
        },
        products: build_dims(&j.items)?,
    };
    let host = utils::get_melhor_envio_host();
    let client = reqwest::Client::new();
    match client
        .post(format!("{}{}", host, MeFields::Calculate.value()))
        .bearer_auth(get_me_access_token())
        .json(&req)
        .send()
        .await
    {
        Ok(response) => {
            let res = response.json::<Vec<reqres::MeCalculateResponse>>().await;
            debug!("{} response: {:?}", MeFields::Calculate.value(), res);
            match res {
                Ok(res) => {
                    let services = res
                        .into_iter()
                        .filter(|s| s.error.is_empty())
                        .map(|s| reqres::ShippingService {
                            id: s.id,
                            name: s.name,
                            price: s.price.parse::<f64>().unwrap_or(0.0),
                            delivery_days: s.delivery_time,
                        })
                        .filter(|s| s.price > 0.0)
                        .collect();
                    Ok(services)
                }
                _ => Ok(Default::default()),
            }
        }
        Err(e) => {
            error!("failed to quote shipment due to: {:?}", e);
            Err(LojaError::Shipping)
        }
    }
}

/// Generate a shipping label for a paid order. Persists the label
///
/// id and tracking code and moves the order to Shipped.
pub async fn create_label(orid: &String) -> Result<reqres::LabelResponse, LojaError> {
    info!("creating label for order: {}", orid);
    let f_order: Order = order::find(orid)?;
    if f_order.status != order::StatusType::Paid.value() {
        error!("labels require a paid order");
        return Err(LojaError::Shipping);
    }
    let items: Vec<reqres::CartItem> = f_order
        .items
        .iter()
        .map(|i| reqres::CartItem {
            pid: String::from(&i.pid),
            quantity: i.quantity,
        })
        .collect();
    let address = crate::address::find(&f_order.aid)?;
    let service_id: u32 = f_order.shipping_service.parse::<u32>().unwrap_or(1);
    let cart_req = reqres::MeCartItemRequest {
        service: service_id,
        from: reqres::MePostal {
            postal_code: utils::get_origin_postal_code(),
        },
        to: reqres::MePostal {
            postal_code: String::from(&address.postal_code),
        },
        products: build_dims(&items)?,
    };
    let host = utils::get_melhor_envio_host();
    let client = reqwest::Client::new();
    let cart = match client
        .post(format!("{}{}", host, MeFields::Cart.value()))
        .bearer_auth(get_me_access_token())
        .json(&cart_req)
        .send()
        .await
    {
        Ok(response) => {
            let res = response.json::<reqres::MeCartItemResponse>().await;
            debug!("{} response: {:?}", MeFields::Cart.value(), res);
            match res {
                Ok(res) => res,
                _ => Default::default(),
            }
        }
        Err(e) => {
            error!("failed to insert cart item due to: {:?}", e);
            return Err(LojaError::Shipping);
        }
    };
    if cart.id.is_empty() {
        error!("carrier rejected the shipment for order {}", orid);
        return Err(LojaError::Shipping);
    }
    let checkout_req = reqres::MeCheckoutRequest {
        orders: vec![String::from(&cart.id)],
    };
    let checkout = match client
        .post(format!("{}{}", host, MeFields::Checkout.value()))
        .bearer_auth(get_me_access_token())
        .json(&checkout_req)
        .send()
        .await
    {
        Ok(response) => {
            let res = response.json::<reqres::MeCheckoutResponse>().await;
            debug!("{} response: {:?}", MeFields::Checkout.value(), res);
            match res {
                Ok(res) => res,
                _ => Default::default(),
            }
        }
        Err(e) => {
            error!("failed to checkout shipment due to: {:?}", e);
            return Err(LojaError::Shipping);
        }
    };
    let tracking = checkout
        .purchase
        .orders
        .first()
        .map(|o| String::from(&o.tracking))
        .unwrap_or_default();
    order::attach_label(orid, &cart.id, &tracking)?;
    // secondary key so carrier webhooks can find the order
    let db = &crate::db::DATABASE_LOCK;
    if !tracking.is_empty() {
        let trk_k = format!("{}-{}", crate::TRACKING_DB_KEY, &tracking);
        let trk_v = bincode::serialize(orid).unwrap_or_default();
        crate::db::write_chunks(&db.env, &db.handle, trk_k.as_bytes(), &trk_v)?;
    }
    order::update_status(orid, order::StatusType::Shipped)?;
    Ok(reqres::LabelResponse {
        orid: String::from(orid),
        label_id: cart.id,
        tracking_code: tracking,
    })
}

/// Find the order a carrier tracking code belongs to
pub fn find_order_by_tracking(tracking: &String) -> Result<Order, LojaError> {
    let db = &crate::db::DATABASE_LOCK;
    let trk_k = format!("{}-{}", crate::TRACKING_DB_KEY, tracking);
    let r = crate::db::DatabaseEnvironment::read(&db.env, &db.handle, &trk_k.as_bytes().to_vec())?;
    if r.is_empty() {
        error!("no order for tracking code {}", tracking);
        return Err(LojaError::Shipping);
    }
    let orid: String = bincode::deserialize(&r[..]).unwrap_or_default();
    order::find(&orid)
}

/// Query carrier tracking for an order
pub async fn track(orid: &String) -> Result<reqres::TrackingResponse, LojaError> {
    let f_order: Order = order::find(orid)?;
    if f_order.label_id.is_empty() {
        error!("order {} has no label yet", orid);
        return Err(LojaError::Shipping);
    }
    let req = reqres::MeCheckoutRequest {
        orders: vec![String::from(&f_order.label_id)],
    };
    let host = utils::get_melhor_envio_host();
    let client = reqwest::Client::new();
    match client
        .post(format!("{}{}", host, MeFields::Tracking.value()))
        .bearer_auth(get_me_access_token())
        .json(&req)
        .send()
        .await
    {
        Ok(response) => {
            let res = response.json::<reqres::MeTrackingResponse>().await;
            debug!("{} response: {:?}", MeFields::Tracking.value(), res);
            match res {
                Ok(res) => Ok(reqres::TrackingResponse {
                    orid: String::from(orid),
                    tracking_code: String::from(&f_order.tracking_code),
                    status: res.status,
                }),
                _ => Ok(Default::default()),
            }
        }
        Err(e) => {
            error!("failed to fetch tracking due to: {:?}", e);
            Err(LojaError::Shipping)
        }
    }
}

// Tests
//-------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        self,
        DATABASE_LOCK,
    };

    #[test]
    fn build_dims_test() -> Result<(), LojaError> {
        let p = product::create(Json(Product {
            name: String::from("Tenis"),
            description: String::from("Tenis corrida 42"),
            price: 249.9,
            qty: 4,
            in_stock: true,
            weight: 800,
            width: 30,
            height: 12,
            length: 40,
            ..Default::default()
        }))?;
        let dims = build_dims(&[reqres::CartItem {
            pid: String::from(&p.pid),
            quantity: 2,
        }])?;
        assert_eq!(dims.len(), 1);
        assert_eq!(dims[0].weight, 0.8);
        assert_eq!(dims[0].quantity, 2);
        assert_eq!(dims[0].insurance_value, 249.9);
        let db = &DATABASE_LOCK;
        db::DatabaseEnvironment::delete(&db.env, &db.handle, p.pid.as_bytes())?;
        Ok(())
    }

    #[test]
    fn find_order_by_tracking_missing_test() {
        let missing = find_order_by_tracking(&format!("BR{}", utils::generate_rnd()));
        assert!(missing.is_err());
    }
}
