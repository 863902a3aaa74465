//! Catalog product module

use crate::{
    cache,
    db::{
        self,
        DATABASE_LOCK,
    },
    error::LojaError,
    models::*,
    utils,
};
use kn0sys_lmdb_rs::MdbError;
use log::{
    debug,
    error,
    info,
};
use rocket::serde::json::Json;

/// Create a new product
pub fn create(d: Json<Product>) -> Result<Product, LojaError> {
    let pid: String = format!("{}{}", crate::PRODUCT_DB_KEY, utils::generate_rnd());
    if !validate_product(&d) {
        error!("invalid product");
        return Err(LojaError::Unknown);
    }
    let new_product = Product {
        pid: String::from(&pid),
        category: String::from(&d.category),
        description: String::from(&d.description),
        image: d.image.iter().cloned().collect(),
        in_stock: d.in_stock,
        name: String::from(&d.name),
        price: d.price,
        qty: d.qty,
        weight: d.weight,
        width: d.width,
        height: d.height,
        length: d.length,
    };
    debug!("insert product: {}", &new_product.pid);
    let db = &DATABASE_LOCK;
    let k = &new_product.pid;
    let v = bincode::serialize(&new_product).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, k.as_bytes(), &v)?;
    // in order to retrieve all products, write keys to with pl
    let list_key = crate::PRODUCT_LIST_DB_KEY;
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &list_key.as_bytes().to_vec())?;
    if r.is_empty() {
        debug!("creating product index");
    }
    let old: String = bincode::deserialize(&r[..]).unwrap_or_default();
    let product_list = if old.is_empty() {
        String::from(&pid)
    } else {
        [old, String::from(&pid)].join(",")
    };
    debug!("writing product index {} for id: {}", product_list, list_key);
    let s_product_list = bincode::serialize(&product_list).unwrap_or_default();
    db::DatabaseEnvironment::delete(&db.env, &db.handle, list_key.as_bytes())?;
    db::write_chunks(&db.env, &db.handle, list_key.as_bytes(), &s_product_list)?;
    cache::invalidate(crate::CATALOG_CACHE_KEY)?;
    Ok(new_product)
}

/// Single product lookup
pub fn find(pid: &String) -> Result<Product, LojaError> {
    let db = &DATABASE_LOCK;
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &pid.as_bytes().to_vec())?;
    if r.is_empty() {
        error!("product not found");
        return Err(LojaError::Database(MdbError::NotFound));
    }
    let result: Product = bincode::deserialize(&r[..]).unwrap_or_default();
    Ok(result)
}

/// Catalog listing. Served from the TTL cache when fresh, images
///
/// are stripped either way.
pub fn find_all() -> Result<Vec<Product>, LojaError> {
    if let Some(hit) = cache::get(crate::CATALOG_CACHE_KEY)? {
        let cached: Vec<Product> = bincode::deserialize(&hit[..]).unwrap_or_default();
        if !cached.is_empty() {
            return Ok(cached);
        }
    }
    let db = &DATABASE_LOCK;
    let i_list_key = crate::PRODUCT_LIST_DB_KEY;
    let i_r = db::DatabaseEnvironment::read(&db.env, &db.handle, &i_list_key.as_bytes().to_vec())?;
    if i_r.is_empty() {
        error!("product index not found");
    }
    let de: String = bincode::deserialize(&i_r[..]).unwrap_or_default();
    let i_v: Vec<String> = de.split(",").map(String::from).collect();
    let mut products: Vec<Product> = Vec::new();
    for p in i_v {
        let product: Product = find(&p).unwrap_or_default();
        if !product.pid.is_empty() {
            // don't return images in listings
            let listed = Product {
                image: Vec::new(),
                ..product
            };
            products.push(listed);
        }
    }
    let payload = bincode::serialize(&products).unwrap_or_default();
    cache::put(crate::CATALOG_CACHE_KEY, &payload, crate::CATALOG_CACHE_TTL)?;
    Ok(products)
}

/// Modify product
pub fn modify(p: Json<Product>) -> Result<Product, LojaError> {
    info!("modify product: {}", &p.pid);
    if !validate_product(&p) {
        error!("invalid product");
        return Err(LojaError::Unknown);
    }
    let f_prod: Product = find(&p.pid)?;
    let u_prod = Product::update(f_prod, &p);
    let db = &DATABASE_LOCK;
    db::DatabaseEnvironment::delete(&db.env, &db.handle, u_prod.pid.as_bytes())?;
    let v = bincode::serialize(&u_prod).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, u_prod.pid.as_bytes(), &v)?;
    cache::invalidate(crate::CATALOG_CACHE_KEY)?;
    Ok(u_prod)
}

/// Adjust stock by a signed delta, flipping `in_stock` when the
///
/// quantity reaches zero.
pub fn adjust_qty(pid: &String, delta: i64) -> Result<Product, LojaError> {
    let f_prod: Product = find(pid)?;
    let new_qty: i64 = f_prod.qty as i64 + delta;
    if new_qty < 0 {
        error!("insufficient stock for product {}", pid);
        return Err(LojaError::Order);
    }
    let u_prod = Product {
        qty: new_qty as u64,
        in_stock: new_qty > 0,
        ..f_prod
    };
    let db = &DATABASE_LOCK;
    db::DatabaseEnvironment::delete(&db.env, &db.handle, u_prod.pid.as_bytes())?;
    let v = bincode::serialize(&u_prod).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, u_prod.pid.as_bytes(), &v)?;
    cache::invalidate(crate::CATALOG_CACHE_KEY)?;
    Ok(u_prod)
}

/// check product field lengths to prevent db spam
fn validate_product(p: &Json<Product>) -> bool {
    p.pid.len() < utils::string_limit()
        && p.description.len() < utils::string_limit()
        && p.name.len() < utils::string_limit()
        && p.category.len() < utils::string_limit()
        && p.image.len() < utils::image_limit()
        && p.price >= 0.0
}

// Tests
//-------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn cleanup(k: &String) -> Result<(), LojaError> {
        let db = &DATABASE_LOCK;
        db::DatabaseEnvironment::delete(&db.env, &db.handle, k.as_bytes())?;
        Ok(())
    }

    fn test_product() -> Json<Product> {
        Json(Product {
            name: String::from("Caneca"),
            description: String::from("Caneca de ceramica 300ml"),
            category: String::from("cozinha"),
            price: 49.9,
            qty: 10,
            in_stock: true,
            weight: 400,
            width: 10,
            height: 12,
            length: 10,
            ..Default::default()
        })
    }

    #[test]
    fn create_and_adjust_test() -> Result<(), LojaError> {
        let created = create(test_product())?;
        let sold = adjust_qty(&created.pid, -10)?;
        assert_eq!(sold.qty, 0);
        assert!(!sold.in_stock);
        let oversold = adjust_qty(&created.pid, -1);
        assert!(oversold.is_err());
        let restocked = adjust_qty(&created.pid, 3)?;
        assert_eq!(restocked.qty, 3);
        assert!(restocked.in_stock);
        cleanup(&created.pid)?;
        Ok(())
    }

    #[test]
    fn validate_product_test() {
        let mut bad = test_product();
        bad.name = "x".repeat(utils::string_limit());
        assert!(!validate_product(&bad));
        assert!(validate_product(&test_product()));
    }
}
