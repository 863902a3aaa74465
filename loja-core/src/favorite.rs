//! Customer favorites module

use crate::{
    db::{
        self,
        DATABASE_LOCK,
    },
    error::LojaError,
    models::*,
    product,
};
use log::{
    debug,
    info,
};

fn favorite_key(cid: &str) -> String {
    format!("{}-{}", crate::FAVORITE_LIST_DB_KEY, cid)
}

fn read_list(cid: &String) -> Result<Vec<String>, LojaError> {
    let db = &DATABASE_LOCK;
    let k = favorite_key(cid);
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &k.as_bytes().to_vec())?;
    let de: String = bincode::deserialize(&r[..]).unwrap_or_default();
    Ok(de.split(",").filter(|s| !s.is_empty()).map(String::from).collect())
}

fn write_list(cid: &String, pids: &[String]) -> Result<(), LojaError> {
    let db = &DATABASE_LOCK;
    let k = favorite_key(cid);
    let joined = pids.join(",");
    let v = bincode::serialize(&joined).unwrap_or_default();
    db::DatabaseEnvironment::delete(&db.env, &db.handle, k.as_bytes()).unwrap_or(());
    db::write_chunks(&db.env, &db.handle, k.as_bytes(), &v)?;
    Ok(())
}

/// Add a product to a customer's favorites, deduplicated
pub fn add(cid: &String, pid: &String) -> Result<Vec<String>, LojaError> {
    info!("favorite {} for customer {}", pid, cid);
    // only existing products can be favorited
    product::find(pid)?;
    let mut pids = read_list(cid)?;
    if !pids.contains(pid) {
        pids.push(String::from(pid));
        write_list(cid, &pids)?;
    } else {
        debug!("product {} already favorited", pid);
    }
    Ok(pids)
}

/// Remove a product from a customer's favorites
pub fn remove(cid: &String, pid: &String) -> Result<Vec<String>, LojaError> {
    info!("unfavorite {} for customer {}", pid, cid);
    let pids: Vec<String> = read_list(cid)?
        .into_iter()
        .filter(|p| p != pid)
        .collect();
    write_list(cid, &pids)?;
    Ok(pids)
}

/// Lookup the favorited products of a customer
pub fn find_all_customer_favorites(cid: &String) -> Result<Vec<Product>, LojaError> {
    let pids = read_list(cid)?;
    let mut products: Vec<Product> = Vec::new();
    for p in pids {
        let product: Product = product::find(&p).unwrap_or_default();
        if !product.pid.is_empty() {
            products.push(product);
        }
    }
    Ok(products)
}

// Tests
//-------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils;
    use rocket::serde::json::Json;

    #[test]
    fn add_remove_test() -> Result<(), LojaError> {
        let cid = format!("c{}", utils::generate_rnd());
        let created = product::create(Json(Product {
            name: String::from("Livro"),
            description: String::from("Dom Casmurro"),
            price: 29.9,
            qty: 1,
            in_stock: true,
            ..Default::default()
        }))?;
        let added = add(&cid, &created.pid)?;
        assert_eq!(added.len(), 1);
        // adding twice does not duplicate
        let again = add(&cid, &created.pid)?;
        assert_eq!(again.len(), 1);
        let favorites = find_all_customer_favorites(&cid)?;
        assert_eq!(favorites[0].pid, created.pid);
        let removed = remove(&cid, &created.pid)?;
        assert!(removed.is_empty());
        let db = &DATABASE_LOCK;
        db::DatabaseEnvironment::delete(&db.env, &db.handle, created.pid.as_bytes())?;
        db::DatabaseEnvironment::delete(&db.env, &db.handle, favorite_key(&cid).as_bytes())?;
        Ok(())
    }
}
