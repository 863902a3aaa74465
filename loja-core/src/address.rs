//! Customer shipping address module

use crate::{
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

/// Create a new address for a customer
pub fn create(j: Json<Address>) -> Result<Address, LojaError> {
    let aid: String = format!("{}{}", crate::ADDRESS_DB_KEY, utils::generate_rnd());
    if !validate_address(&j) {
        error!("invalid address");
        return Err(LojaError::Unknown);
    }
    let new_address = Address {
        aid: String::from(&aid),
        cid: String::from(&j.cid),
        label: String::from(&j.label),
        street: String::from(&j.street),
        number: String::from(&j.number),
        complement: String::from(&j.complement),
        district: String::from(&j.district),
        city: String::from(&j.city),
        state: String::from(&j.state),
        postal_code: String::from(&j.postal_code),
        is_default: j.is_default,
    };
    if new_address.is_default {
        clear_default(&new_address.cid)?;
    }
    debug!("insert address: {}", &new_address.aid);
    let db = &DATABASE_LOCK;
    let v = bincode::serialize(&new_address).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, new_address.aid.as_bytes(), &v)?;
    // per-customer index
    let list_key = format!("{}-{}", crate::ADDRESS_LIST_DB_KEY, &new_address.cid);
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &list_key.as_bytes().to_vec())?;
    let old: String = bincode::deserialize(&r[..]).unwrap_or_default();
    let address_list = if old.is_empty() {
        String::from(&aid)
    } else {
        [old, String::from(&aid)].join(",")
    };
    debug!("writing address index {} for customer: {}", address_list, &new_address.cid);
    let s_list = bincode::serialize(&address_list).unwrap_or_default();
    db::DatabaseEnvironment::delete(&db.env, &db.handle, list_key.as_bytes())?;
    db::write_chunks(&db.env, &db.handle, list_key.as_bytes(), &s_list)?;
    Ok(new_address)
}

/// Address lookup
pub fn find(aid: &String) -> Result<Address, LojaError> {
    let db = &DATABASE_LOCK;
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &aid.as_bytes().to_vec())?;
    if r.is_empty() {
        error!("address not found");
        return Err(LojaError::Database(MdbError::NotFound));
    }
    let result: Address = bincode::deserialize(&r[..]).unwrap_or_default();
    Ok(result)
}

/// Lookup all addresses for a customer
pub fn find_all_customer_addresses(cid: &String) -> Result<Vec<Address>, LojaError> {
    let db = &DATABASE_LOCK;
    let i_list_key = format!("{}-{}", crate::ADDRESS_LIST_DB_KEY, cid);
    let i_r = db::DatabaseEnvironment::read(&db.env, &db.handle, &i_list_key.as_bytes().to_vec())?;
    let de: String = bincode::deserialize(&i_r[..]).unwrap_or_default();
    let i_v: Vec<String> = de.split(",").map(String::from).collect();
    let mut addresses: Vec<Address> = Vec::new();
    for a in i_v {
        let address: Address = find(&a).unwrap_or_default();
        if !address.aid.is_empty() {
            addresses.push(address);
        }
    }
    Ok(addresses)
}

/// Modify address. Setting the default flag clears the previous default.
pub fn modify(j: Json<Address>) -> Result<Address, LojaError> {
    info!("modify address: {}", &j.aid);
    if !validate_address(&j) {
        error!("invalid address");
        return Err(LojaError::Unknown);
    }
    let f_address: Address = find(&j.aid)?;
    if j.is_default && !f_address.is_default {
        clear_default(&f_address.cid)?;
    }
    let u_address = Address::update(f_address, &j);
    let db = &DATABASE_LOCK;
    db::DatabaseEnvironment::delete(&db.env, &db.handle, u_address.aid.as_bytes())?;
    let v = bincode::serialize(&u_address).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, u_address.aid.as_bytes(), &v)?;
    Ok(u_address)
}

/// Remove an address and its index entry
pub fn delete(aid: &String) -> Result<(), LojaError> {
    let f_address: Address = find(aid)?;
    let db = &DATABASE_LOCK;
    db::DatabaseEnvironment::delete(&db.env, &db.handle, aid.as_bytes())?;
    let list_key = format!("{}-{}", crate::ADDRESS_LIST_DB_KEY, &f_address.cid);
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &list_key.as_bytes().to_vec())?;
    let old: String = bincode::deserialize(&r[..]).unwrap_or_default();
    let address_list: String = old
        .split(",")
        .filter(|s| *s != aid.as_str())
        .collect::<Vec<&str>>()
        .join(",");
    let s_list = bincode::serialize(&address_list).unwrap_or_default();
    db::DatabaseEnvironment::delete(&db.env, &db.handle, list_key.as_bytes())?;
    db::write_chunks(&db.env, &db.handle, list_key.as_bytes(), &s_list)?;
    Ok(())
}

/// Clear the default flag on every address of a customer
fn clear_default(cid: &String) -> Result<(), LojaError> {
    let addresses = find_all_customer_addresses(cid)?;
    let db = &DATABASE_LOCK;
    for a in addresses {
        if a.is_default {
            let cleared = Address {
                is_default: false,
                ..a
            };
            db::DatabaseEnvironment::delete(&db.env, &db.handle, cleared.aid.as_bytes())?;
            let v = bincode::serialize(&cleared).unwrap_or_default();
            db::write_chunks(&db.env, &db.handle, cleared.aid.as_bytes(), &v)?;
        }
    }
    Ok(())
}

/// check address field lengths to prevent db spam
fn validate_address(a: &Json<Address>) -> bool {
    a.street.len() < utils::string_limit()
        && a.city.len() < utils::string_limit()
        && a.label.len() < utils::string_limit()
        && !a.postal_code.is_empty()
        && !a.cid.is_empty()
}

// Tests
//-------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_address(cid: &str, is_default: bool) -> Json<Address> {
        Json(Address {
            cid: String::from(cid),
            label: String::from("casa"),
            street: String::from("Avenida Paulista"),
            number: String::from("1578"),
            district: String::from("Bela Vista"),
            city: String::from("Sao Paulo"),
            state: String::from("SP"),
            postal_code: String::from("01310-200"),
            is_default,
            ..Default::default()
        })
    }

    #[test]
    fn default_flag_test() -> Result<(), LojaError> {
        let cid = format!("c{}", utils::generate_rnd());
        let first = create(test_address(&cid, true))?;
        let second = create(test_address(&cid, true))?;
        let all = find_all_customer_addresses(&cid)?;
        assert_eq!(all.len(), 2);
        let defaults: Vec<&Address> = all.iter().filter(|a| a.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].aid, second.aid);
        delete(&first.aid)?;
        delete(&second.aid)?;
        let none = find_all_customer_addresses(&cid)?;
        assert!(none.is_empty());
        Ok(())
    }
}
