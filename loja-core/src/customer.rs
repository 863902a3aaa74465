//! Customer account module

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

/// Create a new customer
pub fn create(email: &str, name: &str, salt: &str, digest: &str) -> Result<Customer, LojaError> {
    let f_cid: String = format!("{}{}", crate::CUSTOMER_DB_KEY, utils::generate_rnd());
    let new_customer = Customer {
        cid: String::from(&f_cid),
        created: chrono::offset::Utc::now().timestamp(),
        email: String::from(email),
        name: String::from(name),
        phone: String::new(),
        salt: String::from(salt),
        digest: String::from(digest),
    };
    debug!("insert customer: {}", &new_customer.cid);
    let db = &DATABASE_LOCK;
    let k = &new_customer.cid;
    let v = bincode::serialize(&new_customer).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, k.as_bytes(), &v)?;
    // secondary key for login lookups
    let email_k = format!("{}-{}", crate::CUSTOMER_EMAIL_DB_KEY, email);
    let email_v = bincode::serialize(&f_cid).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, email_k.as_bytes(), &email_v)?;
    Ok(new_customer)
}

/// Customer lookup
pub fn find(cid: &String) -> Result<Customer, LojaError> {
    let db = &DATABASE_LOCK;
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &cid.as_bytes().to_vec())?;
    if r.is_empty() {
        error!("customer not found");
        return Err(LojaError::Database(MdbError::NotFound));
    }
    let customer: Customer = bincode::deserialize(&r[..]).unwrap_or_default();
    Ok(customer)
}

/// Customer lookup through the email secondary key
pub fn find_by_email(email: &String) -> Result<Customer, LojaError> {
    let db = &DATABASE_LOCK;
    let email_k = format!("{}-{}", crate::CUSTOMER_EMAIL_DB_KEY, email);
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &email_k.as_bytes().to_vec())?;
    if r.is_empty() {
        return Err(LojaError::Database(MdbError::NotFound));
    }
    let cid: String = bincode::deserialize(&r[..]).unwrap_or_default();
    find(&cid)
}

/// Modify customer profile
pub fn modify(j: Json<Customer>) -> Result<Customer, LojaError> {
    info!("modify customer: {}", &j.cid);
    let f_cust: Customer = find(&j.cid)?;
    let u_cust = Customer::update(f_cust, String::from(&j.name), String::from(&j.phone));
    let db = &DATABASE_LOCK;
    db::DatabaseEnvironment::delete(&db.env, &db.handle, u_cust.cid.as_bytes())?;
    let v = bincode::serialize(&u_cust).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, u_cust.cid.as_bytes(), &v)?;
    Ok(u_cust)
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

    #[test]
    fn create_test() -> Result<(), LojaError> {
        let email = format!("{}@example.com.br", utils::generate_rnd());
        let test_customer = create(&email, "Maria", "salt", "digest")?;
        let f_customer = find(&test_customer.cid)?;
        assert_eq!(test_customer.email, f_customer.email);
        let by_email = find_by_email(&email)?;
        assert_eq!(by_email.cid, test_customer.cid);
        cleanup(&test_customer.cid)?;
        cleanup(&format!("{}-{}", crate::CUSTOMER_EMAIL_DB_KEY, email))?;
        Ok(())
    }
}
