//! Coupon eligibility and discount module

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

pub enum CouponKind {
    Fixed,
    Percent,
}

impl CouponKind {
    pub fn value(&self) -> String {
        match *self {
            CouponKind::Fixed => String::from("fixed"),
            CouponKind::Percent => String::from("percent"),
        }
    }
}

fn coupon_key(code: &str) -> String {
    format!("{}-{}", crate::COUPON_DB_KEY, code.to_uppercase())
}

/// Create a new coupon. The code is the natural key, stored uppercased.
pub fn create(j: Json<Coupon>) -> Result<Coupon, LojaError> {
    let code = j.code.to_uppercase();
    if code.is_empty() || code.len() >= utils::string_limit() || j.value <= 0.0 {
        error!("invalid coupon");
        return Err(LojaError::Coupon);
    }
    if j.kind != CouponKind::Fixed.value() && j.kind != CouponKind::Percent.value() {
        error!("unknown coupon kind: {}", &j.kind);
        return Err(LojaError::Coupon);
    }
    let new_coupon = Coupon {
        code: String::from(&code),
        kind: String::from(&j.kind),
        value: j.value,
        min_subtotal: j.min_subtotal,
        expires_at: j.expires_at,
        usage_limit: j.usage_limit,
        used: 0,
        active: j.active,
    };
    debug!("insert coupon: {}", &new_coupon.code);
    let db = &DATABASE_LOCK;
    let k = coupon_key(&code);
    let v = bincode::serialize(&new_coupon).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, k.as_bytes(), &v)?;
    let list_key = crate::COUPON_LIST_DB_KEY;
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &list_key.as_bytes().to_vec())?;
    let old: String = bincode::deserialize(&r[..]).unwrap_or_default();
    if !old.split(",").any(|c| c == code) {
        let coupon_list = if old.is_empty() {
            String::from(&code)
        } else {
            [old, String::from(&code)].join(",")
        };
        let s_list = bincode::serialize(&coupon_list).unwrap_or_default();
        db::DatabaseEnvironment::delete(&db.env, &db.handle, list_key.as_bytes())?;
        db::write_chunks(&db.env, &db.handle, list_key.as_bytes(), &s_list)?;
    }
    Ok(new_coupon)
}

/// Coupon lookup
pub fn find(code: &String) -> Result<Coupon, LojaError> {
    let db = &DATABASE_LOCK;
    let k = coupon_key(code);
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &k.as_bytes().to_vec())?;
    if r.is_empty() {
        error!("coupon not found");
        return Err(LojaError::Database(MdbError::NotFound));
    }
    let result: Coupon = bincode::deserialize(&r[..]).unwrap_or_default();
    Ok(result)
}

/// Lookup all coupons
pub fn find_all() -> Result<Vec<Coupon>, LojaError> {
    let db = &DATABASE_LOCK;
    let i_list_key = crate::COUPON_LIST_DB_KEY;
    let i_r = db::DatabaseEnvironment::read(&db.env, &db.handle, &i_list_key.as_bytes().to_vec())?;
    let de: String = bincode::deserialize(&i_r[..]).unwrap_or_default();
    let i_v: Vec<String> = de.split(",").map(String::from).collect();
    let mut coupons: Vec<Coupon> = Vec::new();
    for c in i_v {
        let coupon: Coupon = find(&c).unwrap_or_default();
        if !coupon.code.is_empty() {
            coupons.push(coupon);
        }
    }
    Ok(coupons)
}

/// Eligibility check and discount computation against a subtotal.
///
/// Percent discounts are rounded to cents, fixed discounts never
///
/// exceed the subtotal.
pub fn validate(code: &String, subtotal: f64) -> Result<f64, LojaError> {
    let f_coupon: Coupon = find(code)?;
    let now = chrono::offset::Utc::now().timestamp();
    if !f_coupon.active {
        info!("coupon {} is inactive", &f_coupon.code);
        return Err(LojaError::Coupon);
    }
    if f_coupon.expires_at > 0 && now > f_coupon.expires_at {
        info!("coupon {} expired", &f_coupon.code);
        return Err(LojaError::Coupon);
    }
    if subtotal < f_coupon.min_subtotal {
        info!("subtotal below coupon {} minimum", &f_coupon.code);
        return Err(LojaError::Coupon);
    }
    if f_coupon.usage_limit > 0 && f_coupon.used >= f_coupon.usage_limit {
        info!("coupon {} exhausted", &f_coupon.code);
        return Err(LojaError::Coupon);
    }
    let discount = if f_coupon.kind == CouponKind::Percent.value() {
        utils::round_brl(subtotal * f_coupon.value / 100.0)
    } else {
        f_coupon.value.min(subtotal)
    };
    Ok(discount)
}

/// Increment the usage counter after a successful charge
pub fn redeem(code: &String) -> Result<Coupon, LojaError> {
    let f_coupon: Coupon = find(code)?;
    let u_coupon = Coupon {
        used: f_coupon.used + 1,
        ..f_coupon
    };
    debug!("coupon {} used {} times", &u_coupon.code, u_coupon.used);
    let db = &DATABASE_LOCK;
    let k = coupon_key(&u_coupon.code);
    db::DatabaseEnvironment::delete(&db.env, &db.handle, k.as_bytes())?;
    let v = bincode::serialize(&u_coupon).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, k.as_bytes(), &v)?;
    Ok(u_coupon)
}

// Tests
//-------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn cleanup(code: &str) {
        let db = &DATABASE_LOCK;
        let k = coupon_key(code);
        let _ = db::DatabaseEnvironment::delete(&db.env, &db.handle, k.as_bytes());
    }

    fn test_coupon(code: &str, kind: CouponKind, value: f64) -> Json<Coupon> {
        Json(Coupon {
            code: String::from(code),
            kind: kind.value(),
            value,
            min_subtotal: 50.0,
            expires_at: chrono::offset::Utc::now().timestamp() + 3600,
            usage_limit: 2,
            active: true,
            ..Default::default()
        })
    }

    #[test]
    fn percent_discount_test() -> Result<(), LojaError> {
        let code = format!("DEZ{}", &utils::generate_rnd()[..8]);
        create(test_coupon(&code, CouponKind::Percent, 10.0))?;
        let discount = validate(&code, 99.9)?;
        assert_eq!(discount, 9.99);
        cleanup(&code);
        Ok(())
    }

    #[test]
    fn fixed_discount_caps_at_subtotal_test() -> Result<(), LojaError> {
        let code = format!("VALE{}", &utils::generate_rnd()[..8]);
        create(test_coupon(&code, CouponKind::Fixed, 80.0))?;
        let discount = validate(&code, 60.0)?;
        assert_eq!(discount, 60.0);
        cleanup(&code);
        Ok(())
    }

    #[test]
    fn min_subtotal_test() -> Result<(), LojaError> {
        let code = format!("MIN{}", &utils::generate_rnd()[..8]);
        create(test_coupon(&code, CouponKind::Percent, 10.0))?;
        let below = validate(&code, 49.99);
        assert!(below.is_err());
        cleanup(&code);
        Ok(())
    }

    #[test]
    fn usage_limit_test() -> Result<(), LojaError> {
        let code = format!("LIM{}", &utils::generate_rnd()[..8]);
        create(test_coupon(&code, CouponKind::Fixed, 5.0))?;
        redeem(&code)?;
        redeem(&code)?;
        let exhausted = validate(&code, 100.0);
        assert!(exhausted.is_err());
        cleanup(&code);
        Ok(())
    }

    #[test]
    fn expired_coupon_test() -> Result<(), LojaError> {
        let code = format!("EXP{}", &utils::generate_rnd()[..8]);
        let mut j = test_coupon(&code, CouponKind::Fixed, 5.0);
        j.expires_at = chrono::offset::Utc::now().timestamp() - 1;
        create(j)?;
        let expired = validate(&code, 100.0);
        assert!(expired.is_err());
        cleanup(&code);
        Ok(())
    }
}
