//! Product review module

use crate::{
    db::{
        self,
        DATABASE_LOCK,
    },
    error::LojaError,
    models::*,
    product,
    reqres,
    utils,
};
use kn0sys_lmdb_rs::MdbError;
use log::{
    debug,
    error,
    info,
};
use rocket::serde::json::Json;

/// Create a review. A customer reviews a product at most once,
///
/// a newer review replaces the older one.
pub fn create(j: Json<Review>) -> Result<Review, LojaError> {
    if j.rating < 1 || j.rating > 5 || j.comment.len() >= utils::string_limit() {
        error!("invalid review");
        return Err(LojaError::Unknown);
    }
    // only existing products can be reviewed
    product::find(&j.pid)?;
    let existing = find_all_product_reviews(&j.pid)?;
    for r in existing {
        if r.cid == j.cid {
            info!("replacing review {} from customer {}", &r.rid, &r.cid);
            delete(&r.rid)?;
        }
    }
    let rid: String = format!("{}{}", crate::REVIEW_DB_KEY, utils::generate_rnd());
    let new_review = Review {
        rid: String::from(&rid),
        cid: String::from(&j.cid),
        pid: String::from(&j.pid),
        rating: j.rating,
        comment: String::from(&j.comment),
        created: chrono::offset::Utc::now().timestamp(),
    };
    debug!("insert review: {}", &new_review.rid);
    let db = &DATABASE_LOCK;
    let v = bincode::serialize(&new_review).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, new_review.rid.as_bytes(), &v)?;
    // per-product index
    let list_key = format!("{}-{}", crate::REVIEW_LIST_DB_KEY, &new_review.pid);
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &list_key.as_bytes().to_vec())?;
    let old: String = bincode::deserialize(&r[..]).unwrap_or_default();
    let review_list = if old.is_empty() {
        String::from(&rid)
    } else {
        [old, String::from(&rid)].join(",")
    };
    let s_list = bincode::serialize(&review_list).unwrap_or_default();
    db::DatabaseEnvironment::delete(&db.env, &db.handle, list_key.as_bytes())?;
    db::write_chunks(&db.env, &db.handle, list_key.as_bytes(), &s_list)?;
    Ok(new_review)
}

/// Review lookup
pub fn find(rid: &String) -> Result<Review, LojaError> {
    let db = &DATABASE_LOCK;
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &rid.as_bytes().to_vec())?;
    if r.is_empty() {
        error!("review not found");
        return Err(LojaError::Database(MdbError::NotFound));
    }
    let result: Review = bincode::deserialize(&r[..]).unwrap_or_default();
    Ok(result)
}

/// Lookup all reviews for a product
pub fn find_all_product_reviews(pid: &String) -> Result<Vec<Review>, LojaError> {
    let db = &DATABASE_LOCK;
    let i_list_key = format!("{}-{}", crate::REVIEW_LIST_DB_KEY, pid);
    let i_r = db::DatabaseEnvironment::read(&db.env, &db.handle, &i_list_key.as_bytes().to_vec())?;
    let de: String = bincode::deserialize(&i_r[..]).unwrap_or_default();
    let i_v: Vec<String> = de.split(",").map(String::from).collect();
    let mut reviews: Vec<Review> = Vec::new();
    for r in i_v {
        let review: Review = find(&r).unwrap_or_default();
        if !review.rid.is_empty() {
            reviews.push(review);
        }
    }
    Ok(reviews)
}

/// Review count and average rating for a product
pub fn rating_summary(pid: &String) -> Result<reqres::RatingSummary, LojaError> {
    let reviews = find_all_product_reviews(pid)?;
    let count = reviews.len() as u64;
    let average = if count == 0 {
        0.0
    } else {
        let sum: u64 = reviews.iter().map(|r| r.rating as u64).sum();
        utils::round_brl(sum as f64 / count as f64)
    };
    Ok(reqres::RatingSummary {
        pid: String::from(pid),
        count,
        average,
    })
}

/// Remove a review and its index entry
pub fn delete(rid: &String) -> Result<(), LojaError> {
    let f_review: Review = find(rid)?;
    let db = &DATABASE_LOCK;
    db::DatabaseEnvironment::delete(&db.env, &db.handle, rid.as_bytes())?;
    let list_key = format!("{}-{}", crate::REVIEW_LIST_DB_KEY, &f_review.pid);
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &list_key.as_bytes().to_vec())?;
    let old: String = bincode::deserialize(&r[..]).unwrap_or_default();
    let review_list: String = old
        .split(",")
        .filter(|s| *s != rid.as_str())
        .collect::<Vec<&str>>()
        .join(",");
    let s_list = bincode::serialize(&review_list).unwrap_or_default();
    db::DatabaseEnvironment::delete(&db.env, &db.handle, list_key.as_bytes())?;
    db::write_chunks(&db.env, &db.handle, list_key.as_bytes(), &s_list)?;
    Ok(())
}

// Tests
//-------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product() -> Result<Product, LojaError> {
        product::create(Json(Product {
            name: String::from("Fone"),
            description: String::from("Fone de ouvido bluetooth"),
            price: 199.0,
            qty: 5,
            in_stock: true,
            ..Default::default()
        }))
    }

    #[test]
    fn one_review_per_customer_test() -> Result<(), LojaError> {
        let p = test_product()?;
        let cid = format!("c{}", utils::generate_rnd());
        create(Json(Review {
            cid: String::from(&cid),
            pid: String::from(&p.pid),
            rating: 2,
            comment: String::from("chegou atrasado"),
            ..Default::default()
        }))?;
        let replacement = create(Json(Review {
            cid: String::from(&cid),
            pid: String::from(&p.pid),
            rating: 4,
            comment: String::from("atualizando depois do suporte"),
            ..Default::default()
        }))?;
        let all = find_all_product_reviews(&p.pid)?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].rid, replacement.rid);
        assert_eq!(all[0].rating, 4);
        delete(&replacement.rid)?;
        let db = &DATABASE_LOCK;
        db::DatabaseEnvironment::delete(&db.env, &db.handle, p.pid.as_bytes())?;
        Ok(())
    }

    #[test]
    fn rating_summary_test() -> Result<(), LojaError> {
        let p = test_product()?;
        for rating in [3, 4, 5] {
            create(Json(Review {
                cid: format!("c{}", utils::generate_rnd()),
                pid: String::from(&p.pid),
                rating,
                comment: String::from("ok"),
                ..Default::default()
            }))?;
        }
        let summary = rating_summary(&p.pid)?;
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, 4.0);
        for r in find_all_product_reviews(&p.pid)? {
            delete(&r.rid)?;
        }
        let db = &DATABASE_LOCK;
        db::DatabaseEnvironment::delete(&db.env, &db.handle, p.pid.as_bytes())?;
        Ok(())
    }

    #[test]
    fn rating_bounds_test() {
        let zero = create(Json(Review {
            cid: String::from("c1"),
            pid: String::from("p-missing"),
            rating: 0,
            ..Default::default()
        }));
        assert!(zero.is_err());
        let six = create(Json(Review {
            cid: String::from("c1"),
            pid: String::from("p-missing"),
            rating: 6,
            ..Default::default()
        }));
        assert!(six.is_err());
    }
}
