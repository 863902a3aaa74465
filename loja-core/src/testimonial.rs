//! Storefront testimonial module

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

/// Create a testimonial. New testimonials start unapproved and
///
/// stay out of the public listing until moderation.
pub fn create(j: Json<Testimonial>) -> Result<Testimonial, LojaError> {
    if j.body.is_empty() || j.body.len() >= utils::string_limit() {
        error!("invalid testimonial");
        return Err(LojaError::Unknown);
    }
    let tid: String = format!("{}{}", crate::TESTIMONIAL_DB_KEY, utils::generate_rnd());
    let new_testimonial = Testimonial {
        tid: String::from(&tid),
        cid: String::from(&j.cid),
        author: String::from(&j.author),
        body: String::from(&j.body),
        approved: false,
        created: chrono::offset::Utc::now().timestamp(),
    };
    debug!("insert testimonial: {}", &new_testimonial.tid);
    let db = &DATABASE_LOCK;
    let v = bincode::serialize(&new_testimonial).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, new_testimonial.tid.as_bytes(), &v)?;
    let list_key = crate::TESTIMONIAL_LIST_DB_KEY;
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &list_key.as_bytes().to_vec())?;
    let old: String = bincode::deserialize(&r[..]).unwrap_or_default();
    let testimonial_list = if old.is_empty() {
        String::from(&tid)
    } else {
        [old, String::from(&tid)].join(",")
    };
    let s_list = bincode::serialize(&testimonial_list).unwrap_or_default();
    db::DatabaseEnvironment::delete(&db.env, &db.handle, list_key.as_bytes())?;
    db::write_chunks(&db.env, &db.handle, list_key.as_bytes(), &s_list)?;
    Ok(new_testimonial)
}

/// Testimonial lookup
pub fn find(tid: &String) -> Result<Testimonial, LojaError> {
    let db = &DATABASE_LOCK;
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &tid.as_bytes().to_vec())?;
    if r.is_empty() {
        error!("testimonial not found");
        return Err(LojaError::Database(MdbError::NotFound));
    }
    let result: Testimonial = bincode::deserialize(&r[..]).unwrap_or_default();
    Ok(result)
}

/// Lookup all testimonials. `approved_only` drives the public listing.
pub fn find_all(approved_only: bool) -> Result<Vec<Testimonial>, LojaError> {
    let db = &DATABASE_LOCK;
    let i_list_key = crate::TESTIMONIAL_LIST_DB_KEY;
    let i_r = db::DatabaseEnvironment::read(&db.env, &db.handle, &i_list_key.as_bytes().to_vec())?;
    let de: String = bincode::deserialize(&i_r[..]).unwrap_or_default();
    let i_v: Vec<String> = de.split(",").map(String::from).collect();
    let mut testimonials: Vec<Testimonial> = Vec::new();
    for t in i_v {
        let testimonial: Testimonial = find(&t).unwrap_or_default();
        if testimonial.tid.is_empty() {
            continue;
        }
        if !approved_only || testimonial.approved {
            testimonials.push(testimonial);
        }
    }
    Ok(testimonials)
}

/// Approve a testimonial for the public listing
pub fn approve(tid: &String) -> Result<Testimonial, LojaError> {
    info!("approve testimonial: {}", tid);
    let f_testimonial: Testimonial = find(tid)?;
    let u_testimonial = Testimonial {
        approved: true,
        ..f_testimonial
    };
    let db = &DATABASE_LOCK;
    db::DatabaseEnvironment::delete(&db.env, &db.handle, u_testimonial.tid.as_bytes())?;
    let v = bincode::serialize(&u_testimonial).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, u_testimonial.tid.as_bytes(), &v)?;
    Ok(u_testimonial)
}

// Tests
//-------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_gates_public_listing_test() -> Result<(), LojaError> {
        let created = create(Json(Testimonial {
            cid: format!("c{}", utils::generate_rnd()),
            author: String::from("Ana"),
            body: String::from("entrega rapida, recomendo"),
            ..Default::default()
        }))?;
        assert!(!created.approved);
        let public = find_all(true)?;
        assert!(!public.iter().any(|t| t.tid == created.tid));
        approve(&created.tid)?;
        let public = find_all(true)?;
        assert!(public.iter().any(|t| t.tid == created.tid));
        let db = &DATABASE_LOCK;
        db::DatabaseEnvironment::delete(&db.env, &db.handle, created.tid.as_bytes())?;
        Ok(())
    }
}
