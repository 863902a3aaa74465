//! Stored payment card module. Only gateway tokens and display
//!
//! data are persisted, never the primary account number.

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
};
use rocket::serde::json::Json;

/// Save a tokenized card for a customer
pub fn create(j: Json<Card>) -> Result<Card, LojaError> {
    if !validate_card(&j) {
        error!("invalid card");
        return Err(LojaError::Unknown);
    }
    let ccid: String = format!("{}{}", crate::CARD_DB_KEY, utils::generate_rnd());
    let new_card = Card {
        ccid: String::from(&ccid),
        cid: String::from(&j.cid),
        token: String::from(&j.token),
        brand: String::from(&j.brand),
        holder: String::from(&j.holder),
        last4: String::from(&j.last4),
        exp_month: j.exp_month,
        exp_year: j.exp_year,
    };
    debug!("insert card: {}", &new_card.ccid);
    let db = &DATABASE_LOCK;
    let v = bincode::serialize(&new_card).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, new_card.ccid.as_bytes(), &v)?;
    let list_key = format!("{}-{}", crate::CARD_LIST_DB_KEY, &new_card.cid);
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &list_key.as_bytes().to_vec())?;
    let old: String = bincode::deserialize(&r[..]).unwrap_or_default();
    let card_list = if old.is_empty() {
        String::from(&ccid)
    } else {
        [old, String::from(&ccid)].join(",")
    };
    let s_list = bincode::serialize(&card_list).unwrap_or_default();
    db::DatabaseEnvironment::delete(&db.env, &db.handle, list_key.as_bytes())?;
    db::write_chunks(&db.env, &db.handle, list_key.as_bytes(), &s_list)?;
    Ok(new_card)
}

/// Card lookup
pub fn find(ccid: &String) -> Result<Card, LojaError> {
    let db = &DATABASE_LOCK;
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &ccid.as_bytes().to_vec())?;
    if r.is_empty() {
        error!("card not found");
        return Err(LojaError::Database(MdbError::NotFound));
    }
    let result: Card = bincode::deserialize(&r[..]).unwrap_or_default();
    Ok(result)
}

/// Lookup all cards for a customer
pub fn find_all_customer_cards(cid: &String) -> Result<Vec<Card>, LojaError> {
    let db = &DATABASE_LOCK;
    let i_list_key = format!("{}-{}", crate::CARD_LIST_DB_KEY, cid);
    let i_r = db::DatabaseEnvironment::read(&db.env, &db.handle, &i_list_key.as_bytes().to_vec())?;
    let de: String = bincode::deserialize(&i_r[..]).unwrap_or_default();
    let i_v: Vec<String> = de.split(",").map(String::from).collect();
    let mut cards: Vec<Card> = Vec::new();
    for c in i_v {
        let card: Card = find(&c).unwrap_or_default();
        if !card.ccid.is_empty() {
            cards.push(card);
        }
    }
    Ok(cards)
}

/// Remove a stored card and its index entry
pub fn delete(ccid: &String) -> Result<(), LojaError> {
    let f_card: Card = find(ccid)?;
    let db = &DATABASE_LOCK;
    db::DatabaseEnvironment::delete(&db.env, &db.handle, ccid.as_bytes())?;
    let list_key = format!("{}-{}", crate::CARD_LIST_DB_KEY, &f_card.cid);
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &list_key.as_bytes().to_vec())?;
    let old: String = bincode::deserialize(&r[..]).unwrap_or_default();
    let card_list: String = old
        .split(",")
        .filter(|s| *s != ccid.as_str())
        .collect::<Vec<&str>>()
        .join(",");
    let s_list = bincode::serialize(&card_list).unwrap_or_default();
    db::DatabaseEnvironment::delete(&db.env, &db.handle, list_key.as_bytes())?;
    db::write_chunks(&db.env, &db.handle, list_key.as_bytes(), &s_list)?;
    Ok(())
}

/// the token comes from the gateway, the last4 is display-only
fn validate_card(c: &Json<Card>) -> bool {
    !c.cid.is_empty()
        && !c.token.is_empty()
        && c.token.len() < utils::string_limit()
        && c.last4.len() == 4
        && c.last4.chars().all(|d| d.is_ascii_digit())
        && c.exp_month >= 1
        && c.exp_month <= 12
}

// Tests
//-------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_find_delete_test() -> Result<(), LojaError> {
        let cid = format!("c{}", utils::generate_rnd());
        let card = create(Json(Card {
            cid: String::from(&cid),
            token: String::from("tok_abc123"),
            brand: String::from("master"),
            holder: String::from("JOAO SOUZA"),
            last4: String::from("0007"),
            exp_month: 6,
            exp_year: 2031,
            ..Default::default()
        }))?;
        let all = find_all_customer_cards(&cid)?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].last4, "0007");
        delete(&card.ccid)?;
        let gone = find(&card.ccid);
        assert!(gone.is_err());
        Ok(())
    }

    #[test]
    fn validate_card_test() {
        let bad_last4 = Json(Card {
            cid: String::from("c1"),
            token: String::from("tok"),
            last4: String::from("12ab"),
            exp_month: 6,
            ..Default::default()
        });
        assert!(!validate_card(&bad_last4));
        let bad_month = Json(Card {
            cid: String::from("c1"),
            token: String::from("tok"),
            last4: String::from("1234"),
            exp_month: 13,
            ..Default::default()
        });
        assert!(!validate_card(&bad_month));
    }
}
