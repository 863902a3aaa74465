//! TTL key/value wrapper over LMDB for hot read paths

use crate::{
    db::{
        self,
        DATABASE_LOCK,
    },
    error::LojaError,
};
use log::debug;
use rocket::serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
struct CacheEntry {
    expires: i64,
    payload: Vec<u8>,
}

fn cache_key(key: &str) -> String {
    format!("{}-{}", crate::CACHE_DB_KEY, key)
}

/// Store a payload for `ttl` seconds
pub fn put(key: &str, payload: &[u8], ttl: i64) -> Result<(), LojaError> {
    let entry = CacheEntry {
        expires: chrono::offset::Utc::now().timestamp() + ttl,
        payload: payload.to_vec(),
    };
    let db = &DATABASE_LOCK;
    let k = cache_key(key);
    db::DatabaseEnvironment::delete(&db.env, &db.handle, k.as_bytes()).unwrap_or(());
    let v = bincode::serialize(&entry).unwrap_or_default();
    db::write_chunks(&db.env, &db.handle, k.as_bytes(), &v)?;
    debug!("cached {} for {}s", key, ttl);
    Ok(())
}

/// Fetch a payload if it is still fresh. Expired entries are
///
/// deleted on read.
pub fn get(key: &str) -> Result<Option<Vec<u8>>, LojaError> {
    let db = &DATABASE_LOCK;
    let k = cache_key(key);
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &k.as_bytes().to_vec())?;
    if r.is_empty() {
        return Ok(None);
    }
    let entry: CacheEntry = bincode::deserialize(&r[..]).unwrap_or_default();
    let now = chrono::offset::Utc::now().timestamp();
    if now > entry.expires {
        debug!("cache key {} expired", key);
        db::DatabaseEnvironment::delete(&db.env, &db.handle, k.as_bytes())?;
        return Ok(None);
    }
    Ok(Some(entry.payload))
}

/// Drop a cached payload after the underlying data changes
pub fn invalidate(key: &str) -> Result<(), LojaError> {
    debug!("invalidating cache key {}", key);
    let db = &DATABASE_LOCK;
    let k = cache_key(key);
    let r = db::DatabaseEnvironment::read(&db.env, &db.handle, &k.as_bytes().to_vec())?;
    if r.is_empty() {
        return Ok(());
    }
    db::DatabaseEnvironment::delete(&db.env, &db.handle, k.as_bytes())?;
    Ok(())
}

// Tests
//-------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_invalidate_test() -> Result<(), LojaError> {
        let key = format!("test-{}", crate::utils::generate_rnd());
        put(&key, b"fresh", 60)?;
        let hit = get(&key)?;
        assert_eq!(hit, Some(b"fresh".to_vec()));
        invalidate(&key)?;
        let miss = get(&key)?;
        assert_eq!(miss, None);
        Ok(())
    }

    #[test]
    fn expired_entry_test() -> Result<(), LojaError> {
        let key = format!("test-{}", crate::utils::generate_rnd());
        // already stale when written
        put(&key, b"stale", -1)?;
        let miss = get(&key)?;
        assert_eq!(miss, None);
        Ok(())
    }
}
