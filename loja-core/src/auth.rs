//! Authorization module for customer registration, login and JWTs

use crate::{
    args,
    customer,
    error::LojaError,
    models::*,
    reqres,
    utils,
};
use clap::Parser;
use log::{
    debug,
    error,
    info,
};
use rocket::{
    http::Status,
    outcome::Outcome,
    request,
    request::FromRequest,
    serde::json::Json,
    Request,
};

use hmac::{
    Hmac,
    Mac,
};
use jwt::*;
use sha2::Sha384;
use std::collections::BTreeMap;

/// Register a new customer with a salted credential digest
pub fn register(j: Json<reqres::RegisterRequest>) -> Result<Customer, LojaError> {
    info!("registering customer");
    if j.email.is_empty() || !j.email.contains('@') || j.password.is_empty() {
        error!("invalid registration");
        return Err(LojaError::Auth);
    }
    if j.email.len() > utils::string_limit() || j.name.len() > utils::string_limit() {
        error!("invalid registration field length");
        return Err(LojaError::Auth);
    }
    if customer::find_by_email(&j.email).is_ok() {
        error!("email already registered");
        return Err(LojaError::Auth);
    }
    let salt: String = utils::generate_rnd();
    let digest: String = hash_credential(&j.password, &salt);
    customer::create(&j.email, &j.name, &salt, &digest)
}

/// Verify credentials and issue a token for recurring requests
pub fn login(j: Json<reqres::LoginRequest>) -> Result<reqres::TokenResponse, LojaError> {
    info!("customer login: {}", &j.email);
    let f_customer: Customer = customer::find_by_email(&j.email).map_err(|_| LojaError::Auth)?;
    let digest: String = hash_credential(&j.password, &f_customer.salt);
    if digest != f_customer.digest {
        error!("credential validation failed");
        return Err(LojaError::Auth);
    }
    let created: i64 = chrono::offset::Utc::now().timestamp();
    let token: String = create_token(String::from(&f_customer.cid), created)?;
    Ok(reqres::TokenResponse {
        cid: String::from(&f_customer.cid),
        token,
    })
}

/// Salted credential digest. The salt is stored per customer.
pub fn hash_credential(password: &str, salt: &str) -> String {
    let mut mac: Hmac<Sha384> =
        Hmac::new_from_slice(salt.as_bytes()).expect("hmac can take a key of any size");
    mac.update(password.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// get the auth expiration command line configuration
fn get_auth_expiration() -> i64 {
    let args = args::Args::parse();
    args.token_timeout * 60
}

fn create_token(cid: String, created: i64) -> Result<String, LojaError> {
    let jwt_secret_key = utils::get_jwt_secret_key()?;
    let key: Hmac<Sha384> =
        Hmac::new_from_slice(jwt_secret_key.as_bytes()).map_err(|_| LojaError::Auth)?;
    let header = Header {
        algorithm: AlgorithmType::Hs384,
        ..Default::default()
    };
    let mut claims = BTreeMap::new();
    let expiration = created + get_auth_expiration();
    claims.insert("cid", cid);
    claims.insert("expiration", expiration.to_string());
    let token = Token::new(header, claims)
        .sign_with_key(&key)
        .map_err(|_| LojaError::Auth)?;
    Ok(String::from(token.as_str()))
}

/// Token guard for all protected routes
#[derive(Debug)]
pub struct BearerToken(String);

impl BearerToken {
    /// customer id extracted from the verified claims
    pub fn get_cid(self) -> String {
        self.0
    }
}

#[derive(Debug)]
pub enum BearerTokenError {
    Expired,
    Missing,
    Invalid,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BearerToken {
    type Error = BearerTokenError;

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let env = utils::get_release_env();
        let dev = utils::ReleaseEnvironment::Development;
        if env == dev {
            return Outcome::Success(BearerToken(String::new()));
        }
        let token = request.headers().get_one("token");
        match token {
            Some(token) => {
                // check validity
                let jwt_secret_key = utils::get_jwt_secret_key().unwrap_or_default();
                let key: Hmac<Sha384> = match Hmac::new_from_slice(jwt_secret_key.as_bytes()) {
                    Ok(k) => k,
                    Err(_) => {
                        return Outcome::Error((Status::Unauthorized, BearerTokenError::Invalid))
                    }
                };
                let jwt: Result<
                    Token<jwt::Header, BTreeMap<std::string::String, std::string::String>, _>,
                    jwt::Error,
                > = token.verify_with_key(&key);
                match jwt {
                    Ok(j) => {
                        let claims = j.claims();
                        debug!("claim cid: {}", claims["cid"]);
                        // verify expiration
                        let now: i64 = chrono::offset::Utc::now().timestamp();
                        let expire = claims["expiration"].parse::<i64>().unwrap_or(0);
                        if now > expire {
                            return Outcome::Error((
                                Status::Unauthorized,
                                BearerTokenError::Expired,
                            ));
                        }
                        Outcome::Success(BearerToken(String::from(&claims["cid"])))
                    }
                    Err(_) => Outcome::Error((Status::Unauthorized, BearerTokenError::Invalid)),
                }
            }
            None => Outcome::Error((Status::Unauthorized, BearerTokenError::Missing)),
        }
    }
}

// Tests
//-------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_credential_test() {
        let salt = "6a61";
        let digest = hash_credential("correct horse", salt);
        let again = hash_credential("correct horse", salt);
        assert_eq!(digest, again);
        let wrong = hash_credential("incorrect horse", salt);
        assert_ne!(digest, wrong);
        let other_salt = hash_credential("correct horse", "6a62");
        assert_ne!(digest, other_salt);
    }

    #[test]
    fn register_and_login_test() -> Result<(), LojaError> {
        utils::gen_signing_keys()?;
        let email = format!("{}@example.com.br", utils::generate_rnd());
        let registered = register(Json(reqres::RegisterRequest {
            email: String::from(&email),
            name: String::from("Maria"),
            password: String::from("correct horse"),
        }))?;
        // duplicate email is rejected
        let duplicate = register(Json(reqres::RegisterRequest {
            email: String::from(&email),
            name: String::from("Maria"),
            password: String::from("another"),
        }));
        assert!(duplicate.is_err());
        let wrong = login(Json(reqres::LoginRequest {
            email: String::from(&email),
            password: String::from("incorrect horse"),
        }));
        assert!(wrong.is_err());
        let session = login(Json(reqres::LoginRequest {
            email: String::from(&email),
            password: String::from("correct horse"),
        }))?;
        assert_eq!(session.cid, registered.cid);
        assert!(!session.token.is_empty());
        let db = &crate::db::DATABASE_LOCK;
        crate::db::DatabaseEnvironment::delete(&db.env, &db.handle, registered.cid.as_bytes())?;
        crate::db::DatabaseEnvironment::delete(
            &db.env,
            &db.handle,
            format!("{}-{}", crate::CUSTOMER_EMAIL_DB_KEY, email).as_bytes(),
        )?;
        Ok(())
    }

    #[test]
    fn create_token_test() -> Result<(), LojaError> {
        utils::gen_signing_keys()?;
        let test_cid = "c123";
        let test_jwt = create_token(String::from(test_cid), 0)?;
        let jwt_secret_key = utils::get_jwt_secret_key()?;
        let key: Hmac<Sha384> = Hmac::new_from_slice(jwt_secret_key.as_bytes()).expect("hmac");
        let jwt: Result<
            Token<jwt::Header, BTreeMap<std::string::String, std::string::String>, _>,
            jwt::Error,
        > = test_jwt.verify_with_key(&key);
        match jwt {
            Ok(j) => {
                let claims = j.claims();
                let expected = String::from(test_cid);
                let actual = String::from(&claims["cid"]);
                assert_eq!(expected, actual);
            }
            Err(_) => panic!("could not verify signed token"),
        }
        Ok(())
    }
}
