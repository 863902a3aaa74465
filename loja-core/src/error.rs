use kn0sys_lmdb_rs::MdbError;
use thiserror::Error;

/// Use for mapping errors in functions that can throw multiple errors.
#[derive(Debug, Error)]
#[error("Loja error. See logs for more info.")]
pub enum LojaError {
    Auth,
    Coupon,
    Database(MdbError),
    Order,
    Payment,
    Shipping,
    Webhook,
    Unknown,
}

impl From<MdbError> for LojaError {
    fn from(e: MdbError) -> Self {
        LojaError::Database(e)
    }
}
