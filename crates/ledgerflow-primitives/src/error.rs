use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrimitivesError {
    #[error("Rpc error: {0}")]
    RpcError(String),
    #[error("Signing rejected: {0}")]
    SigningRejected(String),
    #[error("Invalid intent: {0}")]
    InvalidIntent(String),
    #[error("Invalid pair: {0}")]
    InvalidPair(String),
}

pub type Result<T> = core::result::Result<T, PrimitivesError>;
