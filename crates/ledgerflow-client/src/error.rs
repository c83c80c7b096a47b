use ledgerflow_primitives::PrimitivesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Signing rejected by user: {0}")]
    UserDeclined(String),
    #[error("Authorization transaction failed: {0}")]
    AuthorizationFailed(String),
    #[error("Operation transaction failed: {0}")]
    OperationFailed(String),
    #[error("Saga superseded by a newer intent for the same key")]
    Superseded,
    #[error("A saga is already active for this key")]
    SagaActive,
    #[error("No resource exists for this pair")]
    ResolutionExhausted,
    #[error("Failed rpc request: {0}")]
    RpcRequestError(String),
    #[error("Error while tracking confirmation: {0}")]
    TrackConfirmationError(String),
    #[error("Session storage error: {0}")]
    StorageError(String),
    #[error("Quote pipeline error: {0}")]
    QuotePipelineError(String),
    #[error("Primitives error: {0}")]
    PrimitivesError(#[from] PrimitivesError),
}

pub type Result<T> = core::result::Result<T, ClientError>;
