//! The remote ledger boundary. Everything past this trait is an opaque
//! request/response surface: submissions return a handle, confirmations
//! arrive asynchronously and are awaited per handle.

use alloy::primitives::{Address, FixedBytes, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::intent::OperationKind;
use crate::quote::QuoteQuery;
use crate::resource::{PairKey, ResourceId};

/// Opaque handle to a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHandle(pub FixedBytes<32>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: FixedBytes<32>,
    pub block_number: u64,
}

/// Outcome of one submitted transaction, delivered asynchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub status: TxStatus,
    pub receipt: TxReceipt,
}

/// The fully-resolved call an operation submission carries. Built by the
/// saga driver from a consumed intent plus any resolved resource identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationCall {
    pub kind: OperationKind,
    pub actor: Address,
    pub asset: Address,
    pub amount: U256,
    pub auxiliary_asset: Option<Address>,
    pub resource: Option<ResourceId>,
}

/// Request/response surface of the remote ledger.
///
/// Implementations map these calls onto their transport (json-rpc,
/// injected wallet, ...). A locally-declined signature surfaces as
/// [`crate::PrimitivesError::SigningRejected`]; every other failure is
/// [`crate::PrimitivesError::RpcError`].
#[async_trait]
pub trait RemoteLedger: Send + Sync {
    /// Current spender allowance granted by `owner` over `asset`.
    async fn read_allowance(
        &self,
        asset: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256>;

    /// Submit an authorization granting `spender` rights over exactly
    /// `amount` of `owner`'s `asset`.
    async fn submit_authorization(
        &self,
        asset: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHandle>;

    /// Submit a dependent operation call.
    async fn submit_operation(&self, call: OperationCall) -> Result<TxHandle>;

    /// Wait for the confirmation event of a previously submitted
    /// transaction.
    async fn await_confirmation(&self, handle: TxHandle) -> Result<Confirmation>;

    /// Authoritative lookup of the resource identity for an asset pair.
    async fn read_resource_identity(&self, pair: PairKey) -> Result<Option<ResourceId>>;

    /// Advisory quote for a prospective operation.
    async fn read_quote(&self, query: QuoteQuery) -> Result<U256>;
}
