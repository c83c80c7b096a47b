//! Allowance gate: decides whether an authorization step must precede an
//! operation, and submits at most one authorization per insufficient
//! check. The grant is always the exact required amount, never unbounded.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use ledgerflow_primitives::allowance::AllowanceRecord;
use ledgerflow_primitives::ledger::{RemoteLedger, TxHandle};

use crate::error::Result;

/// Outcome of one gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowanceCheck {
    /// Granted allowance already covers the required amount; no side
    /// effect was produced.
    Sufficient,
    /// An authorization for exactly the required amount was submitted;
    /// the caller must suspend until its confirmation.
    AuthorizationPending(TxHandle),
}

pub struct AllowanceGate {
    ledger: Arc<dyn RemoteLedger>,
    spender: Address,
}

impl std::fmt::Debug for AllowanceGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllowanceGate")
            .field("spender", &self.spender)
            .field("ledger", &"<RemoteLedger>")
            .finish()
    }
}

impl AllowanceGate {
    pub fn new(ledger: Arc<dyn RemoteLedger>, spender: Address) -> Self {
        Self { ledger, spender }
    }

    /// Reads the current allowance and, if it falls short of `required`,
    /// submits one authorization for exactly `required`. A zero
    /// requirement is trivially sufficient and performs no remote read.
    pub async fn check_and_request(
        &self,
        asset: Address,
        owner: Address,
        required: U256,
    ) -> Result<AllowanceCheck> {
        if required.is_zero() {
            return Ok(AllowanceCheck::Sufficient);
        }

        let granted = self
            .ledger
            .read_allowance(asset, owner, self.spender)
            .await?;
        let record = AllowanceRecord {
            asset,
            owner,
            spender: self.spender,
            granted,
            required,
        };

        if record.is_sufficient() {
            tracing::info!(%asset, %owner, %granted, %required, "allowance sufficient");
            return Ok(AllowanceCheck::Sufficient);
        }

        tracing::info!(%asset, %owner, %granted, %required, "allowance insufficient, submitting authorization");
        let handle = self
            .ledger
            .submit_authorization(asset, owner, self.spender, record.shortfall_grant())
            .await?;
        Ok(AllowanceCheck::AuthorizationPending(handle))
    }
}
