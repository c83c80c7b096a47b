//! Operation intents: the parameters of one approval-gated operation,
//! captured at trigger time and owned by the intent store until the saga
//! that carries them terminates.

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PrimitivesError, Result};

/// The kinds of ledger operations a saga can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Deposit,
    Withdraw,
    CreateLoan,
    RepayLoan,
    Swap,
    CreatePool,
}

impl OperationKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Deposit => "deposit",
            OperationKind::Withdraw => "withdraw",
            OperationKind::CreateLoan => "create_loan",
            OperationKind::RepayLoan => "repay_loan",
            OperationKind::Swap => "swap",
            OperationKind::CreatePool => "create_pool",
        }
    }

    /// Whether the operation moves funds out of the actor's account and
    /// therefore needs a spender allowance before submission.
    #[must_use]
    pub fn requires_allowance(&self) -> bool {
        !matches!(self, OperationKind::Withdraw)
    }
}

/// Key under which intents and saga states are tracked. At most one live
/// intent exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntentKey {
    pub actor: Address,
    pub kind: OperationKind,
}

/// Fully-specified parameters of one operation, frozen at trigger time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationIntent {
    pub actor: Address,
    pub asset: Address,
    pub amount: U256,
    pub kind: OperationKind,
    /// Counter-asset for swaps and pool creation, collateral for loans.
    pub auxiliary_asset: Option<Address>,
    pub created_at: DateTime<Utc>,
}

impl OperationIntent {
    pub fn new(
        actor: Address,
        asset: Address,
        amount: U256,
        kind: OperationKind,
        auxiliary_asset: Option<Address>,
    ) -> Result<Self> {
        match kind {
            OperationKind::Swap | OperationKind::CreatePool | OperationKind::CreateLoan => {
                if auxiliary_asset.is_none() {
                    return Err(PrimitivesError::InvalidIntent(format!(
                        "{} intent requires an auxiliary asset",
                        kind.as_str()
                    )));
                }
            }
            _ => {}
        }

        Ok(Self {
            actor,
            asset,
            amount,
            kind,
            auxiliary_asset,
            created_at: Utc::now(),
        })
    }

    /// Asset the spender must be authorized to move for this operation.
    /// Loans lock the collateral (auxiliary) asset, everything else moves
    /// the primary asset.
    #[must_use]
    pub fn allowance_asset(&self) -> Address {
        match self.kind {
            OperationKind::CreateLoan => self.auxiliary_asset.unwrap_or(self.asset),
            _ => self.asset,
        }
    }

    #[must_use]
    pub fn key(&self) -> IntentKey {
        IntentKey {
            actor: self.actor,
            kind: self.kind,
        }
    }
}
