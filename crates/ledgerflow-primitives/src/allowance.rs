//! Allowance records read from the remote ledger. Never cached beyond the
//! saga step that read them, since allowances can change out-of-band.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceRecord {
    pub asset: Address,
    pub owner: Address,
    pub spender: Address,
    pub granted: U256,
    pub required: U256,
}

impl AllowanceRecord {
    #[must_use]
    pub fn is_sufficient(&self) -> bool {
        self.granted >= self.required
    }

    /// Amount an authorization submission must grant. Always the exact
    /// required amount, never an unbounded grant.
    #[must_use]
    pub fn shortfall_grant(&self) -> U256 {
        self.required
    }
}
