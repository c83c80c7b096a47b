//! Resource identities: the ledger-assigned id of a created resource
//! (e.g. a trading pool), distinct from the logical asset pair used to
//! request it.

use alloy::primitives::{Address, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PrimitivesError, Result};

/// Ledger-assigned identifier of a resource.
pub type ResourceId = B256;

/// Unordered pair of asset addresses, stored in canonical order so that
/// `(a, b)` and `(b, a)` key the same resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
    lo: Address,
    hi: Address,
}

impl PairKey {
    pub fn new(a: Address, b: Address) -> Result<Self> {
        if a == b {
            return Err(PrimitivesError::InvalidPair(format!(
                "pair requires two distinct assets, got {a} twice"
            )));
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { lo, hi })
    }

    #[must_use]
    pub fn assets(&self) -> (Address, Address) {
        (self.lo, self.hi)
    }
}

/// Which tier of the resolver's priority chain produced an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Authoritative,
    Cache,
    FallbackConstant,
}

/// A resolved resource identity, tagged with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIdentity {
    pub pair: PairKey,
    pub id: ResourceId,
    pub source: ResolutionSource,
    pub resolved_at: DateTime<Utc>,
}
