//! Quote pipeline vocabulary. Results are tagged with the sequence number
//! of the input that produced them so consumers can discard a late result
//! for an input that has since been superseded.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::resource::ResourceId;

/// One quote request: how much of `asset` goes in, against which resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteQuery {
    pub resource: ResourceId,
    pub asset: Address,
    pub amount: U256,
}

/// A quote produced for one debounced input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResult {
    /// Sequence number of the input that produced this quote.
    pub sequence: u64,
    pub query: QuoteQuery,
    pub amount_out: U256,
}
