//! Core types and traits for the ledgerflow orchestrator.

pub mod allowance;
pub mod error;
pub mod intent;
pub mod ledger;
pub mod quote;
pub mod resource;
pub mod saga;

pub use error::{PrimitivesError, Result};
pub use intent::{IntentKey, OperationIntent, OperationKind};
pub use ledger::{Confirmation, RemoteLedger, TxHandle, TxReceipt, TxStatus};
