//! Client-side orchestrator for approval-gated operations against an
//! eventually-consistent remote ledger. Sequences authorization and
//! dependent operation submissions across their confirmation gaps, keeps
//! a persistent shadow ledger of confirmed cumulative amounts, resolves
//! pool identities through a prioritized source chain, and debounces
//! advisory quote queries.

pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod intent_store;
pub mod quote;
pub mod resolver;
pub mod saga;
pub mod shadow;
pub mod storage;

pub use client::LedgerFlowClient;
pub use error::{ClientError, Result};

/// Installs a tracing subscriber honoring `RUST_LOG`, falling back to the
/// given level. Intended for binaries and examples.
pub fn init_tracing(default_level: tracing::Level) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
