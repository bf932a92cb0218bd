//! Deploy flow error types.

use tonmint_assets::AssetError;
use tonmint_ledger::types::RoyaltyOutOfRange;
use tonmint_ledger::{LedgerError, WalletError};
use tonmint_publish::PublishError;

/// Errors produced by the deployment and mint flow.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Royalty(#[from] RoyaltyOutOfRange),

    #[error("mint range {from}..{to} out of bounds for {available} metadata files")]
    RangeOutOfBounds {
        from: usize,
        to: usize,
        available: usize,
    },

    #[error("local range start {local} does not match on-chain next item index {on_chain}")]
    IndexDesync { local: u64, on_chain: u64 },

    #[error("collection deployment unconfirmed after {attempts} polls")]
    DeployUnconfirmed { attempts: u32 },

    #[error("mint of item {index} unconfirmed after {attempts} polls")]
    MintUnconfirmed { index: u64, attempts: u32 },

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
