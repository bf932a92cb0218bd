//! Ledger and wallet error types.

use crate::boc::BocError;

/// Errors from the ledger RPC boundary.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("get-method {method} failed with exit code {exit_code}")]
    GetMethod {
        method: &'static str,
        exit_code: i64,
    },

    #[error("malformed RPC response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Boc(#[from] BocError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from opening the wallet or sealing a transfer.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("secret phrase must be 24 words, got {0}")]
    PhraseLength(usize),

    #[error("secret phrase contains an invalid word")]
    PhraseWord,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("signer rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed signer response: {0}")]
    Malformed(String),
}
