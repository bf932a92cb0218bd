//! TON ledger boundary for the tonmint workspace.
//!
//! This crate owns everything that touches the chain from the outside:
//! account addresses, coin amounts, the outbound transfer model, a
//! [`LedgerConnection`] trait with a toncenter JSON-RPC implementation,
//! and the [`TransferSigner`] seam behind which message construction
//! and signing live. Deploy logic never talks HTTP directly: it is
//! written against the traits and tested with mocks.

pub mod address;
pub mod boc;
pub mod error;
pub mod rpc;
pub mod types;
pub mod wallet;

pub use address::Address;
pub use error::{LedgerError, WalletError};
pub use rpc::{LedgerConnection, Network, TonCenterClient};
pub use types::{
    Coins, CollectionState, MintCommand, MessageOp, OutboundMessage, SealedTransfer, send_mode,
};
pub use wallet::{SecretPhrase, SignerClient, TransferSigner, Wallet};
