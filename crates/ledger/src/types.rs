//! Coin amounts, send-mode flags, and the outbound transfer model.
//!
//! These are the wire types shared between the deployment controller
//! and the signer boundary. Serialization uses camelCase to match the
//! signer daemon's JSON surface.

use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::address::Address;

/// Send-mode flags attached to outbound messages.
pub mod send_mode {
    /// Sender pays transfer fees separately from the message value.
    pub const PAY_GAS_SEPARATELY: u8 = 1;
    /// Ignore errors during the action phase instead of bouncing.
    pub const IGNORE_ERRORS: u8 = 2;
    /// Default mode for every transfer this workspace submits.
    pub const DEFAULT_TRANSFER: u8 = PAY_GAS_SEPARATELY | IGNORE_ERRORS;
}

const NANO_PER_TON: u64 = 1_000_000_000;

/// Errors from parsing decimal TON amounts.
#[derive(Debug, thiserror::Error)]
pub enum CoinsError {
    #[error("invalid TON amount: {0}")]
    Invalid(String),

    #[error("TON amount overflows nanoton range")]
    Overflow,
}

/// A coin amount in nanotons.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Coins(u64);

impl Coins {
    pub const fn from_nano(nano: u64) -> Self {
        Self(nano)
    }

    pub const fn nano(self) -> u64 {
        self.0
    }

    /// Parses a decimal TON string such as `"0.05"`.
    ///
    /// At most 9 fractional digits are accepted (1 TON = 10^9 nanoton).
    pub fn from_ton(s: &str) -> Result<Self, CoinsError> {
        let invalid = || CoinsError::Invalid(s.to_string());

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if frac_part.len() > 9 {
            return Err(invalid());
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let int: u64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| CoinsError::Overflow)?
        };
        let mut frac: u64 = 0;
        if !frac_part.is_empty() {
            frac = frac_part.parse().map_err(|_| invalid())?;
            frac *= 10u64.pow(9 - frac_part.len() as u32);
        }

        int.checked_mul(NANO_PER_TON)
            .and_then(|n| n.checked_add(frac))
            .map(Self)
            .ok_or(CoinsError::Overflow)
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int = self.0 / NANO_PER_TON;
        let frac = self.0 % NANO_PER_TON;
        if frac == 0 {
            write!(f, "{int}")
        } else {
            let frac = format!("{frac:09}");
            write!(f, "{int}.{}", frac.trim_end_matches('0'))
        }
    }
}

impl fmt::Debug for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coins({self} TON)")
    }
}

impl FromStr for Coins {
    type Err = CoinsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_ton(s)
    }
}

// Nanoton amounts travel as decimal strings to avoid precision loss in
// JSON consumers.
impl Serialize for Coins {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Coins {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<u64>().map(Self).map_err(D::Error::custom)
    }
}

/// Royalty percent outside the 0-100 range.
#[derive(Debug, thiserror::Error)]
#[error("royalty percent {0} out of range (0-100)")]
pub struct RoyaltyOutOfRange(pub u8);

/// On-chain state for a collection deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionState {
    pub owner: Address,
    pub royalty_percent: u8,
    pub royalty_recipient: Address,
    pub next_item_index: u64,
    /// URI of the collection-level metadata record.
    pub collection_content_uri: String,
    /// Base URI that per-item content filenames resolve against.
    pub common_content_uri: String,
}

impl CollectionState {
    /// Checks the royalty invariant before the state leaves the process.
    pub fn validate(&self) -> Result<(), RoyaltyOutOfRange> {
        if self.royalty_percent > 100 {
            return Err(RoyaltyOutOfRange(self.royalty_percent));
        }
        Ok(())
    }
}

/// Parameters for minting a single item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintCommand {
    /// Caller-supplied correlation id; not deduplicated on-chain.
    pub query_id: u64,
    pub item_index: u64,
    pub owner: Address,
    /// Per-item metadata filename, resolved against the collection's
    /// common content base.
    pub content: String,
}

/// Operation carried by an outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "camelCase")]
pub enum MessageOp {
    DeployCollection(CollectionState),
    MintItem(MintCommand),
}

/// One outbound message in a wallet transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub to: Address,
    pub value: Coins,
    pub send_mode: u8,
    pub op: MessageOp,
}

/// A sealed (constructed and signed) external message, ready for
/// broadcast via `sendBoc`.
#[derive(Debug, Clone, PartialEq)]
pub struct SealedTransfer {
    pub boc: Vec<u8>,
}

impl SealedTransfer {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.boc)
    }
}
