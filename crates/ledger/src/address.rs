//! User-friendly TON account addresses.
//!
//! An address in user-friendly form is 48 base64url characters encoding
//! 36 bytes: a tag byte, a workchain byte, the 32-byte account hash,
//! and a CRC16/XMODEM checksum over the first 34 bytes.

use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Tag byte for a bounceable address.
pub const BOUNCEABLE_TAG: u8 = 0x11;
/// Tag byte for a non-bounceable address.
pub const NON_BOUNCEABLE_TAG: u8 = 0x51;
/// Flag OR-ed into the tag for testnet-only addresses.
pub const TESTNET_FLAG: u8 = 0x80;

const FRIENDLY_LEN: usize = 48;
const RAW_LEN: usize = 36;

/// Errors from address parsing.
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("address must be {FRIENDLY_LEN} characters, got {0}")]
    Length(usize),

    #[error("address is not valid base64url")]
    Encoding,

    #[error("unknown address tag 0x{0:02x}")]
    Tag(u8),

    #[error("address checksum mismatch")]
    Checksum,
}

/// A TON account address (workchain + 32-byte hash).
///
/// Parsed once at the edge; equality and hashing ignore the
/// bounceable/testnet presentation flags.
#[derive(Clone)]
pub struct Address {
    tag: u8,
    workchain: i8,
    hash: [u8; 32],
}

impl Address {
    /// Creates a bounceable mainnet-form address.
    pub fn new(workchain: i8, hash: [u8; 32]) -> Self {
        Self {
            tag: BOUNCEABLE_TAG,
            workchain,
            hash,
        }
    }

    pub fn workchain(&self) -> i8 {
        self.workchain
    }

    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }

    /// True if the address carries the testnet-only flag.
    pub fn is_testnet_only(&self) -> bool {
        self.tag & TESTNET_FLAG != 0
    }

    pub fn is_bounceable(&self) -> bool {
        self.tag & !TESTNET_FLAG == BOUNCEABLE_TAG
    }

    fn raw_bytes(&self) -> [u8; RAW_LEN] {
        let mut raw = [0u8; RAW_LEN];
        raw[0] = self.tag;
        raw[1] = self.workchain as u8;
        raw[2..34].copy_from_slice(&self.hash);
        let crc = crc16_xmodem(&raw[..34]);
        raw[34..36].copy_from_slice(&crc.to_be_bytes());
        raw
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != FRIENDLY_LEN {
            return Err(AddressError::Length(s.len()));
        }

        // Some tools emit the standard alphabet; normalize to url-safe.
        let normalized = s.replace('+', "-").replace('/', "_");
        let raw = URL_SAFE_NO_PAD
            .decode(normalized.as_bytes())
            .map_err(|_| AddressError::Encoding)?;
        if raw.len() != RAW_LEN {
            return Err(AddressError::Encoding);
        }

        let tag = raw[0];
        let base_tag = tag & !TESTNET_FLAG;
        if base_tag != BOUNCEABLE_TAG && base_tag != NON_BOUNCEABLE_TAG {
            return Err(AddressError::Tag(tag));
        }

        let expected = u16::from_be_bytes([raw[34], raw[35]]);
        if crc16_xmodem(&raw[..34]) != expected {
            return Err(AddressError::Checksum);
        }

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&raw[2..34]);

        Ok(Self {
            tag,
            workchain: raw[1] as i8,
            hash,
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(self.raw_bytes()))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.workchain == other.workchain && self.hash == other.hash
    }
}

impl Eq for Address {}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.workchain.hash(state);
        self.hash.hash(state);
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// CRC16/XMODEM: poly 0x1021, init 0, no reflection.
pub(crate) fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    // A real collection address, workchain 0.
    const KNOWN: &str = "EQBp1VtboMtxrHF-AO27sGK-gfZ7w7lyN5BCs4dX4lKnotpp";

    #[test]
    fn crc16_check_value() {
        // Standard XMODEM check value.
        assert_eq!(crc16_xmodem(b"123456789"), 0x31c3);
    }

    #[test]
    fn parse_known_address() {
        let addr: Address = KNOWN.parse().unwrap();
        assert_eq!(addr.workchain(), 0);
        assert!(addr.is_bounceable());
        assert!(!addr.is_testnet_only());
    }

    #[test]
    fn display_roundtrip() {
        let addr: Address = KNOWN.parse().unwrap();
        assert_eq!(addr.to_string(), KNOWN);
        let again: Address = addr.to_string().parse().unwrap();
        assert_eq!(addr, again);
    }

    #[test]
    fn constructed_roundtrip() {
        let addr = Address::new(-1, [0x42; 32]);
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(parsed.workchain(), -1);
        assert_eq!(parsed.hash(), &[0x42; 32]);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = "EQAB".parse::<Address>().unwrap_err();
        assert!(matches!(err, AddressError::Length(4)));
    }

    #[test]
    fn rejects_corrupt_checksum() {
        // Flip the final character; the CRC no longer matches.
        let mut s = KNOWN.to_string();
        let last = if s.ends_with('p') { 'q' } else { 'p' };
        s.pop();
        s.push(last);
        let err = s.parse::<Address>().unwrap_err();
        assert!(matches!(
            err,
            AddressError::Checksum | AddressError::Encoding
        ));
    }

    #[test]
    fn rejects_unknown_tag() {
        let mut raw = [0u8; 36];
        raw[0] = 0x33;
        let crc = crc16_xmodem(&raw[..34]);
        raw[34..36].copy_from_slice(&crc.to_be_bytes());
        let s = URL_SAFE_NO_PAD.encode(raw);
        let err = s.parse::<Address>().unwrap_err();
        assert!(matches!(err, AddressError::Tag(0x33)));
    }

    #[test]
    fn equality_ignores_presentation_flags() {
        let bounceable = Address::new(0, [7; 32]);
        let mut raw = bounceable.raw_bytes();
        raw[0] = NON_BOUNCEABLE_TAG;
        let crc = crc16_xmodem(&raw[..34]);
        raw[34..36].copy_from_slice(&crc.to_be_bytes());
        let other: Address = URL_SAFE_NO_PAD.encode(raw).parse::<Address>().unwrap();
        assert_eq!(bounceable, other);
    }

    #[test]
    fn serde_as_string() {
        let addr: Address = KNOWN.parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{KNOWN}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
