//! Ledger RPC boundary and its toncenter implementation.
//!
//! [`LedgerConnection`] is the seam the deployment controller and the
//! confirmation tracker are written against; tests implement it with
//! mocks. [`TonCenterClient`] is the production implementation over
//! the toncenter JSON-RPC v2 API.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::address::Address;
use crate::boc::{Boc, read_msg_address};
use crate::error::LedgerError;
use crate::types::SealedTransfer;

/// Target network selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
}

impl Network {
    pub fn as_str(self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }

    /// Default toncenter endpoint for this network.
    pub fn endpoint(self) -> &'static str {
        match self {
            Network::Testnet => "https://testnet.toncenter.com/api/v2/jsonRPC",
            Network::Mainnet => "https://toncenter.com/api/v2/jsonRPC",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            other => Err(format!("unknown network '{other}' (testnet|mainnet)")),
        }
    }
}

/// Read and broadcast operations against the ledger.
///
/// Object-safe so the deploy crate can hold `Arc<dyn LedgerConnection>`
/// and tests can substitute scripted mocks.
pub trait LedgerConnection: Send + Sync {
    /// Current seqno of an account; 0 for uninitialized accounts.
    fn account_seqno<'a>(
        &'a self,
        account: &'a Address,
    ) -> Pin<Box<dyn Future<Output = Result<u32, LedgerError>> + Send + 'a>>;

    /// Broadcasts a sealed external message.
    fn send<'a>(
        &'a self,
        transfer: &'a SealedTransfer,
    ) -> Pin<Box<dyn Future<Output = Result<(), LedgerError>> + Send + 'a>>;

    /// Resolves the derived address of an item by index.
    fn item_address<'a>(
        &'a self,
        collection: &'a Address,
        index: u64,
    ) -> Pin<Box<dyn Future<Output = Result<Address, LedgerError>> + Send + 'a>>;

    /// Reads the collection's on-chain next-item-index counter.
    fn collection_next_index<'a>(
        &'a self,
        collection: &'a Address,
    ) -> Pin<Box<dyn Future<Output = Result<u64, LedgerError>> + Send + 'a>>;
}

/// toncenter JSON-RPC v2 client.
pub struct TonCenterClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl TonCenterClient {
    pub fn new(network: Network, api_key: Option<String>) -> Self {
        Self::with_endpoint(network.endpoint(), api_key)
    }

    /// Points the client at a custom endpoint (self-hosted gateway).
    pub fn with_endpoint(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": "1",
            "method": method,
            "params": params,
        });

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-Key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        let envelope: RpcEnvelope = response.json().await?;

        debug!(method, status = status.as_u16(), ok = envelope.ok, "rpc call");

        if !envelope.ok {
            return Err(LedgerError::Rpc {
                code: envelope.code.unwrap_or_else(|| status.as_u16() as i64),
                message: envelope
                    .error
                    .unwrap_or_else(|| "unspecified RPC failure".into()),
            });
        }
        envelope
            .result
            .ok_or_else(|| LedgerError::Malformed("missing result".into()))
    }

    async fn run_get_method(
        &self,
        account: &Address,
        method: &'static str,
        stack: Value,
    ) -> Result<Value, LedgerError> {
        let result = self
            .call(
                "runGetMethod",
                json!({
                    "address": account.to_string(),
                    "method": method,
                    "stack": stack,
                }),
            )
            .await?;
        check_exit_code(&result, method)?;
        Ok(result)
    }
}

impl LedgerConnection for TonCenterClient {
    fn account_seqno<'a>(
        &'a self,
        account: &'a Address,
    ) -> Pin<Box<dyn Future<Output = Result<u32, LedgerError>> + Send + 'a>> {
        Box::pin(async move {
            let result = self
                .call(
                    "getWalletInformation",
                    json!({ "address": account.to_string() }),
                )
                .await?;
            parse_wallet_seqno(&result)
        })
    }

    fn send<'a>(
        &'a self,
        transfer: &'a SealedTransfer,
    ) -> Pin<Box<dyn Future<Output = Result<(), LedgerError>> + Send + 'a>> {
        Box::pin(async move {
            self.call("sendBoc", json!({ "boc": transfer.to_base64() }))
                .await?;
            Ok(())
        })
    }

    fn item_address<'a>(
        &'a self,
        collection: &'a Address,
        index: u64,
    ) -> Pin<Box<dyn Future<Output = Result<Address, LedgerError>> + Send + 'a>> {
        Box::pin(async move {
            let result = self
                .run_get_method(
                    collection,
                    "get_nft_address_by_index",
                    json!([["num", index.to_string()]]),
                )
                .await?;
            parse_item_address(&result)
        })
    }

    fn collection_next_index<'a>(
        &'a self,
        collection: &'a Address,
    ) -> Pin<Box<dyn Future<Output = Result<u64, LedgerError>> + Send + 'a>> {
        Box::pin(async move {
            let result = self
                .run_get_method(collection, "get_collection_data", json!([]))
                .await?;
            parse_next_item_index(&result)
        })
    }
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

// ---------------------------------------------------------------------------
// Response parsing, split out for testability.
// ---------------------------------------------------------------------------

fn parse_wallet_seqno(result: &Value) -> Result<u32, LedgerError> {
    match &result["seqno"] {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| LedgerError::Malformed(format!("seqno out of range: {n}"))),
        other => Err(LedgerError::Malformed(format!(
            "unexpected seqno value: {other}"
        ))),
    }
}

fn check_exit_code(result: &Value, method: &'static str) -> Result<(), LedgerError> {
    let exit_code = result["exit_code"]
        .as_i64()
        .ok_or_else(|| LedgerError::Malformed("missing exit_code".into()))?;
    if exit_code != 0 {
        return Err(LedgerError::GetMethod { method, exit_code });
    }
    Ok(())
}

/// First stack entry of a get-method result as `(type, payload)`.
fn first_stack_entry(result: &Value) -> Result<(&str, &Value), LedgerError> {
    let entry = result["stack"]
        .as_array()
        .and_then(|stack| stack.first())
        .ok_or_else(|| LedgerError::Malformed("empty result stack".into()))?;
    let pair = entry
        .as_array()
        .filter(|pair| pair.len() == 2)
        .ok_or_else(|| LedgerError::Malformed("stack entry is not a pair".into()))?;
    let kind = pair[0]
        .as_str()
        .ok_or_else(|| LedgerError::Malformed("stack entry type is not a string".into()))?;
    Ok((kind, &pair[1]))
}

fn parse_item_address(result: &Value) -> Result<Address, LedgerError> {
    let (kind, payload) = first_stack_entry(result)?;
    if kind != "cell" && kind != "slice" {
        return Err(LedgerError::Malformed(format!(
            "expected cell on stack, got {kind}"
        )));
    }
    let encoded = payload["bytes"]
        .as_str()
        .ok_or_else(|| LedgerError::Malformed("stack cell has no bytes".into()))?;

    let boc = Boc::parse_base64(encoded)?;
    read_msg_address(&mut boc.root().slice())?
        .ok_or_else(|| LedgerError::Malformed("item address is addr_none".into()))
}

fn parse_next_item_index(result: &Value) -> Result<u64, LedgerError> {
    let (kind, payload) = first_stack_entry(result)?;
    if kind != "num" {
        return Err(LedgerError::Malformed(format!(
            "expected num on stack, got {kind}"
        )));
    }
    let text = payload
        .as_str()
        .ok_or_else(|| LedgerError::Malformed("stack num is not a string".into()))?;
    let digits = text.trim_start_matches("0x");
    let radix = if digits.len() == text.len() { 10 } else { 16 };
    u64::from_str_radix(digits, radix)
        .map_err(|_| LedgerError::Malformed(format!("unparseable stack num: {text}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boc::testutil::addr_std_boc;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    #[test]
    fn network_parse_and_endpoints() {
        assert_eq!("testnet".parse::<Network>().unwrap(), Network::Testnet);
        assert_eq!("MAINNET".parse::<Network>().unwrap(), Network::Mainnet);
        assert!("ton".parse::<Network>().is_err());
        assert!(Network::Testnet.endpoint().contains("testnet.toncenter.com"));
        assert!(!Network::Mainnet.endpoint().contains("testnet"));
    }

    #[test]
    fn wallet_seqno_from_initialized_account() {
        let result = serde_json::json!({
            "wallet": true,
            "balance": "1000000000",
            "account_state": "active",
            "seqno": 31,
        });
        assert_eq!(parse_wallet_seqno(&result).unwrap(), 31);
    }

    #[test]
    fn wallet_seqno_defaults_to_zero_when_uninitialized() {
        let result = serde_json::json!({
            "wallet": false,
            "account_state": "uninitialized",
        });
        assert_eq!(parse_wallet_seqno(&result).unwrap(), 0);
    }

    #[test]
    fn wallet_seqno_rejects_strings() {
        let result = serde_json::json!({ "seqno": "31" });
        assert!(parse_wallet_seqno(&result).is_err());
    }

    #[test]
    fn item_address_from_stack_cell() {
        let boc = addr_std_boc(0, [0x5a; 32]);
        let result = serde_json::json!({
            "exit_code": 0,
            "stack": [["cell", { "bytes": STANDARD.encode(&boc) }]],
        });
        check_exit_code(&result, "get_nft_address_by_index").unwrap();
        let addr = parse_item_address(&result).unwrap();
        assert_eq!(addr.workchain(), 0);
        assert_eq!(addr.hash(), &[0x5a; 32]);
    }

    #[test]
    fn get_method_exit_code_surfaces() {
        let result = serde_json::json!({ "exit_code": -13, "stack": [] });
        let err = check_exit_code(&result, "get_nft_address_by_index").unwrap_err();
        assert!(matches!(
            err,
            LedgerError::GetMethod { exit_code: -13, .. }
        ));
    }

    #[test]
    fn next_item_index_from_hex_num() {
        let result = serde_json::json!({
            "exit_code": 0,
            "stack": [["num", "0x1e"]],
        });
        assert_eq!(parse_next_item_index(&result).unwrap(), 30);
    }

    #[test]
    fn next_item_index_from_decimal_num() {
        let result = serde_json::json!({
            "exit_code": 0,
            "stack": [["num", "24"]],
        });
        assert_eq!(parse_next_item_index(&result).unwrap(), 24);
    }

    #[test]
    fn malformed_stacks_are_rejected() {
        for result in [
            serde_json::json!({ "exit_code": 0, "stack": [] }),
            serde_json::json!({ "exit_code": 0, "stack": [["num"]] }),
            serde_json::json!({ "exit_code": 0, "stack": [[7, "x"]] }),
        ] {
            assert!(parse_next_item_index(&result).is_err());
        }
    }

    #[test]
    fn rpc_envelope_error_shape() {
        let envelope: RpcEnvelope = serde_json::from_value(serde_json::json!({
            "ok": false,
            "error": "Ratelimit exceeded",
            "code": 429,
        }))
        .unwrap();
        assert!(!envelope.ok);
        assert_eq!(envelope.code, Some(429));
        assert_eq!(envelope.error.as_deref(), Some("Ratelimit exceeded"));
    }
}
