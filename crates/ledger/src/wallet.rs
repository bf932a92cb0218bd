//! Controlling wallet and the transfer-sealing seam.
//!
//! Key derivation, message construction, and signing happen behind the
//! [`TransferSigner`] trait; the deploy flow only ever sees sealed
//! bytes. [`SignerClient`] bridges to a local signer daemon over HTTP;
//! tests substitute in-process mocks.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::address::Address;
use crate::error::WalletError;
use crate::rpc::Network;
use crate::types::{CollectionState, OutboundMessage, SealedTransfer};

const PHRASE_WORDS: usize = 24;

/// The 24-word secret phrase the controlling wallet is derived from.
///
/// Validated on parse and redacted from Debug output; the raw value is
/// only ever surfaced through [`SecretPhrase::expose`].
#[derive(Clone)]
pub struct SecretPhrase(String);

impl SecretPhrase {
    /// Returns the raw phrase for handing to the signer boundary.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl FromStr for SecretPhrase {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = s.split_whitespace().collect();
        if words.len() != PHRASE_WORDS {
            return Err(WalletError::PhraseLength(words.len()));
        }
        for word in &words {
            if !word.chars().all(|c| c.is_ascii_lowercase()) {
                return Err(WalletError::PhraseWord);
            }
        }
        Ok(Self(words.join(" ")))
    }
}

impl fmt::Debug for SecretPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretPhrase(redacted)")
    }
}

/// Seals transfers on behalf of the controlling wallet.
///
/// Implementations own key material and contract artifacts; this crate
/// never sees either.
pub trait TransferSigner: Send + Sync {
    /// The wallet address the signer controls.
    fn address(&self) -> &Address;

    /// Constructs and signs an external message for the given seqno.
    fn seal<'a>(
        &'a self,
        seqno: u32,
        messages: &'a [OutboundMessage],
    ) -> Pin<Box<dyn Future<Output = Result<SealedTransfer, WalletError>> + Send + 'a>>;

    /// Derives the address a collection with this state deploys to.
    fn collection_address<'a>(
        &'a self,
        state: &'a CollectionState,
    ) -> Pin<Box<dyn Future<Output = Result<Address, WalletError>> + Send + 'a>>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenRequest<'a> {
    phrase: &'a str,
    network: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenResponse {
    address: Address,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SealRequest<'a> {
    seqno: u32,
    messages: &'a [OutboundMessage],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SealResponse {
    boc: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeriveRequest<'a> {
    state: &'a CollectionState,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeriveResponse {
    address: Address,
}

/// HTTP bridge to a local signer daemon.
pub struct SignerClient {
    http: reqwest::Client,
    base_url: String,
    address: Address,
}

impl SignerClient {
    /// Opens the wallet: hands the phrase to the signer once and keeps
    /// the derived address for the life of the process.
    pub async fn connect(
        base_url: &str,
        phrase: &SecretPhrase,
        network: Network,
    ) -> Result<Self, WalletError> {
        let http = reqwest::Client::new();
        let base_url = base_url.trim_end_matches('/').to_string();

        let request = OpenRequest {
            phrase: phrase.expose(),
            network: network.as_str(),
        };
        let response = http
            .post(format!("{base_url}/v1/wallet/open"))
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;
        let open: OpenResponse = response.json().await?;

        info!(address = %open.address, %network, "wallet opened");

        Ok(Self {
            http,
            base_url,
            address: open.address,
        })
    }
}

impl TransferSigner for SignerClient {
    fn address(&self) -> &Address {
        &self.address
    }

    fn seal<'a>(
        &'a self,
        seqno: u32,
        messages: &'a [OutboundMessage],
    ) -> Pin<Box<dyn Future<Output = Result<SealedTransfer, WalletError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .http
                .post(format!("{}/v1/transfer/seal", self.base_url))
                .json(&SealRequest { seqno, messages })
                .send()
                .await?;
            let response = check_status(response).await?;
            let sealed: SealResponse = response.json().await?;

            let boc = STANDARD
                .decode(sealed.boc.trim())
                .map_err(|e| WalletError::Malformed(format!("sealed boc is not base64: {e}")))?;
            Ok(SealedTransfer { boc })
        })
    }

    fn collection_address<'a>(
        &'a self,
        state: &'a CollectionState,
    ) -> Pin<Box<dyn Future<Output = Result<Address, WalletError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .http
                .post(format!("{}/v1/collection/address", self.base_url))
                .json(&DeriveRequest { state })
                .send()
                .await?;
            let response = check_status(response).await?;
            let derived: DeriveResponse = response.json().await?;
            Ok(derived.address)
        })
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, WalletError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(WalletError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// The controlling wallet: an opened address paired with its signer.
#[derive(Clone)]
pub struct Wallet {
    address: Address,
    signer: Arc<dyn TransferSigner>,
}

impl Wallet {
    pub fn new(signer: Arc<dyn TransferSigner>) -> Self {
        Self {
            address: signer.address().clone(),
            signer,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub async fn seal(
        &self,
        seqno: u32,
        messages: &[OutboundMessage],
    ) -> Result<SealedTransfer, WalletError> {
        self.signer.seal(seqno, messages).await
    }

    pub async fn collection_address(
        &self,
        state: &CollectionState,
    ) -> Result<Address, WalletError> {
        self.signer.collection_address(state).await
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
