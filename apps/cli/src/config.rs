//! Process configuration.
//!
//! Everything is read from the environment exactly once at startup and
//! carried in [`AppConfig`]; inner crates never touch the environment
//! themselves.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, anyhow};

use tonmint_deploy::ConfirmPolicy;
use tonmint_ledger::{Network, SecretPhrase};

const DEFAULT_SIGNER_URL: &str = "http://127.0.0.1:8575";
const DEFAULT_DATA_DIR: &str = "data";

/// Locations of the template inputs and generated asset folders.
#[derive(Debug, Clone)]
pub struct DataLayout {
    pub images_dir: PathBuf,
    pub metadata_dir: PathBuf,
    pub image_template: PathBuf,
    pub metadata_template: PathBuf,
    pub collection_template: PathBuf,
}

impl DataLayout {
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            images_dir: root.join("images"),
            metadata_dir: root.join("metadata"),
            image_template: root.join("image.jpg"),
            metadata_template: root.join("metadata.json"),
            collection_template: root.join("collection.json"),
        }
    }
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::rooted_at(Path::new(DEFAULT_DATA_DIR))
    }
}

/// Configuration record constructed once at startup.
#[derive(Debug)]
pub struct AppConfig {
    pub secret_phrase: SecretPhrase,
    pub pinata_api_key: String,
    pub pinata_api_secret: String,
    pub toncenter_api_key: Option<String>,
    pub network: Network,
    pub signer_url: String,
    pub confirm: ConfirmPolicy,
    pub layout: DataLayout,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::build(|name| std::env::var(name).ok())
    }

    fn build(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |name: &str| get(name).filter(|value| !value.is_empty());
        let require = |name: &'static str| {
            get(name).ok_or_else(|| anyhow!("missing required environment variable {name}"))
        };

        let secret_phrase: SecretPhrase = require("TONMINT_SECRET_PHRASE")?
            .parse()
            .context("TONMINT_SECRET_PHRASE")?;
        let pinata_api_key = require("PINATA_API_KEY")?;
        let pinata_api_secret = require("PINATA_API_SECRET")?;
        let toncenter_api_key = get("TONCENTER_API_KEY");

        let network = match get("TONMINT_NETWORK") {
            Some(value) => value.parse::<Network>().map_err(|e| anyhow!(e))?,
            None => Network::default(),
        };
        let signer_url = get("TONMINT_SIGNER_URL").unwrap_or_else(|| DEFAULT_SIGNER_URL.into());

        let mut confirm = ConfirmPolicy::default();
        if let Some(value) = get("TONMINT_POLL_INTERVAL_SECS") {
            let secs: u64 = value.parse().context("TONMINT_POLL_INTERVAL_SECS")?;
            confirm.poll_interval = Duration::from_secs(secs);
        }
        if let Some(value) = get("TONMINT_CONFIRM_ATTEMPTS") {
            confirm.max_attempts = value.parse().context("TONMINT_CONFIRM_ATTEMPTS")?;
        }

        let layout = match get("TONMINT_DATA_DIR") {
            Some(dir) => DataLayout::rooted_at(Path::new(&dir)),
            None => DataLayout::default(),
        };

        Ok(Self {
            secret_phrase,
            pinata_api_key,
            pinata_api_secret,
            toncenter_api_key,
            network,
            signer_url,
            confirm,
            layout,
        })
    }
}
