//! Pinata folder upload.
//!
//! Uses the `pinFileToIPFS` endpoint with one multipart part per file,
//! each filed under a shared root directory so Pinata pins the folder
//! as a whole and returns a single CID.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use serde::Deserialize;
use tracing::{debug, info};

use crate::{ContentId, ContentPublisher, PublishError};

const PIN_ENDPOINT: &str = "https://api.pinata.cloud/pinning/pinFileToIPFS";

/// Root directory name used inside the multipart upload. Pinata only
/// needs the parts to share a common prefix; the name itself does not
/// affect the resulting CID paths.
const UPLOAD_ROOT: &str = "folder";

/// Pinata API client.
pub struct PinataPublisher {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    api_secret: String,
}

impl PinataPublisher {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self::with_endpoint(PIN_ENDPOINT, api_key, api_secret)
    }

    /// Points the client at a custom endpoint (test double or proxy).
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    async fn upload_folder(&self, folder: &Path) -> Result<ContentId, PublishError> {
        let files = collect_files(folder)?;
        if files.is_empty() {
            return Err(PublishError::EmptyFolder(folder.display().to_string()));
        }

        debug!(folder = %folder.display(), files = files.len(), "uploading folder");

        let mut form = reqwest::multipart::Form::new();
        for (name, path) in &files {
            let bytes = tokio::fs::read(path).await?;
            let part = reqwest::multipart::Part::bytes(bytes)
                .file_name(format!("{UPLOAD_ROOT}/{name}"))
                .mime_str(mime_for(name))
                .map_err(PublishError::Http)?;
            form = form.part("file", part);
        }

        let response = self
            .http
            .post(&self.endpoint)
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.api_secret)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PublishError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let pinned: PinResponse = response.json().await?;
        if pinned.ipfs_hash.is_empty() {
            return Err(PublishError::Malformed("empty IpfsHash".into()));
        }

        info!(folder = %folder.display(), cid = %pinned.ipfs_hash, "folder pinned");
        Ok(ContentId::new(pinned.ipfs_hash))
    }
}

impl ContentPublisher for PinataPublisher {
    fn publish<'a>(
        &'a self,
        folder: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<ContentId, PublishError>> + Send + 'a>> {
        Box::pin(self.upload_folder(folder))
    }
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// Regular files in the folder as `(file_name, path)`, sorted by name
/// for a deterministic upload order. Subdirectories are not expected
/// in prepared asset folders and are skipped.
fn collect_files(folder: &Path) -> Result<Vec<(String, PathBuf)>, PublishError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        files.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
    }
    files.sort();
    Ok(files)
}

fn mime_for(name: &str) -> &'static str {
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some("json") => "application/json",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}
