//! Content-addressed storage boundary.
//!
//! One operation: publish a local folder, get back a stable content
//! identifier. [`ContentPublisher`] is the seam the orchestrator is
//! written against; [`PinataPublisher`](pinata::PinataPublisher) is the
//! production implementation. Publishing identical content is
//! idempotent under content addressing, so the core never retries:
//! re-running the stage is always safe.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

pub mod pinata;

pub use pinata::PinataPublisher;

/// URI scheme for published content.
pub const CONTENT_SCHEME: &str = "ipfs";

/// Errors from publishing a folder.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upload rejected ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed upload response: {0}")]
    Malformed(String),

    #[error("nothing to publish in {0}")]
    EmptyFolder(String),
}

/// An opaque content identifier returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URI of a file inside the published folder:
    /// `ipfs://<id>/<filename>`.
    pub fn uri(&self, filename: &str) -> String {
        format!("{CONTENT_SCHEME}://{}/{filename}", self.0)
    }

    /// Base URI of the published folder, with a trailing slash.
    pub fn base_uri(&self) -> String {
        format!("{CONTENT_SCHEME}://{}/", self.0)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Uploads a prepared local folder to a content-addressed store.
pub trait ContentPublisher: Send + Sync {
    /// Publishes every file in `folder` and returns the folder's
    /// content identifier.
    fn publish<'a>(
        &'a self,
        folder: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<ContentId, PublishError>> + Send + 'a>>;
}
