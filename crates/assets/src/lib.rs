//! Asset materialization for collection deployment.
//!
//! Expands one template image and one template metadata record into N
//! numbered variants plus the collection-level pair, rewrites the
//! embedded image references once the image folder's CID is known, and
//! produces the numerically ordered listings that resume mode slices.
//!
//! Everything here is plain blocking filesystem work; callers on the
//! async side wrap it in `spawn_blocking`. Any I/O failure aborts the
//! run: the next run self-heals by clearing the generated state.

pub mod listing;
pub mod materialize;
pub mod rewrite;
pub mod sentinel;

pub use listing::{NumberedFile, numbered_entries};
pub use materialize::{Materializer, MaterializeSummary};
pub use rewrite::rewrite_image_references;
pub use sentinel::{remove_sentinel, restore_sentinel};

/// Placeholder entry that keeps generated folders alive under version
/// control. Never regenerated as an asset, removed before publishing.
pub const SENTINEL_FILE: &str = ".gitkeep";

/// File name of the collection-level metadata variant.
pub const COLLECTION_FILE: &str = "collection.json";

/// File name of the collection-level image variant.
pub const LOGO_FILE: &str = "logo.jpg";

/// Errors from asset materialization.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template {0} has no \"{1}\" field")]
    TemplateField(String, &'static str),
}
