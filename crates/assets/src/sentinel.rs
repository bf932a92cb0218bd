//! Sentinel handling around publishes.
//!
//! Generated folders carry a `.gitkeep` so the layout survives under
//! version control. The sentinel must not be published: it is removed
//! immediately before an upload and recreated empty afterwards.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::{AssetError, SENTINEL_FILE};

/// Removes the folder's sentinel. Returns whether one existed.
pub fn remove_sentinel(dir: &Path) -> Result<bool, AssetError> {
    match fs::remove_file(dir.join(SENTINEL_FILE)) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Recreates an empty sentinel in the folder.
pub fn restore_sentinel(dir: &Path) -> Result<(), AssetError> {
    fs::write(dir.join(SENTINEL_FILE), b"")?;
    Ok(())
}
