//! Numeric listings of generated metadata files for resume mode.

use std::path::{Path, PathBuf};

use crate::AssetError;

/// One numbered metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedFile {
    pub number: u64,
    pub file_name: String,
    pub path: PathBuf,
}

/// Lists the numbered `*.json` files in a metadata folder, sorted
/// numerically.
///
/// Sentinels and the collection file have non-numeric stems and are
/// excluded before sorting, so slicing a mint range can rely purely on
/// positions. Sorting is numeric, never lexical: `10.json` follows
/// `2.json`.
pub fn numbered_entries(metadata_dir: &Path) -> Result<Vec<NumberedFile>, AssetError> {
    let mut entries = Vec::new();

    for entry in std::fs::read_dir(metadata_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Ok(number) = stem.parse::<u64>() else {
            continue;
        };
        entries.push(NumberedFile {
            number,
            file_name: entry.file_name().to_string_lossy().into_owned(),
            path,
        });
    }

    entries.sort_by_key(|file| file.number);
    Ok(entries)
}
