//! Post-publish rewrite of metadata image references.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use tonmint_publish::ContentId;

use crate::{AssetError, LOGO_FILE};

/// Points every metadata variant's `image` field at the published
/// image folder: `ipfs://<cid>/<stem>.jpg`, with the collection
/// variant referencing `logo.jpg`.
///
/// Must only run after the image folder has been published, since the CID
/// does not exist before that. Idempotent: a second pass with the same
/// CID rewrites the same values. Returns the number of files updated.
pub fn rewrite_image_references(
    metadata_dir: &Path,
    image_cid: &ContentId,
) -> Result<usize, AssetError> {
    let mut rewritten = 0;

    for entry in fs::read_dir(metadata_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let image = if stem == "collection" {
            image_cid.uri(LOGO_FILE)
        } else {
            image_cid.uri(&format!("{stem}.jpg"))
        };

        let raw = fs::read_to_string(&path)?;
        let mut value: Value = serde_json::from_str(&raw)?;
        value["image"] = Value::String(image);
        fs::write(&path, serde_json::to_string(&value)?)?;
        rewritten += 1;
    }

    debug!(dir = %metadata_dir.display(), rewritten, cid = %image_cid, "rewrote image references");
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SENTINEL_FILE;

    fn setup() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SENTINEL_FILE), b"").unwrap();
        for number in 1..=3 {
            fs::write(
                dir.path().join(format!("{number}.json")),
                format!(r#"{{"name":"Item{number}"}}"#),
            )
            .unwrap();
        }
        fs::write(
            dir.path().join("collection.json"),
            br#"{"name":"Collection","image":"ipfs://images/logo.jpg"}"#,
        )
        .unwrap();
        dir
    }

    fn image_of(dir: &Path, name: &str) -> String {
        let raw = fs::read_to_string(dir.join(name)).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        value["image"].as_str().unwrap().to_string()
    }

    #[test]
    fn rewrites_numbered_and_collection_variants() {
        let dir = setup();
        let cid = ContentId::new("Qimg");
        let rewritten = rewrite_image_references(dir.path(), &cid).unwrap();
        assert_eq!(rewritten, 4);

        for number in 1..=3 {
            assert_eq!(
                image_of(dir.path(), &format!("{number}.json")),
                format!("ipfs://Qimg/{number}.jpg")
            );
        }
        assert_eq!(
            image_of(dir.path(), "collection.json"),
            "ipfs://Qimg/logo.jpg"
        );
    }

    #[test]
    fn rewrite_is_idempotent() {
        let dir = setup();
        let cid = ContentId::new("Qimg");
        rewrite_image_references(dir.path(), &cid).unwrap();

        let before = fs::read_to_string(dir.path().join("2.json")).unwrap();
        rewrite_image_references(dir.path(), &cid).unwrap();
        let after = fs::read_to_string(dir.path().join("2.json")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn sentinel_is_left_alone() {
        let dir = setup();
        rewrite_image_references(dir.path(), &ContentId::new("Qimg")).unwrap();
        assert_eq!(fs::read(dir.path().join(SENTINEL_FILE)).unwrap(), b"");
    }

    #[test]
    fn other_fields_survive_rewrite() {
        let dir = setup();
        rewrite_image_references(dir.path(), &ContentId::new("Qimg")).unwrap();
        let raw = fs::read_to_string(dir.path().join("1.json")).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["name"], "Item1");
    }
}
