//! Template expansion into numbered variants.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::{AssetError, COLLECTION_FILE, LOGO_FILE, SENTINEL_FILE};

/// Local placeholder written into the collection variant before the
/// image folder is published; the rewrite pass replaces it with the
/// real `ipfs://<cid>/logo.jpg` reference.
const LOCAL_LOGO_PLACEHOLDER: &str = "ipfs://images/logo.jpg";

/// Expands template files into numbered asset variants.
#[derive(Debug, Clone)]
pub struct Materializer {
    images_dir: PathBuf,
    metadata_dir: PathBuf,
    image_template: PathBuf,
    metadata_template: PathBuf,
    collection_template: PathBuf,
}

/// What a materialization run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterializeSummary {
    /// Numbered image variants written (excludes the logo).
    pub images: usize,
    /// Numbered metadata variants written (excludes the collection file).
    pub metadata: usize,
}

impl Materializer {
    pub fn new(
        images_dir: impl Into<PathBuf>,
        metadata_dir: impl Into<PathBuf>,
        image_template: impl Into<PathBuf>,
        metadata_template: impl Into<PathBuf>,
        collection_template: impl Into<PathBuf>,
    ) -> Self {
        Self {
            images_dir: images_dir.into(),
            metadata_dir: metadata_dir.into(),
            image_template: image_template.into(),
            metadata_template: metadata_template.into(),
            collection_template: collection_template.into(),
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    /// Regenerates `count` numbered variants of the image and metadata
    /// templates, plus the collection-level pair.
    ///
    /// Both target folders are cleared first (sentinel excepted), so a
    /// re-run with a smaller count leaves no stale files behind.
    pub fn materialize(&self, count: u32) -> Result<MaterializeSummary, AssetError> {
        clear_generated(&self.images_dir)?;
        clear_generated(&self.metadata_dir)?;

        self.write_images(count)?;
        self.write_metadata(count)?;

        info!(count, "materialized asset variants");
        Ok(MaterializeSummary {
            images: count as usize,
            metadata: count as usize,
        })
    }

    fn write_images(&self, count: u32) -> Result<(), AssetError> {
        let image = fs::read(&self.image_template)?;
        for number in 1..=count {
            fs::write(self.images_dir.join(format!("{number}.jpg")), &image)?;
        }
        fs::write(self.images_dir.join(LOGO_FILE), &image)?;
        debug!(count, dir = %self.images_dir.display(), "copied images");
        Ok(())
    }

    fn write_metadata(&self, count: u32) -> Result<(), AssetError> {
        let mut collection: Value = read_json(&self.collection_template)?;
        collection["image"] = Value::String(LOCAL_LOGO_PLACEHOLDER.into());
        fs::write(
            self.metadata_dir.join(COLLECTION_FILE),
            serde_json::to_string(&collection)?,
        )?;

        let template: Value = read_json(&self.metadata_template)?;
        let base_name = template["name"]
            .as_str()
            .ok_or_else(|| {
                AssetError::TemplateField(self.metadata_template.display().to_string(), "name")
            })?
            .to_string();

        for number in 1..=count {
            let mut item = template.clone();
            item["name"] = Value::String(format!("{base_name}{number}"));
            fs::write(
                self.metadata_dir.join(format!("{number}.json")),
                serde_json::to_string(&item)?,
            )?;
        }
        debug!(count, dir = %self.metadata_dir.display(), "copied metadata");
        Ok(())
    }
}

fn read_json(path: &Path) -> Result<Value, AssetError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Removes every generated entry in a folder, keeping the sentinel.
fn clear_generated(dir: &Path) -> Result<(), AssetError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name() == SENTINEL_FILE {
            continue;
        }
        fs::remove_file(entry.path())?;
    }
    Ok(())
}
