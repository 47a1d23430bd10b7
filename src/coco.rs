//! COCO JSON schema types and readers.
//!
//! Only the subset of the COCO schema consumed by label conversion is
//! modeled here: the `images` list (id, dimensions, file name) and the
//! `annotations` list (image reference, category, bbox). Everything else
//! in the file — `info`, `licenses`, `categories`, segmentation data — is
//! accepted and ignored.
//!
//! # COCO Format Reference
//!
//! COCO bounding boxes use `[x, y, width, height]` format where:
//! - `(x, y)` is the top-left corner in absolute pixel coordinates
//! - `width` and `height` are the dimensions

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::error::PrepError;

/// Top-level COCO dataset structure (consumed subset).
///
/// List order is preserved from the JSON file: label files are emitted in
/// `images` order, and the first entry of `images` supplies the reference
/// dimensions for normalization.
#[derive(Debug, Deserialize)]
pub struct CocoDataset {
    #[serde(default)]
    pub images: Vec<CocoImage>,

    #[serde(default)]
    pub annotations: Vec<CocoAnnotation>,
}

/// COCO image entry.
#[derive(Debug, Deserialize)]
pub struct CocoImage {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
}

/// COCO annotation entry.
#[derive(Debug, Deserialize)]
pub struct CocoAnnotation {
    pub image_id: u64,

    /// Signed so a pathological 0-indexed category maps to class -1 rather
    /// than underflowing.
    pub category_id: i64,

    /// COCO bbox format: [x, y, width, height] with (x,y) as top-left corner
    pub bbox: [f64; 4],
}

/// Reads the consumed COCO subset from a JSON annotation file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_coco_json(path: &Path) -> Result<CocoDataset, PrepError> {
    let file = File::open(path).map_err(PrepError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| PrepError::CocoJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a COCO dataset from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_coco_str(json: &str) -> Result<CocoDataset, serde_json::Error> {
    serde_json::from_str(json)
}
