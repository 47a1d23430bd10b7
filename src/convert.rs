//! COCO-to-YOLO label conversion over a downloaded dataset tree.
//!
//! Every file named `*_annotations.coco.json` marks its parent directory as
//! one split (train/valid/test in the PKLot export). Each split is converted
//! independently: one label file per COCO image entry, then the image file
//! is moved into the split's canonical `images/` subdirectory.
//!
//! # Inherited quirks
//!
//! Two behaviors are carried over verbatim from the original pipeline
//! because downstream consumers read its literal output:
//!
//! - Coordinates are normalized by the dimensions of the *first* image in
//!   each split's `images` list, not the owning image's own dimensions. The
//!   PKLot export uses one camera resolution per split, which is the only
//!   reason this produces correct values.
//! - The trailing angle column is derived from the top edge of the
//!   axis-aligned box, which is horizontal, so the emitted angle is always
//!   `0.000000`. See [`box_angle`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::coco::{self, CocoDataset};
use crate::error::PrepError;

/// Filename suffix that identifies a split's COCO annotation file.
pub const ANNOTATION_SUFFIX: &str = "_annotations.coco.json";

/// Directory-name configuration for conversion output.
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    /// Name of the per-split directory receiving label files.
    pub labels_dir_name: String,

    /// Name of the per-split directory images are moved into.
    pub images_dir_name: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            labels_dir_name: "labels".to_string(),
            images_dir_name: "images".to_string(),
        }
    }
}

/// Counters describing one conversion run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Number of annotation files (splits) processed.
    pub splits: usize,

    /// Number of label files written (one per COCO image entry).
    pub label_files: usize,

    /// Total annotation lines written across all label files.
    pub annotation_lines: usize,

    /// Image files moved into the canonical images directory.
    pub images_moved: usize,

    /// Image entries whose source file was absent (skipped, not an error).
    pub images_missing: usize,
}

impl std::fmt::Display for ConvertSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} split(s): {} label file(s), {} annotation line(s), {} image(s) moved, {} missing",
            self.splits,
            self.label_files,
            self.annotation_lines,
            self.images_moved,
            self.images_missing
        )
    }
}

/// Converts every COCO annotation file under `dataset_dir` to YOLO labels.
///
/// Splits are discovered by walking the tree for files ending in
/// [`ANNOTATION_SUFFIX`] and processed in sorted path order. The annotation
/// JSON itself is left untouched.
///
/// This operation is not idempotent: it moves source images into the
/// `images/` subdirectory, so a second run over the same tree finds no
/// sources at the split root and overwrites every label file it can still
/// pair with an image entry.
///
/// # Errors
/// Malformed JSON, a zero-dimension reference image (when at least one
/// annotation needs normalizing), and filesystem faults abort the whole run.
pub fn convert_dataset(
    dataset_dir: &Path,
    options: &ConvertOptions,
) -> Result<ConvertSummary, PrepError> {
    let mut summary = ConvertSummary::default();

    for json_path in find_annotation_files(dataset_dir)? {
        convert_split(&json_path, options, &mut summary)?;
        summary.splits += 1;
    }

    Ok(summary)
}

/// Collects annotation-file paths under `root` in sorted order.
fn find_annotation_files(root: &Path) -> Result<Vec<PathBuf>, PrepError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|source| PrepError::Walk {
            path: root.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;

        if entry.file_type().is_file() && file_name_str(entry.path()).ends_with(ANNOTATION_SUFFIX)
        {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Converts one split, rooted at the annotation file's parent directory.
fn convert_split(
    json_path: &Path,
    options: &ConvertOptions,
    summary: &mut ConvertSummary,
) -> Result<(), PrepError> {
    let split_root = json_path.parent().unwrap_or(Path::new("."));
    let labels_dir = split_root.join(&options.labels_dir_name);
    let images_dir = split_root.join(&options.images_dir_name);

    fs::create_dir_all(&labels_dir).map_err(PrepError::Io)?;
    fs::create_dir_all(&images_dir).map_err(PrepError::Io)?;

    let coco = coco::read_coco_json(json_path)?;

    for image in &coco.images {
        write_label_file(&coco, image.id, &image.file_name, json_path, &labels_dir, summary)?;

        // The source image sits next to the JSON until this move. A missing
        // source (e.g. a second conversion run) is skipped silently.
        let source_path = split_root.join(&image.file_name);
        if source_path.exists() {
            fs::rename(&source_path, images_dir.join(&image.file_name))
                .map_err(PrepError::Io)?;
            summary.images_moved += 1;
        } else {
            summary.images_missing += 1;
        }
    }

    Ok(())
}

/// Writes the label file for one image entry (empty if it has no annotations).
fn write_label_file(
    coco: &CocoDataset,
    image_id: u64,
    file_name: &str,
    json_path: &Path,
    labels_dir: &Path,
    summary: &mut ConvertSummary,
) -> Result<(), PrepError> {
    let label_path = labels_dir.join(format!("{}.txt", label_stem(file_name)));
    let mut label_file = fs::File::create(&label_path).map_err(PrepError::Io)?;
    summary.label_files += 1;

    for ann in coco.annotations.iter().filter(|a| a.image_id == image_id) {
        // Normalization deliberately uses the split's first image entry as
        // the reference resolution for every box in the file.
        let reference = &coco.images[0];
        if reference.width == 0 || reference.height == 0 {
            return Err(PrepError::ZeroImageDimension {
                path: json_path.to_path_buf(),
                file_name: reference.file_name.clone(),
            });
        }

        let line = yolo_label_line(ann.category_id, &ann.bbox, reference.width, reference.height);
        label_file.write_all(line.as_bytes()).map_err(PrepError::Io)?;
        summary.annotation_lines += 1;
    }

    Ok(())
}

/// Formats one YOLO label line from a COCO annotation.
///
/// COCO categories are 1-indexed, the output class index is 0-based. Floats
/// carry exactly 6 fractional digits.
fn yolo_label_line(category_id: i64, bbox: &[f64; 4], ref_width: u32, ref_height: u32) -> String {
    let class = category_id - 1;
    let angle = box_angle(bbox);

    let x_center = (bbox[0] + bbox[2] / 2.0) / ref_width as f64;
    let y_center = (bbox[1] + bbox[3] / 2.0) / ref_height as f64;
    let width = bbox[2] / ref_width as f64;
    let height = bbox[3] / ref_height as f64;

    format!("{class} {x_center:.6} {y_center:.6} {width:.6} {height:.6} {angle:.6}\n")
}

/// Rotation angle of the box's top edge, folded into `[0, π/2)`.
///
/// The top edge of an axis-aligned box is horizontal (`dy` is 0 between the
/// top-left and top-right corners), so this always evaluates to `0.0`. The
/// full formula is kept because the label format reserves the column and
/// consumers read the literal value.
fn box_angle(bbox: &[f64; 4]) -> f64 {
    let [x_min, y_min, width, _height] = *bbox;
    let (x1, y1) = (x_min, y_min);
    let (x2, y2) = (x_min + width, y_min);
    let (dx, dy) = (x2 - x1, y2 - y1);

    dy.atan2(dx).abs() % std::f64::consts::FRAC_PI_2
}

/// The label-file stem is the image filename truncated at the first dot, so
/// `lot_0012.rf.abc123.jpg` maps to `lot_0012.txt`.
fn label_stem(file_name: &str) -> &str {
    match file_name.split_once('.') {
        Some((stem, _)) => stem,
        None => file_name,
    }
}

fn file_name_str(path: &Path) -> &str {
    path.file_name().and_then(|name| name.to_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yolo_label_line_matches_reference_values() {
        // bbox [10, 20, 30, 40] against a 100x200 reference image.
        let line = yolo_label_line(1, &[10.0, 20.0, 30.0, 40.0], 100, 200);
        assert_eq!(line, "0 0.250000 0.200000 0.300000 0.200000 0.000000\n");
    }

    #[test]
    fn category_index_is_zero_based() {
        let line = yolo_label_line(5, &[0.0, 0.0, 10.0, 10.0], 100, 100);
        assert!(line.starts_with("4 "));

        // A 0-indexed category id falls through to class -1 rather than
        // wrapping; the original pipeline behaved the same way.
        let line = yolo_label_line(0, &[0.0, 0.0, 10.0, 10.0], 100, 100);
        assert!(line.starts_with("-1 "));
    }

    #[test]
    fn box_angle_is_always_zero() {
        assert_eq!(box_angle(&[10.0, 20.0, 30.0, 40.0]), 0.0);
        assert_eq!(box_angle(&[0.0, 0.0, 1.0, 99.0]), 0.0);
        // Even a degenerate negative-width box folds back to zero.
        assert_eq!(box_angle(&[5.0, 5.0, -3.0, 2.0]), 0.0);
    }

    #[test]
    fn label_stem_cuts_at_first_dot() {
        assert_eq!(label_stem("lot_0012.rf.abc123.jpg"), "lot_0012");
        assert_eq!(label_stem("plain.jpg"), "plain");
        assert_eq!(label_stem("no_extension"), "no_extension");
    }

    #[test]
    fn find_annotation_files_matches_suffix_only() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(temp.path().join("train")).expect("create split dir");
        fs::write(
            temp.path().join("train/_annotations.coco.json"),
            "{}",
        )
        .expect("write annotation file");
        fs::write(temp.path().join("train/notes.json"), "{}").expect("write other file");

        let found = find_annotation_files(temp.path()).expect("walk");
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("train/_annotations.coco.json"));
    }

    #[test]
    fn zero_dimension_reference_fails_only_with_annotations() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let json_path = temp.path().join("_annotations.coco.json");

        // No annotations: the reference dimensions are never consulted.
        fs::write(
            &json_path,
            r#"{"images": [{"id": 0, "width": 0, "height": 0, "file_name": "a.jpg"}],
                "annotations": []}"#,
        )
        .expect("write json");
        convert_dataset(temp.path(), &ConvertOptions::default()).expect("convert");

        fs::write(
            &json_path,
            r#"{"images": [{"id": 0, "width": 0, "height": 0, "file_name": "a.jpg"}],
                "annotations": [{"id": 0, "image_id": 0, "category_id": 1,
                                 "bbox": [1.0, 1.0, 2.0, 2.0]}]}"#,
        )
        .expect("write json");
        let err = convert_dataset(temp.path(), &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, PrepError::ZeroImageDimension { .. }));
    }

    #[test]
    fn normalization_uses_first_image_dimensions() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::write(
            temp.path().join("_annotations.coco.json"),
            r#"{
                "images": [
                    {"id": 0, "width": 100, "height": 100, "file_name": "first.jpg"},
                    {"id": 1, "width": 400, "height": 400, "file_name": "second.jpg"}
                ],
                "annotations": [
                    {"id": 0, "image_id": 1, "category_id": 1, "bbox": [0.0, 0.0, 50.0, 50.0]}
                ]
            }"#,
        )
        .expect("write json");

        convert_dataset(temp.path(), &ConvertOptions::default()).expect("convert");

        // second.jpg's box is divided by first.jpg's 100x100, not its own
        // 400x400: the inherited reference-resolution behavior.
        let line = fs::read_to_string(temp.path().join("labels/second.txt")).expect("read label");
        assert_eq!(line, "0 0.250000 0.250000 0.500000 0.500000 0.000000\n");
    }
}
