//! Filename normalization for generator-suffixed images.
//!
//! Roboflow-style exports append a `.rf.<hex>` fingerprint to every image
//! name (`lot_0012.rf.a1b2c3.jpg`). This pass strips that fingerprint from
//! `.jpg` files inside any directory named `images`, renaming in place.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::PrepError;

/// Counters describing one normalization run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenameSummary {
    /// `.jpg` files examined inside `images` directories.
    pub files_seen: usize,

    /// Files whose name actually changed.
    pub files_renamed: usize,
}

/// Strips the `.rf.<hex>` fingerprint from every `.jpg` inside any `images`
/// directory under `dataset_dir`, renaming files in place.
///
/// Non-`.jpg` entries and subdirectories are left untouched. There is no
/// collision detection: when two names normalize to the same target, the
/// later rename overwrites the earlier file (inherited behavior).
///
/// # Errors
/// Returns an error on directory traversal or rename faults.
pub fn normalize_image_names(dataset_dir: &Path) -> Result<RenameSummary, PrepError> {
    let mut summary = RenameSummary::default();

    // Collect first so renames never race the directory walk.
    let mut image_dirs = Vec::new();
    for entry in WalkDir::new(dataset_dir) {
        let entry = entry.map_err(|source| PrepError::Walk {
            path: dataset_dir.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;

        if entry.file_type().is_dir() && entry.file_name() == "images" {
            image_dirs.push(entry.path().to_path_buf());
        }
    }

    for images_dir in image_dirs {
        normalize_dir(&images_dir, &mut summary)?;
    }

    Ok(summary)
}

/// Normalizes the `.jpg` files directly inside one `images` directory.
fn normalize_dir(images_dir: &Path, summary: &mut RenameSummary) -> Result<(), PrepError> {
    // Snapshot the listing up front; renames must not feed back into it.
    let entries: Vec<fs::DirEntry> = fs::read_dir(images_dir)
        .map_err(PrepError::Io)?
        .collect::<Result<_, _>>()
        .map_err(PrepError::Io)?;

    for dir_entry in entries {
        if !dir_entry.file_type().map_err(PrepError::Io)?.is_file() {
            continue;
        }

        let file_name = dir_entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !name.ends_with(".jpg") {
            continue;
        }
        summary.files_seen += 1;

        let new_name = strip_rf_fingerprint(name);
        let old_path = images_dir.join(name);
        let new_path = images_dir.join(&new_name);
        fs::rename(&old_path, &new_path).map_err(PrepError::Io)?;
        println!("Renamed: {} -> {}", old_path.display(), new_path.display());

        if new_name != name {
            summary.files_renamed += 1;
        }
    }

    Ok(())
}

/// Removes every `.rf.<hex>` run (one or more lowercase hex chars) from a
/// filename; a name without the fingerprint comes back unchanged.
fn strip_rf_fingerprint(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut rest = name;

    while let Some(pos) = rest.find(".rf.") {
        let after = &rest[pos + 4..];
        let hex_len = after
            .bytes()
            .take_while(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
            .count();

        if hex_len == 0 {
            // ".rf." not followed by hex; keep scanning past this dot.
            out.push_str(&rest[..pos + 1]);
            rest = &rest[pos + 1..];
        } else {
            out.push_str(&rest[..pos]);
            rest = &after[hex_len..];
        }
    }

    out.push_str(rest);
    out
}
