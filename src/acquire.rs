//! Dataset acquisition: archive download, extraction, and install.
//!
//! The PKLot export is fetched as a zip archive from Kaggle's public
//! download endpoint, unpacked into a staging directory under the system
//! temp dir, and then installed destructively: any existing copy at the
//! target path is removed before the fetched tree is copied in. There is
//! no retry policy; a transport or filesystem fault aborts the run.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::PrepError;

/// Kaggle reference of the PKLot export this tool prepares.
pub const DEFAULT_DATASET: &str = "ammarnassanalhajali/pklot-dataset";

/// Reference to a public Kaggle dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetRef {
    pub owner: String,
    pub slug: String,
}

impl DatasetRef {
    /// Public (unauthenticated) download endpoint for this dataset.
    pub fn download_url(&self) -> String {
        format!(
            "https://www.kaggle.com/api/v1/datasets/download/{}/{}",
            self.owner, self.slug
        )
    }
}

impl std::fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.slug)
    }
}

/// Parse a user-supplied dataset reference in `<owner>/<slug>` form.
pub fn parse_dataset_ref(input: &str) -> Result<DatasetRef, PrepError> {
    let trimmed = input.trim();
    let mut parts = trimmed.split('/');
    let owner = parts.next().unwrap_or_default();
    let slug = parts.next().unwrap_or_default();
    let extra = parts.next();

    if owner.is_empty() || slug.is_empty() || extra.is_some() {
        return Err(PrepError::DatasetRefInvalid {
            input: input.to_string(),
            message: "expected dataset reference in '<owner>/<slug>' form".to_string(),
        });
    }

    Ok(DatasetRef {
        owner: owner.to_string(),
        slug: slug.to_string(),
    })
}

/// Downloads `dataset` and materializes it at `target_dir`.
///
/// Any pre-existing directory at `target_dir` is deleted before the fetched
/// contents are copied in. The staging area is cleaned up on both success
/// and failure.
///
/// # Errors
/// Returns an error on network faults, a non-success HTTP status, archive
/// corruption, or filesystem faults.
pub fn download_dataset(dataset: &DatasetRef, target_dir: &Path) -> Result<(), PrepError> {
    let staging = std::env::temp_dir().join(format!("pklot-prep-{}", std::process::id()));

    let result = fetch_extract_install(dataset, target_dir, &staging);
    let _ = fs::remove_dir_all(&staging);
    result
}

fn fetch_extract_install(
    dataset: &DatasetRef,
    target_dir: &Path,
    staging: &Path,
) -> Result<(), PrepError> {
    let contents_dir = staging.join("contents");
    fs::create_dir_all(&contents_dir).map_err(PrepError::Io)?;

    let archive_path = staging.join("dataset.zip");
    fetch_archive(dataset, &archive_path)?;
    extract_archive(&archive_path, &contents_dir)?;
    install_tree(&contents_dir, target_dir)
}

/// Streams the dataset archive to `dest`.
fn fetch_archive(dataset: &DatasetRef, dest: &Path) -> Result<(), PrepError> {
    let url = dataset.download_url();

    let response = ureq::get(&url)
        .call()
        .map_err(|source| PrepError::DownloadFailed {
            dataset: dataset.to_string(),
            message: source.to_string(),
        })?;

    let mut reader = response.into_body().into_reader();
    let mut file = fs::File::create(dest).map_err(PrepError::Io)?;
    io::copy(&mut reader, &mut file).map_err(PrepError::Io)?;

    Ok(())
}

/// Unpacks a zip archive into `directory`.
fn extract_archive(archive_path: &Path, directory: &Path) -> Result<(), PrepError> {
    let file = fs::File::open(archive_path).map_err(PrepError::Io)?;

    let mut archive =
        zip::ZipArchive::new(file).map_err(|source| PrepError::ArchiveExtract {
            path: archive_path.to_path_buf(),
            source,
        })?;

    archive
        .extract(directory)
        .map_err(|source| PrepError::ArchiveExtract {
            path: archive_path.to_path_buf(),
            source,
        })
}

/// Replaces `target` with a recursive copy of `source`.
fn install_tree(source: &Path, target: &Path) -> Result<(), PrepError> {
    if target.exists() {
        fs::remove_dir_all(target).map_err(PrepError::Io)?;
    }
    copy_tree(source, target)
}

fn copy_tree(source: &Path, target: &Path) -> Result<(), PrepError> {
    fs::create_dir_all(target).map_err(PrepError::Io)?;

    for entry in fs::read_dir(source).map_err(PrepError::Io)? {
        let entry = entry.map_err(PrepError::Io)?;
        let dest = target.join(entry.file_name());

        if entry.file_type().map_err(PrepError::Io)?.is_dir() {
            copy_tree(&entry.path(), &dest)?;
        } else {
            fs::copy(entry.path(), &dest).map_err(PrepError::Io)?;
        }
    }

    Ok(())
}
