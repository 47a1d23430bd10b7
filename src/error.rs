use std::path::PathBuf;
use thiserror::Error;

/// The main error type for pklot-prep operations.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse COCO JSON from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed while traversing {path}: {message}")]
    Walk { path: PathBuf, message: String },

    #[error("Reference image '{file_name}' in {path} has a zero dimension")]
    ZeroImageDimension { path: PathBuf, file_name: String },

    #[error("Invalid dataset reference '{input}': {message}")]
    DatasetRefInvalid { input: String, message: String },

    #[error("Failed to download dataset '{dataset}': {message}")]
    DownloadFailed { dataset: String, message: String },

    #[error("Failed to extract archive {path}: {source}")]
    ArchiveExtract {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}
