use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while listing the selected folder
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("folder does not exist: {0}")]
    NotFound(PathBuf),

    #[error("not a folder: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to list {path}: {source}")]
    Listing {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Errors raised while converting a single DNG file.
///
/// These never abort a batch: the converter records them against the
/// file and moves on.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to decode RAW: {0}")]
    Decode(String),

    #[error("unsupported sensor layout: {0}")]
    UnsupportedLayout(String),

    #[error("failed to encode JPEG: {0}")]
    Encode(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
