use std::path::PathBuf;

use thiserror::Error;

use crate::types::MediaDigest;

#[derive(Error, Debug)]
pub enum OratorError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Analysis failed: {reason}")]
    Analysis { reason: String },

    #[error("No cached analysis for {digest}")]
    NotFound { digest: MediaDigest },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    Api(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, OratorError>;
