use thiserror::Error;

/// Caller-visible failures of a compression run.
///
/// Per-image and per-font problems never show up here: they are logged and
/// the resource is left untouched. Engine failures are reported through the
/// status callback instead (see [`crate::engine::EngineOutcome`]).
#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Failed to load PDF: {0}")]
    DocumentLoad(String),

    #[error("Failed to save PDF: {0}")]
    Save(String),

    #[error("Target of {target} bytes not reached after {attempts} attempts (best: {best_size} bytes)")]
    UnreachableTarget {
        target: u64,
        best_size: u64,
        attempts: u32,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CompressError>;
