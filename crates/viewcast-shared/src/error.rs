use thiserror::Error;

/// Errors arising from the live channel wire format.
#[derive(Error, Debug)]
pub enum WireError {
    #[error("Invalid frame: {0}")]
    Json(#[from] serde_json::Error),
}
