use std::path::PathBuf;

/// Errors surfaced by a search run.
#[derive(Debug, thiserror::Error)]
pub enum ScalperError {
    /// memory.json exists and is non-empty but does not parse or validate.
    /// Never auto-repaired; the user has to inspect or discard the file.
    #[error("invalid JSON in memory file {}: {reason}. Verify memory file integrity.", path.display())]
    CorruptHistory { path: PathBuf, reason: String },

    /// A page fetch failed outright. Not retried; ends the run.
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("search request rejected with status {0}")]
    ApiStatus(reqwest::StatusCode),

    /// Kaggle credentials could not be located.
    #[error("kaggle credentials not found: {0}")]
    Credentials(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
