use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while driving the browser, extracting pages and persisting rows
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Interaction with '{selector}' failed: {reason}")]
    InteractionFailed { selector: String, reason: String },

    #[error("Failed to read page: {0}")]
    PageReadFailed(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    /// Login elements or post-login confirmation could not be obtained in time.
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Session is {state}, cannot {operation}")]
    InvalidState { state: String, operation: String },

    #[error("Invalid extraction rule '{field}': {reason}")]
    InvalidRule { field: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to persist {}: {reason}", path.display())]
    Persistence { path: PathBuf, reason: String },

    #[error("Column mismatch in {}: expected {expected:?}, found {found:?}", path.display())]
    SchemaMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Record has {found} values for {expected} columns")]
    RecordArity { expected: usize, found: usize },

    #[error("Page {page} failed: {reason}")]
    PageProcessing { page: usize, reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl HarvestError {
    /// Only authentication failures abort a run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HarvestError::Auth(_))
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;
