//! Error types for Horizon Grid.

use std::fmt;

/// Result type alias for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors surfaced by the grid component.
///
/// Remote save failures are not errors here; the quick-edit pipeline reports
/// them through its outcome.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GridError {
    /// A quick save was attempted without a usable endpoint.
    #[error("{api} is required")]
    MissingSaveApi {
        /// Name of the missing endpoint setting.
        api: &'static str,
    },

    /// A selection action was invoked on a table without row selection.
    #[error("row selection is not configured")]
    SelectionNotConfigured,

    /// An action name the table does not handle.
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    /// The table schema could not be parsed.
    #[error("invalid table schema: {0}")]
    InvalidSchema(#[from] serde_json::Error),
}

/// Failure reported by a [`crate::SaveTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveError {
    message: String,
    status: Option<u16>,
}

impl SaveError {
    /// A failure with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// A failure carrying the remote status code.
    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The remote status code, if the remote answered.
    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {status})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for SaveError {}
