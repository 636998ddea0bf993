use std::path::PathBuf;
use thiserror::Error;

/// Result type for mailbox operations
pub type Result<T> = std::result::Result<T, MailboxError>;

/// Errors that can occur while reading mailbox archives
#[derive(Error, Debug)]
pub enum MailboxError {
    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Archive directory or file does not exist
    #[error("Missing archive source: {}", .0.display())]
    MissingSource(PathBuf),

    /// Background read task failed to complete
    #[error("Archive read task failed: {0}")]
    TaskFailed(String),
}
