use std::path::PathBuf;
use thiserror::Error;

/// Result type for citation operations
pub type Result<T> = std::result::Result<T, CitationError>;

/// Errors raised while loading citation inputs
#[derive(Error, Debug)]
pub enum CitationError {
    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Claim bucket document could not be parsed
    #[error("Invalid claim buckets: {0}")]
    InvalidBuckets(String),

    /// Exhibit registry could not be parsed
    #[error("Invalid exhibit registry {}: {reason}", path.display())]
    InvalidRegistry { path: PathBuf, reason: String },

    /// Registry file does not exist
    #[error("Missing exhibit registry: {}", .0.display())]
    MissingRegistry(PathBuf),
}

/// Failure of the external fact-graph collaborator.
///
/// Always recovered by the caller: graph citations degrade to empty.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("Graph source unavailable: {0}")]
    Unavailable(String),

    #[error("Graph call timed out after {0} ms")]
    Timeout(u64),

    #[error("Graph query failed: {0}")]
    Query(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_errors_carry_the_path() {
        let invalid = CitationError::InvalidRegistry {
            path: PathBuf::from("registry.json"),
            reason: "expected value".to_string(),
        };
        assert_eq!(invalid.to_string(), "Invalid exhibit registry registry.json: expected value");

        let missing = CitationError::MissingRegistry(PathBuf::from("absent.json"));
        assert_eq!(missing.to_string(), "Missing exhibit registry: absent.json");
    }
}
