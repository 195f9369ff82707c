//! Curriculum loading errors.

/// Errors from loading curriculum tables or selection rules.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    /// File could not be read
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// File is not valid JSON for the expected shape
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// File parsed but violates a table invariant
    #[error("invalid curriculum data: {message}")]
    Invalid { message: String },
}
