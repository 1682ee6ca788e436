use thiserror::Error;

/// Core error types for the identity model
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid subject identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid assigning authority: {0}")]
    InvalidAssigningAuthority(String),
}

impl CoreError {
    /// Create a new InvalidIdentifier error
    pub fn invalid_identifier(value: impl Into<String>) -> Self {
        Self::InvalidIdentifier(value.into())
    }

    /// Create a new InvalidAssigningAuthority error
    pub fn invalid_assigning_authority(value: impl Into<String>) -> Self {
        Self::InvalidAssigningAuthority(value.into())
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
