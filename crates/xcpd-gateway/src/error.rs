//! Gateway error types.
//!
//! Only `GatewayError` ever reaches a caller. Transport, cache and
//! confirmation faults are recovered inside the orchestration and logged.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by a responding gateway call.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The remote call failed (connection, fault response, ...).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote answered with something that is not a discovery response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The call did not finish within the configured request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The task running the call was cancelled or panicked.
    #[error("request aborted: {0}")]
    Aborted(String),
}

impl TransportError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Errors raised by the local identity index.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// The local index could not be reached.
    #[error("local lookup transport fault: {0}")]
    Transport(String),

    /// The local index rejected the query as invalid.
    #[error("local lookup business fault: {0}")]
    Business(String),
}

/// Errors surfaced to the caller of an inbound operation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The inbound query is missing required data; nothing was dispatched.
    #[error("validation error: {0}")]
    Validation(String),

    /// The query carries no identifier under the community assigning authority.
    #[error("query has no identifier under the community assigning authority")]
    MissingCommunityIdentifier,

    /// The local identity index failed while resolving the inbound query.
    #[error(transparent)]
    LocalLookup(#[from] LookupError),
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns `true` for errors caused by the caller's input.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::MissingCommunityIdentifier)
    }
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
