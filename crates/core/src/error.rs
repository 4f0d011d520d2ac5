//! Connector error model.

use thiserror::Error;

/// Result type used across the connector crates.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Failure talking to the remote storefront API.
///
/// These come from the transport or the remote application itself, never from
/// local validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The request did not complete (connection refused, timeout, HTTP status).
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote API rejected the credentials or the session expired.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The remote API answered with a fault.
    #[error("remote fault {code}: {message}")]
    Fault { code: String, message: String },

    /// The response could not be decoded into the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn fault(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fault {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Connector-level error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    /// A value failed validation (e.g. malformed remote data).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A record expected to exist locally was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness rule was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A user-facing error raised by a connector operation.
    #[error("{0}")]
    User(String),

    /// The operation is not available for this kind of channel.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A bulk inventory update returned a fault other than "item not found".
    #[error("FaultCode: {code}, FaultMessage: {message}")]
    InventoryUpdateFault { code: String, message: String },

    /// The remote API returned a result list whose length differs from the
    /// request list, so results cannot be matched to listings.
    #[error("inventory update returned {actual} results for {expected} requests")]
    ResponseMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl ConnectorError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn user(msg: impl Into<String>) -> Self {
        Self::User(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}
