use serde::Serialize;

use crate::permissions::Capability;

/// Code reported on the result channel when a permission is denied
pub const PERMISSION_DENIED_ERROR: i32 = 20;

/// Result type delivered through a request's reply channel
pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

/// Failures a bridge request can resolve to
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// Action name outside the recognized set
    #[error("Unrecognized action: {0}")]
    UnrecognizedAction(String),

    /// Positional argument absent from the request
    #[error("Missing argument {index} for {action}")]
    MissingArgument { action: String, index: usize },

    /// Filename does not name an entry in the flat storage namespace
    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),

    /// A requested permission came back denied
    #[error("Permission denied")]
    PermissionDenied,

    /// The permission round trip did not complete in time
    #[error("Timed out waiting for {0} permission")]
    PermissionTimeout(Capability),

    /// File creation, write or payload decode failed
    #[error("{0}")]
    Io(String),

    /// Request queue is full
    #[error("Request queue is full")]
    Busy,

    /// Request was discarded before a result was produced
    #[error("Request was dropped before completion")]
    Dropped,
}

impl BridgeError {
    /// Platform code for this error, if it has one
    pub fn code(&self) -> Option<i32> {
        match self {
            BridgeError::PermissionDenied => Some(PERMISSION_DENIED_ERROR),
            _ => None,
        }
    }

    /// Render as the error payload sent back to the web layer
    pub fn payload(&self) -> ErrorPayload {
        match self.code() {
            Some(code) => ErrorPayload::Code { code },
            None => ErrorPayload::Message {
                message: self.to_string(),
            },
        }
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Io(err.to_string())
    }
}

/// Error payload on the result channel: a denial code or a free-text message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    Code { code: i32 },
    Message { message: String },
}
