//! Error types for peerboot

use thiserror::Error;

/// Main error type for peerboot
#[derive(Error, Debug)]
pub enum BootError {
    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    // Directory errors
    #[error("endpoint {endpoint} unreachable: {reason}")]
    Unreachable { endpoint: String, reason: String },

    #[error("protocol error from {endpoint}: {reason}")]
    Protocol { endpoint: String, reason: String },

    #[error("member conflict at {endpoint}: {reason}")]
    Conflict { endpoint: String, reason: String },

    #[error("member {id} not found at {endpoint}")]
    NotFound { endpoint: String, id: String },

    // Output errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BootError {
    /// Failure of the remote directory, as opposed to local configuration or I/O
    pub fn is_directory_error(&self) -> bool {
        matches!(
            self,
            Self::Unreachable { .. }
                | Self::Protocol { .. }
                | Self::Conflict { .. }
                | Self::NotFound { .. }
        )
    }

    /// Attach the endpoint a directory error came from, if not already known
    pub fn at_endpoint(self, at: &str) -> Self {
        match self {
            Self::Protocol { endpoint, reason } if endpoint.is_empty() => Self::Protocol {
                endpoint: at.to_string(),
                reason,
            },
            other => other,
        }
    }
}

/// Result type alias for peerboot
pub type Result<T> = std::result::Result<T, BootError>;
