//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

/// Core layer error type
///
/// Every variant ends up as the `message` of a failed `FlowOutcome`, so the
/// display strings are what the Dart side finally shows.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Empty or unusable caller input (file path, package name, store URI)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No host surface (activity) to launch the action from
    #[error("Context unavailable: no activity is attached to launch the action")]
    ContextUnavailable,

    /// The install action could not be built
    #[error("APK installation could not be initialized: {0}")]
    BuilderFailure(String),

    /// The installer returned a non-OK result
    #[error("Installation failed or was cancelled")]
    OsRejected,

    /// The permission settings screen returned a non-OK result
    #[error("Fail to request permissions")]
    PermissionRequestFailed,

    /// Another flow is still waiting for its completion
    #[error("Another installation is already in progress")]
    Busy,

    /// The pending flow was cancelled before a completion arrived
    #[error("Installation cancelled: {0}")]
    Cancelled(String),

    /// No completion arrived within the configured timeout
    #[error("Installation timed out after {0}s without a result")]
    TimedOut(u64),

    /// Staging the package file failed
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Invalid plugin configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Unknown method-channel call
    #[error("Method not implemented: {0}")]
    NotImplemented(String),
}

impl CoreError {
    /// Whether it is expected behavior (user input, user cancelled, etc.), used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::InvalidInput(_)
            | Self::OsRejected
            | Self::PermissionRequestFailed
            | Self::Busy
            | Self::Cancelled(_)
            | Self::NotImplemented(_) => true,
            Self::ContextUnavailable
            | Self::BuilderFailure(_)
            | Self::TimedOut(_)
            | Self::StorageError(_)
            | Self::ConfigError(_)
            | Self::SerializationError(_) => false,
        }
    }

    /// Logs the error at the level `is_expected` picks.
    pub fn log(&self, context: &str) {
        if self.is_expected() {
            log::warn!("{context}: {self}");
        } else {
            log::error!("{context}: {self}");
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
