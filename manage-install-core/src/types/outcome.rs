//! Terminal result of a flow

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Message of a successful install
pub const INSTALL_COMPLETE: &str = "Installation complete";

/// Result delivered to the caller, serialised as `{ "isSuccess", "message" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowOutcome {
    pub is_success: bool,
    pub message: Option<String>,
}

impl FlowOutcome {
    #[must_use]
    pub fn success(message: Option<String>) -> Self {
        Self {
            is_success: true,
            message,
        }
    }

    #[must_use]
    pub fn installed() -> Self {
        Self::success(Some(INSTALL_COMPLETE.to_string()))
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            message: Some(message.into()),
        }
    }
}

impl From<&CoreError> for FlowOutcome {
    fn from(err: &CoreError) -> Self {
        Self::failure(err.to_string())
    }
}

impl From<CoreError> for FlowOutcome {
    fn from(err: CoreError) -> Self {
        Self::from(&err)
    }
}
