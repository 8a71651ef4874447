//! Method-channel request payloads

use serde::{Deserialize, Serialize};

/// `installApk` arguments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallRequest {
    /// Local path of the package file
    #[serde(default)]
    pub file_path: Option<String>,
    /// Target package name, defaults to the host application's own
    #[serde(default)]
    pub app_id: Option<String>,
}

impl InstallRequest {
    #[must_use]
    pub fn new(file_path: impl Into<String>, app_id: Option<String>) -> Self {
        Self {
            file_path: Some(file_path.into()),
            app_id,
        }
    }

    /// File path with `None` and `""` folded together
    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref().filter(|p| !p.is_empty())
    }

    /// Explicit target, if the caller gave a non-empty one
    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// `goToAppStore` arguments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRequest {
    #[serde(default)]
    pub store_uri: Option<String>,
}
