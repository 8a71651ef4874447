//! Plugin configuration.
//!
//! Everything has a default, so `{}` is a valid config for a modern device
//! whose host supplies its own permission gate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use manage_install_core::error::{CoreError, CoreResult};
use manage_install_core::types::{CorrelationToken, SdkLevel};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstallerConfig {
    /// Host application package name, the default install target
    pub package_name: Option<String>,
    /// `Build.VERSION.SDK_INT` of the device
    pub sdk_level: SdkLevel,
    /// Public downloads directory, required for staging on API 23 and below
    pub public_storage_dir: Option<PathBuf>,
    /// `FileProvider` path root the packages are shared under
    pub file_provider_root: String,
    /// Request code shared by the permission request and the installer launch
    pub request_code: i32,
    /// Give up on a pending flow after this many seconds. Unset waits forever.
    pub install_timeout_secs: Option<u64>,
    /// Resolve a pending flow as cancelled when the activity goes away for good
    pub cancel_on_detach: bool,
}

impl InstallerConfig {
    pub const DEFAULT_SDK_LEVEL: SdkLevel = SdkLevel(34);
    pub const DEFAULT_PROVIDER_ROOT: &'static str = "install";

    /// Parses and validates a JSON config.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CoreError::ConfigError(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| CoreError::ConfigError(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_json(&json)?;
        log::debug!("Loaded installer config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.sdk_level.0 == 0 {
            return Err(CoreError::ConfigError("sdkLevel must be positive".to_string()));
        }
        if self.file_provider_root.is_empty() || self.file_provider_root.contains('/') {
            return Err(CoreError::ConfigError(format!(
                "fileProviderRoot must be a single path segment, got {:?}",
                self.file_provider_root
            )));
        }
        if self.install_timeout_secs == Some(0) {
            return Err(CoreError::ConfigError(
                "installTimeoutSecs must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// `<package>.installFileProvider.install`, if the package name is known.
    pub fn file_provider_authority(&self) -> Option<String> {
        self.package_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(|name| format!("{name}.installFileProvider.install"))
    }

    pub fn token(&self) -> CorrelationToken {
        CorrelationToken(self.request_code)
    }

    pub fn install_timeout(&self) -> Option<Duration> {
        self.install_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            package_name: None,
            sdk_level: Self::DEFAULT_SDK_LEVEL,
            public_storage_dir: None,
            file_provider_root: Self::DEFAULT_PROVIDER_ROOT.to_string(),
            request_code: CorrelationToken::PERMISSION_OR_INSTALL.0,
            install_timeout_secs: None,
            cancel_on_detach: false,
        }
    }
}
