//! Filesystem-backed install intent builder.
//!
//! Android M and older cannot hand a private file to the installer, so the
//! package is first copied to `<public storage>/<target>/`. From N on the
//! file is shared through the app's `FileProvider` authority instead.

use std::fs;
use std::path::{Path, PathBuf};

use manage_install_core::error::{CoreError, CoreResult};
use manage_install_core::traits::InstallActionBuilder;
use manage_install_core::types::{InstallIntent, PackageUri, SdkLevel};

use crate::config::InstallerConfig;

/// Install intent builder
pub struct PackageIntentBuilder {
    sdk_level: SdkLevel,
    /// `FileProvider` authority, `None` when no application context exists
    authority: Option<String>,
    provider_root: String,
    public_storage_dir: Option<PathBuf>,
}

impl PackageIntentBuilder {
    #[must_use]
    pub fn new(sdk_level: SdkLevel, authority: Option<String>) -> Self {
        Self {
            sdk_level,
            authority,
            provider_root: InstallerConfig::DEFAULT_PROVIDER_ROOT.to_string(),
            public_storage_dir: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &InstallerConfig) -> Self {
        Self {
            sdk_level: config.sdk_level,
            authority: config.file_provider_authority(),
            provider_root: config.file_provider_root.clone(),
            public_storage_dir: config.public_storage_dir.clone(),
        }
    }

    /// Public downloads directory used for staging on legacy releases.
    #[must_use]
    pub fn with_public_storage(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_storage_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_provider_root(mut self, root: impl Into<String>) -> Self {
        self.provider_root = root.into();
        self
    }

    fn package_uri(&self, file: &Path) -> CoreResult<PackageUri> {
        if !self.sdk_level.supports_content_uris() {
            let path = std::path::absolute(file)
                .map_err(|e| CoreError::BuilderFailure(format!("{}: {e}", file.display())))?;
            return Ok(PackageUri::File { path });
        }

        let authority = self.authority.clone().ok_or(CoreError::ContextUnavailable)?;
        Ok(PackageUri::Content {
            authority,
            path: format!("{}/{}", self.provider_root, file_name(file)?),
        })
    }
}

impl InstallActionBuilder for PackageIntentBuilder {
    fn build(&self, file_path: &str, target: &str) -> CoreResult<InstallIntent> {
        if file_path.is_empty() {
            return Err(CoreError::InvalidInput("empty package file path".to_string()));
        }
        let source = Path::new(file_path);
        if !source.is_file() {
            return Err(CoreError::InvalidInput(format!(
                "package file does not exist: {file_path}"
            )));
        }

        log::info!("Building install intent on {}", self.sdk_level);

        let file = if self.sdk_level.requires_public_staging() {
            let public_dir = self.public_storage_dir.as_deref().ok_or_else(|| {
                CoreError::ConfigError(format!(
                    "publicStorageDir is required on {}",
                    self.sdk_level
                ))
            })?;
            stage_package(source, public_dir, target)
                .map_err(|e| CoreError::BuilderFailure(e.to_string()))?
        } else {
            source.to_path_buf()
        };

        Ok(InstallIntent::new(self.package_uri(&file)?))
    }
}

/// Copies `source` to `<public_dir>/<target>/<file name>`, overwriting an
/// existing copy. Returns the staged path.
pub fn stage_package(source: &Path, public_dir: &Path, target: &str) -> CoreResult<PathBuf> {
    let target_dir = public_dir.join(target);
    fs::create_dir_all(&target_dir).map_err(|e| {
        CoreError::StorageError(format!("cannot create {}: {e}", target_dir.display()))
    })?;

    let dest = target_dir.join(file_name(source)?);
    if is_same_file(source, &dest) {
        log::debug!("{} is already staged", dest.display());
        return Ok(dest);
    }

    fs::copy(source, &dest).map_err(|e| {
        CoreError::StorageError(format!(
            "cannot copy {} to {}: {e}",
            source.display(),
            dest.display()
        ))
    })?;
    log::info!("Staged package at {}", dest.display());
    Ok(dest)
}

fn file_name(path: &Path) -> CoreResult<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| CoreError::InvalidInput(format!("not a file path: {}", path.display())))
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
