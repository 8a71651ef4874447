//! 安装 Intent 构建抽象 Trait

use crate::error::CoreResult;
use crate::types::InstallIntent;

/// Install Action Builder Trait
///
/// Turns a package path into the intent that opens the system installer.
/// This is the only collaborator allowed to touch the disk (legacy staging).
///
/// # Errors
/// * `CoreError::InvalidInput` - empty path or missing file
/// * `CoreError::ContextUnavailable` - no host context to derive the URI from
/// * `CoreError::BuilderFailure` - the intent could not be produced (e.g. staging copy failed)
pub trait InstallActionBuilder: Send + Sync {
    /// # Arguments
    /// * `file_path` - package file on local storage
    /// * `target` - resolved package name, used for the staging directory
    fn build(&self, file_path: &str, target: &str) -> CoreResult<InstallIntent>;
}
