//! Install permission abstraction Trait

/// Permission Gate Trait
///
/// Answers whether the host may currently install packages from this source.
/// Implementations must be a cheap, non-blocking query.
///
/// Platform implementations:
/// - Android O+: `PackageManager.canRequestPackageInstalls()`
/// - Older Android: always granted, the permission does not exist there
pub trait PermissionGate: Send + Sync {
    /// # Arguments
    /// * `target` - package name the permission is checked for
    fn is_granted(&self, target: &str) -> bool;
}

/// Gate for platforms without a per-source install permission
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysGranted;

impl PermissionGate for AlwaysGranted {
    fn is_granted(&self, _target: &str) -> bool {
        true
    }
}
