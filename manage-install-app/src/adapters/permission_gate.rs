//! SDK-aware install permission gate.

use manage_install_core::traits::PermissionGate;
use manage_install_core::types::SdkLevel;

type Probe = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Install permission gate backed by a host probe.
///
/// The probe stands in for `PackageManager.canRequestPackageInstalls()` and is
/// only consulted from Android O on; older releases have no such permission.
pub struct SdkPermissionGate {
    sdk_level: SdkLevel,
    probe: Probe,
}

impl SdkPermissionGate {
    pub fn new<F>(sdk_level: SdkLevel, probe: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            sdk_level,
            probe: Box::new(probe),
        }
    }
}

impl PermissionGate for SdkPermissionGate {
    fn is_granted(&self, target: &str) -> bool {
        if !self.sdk_level.has_install_permission() {
            return true;
        }
        (self.probe)(target)
    }
}
