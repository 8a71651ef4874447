//! Platform capability traits

mod host_surface;
mod install_action_builder;
mod permission_gate;
mod url_opener;

pub use host_surface::{ActivityResultListener, HostSurface};
pub use install_action_builder::InstallActionBuilder;
pub use permission_gate::{AlwaysGranted, PermissionGate};
pub use url_opener::UrlOpener;
