//! manage_install Core Library
//!
//! Coordinates the asynchronous install flow of a package file on Android:
//! - install permission check and request (Permission Gate)
//! - installer hand-off (Install Action Builder)
//! - result correlation across the shared request code (Flow Coordinator)
//!
//! Platform glue (host surface, permission probe, URL opener) is abstracted
//! behind traits so the flow itself stays testable without a device.

pub mod error;
pub mod services;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::{
    ActivityResultBridge, FlowCoordinator, InstallService, ResultChannel, StoreService,
};
pub use traits::{
    ActivityResultListener, HostSurface, InstallActionBuilder, PermissionGate, UrlOpener,
};
