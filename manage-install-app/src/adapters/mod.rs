//! Default platform adapters.

mod intent_builder;
mod permission_gate;

pub use intent_builder::{stage_package, PackageIntentBuilder};
pub use permission_gate::SdkPermissionGate;
