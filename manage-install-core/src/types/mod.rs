//! 类型定义模块

mod outcome;
mod platform;
mod request;
mod state;

pub use outcome::FlowOutcome;
pub use platform::{
    ActivityResultCode, CorrelationToken, HostAction, InstallIntent, IntentFlags, PackageUri,
    SdkLevel,
};
pub use request::{InstallRequest, StoreRequest};
pub use state::{FlowContext, PendingState};
