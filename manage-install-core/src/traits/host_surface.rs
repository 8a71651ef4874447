//! Host surface (foreground activity) abstraction

use crate::error::CoreResult;
use crate::types::{ActivityResultCode, CorrelationToken, HostAction};

/// The foreground activity, able to start actions for a result.
///
/// `launch` only hands the action over; the result arrives later through
/// `ActivityResultBridge::deliver`.
pub trait HostSurface: Send + Sync {
    fn launch(&self, action: HostAction, token: CorrelationToken) -> CoreResult<()>;
}

/// Receiver of activity results, registered on the bridge per token.
pub trait ActivityResultListener: Send + Sync {
    /// Returns `true` if the result was consumed.
    fn on_activity_result(&self, token: CorrelationToken, code: ActivityResultCode) -> bool;
}
