//! Coordinator state

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use uuid::Uuid;

/// Bookkeeping for one `installApk` call, kept across the permission round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowContext {
    pub id: Uuid,
    /// Active package path, re-used when the flow re-enters after the permission screen
    pub file_path: String,
    pub started_at: DateTime<Utc>,
    /// Monotonic start, used for the optional timeout
    pub started: Instant,
}

impl FlowContext {
    #[must_use]
    pub fn new(file_path: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_path,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }
}

/// Which completion the coordinator is waiting for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PendingState {
    #[default]
    Idle,
    /// The unknown-sources settings screen is open
    AwaitingPermission { flow: FlowContext, target: String },
    /// The system installer is open
    AwaitingInstall { flow: FlowContext, target: String },
}

impl PendingState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn flow(&self) -> Option<&FlowContext> {
        match self {
            Self::Idle => None,
            Self::AwaitingPermission { flow, .. } | Self::AwaitingInstall { flow, .. } => {
                Some(flow)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingPermission { .. } => "awaiting-permission",
            Self::AwaitingInstall { .. } => "awaiting-install",
        }
    }
}
