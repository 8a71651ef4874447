//! Install flow coordinator
//!
//! Permission request and installer launch share one request code, so the
//! only way to tell their results apart is the `PendingState` held here.
//!
//! ```text
//! Idle ──granted──────────────────────────► AwaitingInstall ──result──► Idle
//!   └──denied──► AwaitingPermission ──OK──► (re-enter install) ─┘
//!                         └──not OK──► Idle
//! ```

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::error::{CoreError, CoreResult};
use crate::services::{ActivityResultBridge, ResultChannel};
use crate::traits::{InstallActionBuilder, PermissionGate};
use crate::types::{
    ActivityResultCode, CorrelationToken, FlowContext, FlowOutcome, HostAction, InstallRequest,
    PendingState,
};

/// Flow coordinator
///
/// Owns the single in-flight request. Every entry point takes `&mut self`;
/// the owner (normally `InstallService`) serialises `install` calls and
/// activity results.
pub struct FlowCoordinator {
    state: PendingState,
    channel: ResultChannel,
    token: CorrelationToken,
    /// Package name of the host application, the default target
    host_identity: Option<String>,
    permission_gate: Arc<dyn PermissionGate>,
    action_builder: Arc<dyn InstallActionBuilder>,
    bridge: Arc<ActivityResultBridge>,
}

impl FlowCoordinator {
    #[must_use]
    pub fn new(
        host_identity: Option<String>,
        permission_gate: Arc<dyn PermissionGate>,
        action_builder: Arc<dyn InstallActionBuilder>,
        bridge: Arc<ActivityResultBridge>,
    ) -> Self {
        Self {
            state: PendingState::Idle,
            channel: ResultChannel::new(),
            token: CorrelationToken::default(),
            host_identity: host_identity.filter(|id| !id.is_empty()),
            permission_gate,
            action_builder,
            bridge,
        }
    }

    /// Uses `token` instead of the default request code.
    #[must_use]
    pub fn with_token(mut self, token: CorrelationToken) -> Self {
        self.token = token;
        self
    }

    pub fn state(&self) -> &PendingState {
        &self.state
    }

    pub fn token(&self) -> CorrelationToken {
        self.token
    }

    /// Starts a flow for `request`; the outcome is sent to `caller` exactly once.
    ///
    /// A call while another flow is pending is answered with `CoreError::Busy`
    /// and leaves the pending flow untouched.
    pub fn install(&mut self, request: InstallRequest, caller: oneshot::Sender<FlowOutcome>) {
        log::info!(
            "installApk(appId: {:?}, filePath: {:?})",
            request.app_id,
            request.file_path
        );

        if let Some(flow) = self.state.flow() {
            log::warn!(
                "Rejecting installApk, flow {} is still {}",
                flow.id,
                self.state.name()
            );
            ResultChannel::reply(caller, CoreError::Busy.into());
            return;
        }

        if let Some(stale) = self.channel.associate(caller) {
            // Idle with a caller still attached would break the one-reply rule.
            log::warn!("Replacing an unresolved caller on an idle coordinator");
            ResultChannel::reply(stale, CoreError::Cancelled("superseded".to_string()).into());
        }

        let Some(file_path) = request.file_path().map(str::to_string) else {
            self.fail(CoreError::InvalidInput(
                "'installApk' called with empty argument 'filePath'".to_string(),
            ));
            return;
        };

        let flow = FlowContext::new(file_path);
        self.begin(flow, request.app_id().map(str::to_string), false);
    }

    /// Handles an activity result. Returns `false` for foreign request codes.
    pub fn on_activity_result(&mut self, token: CorrelationToken, code: ActivityResultCode) -> bool {
        if token != self.token {
            return false;
        }
        log::info!(
            "Activity result (request code {token}, {code}) while {}",
            self.state.name()
        );

        match std::mem::take(&mut self.state) {
            PendingState::AwaitingInstall { flow, target } => {
                log::info!(
                    "Installer for {target} returned after {}s (flow {})",
                    (chrono::Utc::now() - flow.started_at).num_seconds(),
                    flow.id
                );
                if code.is_ok() {
                    self.channel.resolve(FlowOutcome::installed());
                } else {
                    self.fail(CoreError::OsRejected);
                }
            }
            PendingState::AwaitingPermission { flow, target } => {
                if code.is_ok() {
                    log::info!("Permission screen for {target} returned OK, retrying install");
                    // 重新进入安装流程，target 重新解析为宿主包名
                    self.begin(flow, None, true);
                } else {
                    self.fail(CoreError::PermissionRequestFailed);
                }
            }
            PendingState::Idle => {
                log::warn!("Ignoring activity result with no pending flow");
            }
        }
        true
    }

    /// Resolves the pending flow with `reason` and returns to `Idle`.
    ///
    /// Returns `false` if nothing was pending.
    pub fn cancel(&mut self, reason: CoreError) -> bool {
        let previous = std::mem::take(&mut self.state);
        let Some(flow) = previous.flow() else {
            return false;
        };
        log::info!("Cancelling flow {} ({})", flow.id, previous.name());
        self.fail(reason);
        true
    }

    /// Forgets the pending flow and drops its caller without answering.
    ///
    /// Returns `false` if there was nothing to release.
    pub fn release(&mut self) -> bool {
        let previous = std::mem::take(&mut self.state);
        let had_caller = self.channel.is_associated();
        self.channel.detach();
        if let Some(flow) = previous.flow() {
            log::info!("Releasing flow {} ({})", flow.id, previous.name());
        }
        previous.flow().is_some() || had_caller
    }

    /// Steps 2 and 3: resolve the target, query the gate, dispatch.
    fn begin(&mut self, flow: FlowContext, app_id: Option<String>, is_retry: bool) {
        match self.try_begin(flow, app_id, is_retry) {
            Ok(next) => {
                log::debug!("Flow now {}", next.name());
                self.state = next;
            }
            Err(e) => self.fail(e),
        }
    }

    fn try_begin(
        &self,
        flow: FlowContext,
        app_id: Option<String>,
        is_retry: bool,
    ) -> CoreResult<PendingState> {
        let target = app_id
            .or_else(|| self.host_identity.clone())
            .ok_or_else(|| {
                CoreError::InvalidInput(
                    "'installApk' called with empty argument 'packageName'".to_string(),
                )
            })?;

        if self.permission_gate.is_granted(&target) {
            if !self.bridge.is_attached() {
                return Err(CoreError::ContextUnavailable);
            }
            let intent = self.action_builder.build(&flow.file_path, &target)?;
            log::info!("Install intent for {target}: {}", intent.data);
            self.bridge
                .dispatch(HostAction::LaunchInstaller(intent), self.token)?;
            Ok(PendingState::AwaitingInstall { flow, target })
        } else if is_retry {
            // The settings screen came back OK but the grant did not stick.
            Err(CoreError::PermissionRequestFailed)
        } else {
            self.bridge
                .dispatch(HostAction::request_install_permission(&target), self.token)?;
            Ok(PendingState::AwaitingPermission { flow, target })
        }
    }

    fn fail(&mut self, err: CoreError) {
        err.log("installApk");
        self.state = PendingState::Idle;
        self.channel.resolve(err.into());
    }

    /// Monotonic start of the pending flow, if any.
    pub fn pending_since(&self) -> Option<tokio::time::Instant> {
        self.state.flow().map(|flow| flow.started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_coordinator, TestHarness};
    use crate::types::{InstallIntent, PackageUri};

    const TOKEN: CorrelationToken = CorrelationToken::PERMISSION_OR_INSTALL;

    fn install(harness: &mut TestHarness, request: InstallRequest) -> oneshot::Receiver<FlowOutcome> {
        let (tx, rx) = oneshot::channel();
        harness.coordinator.install(request, tx);
        rx
    }

    fn request(path: &str) -> InstallRequest {
        InstallRequest::new(path, None)
    }

    #[test]
    fn empty_file_path_fails_without_dispatch() {
        let mut h = create_test_coordinator(true);
        let mut rx = install(&mut h, InstallRequest::new("", Some("com.other".to_string())));

        let outcome = rx.try_recv().unwrap();
        assert!(!outcome.is_success);
        assert!(outcome.message.unwrap().contains("'filePath'"));
        assert!(h.surface.launched().is_empty());
        assert!(h.coordinator.state().is_idle());
    }

    #[test]
    fn missing_file_path_fails_without_dispatch() {
        let mut h = create_test_coordinator(true);
        let mut rx = install(&mut h, InstallRequest::default());

        assert!(!rx.try_recv().unwrap().is_success);
        assert!(h.surface.launched().is_empty());
    }

    #[test]
    fn empty_target_without_host_identity_fails() {
        let mut h = TestHarness::without_identity(true);
        let mut rx = install(&mut h, InstallRequest::new("/data/app.apk", Some(String::new())));

        let outcome = rx.try_recv().unwrap();
        assert!(!outcome.is_success);
        assert!(outcome.message.unwrap().contains("'packageName'"));
        assert!(h.surface.launched().is_empty());
        assert!(h.coordinator.state().is_idle());
    }

    #[test]
    fn granted_launches_installer_once() {
        let mut h = create_test_coordinator(true);
        let mut rx = install(&mut h, request("/data/app.apk"));

        let launched = h.surface.launched();
        assert_eq!(launched.len(), 1);
        assert!(matches!(launched[0].0, HostAction::LaunchInstaller(_)));
        assert_eq!(launched[0].1, TOKEN);
        assert!(matches!(
            h.coordinator.state(),
            PendingState::AwaitingInstall { target, .. } if target == "com.example.host"
        ));
        assert!(rx.try_recv().is_err());
        assert_eq!(h.builder.calls(), vec![("/data/app.apk".to_string(), "com.example.host".to_string())]);
    }

    #[test]
    fn install_ok_resolves_success() {
        let mut h = create_test_coordinator(true);
        let mut rx = install(&mut h, request("/data/app.apk"));

        assert!(h.coordinator.on_activity_result(TOKEN, ActivityResultCode::Ok));

        assert_eq!(rx.try_recv().unwrap(), FlowOutcome::installed());
        assert!(h.coordinator.state().is_idle());
    }

    #[test]
    fn install_cancel_resolves_failure() {
        let mut h = create_test_coordinator(true);
        let mut rx = install(&mut h, request("/data/app.apk"));

        assert!(h.coordinator.on_activity_result(TOKEN, ActivityResultCode::Canceled));

        let outcome = rx.try_recv().unwrap();
        assert!(!outcome.is_success);
        assert!(outcome.message.unwrap().contains("cancelled"));
        assert!(h.coordinator.state().is_idle());
    }

    #[test]
    fn denied_requests_permission_first() {
        let mut h = create_test_coordinator(false);
        let mut rx = install(&mut h, InstallRequest::new("/data/app.apk", Some("com.target".to_string())));

        let launched = h.surface.launched();
        assert_eq!(launched.len(), 1);
        assert_eq!(
            launched[0].0,
            HostAction::request_install_permission("com.target")
        );
        assert!(matches!(
            h.coordinator.state(),
            PendingState::AwaitingPermission { .. }
        ));
        assert!(h.builder.calls().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn permission_ok_reenters_with_same_path() {
        let mut h = create_test_coordinator(false);
        let mut rx = install(&mut h, InstallRequest::new("/data/app.apk", Some("com.target".to_string())));

        h.gate.set_granted(true);
        assert!(h.coordinator.on_activity_result(TOKEN, ActivityResultCode::Ok));

        // Re-entry resolves the target back to the host identity.
        assert_eq!(
            h.builder.calls(),
            vec![("/data/app.apk".to_string(), "com.example.host".to_string())]
        );
        let launched = h.surface.launched();
        assert_eq!(launched.len(), 2);
        assert!(matches!(launched[1].0, HostAction::LaunchInstaller(_)));
        assert!(matches!(
            h.coordinator.state(),
            PendingState::AwaitingInstall { .. }
        ));
        assert!(rx.try_recv().is_err());

        h.coordinator.on_activity_result(TOKEN, ActivityResultCode::Ok);
        assert_eq!(rx.try_recv().unwrap(), FlowOutcome::installed());
    }

    #[test]
    fn permission_flow_keeps_flow_identity() {
        let mut h = create_test_coordinator(false);
        let _rx = install(&mut h, request("/data/app.apk"));
        let id = h.coordinator.state().flow().unwrap().id;

        h.gate.set_granted(true);
        h.coordinator.on_activity_result(TOKEN, ActivityResultCode::Ok);

        assert_eq!(h.coordinator.state().flow().unwrap().id, id);
    }

    #[test]
    fn permission_denied_resolves_without_reentry() {
        let mut h = create_test_coordinator(false);
        let mut rx = install(&mut h, request("/data/app.apk"));

        assert!(h.coordinator.on_activity_result(TOKEN, ActivityResultCode::Canceled));

        let outcome = rx.try_recv().unwrap();
        assert!(!outcome.is_success);
        assert!(outcome.message.unwrap().ends_with("request permissions"));
        assert_eq!(h.surface.launched().len(), 1);
        assert!(h.builder.calls().is_empty());
        assert!(h.coordinator.state().is_idle());
    }

    #[test]
    fn permission_ok_but_still_denied_fails_once() {
        let mut h = create_test_coordinator(false);
        let mut rx = install(&mut h, request("/data/app.apk"));

        h.coordinator.on_activity_result(TOKEN, ActivityResultCode::Ok);

        assert_eq!(
            rx.try_recv().unwrap(),
            FlowOutcome::from(CoreError::PermissionRequestFailed)
        );
        assert_eq!(h.surface.launched().len(), 1);
        assert!(h.coordinator.state().is_idle());
    }

    #[test]
    fn foreign_token_is_ignored() {
        let mut h = create_test_coordinator(true);
        let mut rx = install(&mut h, request("/data/app.apk"));
        let before = h.coordinator.state().clone();

        assert!(!h.coordinator.on_activity_result(CorrelationToken(42), ActivityResultCode::Ok));

        assert_eq!(h.coordinator.state(), &before);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn result_while_idle_is_consumed_without_effect() {
        let mut h = create_test_coordinator(true);
        assert!(h.coordinator.on_activity_result(TOKEN, ActivityResultCode::Ok));
        assert!(h.coordinator.state().is_idle());
        assert!(h.surface.launched().is_empty());
    }

    #[test]
    fn builder_failure_resolves_and_returns_idle() {
        let mut h = create_test_coordinator(true);
        h.builder
            .fail_with(CoreError::InvalidInput("file not found".to_string()));
        let mut rx = install(&mut h, request("/data/missing.apk"));

        let outcome = rx.try_recv().unwrap();
        assert!(!outcome.is_success);
        assert!(outcome.message.unwrap().contains("file not found"));
        assert!(h.surface.launched().is_empty());
        assert!(h.coordinator.state().is_idle());
    }

    #[test]
    fn detached_surface_is_context_unavailable() {
        let mut h = create_test_coordinator(true);
        h.bridge.detach_for_config_changes();
        let mut rx = install(&mut h, request("/data/app.apk"));

        assert_eq!(
            rx.try_recv().unwrap(),
            FlowOutcome::from(CoreError::ContextUnavailable)
        );
        assert!(h.builder.calls().is_empty());
        assert!(h.coordinator.state().is_idle());
    }

    #[test]
    fn permission_request_without_surface_fails() {
        let mut h = create_test_coordinator(false);
        h.bridge.detach();
        let mut rx = install(&mut h, request("/data/app.apk"));

        assert_eq!(
            rx.try_recv().unwrap(),
            FlowOutcome::from(CoreError::ContextUnavailable)
        );
        assert!(h.coordinator.state().is_idle());
    }

    #[test]
    fn second_install_while_pending_is_busy() {
        let mut h = create_test_coordinator(true);
        let mut first = install(&mut h, request("/data/first.apk"));
        let mut second = install(&mut h, request("/data/second.apk"));

        assert_eq!(second.try_recv().unwrap(), FlowOutcome::from(CoreError::Busy));
        assert_eq!(h.surface.launched().len(), 1);

        h.coordinator.on_activity_result(TOKEN, ActivityResultCode::Ok);
        assert_eq!(first.try_recv().unwrap(), FlowOutcome::installed());
    }

    #[test]
    fn at_most_one_resolution_per_chain() {
        let mut h = create_test_coordinator(true);
        let mut rx = install(&mut h, request("/data/app.apk"));

        h.coordinator.on_activity_result(TOKEN, ActivityResultCode::Ok);
        h.coordinator.on_activity_result(TOKEN, ActivityResultCode::Canceled);

        assert_eq!(rx.try_recv().unwrap(), FlowOutcome::installed());
        assert!(h.coordinator.state().is_idle());
    }

    #[test]
    fn cancel_resolves_pending_flow() {
        let mut h = create_test_coordinator(false);
        let mut rx = install(&mut h, request("/data/app.apk"));

        assert!(h.coordinator.cancel(CoreError::Cancelled("activity destroyed".to_string())));
        assert!(!h.coordinator.cancel(CoreError::Cancelled("again".to_string())));

        let outcome = rx.try_recv().unwrap();
        assert!(outcome.message.unwrap().contains("activity destroyed"));
        assert!(h.coordinator.state().is_idle());
    }

    #[test]
    fn release_drops_caller_and_accepts_next_install() {
        let mut h = create_test_coordinator(false);
        let mut rx = install(&mut h, request("/data/app.apk"));

        assert!(h.coordinator.release());
        assert!(h.coordinator.state().is_idle());
        assert!(matches!(
            rx.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
        assert!(!h.coordinator.release());

        let mut next = install(&mut h, request("/data/next.apk"));
        assert!(matches!(
            h.coordinator.state(),
            PendingState::AwaitingPermission { .. }
        ));
        assert!(next.try_recv().is_err());
    }

    #[test]
    fn dispatched_intent_comes_from_builder() {
        let mut h = create_test_coordinator(true);
        let _rx = install(&mut h, request("/data/app.apk"));

        let HostAction::LaunchInstaller(intent) = &h.surface.launched()[0].0 else {
            panic!("expected installer launch");
        };
        assert_eq!(
            intent,
            &InstallIntent::new(PackageUri::Content {
                authority: "com.example.host.installFileProvider.install".to_string(),
                path: "install/app.apk".to_string(),
            })
        );
    }
}
