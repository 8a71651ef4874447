//! 测试辅助模块
//!
//! 提供 mock 实现和便捷的测试工厂方法。

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::error::{CoreError, CoreResult};
use crate::services::{ActivityResultBridge, FlowCoordinator};
use crate::traits::{ActivityResultListener, HostSurface, InstallActionBuilder, PermissionGate};
use crate::types::{ActivityResultCode, CorrelationToken, HostAction, InstallIntent, PackageUri};

pub const HOST_PACKAGE: &str = "com.example.host";

// ===== RecordingSurface =====

pub struct RecordingSurface {
    launched: Mutex<Vec<(HostAction, CorrelationToken)>>,
    /// 可选：每次 launch 时通知测试
    notify: Option<mpsc::UnboundedSender<HostAction>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            launched: Mutex::new(Vec::new()),
            notify: None,
        }
    }

    pub fn with_notify() -> (Self, mpsc::UnboundedReceiver<HostAction>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                launched: Mutex::new(Vec::new()),
                notify: Some(tx),
            },
            rx,
        )
    }

    pub fn launched(&self) -> Vec<(HostAction, CorrelationToken)> {
        self.launched.lock().unwrap().clone()
    }
}

impl HostSurface for RecordingSurface {
    fn launch(&self, action: HostAction, token: CorrelationToken) -> CoreResult<()> {
        self.launched.lock().unwrap().push((action.clone(), token));
        if let Some(ref notify) = self.notify {
            let _ = notify.send(action);
        }
        Ok(())
    }
}

// ===== RecordingListener =====

pub struct RecordingListener {
    token: CorrelationToken,
    received: Mutex<Vec<ActivityResultCode>>,
}

impl RecordingListener {
    pub fn new(token: CorrelationToken) -> Self {
        Self {
            token,
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn received(&self) -> Vec<ActivityResultCode> {
        self.received.lock().unwrap().clone()
    }
}

impl ActivityResultListener for RecordingListener {
    fn on_activity_result(&self, token: CorrelationToken, code: ActivityResultCode) -> bool {
        if token != self.token {
            return false;
        }
        self.received.lock().unwrap().push(code);
        true
    }
}

// ===== ToggleGate =====

pub struct ToggleGate {
    granted: AtomicBool,
}

impl ToggleGate {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
        }
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }
}

impl PermissionGate for ToggleGate {
    fn is_granted(&self, _target: &str) -> bool {
        self.granted.load(Ordering::SeqCst)
    }
}

// ===== StubActionBuilder =====

pub struct StubActionBuilder {
    calls: Mutex<Vec<(String, String)>>,
    /// 如果 Some，build 时返回此错误
    error: Mutex<Option<CoreError>>,
}

impl StubActionBuilder {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            error: Mutex::new(None),
        }
    }

    pub fn fail_with(&self, err: CoreError) {
        *self.error.lock().unwrap() = Some(err);
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl InstallActionBuilder for StubActionBuilder {
    fn build(&self, file_path: &str, target: &str) -> CoreResult<InstallIntent> {
        self.calls
            .lock()
            .unwrap()
            .push((file_path.to_string(), target.to_string()));
        if let Some(ref err) = *self.error.lock().unwrap() {
            return Err(err.clone());
        }
        let file_name = Path::new(file_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(InstallIntent::new(PackageUri::Content {
            authority: format!("{target}.installFileProvider.install"),
            path: format!("install/{file_name}"),
        }))
    }
}

// ===== Factory =====

pub struct TestHarness {
    pub coordinator: FlowCoordinator,
    pub surface: Arc<RecordingSurface>,
    pub gate: Arc<ToggleGate>,
    pub builder: Arc<StubActionBuilder>,
    pub bridge: Arc<ActivityResultBridge>,
}

impl TestHarness {
    fn build(host_identity: Option<String>, granted: bool, surface: RecordingSurface) -> Self {
        let surface = Arc::new(surface);
        let gate = Arc::new(ToggleGate::new(granted));
        let builder = Arc::new(StubActionBuilder::new());
        let bridge = Arc::new(ActivityResultBridge::new());
        bridge.attach(surface.clone());

        let coordinator =
            FlowCoordinator::new(host_identity, gate.clone(), builder.clone(), bridge.clone());

        Self {
            coordinator,
            surface,
            gate,
            builder,
            bridge,
        }
    }

    pub fn without_identity(granted: bool) -> Self {
        Self::build(None, granted, RecordingSurface::new())
    }
}

/// Coordinator with an attached recording surface and `HOST_PACKAGE` as host identity.
pub fn create_test_coordinator(granted: bool) -> TestHarness {
    TestHarness::build(Some(HOST_PACKAGE.to_string()), granted, RecordingSurface::new())
}

/// Same as `create_test_coordinator`, plus a receiver for every launched action.
pub fn create_notifying_coordinator(
    granted: bool,
) -> (TestHarness, mpsc::UnboundedReceiver<HostAction>) {
    let (surface, launches) = RecordingSurface::with_notify();
    (
        TestHarness::build(Some(HOST_PACKAGE.to_string()), granted, surface),
        launches,
    )
}
