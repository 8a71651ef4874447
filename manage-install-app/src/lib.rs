//! Platform-agnostic plugin bootstrap for manage_install.
//!
//! Provides `AppState` (service container plus the plugin lifecycle hooks),
//! `AppStateBuilder` (adapter injection) and the `manage_install` method
//! channel dispatcher.

use std::sync::Arc;

use manage_install_core::error::{CoreError, CoreResult};
use manage_install_core::services::{
    ActivityResultBridge, FlowCoordinator, InstallService, InstallServiceOptions, StoreService,
};
use manage_install_core::traits::{
    AlwaysGranted, HostSurface, InstallActionBuilder, PermissionGate, UrlOpener,
};
use manage_install_core::types::{
    ActivityResultCode, CorrelationToken, FlowOutcome, InstallRequest, StoreRequest,
};

pub mod adapters;
pub mod channel;
pub mod config;

pub use channel::{MethodCall, MethodResponse, CHANNEL_NAME};
pub use config::InstallerConfig;

use adapters::PackageIntentBuilder;

/// Platform-agnostic plugin state.
///
/// Built once when the plugin attaches to the engine; the host forwards its
/// activity lifecycle and `onActivityResult` calls here.
pub struct AppState {
    /// Plugin configuration
    pub config: InstallerConfig,
    /// Launch/result bridge to the current activity
    pub bridge: Arc<ActivityResultBridge>,
    /// Install flow service
    pub install_service: Arc<InstallService>,
    /// App Store hand-off
    pub store_service: StoreService,
}

impl AppState {
    /// `installApk`
    pub async fn install_apk(&self, request: InstallRequest) -> FlowOutcome {
        let outcome = self.install_service.install_apk(request).await;
        log::info!(
            "installApk finished: success={}, message={:?}",
            outcome.is_success,
            outcome.message
        );
        outcome
    }

    /// `goToAppStore`
    pub async fn go_to_app_store(&self, request: StoreRequest) -> FlowOutcome {
        self.store_service.go_to_app_store(request).await
    }

    fn register_listener(&self) {
        self.bridge.register(
            self.install_service.token(),
            self.install_service.result_listener(),
        );
    }

    /// `onAttachedToActivity`
    ///
    /// A flow still pending here was started from an activity that is gone
    /// for good; its result can no longer arrive, so it is cancelled before
    /// the new activity can start one.
    pub fn attach_to_activity(&self, surface: Arc<dyn HostSurface>) {
        self.install_service
            .queue_cancel(CoreError::Cancelled("activity replaced".to_string()));
        self.bridge.attach(surface);
        self.register_listener();
    }

    /// `onDetachedFromActivityForConfigChanges`
    pub fn detach_from_activity_for_config_changes(&self) {
        self.bridge.detach_for_config_changes();
    }

    /// `onReattachedToActivityForConfigChanges`
    pub fn reattach_to_activity_for_config_changes(&self, surface: Arc<dyn HostSurface>) {
        self.bridge.reattach(surface);
        self.register_listener();
    }

    /// `onDetachedFromActivity`
    ///
    /// Results arriving after this are ignored. With `cancelOnDetach` the
    /// pending caller is answered right away instead of waiting forever.
    pub async fn detach_from_activity(&self) {
        self.bridge.detach();
        if self.config.cancel_on_detach
            && self
                .install_service
                .cancel(CoreError::Cancelled("activity detached".to_string()))
                .await
        {
            log::warn!("Pending install cancelled because the activity detached");
        }
    }

    /// `onDetachedFromEngine`
    ///
    /// The Dart side is gone: the pending caller is dropped unanswered and
    /// every result listener removed.
    pub async fn detach_from_engine(&self) {
        self.bridge.detach();
        if self.install_service.release().await {
            log::info!("Pending install released, engine detached");
        }
    }

    /// `onActivityResult`. Returns whether the result belonged to this plugin.
    pub fn on_activity_result(&self, request_code: i32, result_code: i32) -> bool {
        let code = ActivityResultCode::from_raw(result_code);
        log::info!("handleActivityResult: requestCode: {request_code}, resultCode: {code}");
        self.bridge.deliver(CorrelationToken(request_code), code)
    }
}

/// Builder for constructing `AppState` with platform-specific adapters.
///
/// # Required adapters
/// - `permission_gate`: on API 26 and above
///
/// # Optional
/// - `action_builder`: defaults to `PackageIntentBuilder::from_config`
/// - `url_opener`: without one `goToAppStore` is reported as not implemented
pub struct AppStateBuilder {
    config: InstallerConfig,
    permission_gate: Option<Arc<dyn PermissionGate>>,
    action_builder: Option<Arc<dyn InstallActionBuilder>>,
    url_opener: Option<Arc<dyn UrlOpener>>,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: InstallerConfig::default(),
            permission_gate: None,
            action_builder: None,
            url_opener: None,
        }
    }

    #[must_use]
    pub fn config(mut self, config: InstallerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn permission_gate(mut self, gate: Arc<dyn PermissionGate>) -> Self {
        self.permission_gate = Some(gate);
        self
    }

    #[must_use]
    pub fn action_builder(mut self, builder: Arc<dyn InstallActionBuilder>) -> Self {
        self.action_builder = Some(builder);
        self
    }

    #[must_use]
    pub fn url_opener(mut self, opener: Arc<dyn UrlOpener>) -> Self {
        self.url_opener = Some(opener);
        self
    }

    /// Build the `AppState` and start the install service.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// Returns `CoreError::ConfigError` if the config is invalid, a required
    /// adapter is missing, or no runtime is available.
    pub fn build(self) -> CoreResult<AppState> {
        let config = self.config;
        config.validate()?;

        let permission_gate: Arc<dyn PermissionGate> = match self.permission_gate {
            Some(gate) => gate,
            None if !config.sdk_level.has_install_permission() => Arc::new(AlwaysGranted),
            None => {
                return Err(CoreError::ConfigError(format!(
                    "permission_gate is required on {}",
                    config.sdk_level
                )))
            }
        };
        let action_builder: Arc<dyn InstallActionBuilder> = self
            .action_builder
            .unwrap_or_else(|| Arc::new(PackageIntentBuilder::from_config(&config)));

        let bridge = Arc::new(ActivityResultBridge::new());
        let coordinator = FlowCoordinator::new(
            config.package_name.clone(),
            permission_gate,
            action_builder,
            Arc::clone(&bridge),
        )
        .with_token(config.token());

        let install_service = Arc::new(InstallService::spawn(
            coordinator,
            InstallServiceOptions {
                timeout: config.install_timeout(),
            },
        )?);
        let store_service = StoreService::new(self.url_opener);

        log::info!(
            "manage_install ready ({}, package {:?})",
            config.sdk_level,
            config.package_name
        );

        Ok(AppState {
            config,
            bridge,
            install_service,
            store_service,
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
