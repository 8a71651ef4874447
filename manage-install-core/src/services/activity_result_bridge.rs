//! Activity result bridge
//!
//! Single path for both launches and their results. The host surface may go
//! away for a configuration change and come back; listeners survive that, but
//! a permanent detach drops them and late results are ignored.

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{CoreError, CoreResult};
use crate::traits::{ActivityResultListener, HostSurface};
use crate::types::{ActivityResultCode, CorrelationToken, HostAction};

struct Registration {
    token: CorrelationToken,
    listener: Arc<dyn ActivityResultListener>,
}

#[derive(Default)]
struct BridgeInner {
    surface: Option<Arc<dyn HostSurface>>,
    listeners: Vec<Registration>,
}

/// Activity result bridge
///
/// Shared between the coordinator (launches) and the host (results), hence
/// the interior lock. Neither the surface nor a listener is ever called with
/// the lock held.
#[derive(Default)]
pub struct ActivityResultBridge {
    inner: RwLock<BridgeInner>,
}

impl ActivityResultBridge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BridgeInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BridgeInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// `onAttachedToActivity`
    pub fn attach(&self, surface: Arc<dyn HostSurface>) {
        self.write().surface = Some(surface);
        log::debug!("Host surface attached");
    }

    /// `onDetachedFromActivityForConfigChanges`: the surface goes away, listeners stay.
    pub fn detach_for_config_changes(&self) {
        self.write().surface = None;
        log::debug!("Host surface detached for configuration change");
    }

    /// `onReattachedToActivityForConfigChanges`
    pub fn reattach(&self, surface: Arc<dyn HostSurface>) {
        self.write().surface = Some(surface);
        log::debug!("Host surface reattached after configuration change");
    }

    /// `onDetachedFromActivity`: drops the surface and every listener.
    pub fn detach(&self) {
        let mut inner = self.write();
        inner.surface = None;
        let dropped = inner.listeners.len();
        inner.listeners.clear();
        log::debug!("Host surface detached, {dropped} result listener(s) dropped");
    }

    pub fn is_attached(&self) -> bool {
        self.read().surface.is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.read().listeners.len()
    }

    /// Installs the listener for `token`, replacing a previous one for the same token.
    pub fn register(&self, token: CorrelationToken, listener: Arc<dyn ActivityResultListener>) {
        let mut inner = self.write();
        if let Some(existing) = inner.listeners.iter_mut().find(|r| r.token == token) {
            existing.listener = listener;
        } else {
            inner.listeners.push(Registration { token, listener });
        }
    }

    /// Hands `action` to the current surface.
    ///
    /// # Errors
    /// `CoreError::ContextUnavailable` when no surface is attached.
    pub fn dispatch(&self, action: HostAction, token: CorrelationToken) -> CoreResult<()> {
        let surface = self
            .read()
            .surface
            .clone()
            .ok_or(CoreError::ContextUnavailable)?;
        log::info!("Launching {} for result (request code {token})", action.action());
        surface.launch(action, token)
    }

    /// `onActivityResult` from the host. Returns whether a listener consumed it.
    pub fn deliver(&self, token: CorrelationToken, code: ActivityResultCode) -> bool {
        let listeners: Vec<Arc<dyn ActivityResultListener>> = self
            .read()
            .listeners
            .iter()
            .filter(|r| r.token == token)
            .map(|r| Arc::clone(&r.listener))
            .collect();

        if listeners.is_empty() {
            log::debug!("No listener for activity result (request code {token}, {code})");
            return false;
        }
        listeners
            .iter()
            .any(|listener| listener.on_activity_result(token, code))
    }
}
