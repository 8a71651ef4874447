//! Install service
//!
//! Runs the `FlowCoordinator` on its own Tokio task. `install_apk` calls and
//! activity results are both messages on one mailbox, so the coordinator
//! never sees two entry points at once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::error::{CoreError, CoreResult};
use crate::services::FlowCoordinator;
use crate::traits::ActivityResultListener;
use crate::types::{ActivityResultCode, CorrelationToken, FlowOutcome, InstallRequest};

enum Command {
    Install {
        request: InstallRequest,
        reply: oneshot::Sender<FlowOutcome>,
    },
    ActivityResult {
        token: CorrelationToken,
        code: ActivityResultCode,
    },
    Cancel {
        reason: CoreError,
        ack: oneshot::Sender<bool>,
    },
    Release {
        ack: oneshot::Sender<bool>,
    },
}

/// Install service tuning
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallServiceOptions {
    /// Resolve a pending flow with `TimedOut` after this long. `None` waits forever.
    pub timeout: Option<Duration>,
}

/// Install service
///
/// Cheap handle to the coordinator task. Dropping the last handle stops the
/// task; a caller still waiting then gets a `Cancelled` outcome, as does a
/// caller released with `release`.
pub struct InstallService {
    tx: mpsc::UnboundedSender<Command>,
    token: CorrelationToken,
}

impl InstallService {
    /// Spawns the coordinator task on the current Tokio runtime.
    ///
    /// # Errors
    /// `CoreError::ConfigError` when called outside a Tokio runtime.
    pub fn spawn(coordinator: FlowCoordinator, options: InstallServiceOptions) -> CoreResult<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CoreError::ConfigError(format!("install service needs a Tokio runtime: {e}")))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let token = coordinator.token();
        runtime.spawn(run(coordinator, rx, options.timeout));

        Ok(Self { tx, token })
    }

    pub fn token(&self) -> CorrelationToken {
        self.token
    }

    /// `installApk`: resolves once the whole flow (permission round trip included) is over.
    pub async fn install_apk(&self, request: InstallRequest) -> FlowOutcome {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Install { request, reply }).is_err() {
            return stopped();
        }
        rx.await.unwrap_or_else(|_| stopped())
    }

    /// Resolves the pending flow (if any) with `reason`.
    pub async fn cancel(&self, reason: CoreError) -> bool {
        let (ack, rx) = oneshot::channel();
        if self.tx.send(Command::Cancel { reason, ack }).is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Queues a cancel of the pending flow without waiting for it.
    ///
    /// Anything sent after this (e.g. the next `install_apk`) is handled after
    /// the cancel.
    pub fn queue_cancel(&self, reason: CoreError) {
        let (ack, _) = oneshot::channel();
        if self.tx.send(Command::Cancel { reason, ack }).is_err() {
            log::debug!("Install service gone, nothing to cancel");
        }
    }

    /// Drops the pending flow and its caller without an outcome.
    pub async fn release(&self) -> bool {
        let (ack, rx) = oneshot::channel();
        if self.tx.send(Command::Release { ack }).is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Listener to register on the `ActivityResultBridge`.
    ///
    /// Holds the mailbox weakly: the bridge must not keep the service alive.
    pub fn result_listener(&self) -> Arc<dyn ActivityResultListener> {
        Arc::new(ResultForwarder {
            token: self.token,
            tx: self.tx.downgrade(),
        })
    }
}

struct ResultForwarder {
    token: CorrelationToken,
    tx: mpsc::WeakUnboundedSender<Command>,
}

impl ActivityResultListener for ResultForwarder {
    fn on_activity_result(&self, token: CorrelationToken, code: ActivityResultCode) -> bool {
        let Some(tx) = self.tx.upgrade() else {
            log::debug!("Install service gone, ignoring activity result {code}");
            return false;
        };
        token == self.token && tx.send(Command::ActivityResult { token, code }).is_ok()
    }
}

fn stopped() -> FlowOutcome {
    CoreError::Cancelled("no outcome will be delivered".to_string()).into()
}

async fn run(
    mut coordinator: FlowCoordinator,
    mut rx: mpsc::UnboundedReceiver<Command>,
    timeout: Option<Duration>,
) {
    loop {
        let deadline = timeout
            .zip(coordinator.pending_since())
            .map(|(limit, since)| (limit, since + limit));

        let command = match deadline {
            Some((limit, at)) => tokio::select! {
                command = rx.recv() => command,
                () = tokio::time::sleep_until(at) => {
                    coordinator.cancel(CoreError::TimedOut(limit.as_secs()));
                    continue;
                }
            },
            None => rx.recv().await,
        };

        let Some(command) = command else {
            break;
        };

        match command {
            Command::Install { request, reply } => coordinator.install(request, reply),
            Command::ActivityResult { token, code } => {
                coordinator.on_activity_result(token, code);
            }
            Command::Cancel { reason, ack } => {
                let _ = ack.send(coordinator.cancel(reason));
            }
            Command::Release { ack } => {
                let _ = ack.send(coordinator.release());
            }
        }
    }
    log::debug!("Install service stopped");
}
