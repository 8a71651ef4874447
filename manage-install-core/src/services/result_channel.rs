//! One-shot delivery of a flow outcome

use tokio::sync::oneshot;

use crate::types::FlowOutcome;

/// Holds the caller currently waiting for an outcome.
///
/// The caller is a `oneshot::Sender`, consumed on `resolve`, so a flow can
/// never answer twice.
#[derive(Debug, Default)]
pub struct ResultChannel {
    caller: Option<oneshot::Sender<FlowOutcome>>,
}

impl ResultChannel {
    #[must_use]
    pub fn new() -> Self {
        Self { caller: None }
    }

    /// Associates a new caller. Returns the previous one if it was never resolved.
    pub fn associate(
        &mut self,
        caller: oneshot::Sender<FlowOutcome>,
    ) -> Option<oneshot::Sender<FlowOutcome>> {
        self.caller.replace(caller)
    }

    pub fn is_associated(&self) -> bool {
        self.caller.is_some()
    }

    /// Delivers the outcome to the associated caller.
    ///
    /// Returns `false` when no caller was associated (no-op).
    pub fn resolve(&mut self, outcome: FlowOutcome) -> bool {
        let Some(caller) = self.caller.take() else {
            log::debug!("Dropping outcome without an associated caller: {outcome:?}");
            return false;
        };
        if caller.send(outcome).is_err() {
            log::debug!("Caller went away before the outcome was delivered");
        }
        true
    }

    /// Answers a caller that was never associated (e.g. rejected as busy).
    pub fn reply(caller: oneshot::Sender<FlowOutcome>, outcome: FlowOutcome) {
        if caller.send(outcome).is_err() {
            log::debug!("Caller went away before the reply was delivered");
        }
    }

    /// Forgets the caller without answering (engine detached).
    pub fn detach(&mut self) {
        self.caller = None;
    }
}
