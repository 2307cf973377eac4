//! One-shot readiness gate for the schedule store.
//!
//! The gate starts pending and is resolved exactly once, either with the
//! opened store or with a bootstrap failure. Any number of tasks can wait
//! on it; all of them are released by the single resolution.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use super::StoreError;

/// Errors from the readiness gate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// Opening the store failed; the gate will never open
    #[error("store bootstrap failed: {0}")]
    BootFailed(Arc<str>),

    /// The gate was already opened or failed
    #[error("readiness gate already resolved")]
    AlreadyResolved,
}

enum GateState<S> {
    Pending,
    Ready(Arc<S>),
    Failed(Arc<str>),
}

/// Gate that releases waiters once the store is open.
///
/// Cloning is cheap; all clones share one state.
pub struct ReadinessGate<S> {
    state: Arc<watch::Sender<GateState<S>>>,
}

impl<S> Clone for ReadinessGate<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<S> fmt::Debug for ReadinessGate<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.state.borrow() {
            GateState::Pending => "pending",
            GateState::Ready(_) => "ready",
            GateState::Failed(_) => "failed",
        };
        f.debug_struct("ReadinessGate").field("state", &state).finish()
    }
}

impl<S> Default for ReadinessGate<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> ReadinessGate<S> {
    /// Create a pending gate.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(GateState::Pending);
        Self {
            state: Arc::new(tx),
        }
    }

    /// Create a gate that is already open.
    pub fn ready(store: S) -> Self {
        let (tx, _rx) = watch::channel(GateState::Ready(Arc::new(store)));
        Self {
            state: Arc::new(tx),
        }
    }

    /// Whether the store is open.
    pub fn is_ready(&self) -> bool {
        matches!(&*self.state.borrow(), GateState::Ready(_))
    }

    /// Open the gate with the store, releasing every waiter.
    pub fn open(&self, store: S) -> Result<(), GateError> {
        self.resolve(GateState::Ready(Arc::new(store)))
    }

    /// Fail the gate; every current and future waiter gets the reason.
    pub fn fail(&self, reason: impl Into<Arc<str>>) -> Result<(), GateError> {
        self.resolve(GateState::Failed(reason.into()))
    }

    fn resolve(&self, next: GateState<S>) -> Result<(), GateError> {
        let mut next = Some(next);
        let resolved = self.state.send_if_modified(|state| {
            if !matches!(state, GateState::Pending) {
                return false;
            }
            match next.take() {
                Some(n) => {
                    *state = n;
                    true
                }
                None => false,
            }
        });

        if resolved {
            Ok(())
        } else {
            Err(GateError::AlreadyResolved)
        }
    }

    /// Wait until the gate resolves.
    ///
    /// Returns immediately once resolved, without suspending.
    pub async fn wait(&self) -> Result<Arc<S>, GateError> {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here,
        // and `wait_for` only returns resolved states.
        let state = rx
            .wait_for(|s| !matches!(s, GateState::Pending))
            .await
            .map_err(|_| GateError::BootFailed("readiness gate dropped".into()))?;

        match &*state {
            GateState::Ready(store) => Ok(Arc::clone(store)),
            GateState::Failed(reason) => Err(GateError::BootFailed(Arc::clone(reason))),
            GateState::Pending => Err(GateError::BootFailed("readiness gate still pending".into())),
        }
    }
}

/// Resolve `gate` from the outcome of opening the store.
///
/// A failed open fails the gate and is returned to the caller, which
/// treats it as fatal.
pub async fn resolve_with<S, F>(gate: &ReadinessGate<S>, open: F) -> Result<(), StoreError>
where
    F: Future<Output = Result<S, StoreError>>,
{
    match open.await {
        Ok(store) => {
            gate.open(store)?;
            info!("schedule store ready");
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "schedule store bootstrap failed");
            gate.fail(err.to_string())?;
            Err(err)
        }
    }
}
