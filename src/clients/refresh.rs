//! Coordination of credential refreshes across concurrent requests.
//!
//! The gate is a boolean "refresh in flight" flag plus an ordered queue of
//! waiters, guarded by one mutex. At most one refresh is outstanding at any
//! time: the first request to observe a rejected credential becomes the
//! leader and performs the refresh, every request that fails while the
//! leader is working is parked in the queue and woken, in enqueue order,
//! with the leader's outcome.
//!
//! The mutex is never held across an `.await`.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::clients::errors::AuthFailure;

/// Result of a refresh cycle as seen by every participant.
pub(crate) type RefreshOutcome = Result<(), AuthFailure>;

/// What a request should do when no refresh is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    /// Start a refresh and become the leader.
    Refresh,
    /// The credential already changed since the request was sent; replay it.
    Replay,
    /// Give up with the given failure.
    Fail(AuthFailure),
}

/// Role assigned to a request entering the gate.
#[derive(Debug)]
pub(crate) enum Entry<'a> {
    Lead(RefreshLease<'a>),
    Wait(oneshot::Receiver<RefreshOutcome>),
    Replay,
    Fail(AuthFailure),
}

#[derive(Debug, Default)]
struct GateState {
    in_flight: bool,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

#[derive(Debug, Default)]
pub(crate) struct RefreshGate {
    state: Mutex<GateState>,
}

impl RefreshGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enters the gate.
    ///
    /// If a refresh is in flight the caller is queued. Otherwise `decide`
    /// runs while the gate is held, so its view of the credential store
    /// cannot interleave with a leader finishing.
    pub(crate) fn enter<F>(&self, decide: F) -> Entry<'_>
    where
        F: FnOnce() -> Decision,
    {
        let mut state = self.lock();

        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            tracing::debug!(queued = state.waiters.len(), "Waiting for in-flight refresh");
            return Entry::Wait(rx);
        }

        match decide() {
            Decision::Refresh => {
                state.in_flight = true;
                Entry::Lead(RefreshLease {
                    gate: self,
                    settled: false,
                })
            }
            Decision::Replay => Entry::Replay,
            Decision::Fail(failure) => Entry::Fail(failure),
        }
    }

    pub(crate) fn is_refreshing(&self) -> bool {
        self.lock().in_flight
    }

    fn release(&self, outcome: RefreshOutcome) {
        let waiters = {
            let mut state = self.lock();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };

        for waiter in waiters {
            // A waiter whose caller went away has nothing to wake.
            let _ = waiter.send(outcome);
        }
    }
}

/// Proof that the holder is the single refresh leader.
///
/// Settling the lease clears the in-flight flag and wakes the queue. A lease
/// dropped without being settled (the leading future was cancelled) wakes
/// the queue with [`AuthFailure::RefreshAbandoned`] so no waiter hangs.
#[derive(Debug)]
pub(crate) struct RefreshLease<'a> {
    gate: &'a RefreshGate,
    settled: bool,
}

impl RefreshLease<'_> {
    pub(crate) fn settle(mut self, outcome: RefreshOutcome) {
        self.settled = true;
        self.gate.release(outcome);
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("Refresh leader dropped before completion; releasing waiters");
            self.gate.release(Err(AuthFailure::RefreshAbandoned));
        }
    }
}

/// Awaits the outcome delivered to a queued request.
pub(crate) async fn wait(rx: oneshot::Receiver<RefreshOutcome>) -> RefreshOutcome {
    rx.await.unwrap_or(Err(AuthFailure::RefreshAbandoned))
}
