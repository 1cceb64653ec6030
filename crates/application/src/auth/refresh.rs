//! Single-flight token refresh state machine.
//!
//! At most one refresh runs at a time. Requests that need a refresh while
//! one is running attach to the same shared future instead of starting a
//! second call. After a failed refresh the coordinator stays `Failed` until
//! a new session is established, so an invalid refresh token is never
//! retried. Establishing or ending a session detaches any running refresh.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use lexo_domain::RefreshPhase;
use parking_lot::Mutex;

use crate::error::RefreshError;

/// Outcome of a refresh: the new access token.
pub type RefreshResult = Result<String, RefreshError>;

/// Handle to an in-flight refresh; cloning it attaches another waiter.
///
/// The shared future is driven by whichever waiter polls it, so dropping
/// the request that started it does not strand the others.
pub type SharedRefresh = Shared<BoxFuture<'static, RefreshResult>>;

/// What a request that needs a refresh should do next.
pub enum RefreshTicket {
    /// This request started the refresh.
    Started(SharedRefresh),
    /// A refresh was already running; await its outcome.
    Joined(SharedRefresh),
    /// A refresh completed after the request was sent; replay with the
    /// current token.
    AlreadyRefreshed,
    /// A previous refresh failed; the session is over.
    SessionFailed,
}

enum Slot {
    Idle,
    InFlight {
        generation: u64,
        handle: SharedRefresh,
    },
    Failed,
}

struct State {
    slot: Slot,
    next_generation: u64,
    /// Successful refreshes so far.
    epoch: u64,
}

/// Guards the refresh state.
///
/// The lock is synchronous and never held across an await, so the
/// check-and-set in [`RefreshCoordinator::begin`] is atomic on a
/// multi-threaded runtime.
pub struct RefreshCoordinator {
    state: Mutex<State>,
}

impl RefreshCoordinator {
    /// Creates an idle coordinator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(State {
                slot: Slot::Idle,
                next_generation: 0,
                epoch: 0,
            }),
        }
    }

    /// Returns the observable phase.
    #[must_use]
    pub fn phase(&self) -> RefreshPhase {
        match self.state.lock().slot {
            Slot::Idle => RefreshPhase::Idle,
            Slot::InFlight { .. } => RefreshPhase::InFlight,
            Slot::Failed => RefreshPhase::Failed,
        }
    }

    /// Returns true once a refresh has failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.state.lock().slot, Slot::Failed)
    }

    /// Returns the number of successful refreshes.
    ///
    /// Read it when a request is sent and hand it back to [`Self::begin`].
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    /// Joins the running refresh or starts one.
    ///
    /// `seen_epoch` is the [`Self::epoch`] observed when the failed request
    /// was sent; if a refresh has succeeded since, no new one is started.
    ///
    /// `start` receives the generation of the new refresh and must only
    /// build the future; it runs under the lock and must not call back into
    /// the coordinator. The future reports its end through [`Self::settle`].
    pub fn begin<F>(&self, seen_epoch: u64, start: F) -> RefreshTicket
    where
        F: FnOnce(u64) -> BoxFuture<'static, RefreshResult>,
    {
        let mut state = self.state.lock();
        match &state.slot {
            Slot::Failed => return RefreshTicket::SessionFailed,
            Slot::InFlight { handle, .. } => return RefreshTicket::Joined(handle.clone()),
            Slot::Idle if state.epoch != seen_epoch => return RefreshTicket::AlreadyRefreshed,
            Slot::Idle => {}
        }

        let generation = state.next_generation;
        state.next_generation += 1;
        let handle = start(generation).shared();
        state.slot = Slot::InFlight {
            generation,
            handle: handle.clone(),
        };
        RefreshTicket::Started(handle)
    }

    /// Ends the refresh of the given generation.
    ///
    /// Returns false, changing nothing, when that refresh is no longer the
    /// installed one; its outcome must then not touch the session.
    #[must_use]
    pub fn settle(&self, generation: u64, succeeded: bool) -> bool {
        let mut state = self.state.lock();
        if !matches!(state.slot, Slot::InFlight { generation: current, .. } if current == generation)
        {
            return false;
        }
        if succeeded {
            state.slot = Slot::Idle;
            state.epoch += 1;
        } else {
            state.slot = Slot::Failed;
        }
        true
    }

    /// Returns to `Idle` after a new session was established or ended.
    ///
    /// A running refresh belongs to the previous session: it is detached,
    /// so its [`Self::settle`] is ignored. Requests already waiting on it
    /// still receive its outcome.
    pub fn reset(&self) {
        self.state.lock().slot = Slot::Idle;
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("phase", &self.phase())
            .finish()
    }
}
