//! Shared busy-indicator coordination
//!
//! Reference-counts in-flight requests so the indicator shows for the union
//! of their durations: mounted on the 0→1 transition, unmounted when the
//! count returns to zero. A watchdog force-resets the counter if it stays
//! above zero for a full window, bounding the damage of an unpaired
//! [`LoadingCoordinator::begin`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use crate::signal::Signal;

/// Capability the UI layer implements to present the busy indicator
///
/// `show` and `hide` must tolerate repeated calls; the coordinator already
/// deduplicates mount/unmount, so in practice they alternate.
pub trait BusyIndicator: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

/// No-op indicator for headless use and tests
pub struct NullIndicator;

impl BusyIndicator for NullIndicator {
    fn show(&self) {}
    fn hide(&self) {}
}

struct LoadingState {
    /// Requests currently believed outstanding, saturating at zero
    in_flight: u32,
    /// Whether the indicator is currently attached
    mounted: bool,
    /// Bumped on every arm and teardown so a stale watchdog fire is a no-op
    generation: u64,
    watchdog: Option<tokio::task::JoinHandle<()>>,
}

struct Inner {
    state: Mutex<LoadingState>,
    busy: Signal<bool>,
    indicator: Arc<dyn BusyIndicator>,
    watchdog_timeout: Duration,
}

/// Cheaply clonable handle to the reference-counted loading coordinator
///
/// All clones share one counter and one indicator.
#[derive(Clone)]
pub struct LoadingCoordinator {
    inner: Arc<Inner>,
}

impl LoadingCoordinator {
    /// Create a coordinator bound to an indicator implementation
    pub fn new(indicator: Arc<dyn BusyIndicator>, watchdog_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(LoadingState {
                    in_flight: 0,
                    mounted: false,
                    generation: 0,
                    watchdog: None,
                }),
                busy: Signal::new(false),
                indicator,
                watchdog_timeout,
            }),
        }
    }

    /// Note a request starting
    ///
    /// On the 0→1 transition, mounts the indicator and arms the watchdog.
    pub fn begin(&self) {
        let mut state = self.inner.state.lock().expect("loading state lock poisoned");
        state.in_flight += 1;
        debug!(in_flight = state.in_flight, "begin: request started");

        if state.in_flight != 1 {
            return;
        }

        if !state.mounted {
            self.inner.indicator.show();
            state.mounted = true;
        }
        self.inner.busy.set(true);
        self.arm_watchdog(&mut state);
    }

    /// Note a request completing, on any exit path
    ///
    /// Decrements are clamped at zero; reaching zero tears the indicator down
    /// and disarms the watchdog.
    pub fn end(&self) {
        let mut state = self.inner.state.lock().expect("loading state lock poisoned");
        state.in_flight = state.in_flight.saturating_sub(1);
        debug!(in_flight = state.in_flight, "end: request finished");

        if state.in_flight == 0 {
            self.inner.teardown(&mut state);
        }
    }

    /// Acquire a scoped loading reference
    ///
    /// The matching [`end`](Self::end) runs when the guard drops, so every
    /// exit path of the caller releases its reference.
    pub fn begin_scoped(&self) -> LoadingGuard {
        self.begin();
        LoadingGuard {
            coordinator: self.clone(),
        }
    }

    /// Whether any request is currently outstanding
    pub fn is_busy(&self) -> bool {
        self.inner.busy.get()
    }

    /// Subscribe to the busy flag for per-view spinners
    pub fn subscribe_busy(&self) -> tokio::sync::watch::Receiver<bool> {
        self.inner.busy.subscribe()
    }

    /// Current in-flight count, never negative
    pub fn in_flight(&self) -> u32 {
        self.inner.state.lock().expect("loading state lock poisoned").in_flight
    }

    fn arm_watchdog(&self, state: &mut LoadingState) {
        state.generation += 1;
        let generation = state.generation;
        if let Some(handle) = state.watchdog.take() {
            handle.abort();
        }

        let inner = Arc::clone(&self.inner);
        // Anchor the deadline at arm time, not at the task's first poll
        let sleep = tokio::time::sleep(self.inner.watchdog_timeout);
        state.watchdog = Some(tokio::spawn(async move {
            sleep.await;
            inner.watchdog_fired(generation);
        }));
    }
}

impl Inner {
    fn watchdog_fired(&self, generation: u64) {
        let mut state = self.state.lock().expect("loading state lock poisoned");
        if state.generation != generation || state.in_flight == 0 {
            // Normal completion already reached zero; nothing to recover
            return;
        }

        warn!(
            in_flight = state.in_flight,
            timeout_ms = self.watchdog_timeout.as_millis() as u64,
            "watchdog fired: forcing idle, a begin() was not paired with end()"
        );
        state.in_flight = 0;
        self.teardown(&mut state);
    }

    /// Shared teardown for decrement-to-zero and watchdog recovery
    fn teardown(&self, state: &mut LoadingState) {
        state.generation += 1;
        if let Some(handle) = state.watchdog.take() {
            handle.abort();
        }
        if state.mounted {
            self.indicator.hide();
            state.mounted = false;
        }
        self.busy.set(false);
    }
}

/// RAII loading reference; dropping it releases the reference
pub struct LoadingGuard {
    coordinator: LoadingCoordinator,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.coordinator.end();
    }
}
