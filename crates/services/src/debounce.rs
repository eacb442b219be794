//! Trailing-edge debouncing for side effects and values.
//!
//! One pending effect at a time: every new call cancels the previous timer
//! and starts the delay over, so a burst of calls collapses into a single
//! effect that runs once the burst goes quiet.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Schedules at most one delayed effect, cancel-on-change.
///
/// `call` arms a fresh timer and disarms whatever was armed before. Dropping
/// the debouncer cancels a pending effect without running it; an effect that
/// already fired is left alone. Timers run on the ambient tokio runtime, so
/// all methods must be called from within one.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `effect` to run after the full delay passes with no further
    /// call. Any previously scheduled effect is canceled first.
    pub fn call<F, Fut>(&mut self, effect: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            effect().await;
        }));
    }

    /// Disarm the pending effect, if any, without running it.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// True while an effect is armed and has not finished running.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A value that settles: writes become visible only after a quiet period.
///
/// `set` stores a candidate and restarts the delay; `get` keeps returning
/// the last candidate that survived a full delay unreplaced.
#[derive(Debug)]
pub struct DebouncedValue<T> {
    current: Arc<Mutex<T>>,
    debouncer: Debouncer,
}

impl<T: Clone + Send + 'static> DebouncedValue<T> {
    #[must_use]
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            current: Arc::new(Mutex::new(initial)),
            debouncer: Debouncer::new(delay),
        }
    }

    /// Propose a new value; it becomes visible once the delay elapses with
    /// no newer proposal.
    pub fn set(&mut self, value: T) {
        let current = Arc::clone(&self.current);
        self.debouncer.call(move || async move {
            *current.lock().unwrap_or_else(PoisonError::into_inner) = value;
        });
    }

    /// The last settled value.
    #[must_use]
    pub fn get(&self) -> T {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// True while a proposed value is still waiting out its delay.
    #[must_use]
    pub fn is_settling(&self) -> bool {
        self.debouncer.is_pending()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
