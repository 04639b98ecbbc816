//! Delayed callbacks behind a two-method seam.
//!
//! The store only ever asks to run something after a delay and to call that
//! off again. [`runtime::TokioScheduler`] does it on a tokio runtime;
//! [`ManualScheduler`] keeps a virtual clock that tests advance by hand.

mod manual;
#[cfg(feature = "tokio")]
pub mod runtime;

pub use manual::ManualScheduler;

use std::time::Duration;

pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Identifies one scheduled callback within the scheduler that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

pub trait TimerScheduler: Send + Sync {
    /// Run `callback` once after `delay`.
    ///
    /// Implementations must not invoke the callback from inside this call and
    /// must not hold their own locks while it runs: callbacks re-enter the
    /// store, which calls back into the scheduler.
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;

    /// Drop a scheduled callback. Unknown or already fired handles are ignored.
    fn cancel(&self, handle: TimerHandle);
}
