use super::{TimerCallback, TimerHandle, TimerScheduler};
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, HashMap},
    time::Duration,
};

/// Scheduler driven by a virtual clock.
///
/// Nothing fires until [`ManualScheduler::advance`] or
/// [`ManualScheduler::fire_all`] is called, which makes expiry and promotion
/// fully deterministic in tests. Also usable by embedders that already own a
/// frame or tick loop.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    // (deadline, id) keeps ties in scheduling order
    queue: BTreeMap<(Duration, u64), TimerCallback>,
    deadlines: HashMap<u64, Duration>,
}

impl ManualState {
    fn pop_due(&mut self, until: Option<Duration>) -> Option<TimerCallback> {
        let (&(deadline, id), _) = self.queue.first_key_value()?;
        if until.is_some_and(|until| deadline > until) {
            return None;
        }
        let callback = self.queue.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        self.now = self.now.max(deadline);
        Some(callback)
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of callbacks scheduled and not yet fired or cancelled.
    pub fn pending_count(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Move the clock forward by `by`, firing every callback that comes due in
    /// deadline order. Returns how many fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.state.lock().now + by;
        let mut fired = 0;
        loop {
            // lock released before the callback runs
            let next = self.state.lock().pop_due(Some(target));
            match next {
                Some(callback) => {
                    callback();
                    fired += 1;
                }
                None => break,
            }
        }
        self.state.lock().now = target;
        fired
    }

    /// Convenience for `advance(Duration::from_millis(ms))`.
    pub fn advance_ms(&self, ms: u64) -> usize {
        self.advance(Duration::from_millis(ms))
    }

    /// Fire everything scheduled, including callbacks scheduled while firing.
    pub fn fire_all(&self) -> usize {
        let mut fired = 0;
        loop {
            let next = self.state.lock().pop_due(None);
            match next {
                Some(callback) => {
                    callback();
                    fired += 1;
                }
                None => break,
            }
        }
        fired
    }
}

impl TimerScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        let deadline = state.now + delay;
        state.queue.insert((deadline, id), callback);
        state.deadlines.insert(id, deadline);
        TimerHandle::from_raw(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        let mut state = self.state.lock();
        if let Some(deadline) = state.deadlines.remove(&handle.raw()) {
            state.queue.remove(&(deadline, handle.raw()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> TimerCallback) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |name: &'static str| -> TimerCallback {
            let sink = Arc::clone(&sink);
            Box::new(move || sink.lock().push(name))
        };
        (log, make)
    }

    #[test]
    fn test_nothing_fires_before_deadline() {
        let scheduler = ManualScheduler::new();
        let (log, make) = recorder();
        scheduler.schedule(Duration::from_millis(100), make("a"));

        assert_eq!(scheduler.advance_ms(99), 0);
        assert!(log.lock().is_empty());
        assert_eq!(scheduler.advance_ms(1), 1);
        assert_eq!(*log.lock(), vec!["a"]);
        assert_eq!(scheduler.now(), Duration::from_millis(100));
    }

    #[test]
    fn test_fires_in_deadline_then_schedule_order() {
        let scheduler = ManualScheduler::new();
        let (log, make) = recorder();
        scheduler.schedule(Duration::from_millis(300), make("late"));
        scheduler.schedule(Duration::from_millis(100), make("first"));
        scheduler.schedule(Duration::from_millis(100), make("second"));

        assert_eq!(scheduler.advance_ms(1000), 3);
        assert_eq!(*log.lock(), vec!["first", "second", "late"]);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let scheduler = ManualScheduler::new();
        let (log, make) = recorder();
        let handle = scheduler.schedule(Duration::from_millis(10), make("a"));
        scheduler.schedule(Duration::from_millis(20), make("b"));

        scheduler.cancel(handle);
        // twice is fine
        scheduler.cancel(handle);

        assert_eq!(scheduler.fire_all(), 1);
        assert_eq!(*log.lock(), vec!["b"]);
    }

    #[test]
    fn test_callback_may_reschedule() {
        let scheduler = Arc::new(ManualScheduler::new());
        let hits = Arc::new(Mutex::new(0));

        let inner_scheduler = Arc::clone(&scheduler);
        let inner_hits = Arc::clone(&hits);
        scheduler.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                *inner_hits.lock() += 1;
                let hits = Arc::clone(&inner_hits);
                inner_scheduler.schedule(
                    Duration::from_millis(10),
                    Box::new(move || *hits.lock() += 1),
                );
            }),
        );

        assert_eq!(scheduler.advance_ms(15), 1);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(scheduler.advance_ms(5), 1);
        assert_eq!(*hits.lock(), 2);
    }
}
