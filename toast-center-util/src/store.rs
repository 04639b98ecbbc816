use crate::{
    ActionButton, CloseReason, Notice, NoticeId, NoticePatch, Snapshot,
    timer::{TimerHandle, TimerScheduler},
};
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Weak},
    time::Duration,
};

/// Receives timer firings. Implemented by the shared toaster state so a
/// callback can find its way back into the store without owning it.
pub(crate) trait ExpiryTarget: Send + Sync {
    fn timer_fired(&self, id: NoticeId, key: u64);
}

/// Where a toast was found or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Active,
    Pending,
}

struct ArmedTimer {
    // distinguishes this countdown from earlier ones for the same toast
    key: u64,
    handle: TimerHandle,
}

/// The visible set, the overflow queue and one countdown per visible timed
/// toast.
///
/// Invariants after every method returns:
/// - `active.len() <= capacity`
/// - a toast lives in at most one of `active` and `pending`
/// - `timers` holds exactly the active toasts with a non-zero duration
/// - `pending` is strictly FIFO
pub(crate) struct NoticeStore {
    capacity: usize,
    active: Vec<Notice>,
    pending: VecDeque<Notice>,
    timers: HashMap<NoticeId, ArmedTimer>,
    next_timer_key: u64,
    scheduler: Arc<dyn TimerScheduler>,
    target: Weak<dyn ExpiryTarget>,
}

impl NoticeStore {
    pub(crate) fn new(
        capacity: usize,
        scheduler: Arc<dyn TimerScheduler>,
        target: Weak<dyn ExpiryTarget>,
    ) -> Self {
        Self {
            capacity,
            active: Vec::with_capacity(capacity),
            pending: VecDeque::new(),
            timers: HashMap::new(),
            next_timer_key: 0,
            scheduler,
            target,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn active_len(&self) -> usize {
        self.active.len()
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Arc::from(self.active.as_slice())
    }

    /// Show the toast if there is room, otherwise queue it.
    pub(crate) fn admit(&mut self, notice: Notice) -> Slot {
        if self.active.len() < self.capacity {
            tracing::info!("showing toast {} ({})", notice.id, notice.category);
            self.show(notice);
            Slot::Active
        } else {
            tracing::info!(
                "queueing toast {} ({}), {} already visible",
                notice.id,
                notice.category,
                self.active.len()
            );
            self.pending.push_back(notice);
            Slot::Pending
        }
    }

    /// Remove a toast wherever it is. Removing a visible toast promotes from
    /// the queue. Unknown ids are a no-op.
    pub(crate) fn expire(&mut self, id: NoticeId, reason: CloseReason) -> Option<Slot> {
        if let Some(pos) = self.active.iter().position(|n| n.id == id) {
            self.active.remove(pos);
            self.disarm(id);
            tracing::info!("closed toast {id}: {reason:?}");
            self.promote_if_room();
            return Some(Slot::Active);
        }

        if let Some(pos) = self.pending.iter().position(|n| n.id == id) {
            self.pending.remove(pos);
            tracing::info!("dropped queued toast {id}: {reason:?}");
            return Some(Slot::Pending);
        }

        tracing::debug!("toast {id} already gone, ignoring {reason:?}");
        None
    }

    /// Entry point for timer callbacks. Only the countdown currently armed for
    /// `id` may expire it.
    pub(crate) fn timer_fired(&mut self, id: NoticeId, key: u64) -> Option<Slot> {
        match self.timers.get(&id) {
            Some(armed) if armed.key == key => self.expire(id, CloseReason::Expired),
            Some(_) => {
                tracing::debug!("ignoring superseded timer for toast {id}");
                None
            }
            None => {
                tracing::debug!("ignoring timer for toast {id} without a countdown");
                None
            }
        }
    }

    /// Rewrite a toast in place. A visible toast whose duration was touched
    /// gets a fresh full-length countdown (or none for `0`); a queued toast
    /// picks up its duration when promoted.
    pub(crate) fn mutate(&mut self, id: NoticeId, patch: NoticePatch) -> Option<Slot> {
        if let Some(pos) = self.active.iter().position(|n| n.id == id) {
            let restart = self.active[pos].apply(patch);
            if restart {
                self.disarm(id);
                if self.active[pos].is_timed() {
                    let duration_ms = self.active[pos].duration_ms;
                    self.arm(id, duration_ms);
                }
            }
            tracing::debug!("updated visible toast {id}");
            return Some(Slot::Active);
        }

        if let Some(notice) = self.pending.iter_mut().find(|n| n.id == id) {
            notice.apply(patch);
            tracing::debug!("updated queued toast {id}");
            return Some(Slot::Pending);
        }

        tracing::debug!("toast {id} not found, update ignored");
        None
    }

    /// Cancel every countdown and forget every toast. Returns how many were
    /// dropped.
    pub(crate) fn wipe(&mut self) -> usize {
        for (_, armed) in self.timers.drain() {
            self.scheduler.cancel(armed.handle);
        }
        let dropped = self.active.len() + self.pending.len();
        self.active.clear();
        self.pending.clear();
        tracing::info!("cleared {dropped} toasts: {:?}", CloseReason::Cleared);
        dropped
    }

    /// Action button of a visible toast.
    pub(crate) fn action_button(&self, id: NoticeId) -> Option<ActionButton> {
        self.active
            .iter()
            .find(|n| n.id == id)
            .and_then(|n| n.action_button.clone())
    }

    fn promote_if_room(&mut self) {
        while self.active.len() < self.capacity {
            let Some(notice) = self.pending.pop_front() else {
                break;
            };
            tracing::debug!("promoting queued toast {}", notice.id);
            self.show(notice);
        }
    }

    fn show(&mut self, notice: Notice) {
        let (id, duration_ms, timed) = (notice.id, notice.duration_ms, notice.is_timed());
        self.active.push(notice);
        if timed {
            self.arm(id, duration_ms);
        }
    }

    /// Start a countdown for a timed toast.
    fn arm(&mut self, id: NoticeId, duration_ms: u64) {
        let key = self.next_timer_key;
        self.next_timer_key += 1;

        let target = self.target.clone();
        let handle = self.scheduler.schedule(
            Duration::from_millis(duration_ms),
            Box::new(move || match target.upgrade() {
                Some(target) => target.timer_fired(id, key),
                None => tracing::debug!("timer for toast {id} fired after the toaster was dropped"),
            }),
        );
        if let Some(previous) = self.timers.insert(id, ArmedTimer { key, handle }) {
            tracing::warn!("toast {id} had a live countdown while arming a new one");
            self.scheduler.cancel(previous.handle);
        }
    }

    fn disarm(&mut self, id: NoticeId) {
        if let Some(armed) = self.timers.remove(&id) {
            self.scheduler.cancel(armed.handle);
        }
    }

    #[cfg(test)]
    pub(crate) fn active_ids(&self) -> Vec<NoticeId> {
        self.active.iter().map(|n| n.id).collect()
    }

    #[cfg(test)]
    pub(crate) fn pending_ids(&self) -> Vec<NoticeId> {
        self.pending.iter().map(|n| n.id).collect()
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert!(self.active.len() <= self.capacity, "visible set over capacity");
        for n in &self.active {
            assert!(
                !self.pending.iter().any(|p| p.id == n.id),
                "toast {} both visible and queued",
                n.id
            );
            assert_eq!(
                self.timers.contains_key(&n.id),
                n.is_timed(),
                "countdown mismatch for toast {}",
                n.id
            );
        }
        for n in &self.pending {
            assert!(!self.timers.contains_key(&n.id), "queued toast {} has a countdown", n.id);
        }
        assert!(self.timers.len() <= self.active.len());
    }
}
