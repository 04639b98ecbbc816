//! Fan-out of visible-set snapshots to registered listeners.

use crate::Notice;
use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

/// Immutable copy of the visible toasts, in display order.
pub type Snapshot = Arc<[Notice]>;

pub(crate) type Listener = Arc<dyn Fn(&Snapshot) + Send + Sync>;

/// Registered listeners in registration order.
#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

impl Subscribers {
    pub(crate) fn add(&mut self, listener: Listener) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: u64) -> bool {
        let Some(pos) = self.entries.iter().position(|(i, _)| *i == id) else {
            return false;
        };
        self.entries.remove(pos);
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn listeners(&self) -> Vec<Listener> {
        self.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
    }
}

/// Call every listener with `snapshot`. A panicking listener is logged and
/// skipped; the rest still receive the snapshot.
pub(crate) fn deliver(listeners: &[Listener], snapshot: &Snapshot) {
    tracing::trace!(
        "broadcasting {} visible toasts to {} subscribers",
        snapshot.len(),
        listeners.len()
    );
    for (index, listener) in listeners.iter().enumerate() {
        if catch_unwind(AssertUnwindSafe(|| listener(snapshot))).is_err() {
            tracing::error!("toast subscriber #{index} panicked while handling a snapshot");
        }
    }
}

/// Snapshots waiting for delivery, in the order the store produced them.
///
/// Only one caller delivers at a time. A broadcast raised while another is in
/// progress, from a re-entering subscriber or from another thread, is queued
/// and delivered by the call already draining, so every listener sees the
/// snapshots in mutation order and ends on the latest one.
#[derive(Default)]
pub(crate) struct Outbox {
    state: Mutex<OutboxState>,
}

#[derive(Default)]
struct OutboxState {
    queue: VecDeque<Snapshot>,
    draining: bool,
}

impl Outbox {
    /// Must be called with the store lock held so queue order matches
    /// mutation order.
    pub(crate) fn push(&self, snapshot: Snapshot) {
        self.state.lock().queue.push_back(snapshot);
    }

    /// Deliver everything queued, unless a drain is already running further
    /// up the stack or on another thread.
    pub(crate) fn drain(&self, subscribers: &Mutex<Subscribers>) {
        {
            let mut state = self.state.lock();
            if state.draining {
                return;
            }
            state.draining = true;
        }
        loop {
            let snapshot = {
                let mut state = self.state.lock();
                match state.queue.pop_front() {
                    Some(snapshot) => snapshot,
                    None => {
                        state.draining = false;
                        return;
                    }
                }
            };
            let listeners = subscribers.lock().listeners();
            deliver(&listeners, &snapshot);
        }
    }

    #[cfg(test)]
    fn queued(&self) -> usize {
        self.state.lock().queue.len()
    }
}

/// Handle returned by [`crate::Toaster::subscribe`].
///
/// Dropping it does not unsubscribe; call [`Subscription::unsubscribe`].
pub struct Subscription {
    id: u64,
    channel: Weak<Mutex<Subscribers>>,
    live: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(id: u64, channel: &Arc<Mutex<Subscribers>>) -> Self {
        Self {
            id,
            channel: Arc::downgrade(channel),
            live: AtomicBool::new(true),
        }
    }

    /// Stop receiving snapshots. Calling it again does nothing.
    pub fn unsubscribe(&self) {
        if !self.live.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(channel) = self.channel.upgrade() {
            channel.lock().remove(self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting(hits: &Arc<Mutex<Vec<usize>>>, tag: usize) -> Listener {
        let hits = Arc::clone(hits);
        Arc::new(move |snapshot: &Snapshot| hits.lock().push(tag * 100 + snapshot.len()))
    }

    #[test]
    fn test_delivery_in_registration_order() {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let mut subscribers = Subscribers::default();
        subscribers.add(counting(&hits, 1));
        subscribers.add(counting(&hits, 2));

        let snapshot: Snapshot = Arc::from(Vec::new());
        deliver(&subscribers.listeners(), &snapshot);

        assert_eq!(*hits.lock(), vec![100, 200]);
    }

    fn explode(_: &Snapshot) {
        panic!("renderer blew up")
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let mut subscribers = Subscribers::default();
        subscribers.add(Arc::new(explode));
        subscribers.add(counting(&hits, 3));

        let snapshot: Snapshot = Arc::from(Vec::new());
        deliver(&subscribers.listeners(), &snapshot);

        assert_eq!(*hits.lock(), vec![300]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let channel = Arc::new(Mutex::new(Subscribers::default()));
        let hits = Arc::new(Mutex::new(Vec::new()));
        let first = channel.lock().add(counting(&hits, 1));
        channel.lock().add(counting(&hits, 2));

        let subscription = Subscription::new(first, &channel);
        subscription.unsubscribe();
        subscription.unsubscribe();

        assert!(!subscription.is_active());
        assert_eq!(channel.lock().len(), 1);
    }

    #[test]
    fn test_unsubscribe_after_channel_dropped() {
        let channel = Arc::new(Mutex::new(Subscribers::default()));
        let id = channel.lock().add(Arc::new(|_: &Snapshot| {}));
        let subscription = Subscription::new(id, &channel);
        drop(channel);

        subscription.unsubscribe();
        assert!(!subscription.is_active());
    }

    fn snapshot_of(len: usize) -> Snapshot {
        use crate::{Category, NoticeOptions, notice::Notice};
        (0..len)
            .map(|i| Notice::new(Category::Info, format!("toast {i}"), 0, NoticeOptions::new()))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_outbox_delivers_nested_push_after_current() {
        let outbox = Arc::new(Outbox::default());
        let channel = Arc::new(Mutex::new(Subscribers::default()));
        let first_seen = Arc::new(Mutex::new(Vec::new()));
        let second_seen = Arc::new(Mutex::new(Vec::new()));

        {
            let outbox = Arc::clone(&outbox);
            let channel_ref = Arc::downgrade(&channel);
            let seen = Arc::clone(&first_seen);
            channel.lock().add(Arc::new(move |snapshot: &Snapshot| {
                seen.lock().push(snapshot.len());
                // react to the first snapshot with a newer, empty one
                if snapshot.len() == 1 {
                    outbox.push(snapshot_of(0));
                    if let Some(channel) = channel_ref.upgrade() {
                        outbox.drain(&channel);
                    }
                }
            }));
        }
        let seen = Arc::clone(&second_seen);
        channel
            .lock()
            .add(Arc::new(move |snapshot: &Snapshot| seen.lock().push(snapshot.len())));

        outbox.push(snapshot_of(1));
        outbox.drain(&channel);

        assert_eq!(*first_seen.lock(), vec![1, 0]);
        assert_eq!(*second_seen.lock(), vec![1, 0]);
        assert_eq!(outbox.queued(), 0);
    }

    #[test]
    fn test_outbox_survives_panicking_listener() {
        let outbox = Outbox::default();
        let channel = Mutex::new(Subscribers::default());
        let hits = Arc::new(Mutex::new(Vec::new()));
        channel.lock().add(Arc::new(explode));
        channel.lock().add(counting(&hits, 1));

        outbox.push(snapshot_of(2));
        outbox.drain(&channel);
        outbox.push(snapshot_of(0));
        outbox.drain(&channel);

        assert_eq!(*hits.lock(), vec![102, 100]);
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut subscribers = Subscribers::default();
        assert!(!subscribers.remove(42));
    }
}
