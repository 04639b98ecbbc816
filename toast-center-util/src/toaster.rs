//! Public entry point: validated toast creation, in-place updates, removal and
//! subscription.

use crate::{
    Category, NoticeId, NoticeOptions, NoticePatch, Snapshot, Subscription, ToastError,
    notice::{Notice, validate_duration, validate_message},
    store::{ExpiryTarget, NoticeStore, Slot},
    subscribers::{Outbox, Subscribers},
    timer::TimerScheduler,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Weak},
};
use toast_center_config::ToastConfig;

/// Read-only counters for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub active_count: usize,
    pub pending_count: usize,
    pub max_concurrent: usize,
    pub subscriber_count: usize,
}

struct Shared {
    config: ToastConfig,
    store: Mutex<NoticeStore>,
    subscribers: Arc<Mutex<Subscribers>>,
    outbox: Outbox,
}

impl Shared {
    /// Queue the current visible set. Callers hold the store lock.
    fn stage(&self, store: &NoticeStore) {
        self.outbox.push(store.snapshot());
    }

    /// Deliver staged snapshots. Callers must have released the store lock.
    fn flush(&self) {
        self.outbox.drain(&self.subscribers);
    }
}

impl ExpiryTarget for Shared {
    fn timer_fired(&self, id: NoticeId, key: u64) {
        {
            let mut store = self.store.lock();
            if store.timer_fired(id, key) == Some(Slot::Active) {
                self.stage(&store);
            }
        }
        self.flush();
    }
}

/// Handle to one toast queue. Clones share the same queue; build one per
/// process and hand clones to whoever raises toasts.
///
/// Every operation applies its change and queues the new visible set under one
/// lock, then delivers with the lock released. Subscribers may therefore call
/// back into the toaster; the snapshot produced by such a nested call reaches
/// every subscriber after the one currently being delivered.
#[derive(Clone)]
pub struct Toaster {
    shared: Arc<Shared>,
}

impl Toaster {
    pub fn new(config: ToastConfig, scheduler: Arc<dyn TimerScheduler>) -> Result<Self, ToastError> {
        config.validate()?;
        let capacity = config.max_concurrent as usize;
        let shared = Arc::new_cyclic(|weak: &Weak<Shared>| {
            let target: Weak<dyn ExpiryTarget> = weak.clone();
            Shared {
                config,
                store: Mutex::new(NoticeStore::new(capacity, scheduler, target)),
                subscribers: Arc::new(Mutex::new(Subscribers::default())),
                outbox: Outbox::default(),
            }
        });
        Ok(Self { shared })
    }

    /// Toaster whose timers run on the given tokio runtime.
    #[cfg(feature = "tokio")]
    pub fn with_tokio(config: ToastConfig, runtime: tokio::runtime::Handle) -> Result<Self, ToastError> {
        Self::new(config, Arc::new(crate::TokioScheduler::new(runtime)))
    }

    pub fn config(&self) -> &ToastConfig {
        &self.shared.config
    }

    pub fn success(&self, message: impl Into<String>, options: NoticeOptions) -> Result<NoticeId, ToastError> {
        self.notify(Category::Success, message, options)
    }

    pub fn error(&self, message: impl Into<String>, options: NoticeOptions) -> Result<NoticeId, ToastError> {
        self.notify(Category::Error, message, options)
    }

    pub fn warning(&self, message: impl Into<String>, options: NoticeOptions) -> Result<NoticeId, ToastError> {
        self.notify(Category::Warning, message, options)
    }

    pub fn info(&self, message: impl Into<String>, options: NoticeOptions) -> Result<NoticeId, ToastError> {
        self.notify(Category::Info, message, options)
    }

    /// Raise a toast that stays until it is updated or removed. Any duration
    /// in `options` is ignored.
    pub fn loading(&self, message: impl Into<String>, options: NoticeOptions) -> Result<NoticeId, ToastError> {
        self.notify(Category::Loading, message, options)
    }

    /// Validate and raise a toast of any category.
    ///
    /// Fails with [`ToastError::InvalidNotice`] for a blank message or a
    /// negative duration, before anything is changed.
    pub fn notify(
        &self,
        category: Category,
        message: impl Into<String>,
        options: NoticeOptions,
    ) -> Result<NoticeId, ToastError> {
        let message = message.into();
        if let Err(err) = validate_message(&message).and_then(|()| validate_duration(options.duration_ms)) {
            tracing::warn!("rejected {category} toast: {err}");
            return Err(err);
        }

        let duration_ms = match (category, options.duration_ms) {
            (Category::Loading, Some(requested)) if requested != 0 => {
                tracing::debug!("loading toasts never expire, ignoring duration {requested}ms");
                0
            }
            (Category::Loading, _) => 0,
            (_, Some(requested)) => requested.unsigned_abs(),
            (_, None) => category.default_timeout(&self.shared.config),
        };

        let notice = Notice::new(category, message, duration_ms, options);
        let id = notice.id;
        {
            let mut store = self.shared.store.lock();
            store.admit(notice);
            self.shared.stage(&store);
        }
        self.shared.flush();
        Ok(id)
    }

    /// Rewrite fields of a toast in place, keeping its id.
    ///
    /// Touching `duration_ms` of a visible toast restarts its countdown from
    /// the full new duration. Unknown ids are ignored: the toast most likely
    /// expired or was dismissed already.
    pub fn update(&self, id: NoticeId, patch: NoticePatch) -> Result<(), ToastError> {
        if let Err(err) = patch.validate() {
            tracing::warn!("rejected update for toast {id}: {err}");
            return Err(err);
        }
        {
            let mut store = self.shared.store.lock();
            if store.mutate(id, patch) == Some(Slot::Active) {
                self.shared.stage(&store);
            }
        }
        self.shared.flush();
        Ok(())
    }

    /// Dismiss a toast. Safe to call for ids that are already gone.
    pub fn remove(&self, id: NoticeId) {
        {
            let mut store = self.shared.store.lock();
            if store.expire(id, crate::CloseReason::Dismissed) == Some(Slot::Active) {
                self.shared.stage(&store);
            }
        }
        self.shared.flush();
    }

    /// Drop every toast, visible or queued, and cancel all countdowns.
    pub fn clear(&self) {
        {
            let mut store = self.shared.store.lock();
            store.wipe();
            self.shared.stage(&store);
        }
        self.shared.flush();
    }

    /// Receive the visible set after every change to it.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let id = self.shared.subscribers.lock().add(Arc::new(listener));
        Subscription::new(id, &self.shared.subscribers)
    }

    /// Current visible set, for renderers that attach after the fact.
    pub fn active(&self) -> Snapshot {
        self.shared.store.lock().snapshot()
    }

    pub fn queue_status(&self) -> QueueStatus {
        let (active_count, pending_count, max_concurrent) = {
            let store = self.shared.store.lock();
            (store.active_len(), store.pending_len(), store.capacity())
        };
        QueueStatus {
            active_count,
            pending_count,
            max_concurrent,
            subscriber_count: self.shared.subscribers.lock().len(),
        }
    }

    /// Run the action button callback of a visible toast. Returns whether a
    /// callback ran.
    pub fn invoke_action(&self, id: NoticeId) -> bool {
        let Some(button) = self.shared.store.lock().action_button(id) else {
            tracing::debug!("toast {id} has no visible action button");
            return false;
        };
        tracing::trace!("invoking action '{}' of toast {id}", button.label);
        if catch_unwind(AssertUnwindSafe(|| button.invoke())).is_err() {
            tracing::error!("action '{}' of toast {id} panicked", button.label);
        }
        true
    }
}

impl std::fmt::Debug for Toaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toaster")
            .field("status", &self.queue_status())
            .finish()
    }
}
