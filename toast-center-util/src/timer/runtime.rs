use super::{TimerCallback, TimerHandle, TimerScheduler};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{runtime::Handle, task::AbortHandle};

/// Runs each timer as a task on a tokio runtime that sleeps and then calls back.
pub struct TokioScheduler {
    runtime: Handle,
    tasks: Arc<Mutex<TaskTable>>,
}

#[derive(Default)]
struct TaskTable {
    next_id: u64,
    running: HashMap<u64, AbortHandle>,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            tasks: Arc::new(Mutex::new(TaskTable::default())),
        }
    }

    /// Scheduler bound to the runtime of the calling context, if there is one.
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    /// Timers scheduled and neither fired nor cancelled.
    pub fn pending_count(&self) -> usize {
        self.tasks.lock().running.len()
    }
}

impl TimerScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        // Held across spawn so the task cannot deregister before it is registered.
        let mut table = self.tasks.lock();
        let id = table.next_id;
        table.next_id += 1;

        let tasks = Arc::clone(&self.tasks);
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if tasks.lock().running.remove(&id).is_none() {
                // cancelled between waking up and getting here
                return;
            }
            callback();
        });
        table.running.insert(id, task.abort_handle());
        TimerHandle::from_raw(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(task) = self.tasks.lock().running.remove(&handle.raw()) {
            task.abort();
        }
    }
}
