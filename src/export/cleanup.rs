//! Deferred release of transient export resources.
//!
//! Each task registered with [`CleanupScope::defer`] runs exactly once: at
//! its deadline, or right away when the scope is dropped first. The scope
//! must be used from within a tokio runtime.

use log::{debug, warn};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

type Task = Box<dyn FnOnce() + Send>;
type Slot = Arc<Mutex<Option<Task>>>;

struct Deferred {
    label: String,
    slot: Slot,
    handle: JoinHandle<()>,
}

fn take(slot: &Slot) -> Option<Task> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

/// Owner of deferred cleanup tasks
#[derive(Default)]
pub struct CleanupScope {
    pending: Mutex<Vec<Deferred>>,
}

impl CleanupScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` once `delay` has elapsed
    pub fn defer<F>(&self, label: impl Into<String>, delay: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let label = label.into();
        let task: Task = Box::new(action);
        let slot: Slot = Arc::new(Mutex::new(Some(task)));
        let deadline = tokio::time::Instant::now() + delay;
        let timer_slot = Arc::clone(&slot);
        let timer_label = label.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(task) = take(&timer_slot) {
                debug!("cleanup '{}' ran after {:?}", timer_label, delay);
                task();
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|d| !d.handle.is_finished());
        pending.push(Deferred { label, slot, handle });
    }

    /// Number of tasks that have not run yet
    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|d| d.slot.lock().unwrap_or_else(PoisonError::into_inner).is_some())
            .count()
    }

    /// Wait until every registered task has reached its deadline and run
    pub async fn drain(&self) {
        let handles: Vec<(String, JoinHandle<()>)> = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            pending.drain(..).map(|d| (d.label, d.handle)).collect()
        };
        for (label, handle) in handles {
            if let Err(e) = handle.await {
                warn!("cleanup '{}' did not complete: {}", label, e);
            }
        }
    }
}

impl Drop for CleanupScope {
    fn drop(&mut self) {
        let pending = std::mem::take(self.pending.get_mut().unwrap_or_else(PoisonError::into_inner));
        for d in pending {
            d.handle.abort();
            if let Some(task) = take(&d.slot) {
                debug!("cleanup '{}' ran early on scope exit", d.label);
                task();
            }
        }
    }
}
