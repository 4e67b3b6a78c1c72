//! Move listener registry.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::warn;

use chaant_protocols::{ListenerGuard, MoveListener, MoveRecord};

#[derive(Default)]
struct Entries {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(u64, MoveListener)>>,
}

/// Listeners notified after each confirmed own move.
#[derive(Default, Clone)]
pub(crate) struct ListenerSet {
    entries: Arc<Entries>,
}

impl ListenerSet {
    pub(crate) fn add(&self, listener: MoveListener) -> ListenerGuard {
        let id = self.entries.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.listeners.write().push((id, listener));

        let entries = Arc::downgrade(&self.entries);
        ListenerGuard::new(move || {
            if let Some(entries) = entries.upgrade() {
                entries.listeners.write().retain(|(lid, _)| *lid != id);
            }
        })
    }

    /// Invoke every listener in registration order. Failures are logged.
    pub(crate) fn notify(&self, record: &MoveRecord) {
        let snapshot: Vec<MoveListener> = self
            .entries
            .listeners
            .read()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();

        for listener in snapshot {
            if let Err(e) = listener(record) {
                warn!("Move listener failed after {}: {}", record.notation, e);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.listeners.read().len()
    }
}
