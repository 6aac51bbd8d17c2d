use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crossbeam_channel::{Receiver, TrySendError};

use crate::pipeline::grouping_progress::GroupingProgress;

/// Callback invoked synchronously for each progress event of a session.
///
/// Listeners run inline on the pipeline thread, so a slow listener slows the
/// run. Consumers that do real work per event should subscribe a
/// [`channel_listener`] and drain the receiver on their own thread.
pub type ProgressListener = Arc<dyn Fn(&GroupingProgress) + Send + Sync>;

type ListenerMap = HashMap<String, Vec<(u64, ProgressListener)>>;

/// Per-orchestrator map from session id to progress listeners.
///
/// Safe for concurrent subscribe, unsubscribe and emit. Listeners are called
/// outside the lock, so a listener may itself subscribe or unsubscribe.
#[derive(Default)]
pub struct ProgressRegistry {
    next_id: AtomicU64,
    listeners: Mutex<ListenerMap>,
}

/// Handle returned by [`ProgressRegistry::subscribe`].
///
/// Dropping the handle keeps the listener registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
pub struct Subscription {
    session_id: String,
    id: u64,
    registry: Weak<ProgressRegistry>,
}

impl Subscription {
    /// Removes the listener. Returns `false` if it was already gone.
    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(&self.session_id, self.id),
            None => false,
        }
    }
}

impl ProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for events of `session_id`.
    ///
    /// The listener is called from [`emit`](Self::emit) on the emitting
    /// thread. Use [`channel_listener`] when the consumer may fall behind.
    pub fn subscribe(self: &Arc<Self>, session_id: &str, listener: ProgressListener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock()
            .entry(session_id.to_string())
            .or_default()
            .push((id, listener));
        Subscription {
            session_id: session_id.to_string(),
            id,
            registry: Arc::downgrade(self),
        }
    }

    pub fn listener_count(&self, session_id: &str) -> usize {
        self.lock().get(session_id).map_or(0, Vec::len)
    }

    /// Delivers `event` to every listener of its session.
    ///
    /// A panicking listener is logged and skipped; it never reaches the
    /// pipeline or the remaining listeners.
    pub fn emit(&self, event: &GroupingProgress) {
        let snapshot: Vec<ProgressListener> = self
            .lock()
            .get(&event.session_id)
            .map(|ls| ls.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();

        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                log::warn!(
                    "Progress listener for session {} panicked on {}",
                    event.session_id,
                    event.step
                );
            }
        }
    }

    fn remove(&self, session_id: &str, id: u64) -> bool {
        let mut listeners = self.lock();
        let Some(entries) = listeners.get_mut(session_id) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(session_id);
        }
        removed
    }

    fn lock(&self) -> MutexGuard<'_, ListenerMap> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Listener that forwards events into a bounded channel.
///
/// Uses `try_send`: when the consumer falls `capacity` events behind, newer
/// events are dropped instead of blocking the pipeline. This is the listener
/// to use for consumers that cannot keep up with emission.
pub fn channel_listener(capacity: usize) -> (ProgressListener, Receiver<GroupingProgress>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
    let listener: ProgressListener = Arc::new(move |event: &GroupingProgress| {
        match tx.try_send(event.clone()) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => {
                log::debug!("Progress channel full, dropping {} event", event.step);
            }
        }
    });
    (listener, rx)
}
