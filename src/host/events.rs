use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostEvent {
    TrackChanged,
    PlayPauseToggled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type EventHandler = Box<dyn Fn(HostEvent) + Send + Sync>;

/// Handler registry shared by host implementations.
#[derive(Default)]
pub struct Subscribers {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(SubscriptionId, HostEvent, Arc<EventHandler>)>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, event: HostEvent, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, event, Arc::new(handler)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().retain(|(sub, _, _)| *sub != id);
    }

    /// Invoke every handler registered for `event`. Handlers run outside the lock
    /// so they may subscribe or unsubscribe.
    pub fn emit(&self, event: HostEvent) {
        let matching: Vec<Arc<EventHandler>> = self
            .lock()
            .iter()
            .filter(|(_, e, _)| *e == event)
            .map(|(_, _, h)| Arc::clone(h))
            .collect();
        log::debug!("Host event {:?} -> {} handler(s)", event, matching.len());
        for handler in matching {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, HostEvent, Arc<EventHandler>)>> {
        // Handlers never run under the lock; a poisoned list is still intact.
        self.handlers.lock().unwrap_or_else(|e| e.into_inner())
    }
}
