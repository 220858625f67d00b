//! # Triggers
//!
//! Observable signals. Listeners are bound to a reference object through a
//! weak pointer, so a listener never keeps its owner alive: once the last
//! strong reference to the owner is gone the entry is pruned on the next
//! access.
//!
//! ```text
//! Trigger ──(Weak)──> owner
//!    │
//!    └──> listener(&Arc<owner>)   only called while the owner is alive
//! ```
//!
//! Listeners that are not tied to an owner use [`Trigger::subscribe`], which
//! returns a [`Subscription`] guard that unregisters on drop.

use parking_lot::Mutex;
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Identifier of a registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Callback that returns false once its owner is gone.
type Callback = Arc<dyn Fn() -> bool + Send + Sync>;

struct ListenerEntry {
    id: ListenerId,
    owner: Option<Weak<dyn Any + Send + Sync>>,
    callback: Callback,
}

impl ListenerEntry {
    fn is_alive(&self) -> bool {
        self.owner.as_ref().map_or(true, |owner| owner.strong_count() > 0)
    }
}

#[derive(Default)]
struct TriggerInner {
    listeners: Mutex<Vec<ListenerEntry>>,
    next_id: AtomicU64,
}

/// Fan-out signal driving re-renders.
#[derive(Clone, Default)]
pub struct Trigger {
    inner: Arc<TriggerInner>,
}

impl Trigger {
    /// Creates a trigger with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger that fires whenever any of `sources` fires.
    #[must_use]
    pub fn delegate(sources: &[&Trigger]) -> Self {
        let delegate = Self::new();
        for source in sources {
            source.add_listener(&delegate.inner, |inner| {
                Trigger {
                    inner: Arc::clone(inner),
                }
                .trigger();
            });
        }
        delegate
    }

    fn next_id(&self) -> ListenerId {
        ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers `listener` for as long as `reference` is alive.
    ///
    /// The listener receives the upgraded reference; it must not capture a
    /// strong reference to the owner itself, or the owner is never released.
    pub fn add_listener<R, F>(&self, reference: &Arc<R>, listener: F) -> ListenerId
    where
        R: Send + Sync + 'static,
        F: Fn(&Arc<R>) + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(reference);
        let owner: Weak<dyn Any + Send + Sync> = weak.clone();
        let callback: Callback = Arc::new(move || match weak.upgrade() {
            Some(strong) => {
                listener(&strong);
                true
            }
            None => false,
        });

        let id = self.next_id();
        let mut listeners = self.inner.listeners.lock();
        listeners.retain(ListenerEntry::is_alive);
        listeners.push(ListenerEntry {
            id,
            owner: Some(owner),
            callback,
        });
        id
    }

    /// Registers an owner-less listener, removed when the guard drops.
    #[must_use = "the listener is removed as soon as the subscription is dropped"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.inner.listeners.lock().push(ListenerEntry {
            id,
            owner: None,
            callback: Arc::new(move || {
                listener();
                true
            }),
        });
        Subscription {
            trigger: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.lock();
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        listeners.len() != before
    }

    /// Number of listeners whose owners are still alive.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        let mut listeners = self.inner.listeners.lock();
        listeners.retain(ListenerEntry::is_alive);
        listeners.len()
    }

    /// Synchronously invokes every live listener on the calling thread.
    pub fn trigger(&self) {
        let callbacks: Vec<(ListenerId, Callback)> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|entry| (entry.id, Arc::clone(&entry.callback)))
            .collect();

        let dead: Vec<ListenerId> = callbacks
            .into_iter()
            .filter_map(|(id, callback)| (!callback()).then_some(id))
            .collect();

        if !dead.is_empty() {
            self.inner.listeners.lock().retain(|entry| !dead.contains(&entry.id));
        }
    }
}

impl std::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trigger")
            .field("listeners", &self.inner.listeners.lock().len())
            .finish()
    }
}

/// Guard returned by [`Trigger::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    trigger: Weak<TriggerInner>,
    id: ListenerId,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.trigger.upgrade() {
            inner.listeners.lock().retain(|entry| entry.id != self.id);
        }
    }
}
