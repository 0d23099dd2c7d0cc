//! Single-subscriber observer registration.
//!
//! Each service and repository notifies at most one observer, held
//! weakly so a dropped UI component never keeps the service alive and
//! never receives stale callbacks. Unlike the classic delegate
//! pattern, a missing observer is not a silent drop: every
//! undeliverable notification is logged.

use std::sync::{Arc, RwLock, Weak};

/// Weakly-held slot for a single registered observer.
#[derive(Debug)]
pub struct ObserverSlot<T: ?Sized> {
    observer: RwLock<Option<Weak<T>>>,
}

impl<T: ?Sized> ObserverSlot<T> {
    pub fn new() -> Self {
        Self {
            observer: RwLock::new(None),
        }
    }

    /// Registers `observer` as the single subscriber, replacing any
    /// previous registration. Only a weak reference is kept.
    pub fn register(&self, observer: &Arc<T>) {
        let mut slot = self.observer.write().unwrap();
        *slot = Some(Arc::downgrade(observer));
    }

    /// Removes the current registration, if any.
    pub fn clear(&self) {
        let mut slot = self.observer.write().unwrap();
        *slot = None;
    }

    /// Delivers a notification to the registered observer.
    ///
    /// If no observer is registered, or the registered observer has
    /// been dropped, the notification is logged and discarded.
    pub fn notify(&self, event: &str, deliver: impl FnOnce(&T)) {
        let upgraded = {
            let slot = self.observer.read().unwrap();
            slot.as_ref().and_then(Weak::upgrade)
        };
        match upgraded {
            Some(observer) => deliver(&observer),
            None => tracing::warn!(event, "no observer registered, notification dropped"),
        }
    }
}

impl<T: ?Sized> Default for ObserverSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
