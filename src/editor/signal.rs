//! Listener registry with disposable subscriptions.
//!
//! Adapters embed one [`Signal`] per change kind. Subscribing hands back a
//! [`Subscription`] whose `dispose()` detaches the listener; nothing is
//! detached implicitly, so owners keep their subscriptions in a list and
//! dispose them explicitly.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Registry<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
}

impl<T> Registry<T> {
    fn contains(&self, id: u64) -> bool {
        self.listeners.iter().any(|(listener_id, _)| *listener_id == id)
    }
}

/// Single-threaded event source.
pub struct Signal<T> {
    registry: Rc<RefCell<Registry<T>>>,
}

impl<T: 'static> Signal<T> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Registers `listener` until the returned subscription is disposed.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&T) + 'static,
    {
        let listener: Listener<T> = Rc::new(RefCell::new(listener));
        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.push((id, listener));
            id
        };

        let registry: Weak<RefCell<Registry<T>>> = Rc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry
                    .borrow_mut()
                    .listeners
                    .retain(|(listener_id, _)| *listener_id != id);
            }
        })
    }

    /// Calls every listener registered at the time of the call.
    ///
    /// Listeners disposed by an earlier listener in the same dispatch are
    /// skipped. A listener that re-enters `emit` is not called recursively.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<(u64, Listener<T>)> = self.registry.borrow().listeners.clone();
        for (id, listener) in snapshot {
            if !self.registry.borrow().contains(id) {
                continue;
            }
            if let Ok(mut listener) = listener.try_borrow_mut() {
                (&mut *listener)(value);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.registry.borrow().listeners.len())
            .finish()
    }
}

/// Handle to a registered listener.
#[must_use = "dropping a subscription without disposing it leaves the listener attached"]
pub struct Subscription {
    disposer: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(disposer: impl FnOnce() + 'static) -> Self {
        Self {
            disposer: Some(Box::new(disposer)),
        }
    }

    /// Detaches the listener.
    pub fn dispose(mut self) {
        if let Some(disposer) = self.disposer.take() {
            disposer();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.disposer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn disposed_listener_stops_receiving() {
        let signal = Signal::<u32>::new();
        let seen = Rc::new(Cell::new(0));

        let counter = Rc::clone(&seen);
        let subscription = signal.subscribe(move |value| counter.set(counter.get() + value));

        signal.emit(&2);
        subscription.dispose();
        signal.emit(&5);

        assert_eq!(seen.get(), 2);
        assert_eq!(signal.listener_count(), 0);
    }

    #[test]
    fn listener_disposed_during_dispatch_is_skipped() {
        let signal = Signal::<()>::new();
        let second_calls = Rc::new(Cell::new(0));
        let pending: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let to_dispose = Rc::clone(&pending);
        let first = signal.subscribe(move |_| {
            if let Some(subscription) = to_dispose.borrow_mut().take() {
                subscription.dispose();
            }
        });

        let calls = Rc::clone(&second_calls);
        *pending.borrow_mut() = Some(signal.subscribe(move |_| calls.set(calls.get() + 1)));

        signal.emit(&());
        assert_eq!(second_calls.get(), 0);
        assert_eq!(signal.listener_count(), 1);
        first.dispose();
    }

    #[test]
    fn dispose_after_signal_dropped_is_harmless() {
        let signal = Signal::<u8>::new();
        let subscription = signal.subscribe(|_| {});
        drop(signal);
        subscription.dispose();
    }
}
