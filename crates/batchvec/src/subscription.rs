#![forbid(unsafe_code)]

//! Listener registries and RAII subscription guards.
//!
//! Listeners are held strongly by their [`Subscription`] and weakly by the
//! collection. Dropping the guard is all it takes to unsubscribe; dead slots
//! are pruned lazily on the next notification.
//!
//! # Invariants
//!
//! 1. Listeners are invoked in registration order.
//! 2. A listener whose guard was dropped never fires again.
//! 3. The registry borrow is released before any listener runs, so a
//!    listener may subscribe further listeners (they fire from the next
//!    notification on).
//! 4. [`SubscriptionSet`] releases its guards in reverse registration order.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Listener<E> = Rc<dyn Fn(&E)>;

/// Ordered set of weakly-held listeners for one event type.
pub(crate) struct Listeners<E> {
    slots: RefCell<Vec<Weak<dyn Fn(&E)>>>,
}

impl<E: 'static> Listeners<E> {
    pub(crate) fn new() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        let listener: Listener<E> = Rc::new(callback);
        self.slots.borrow_mut().push(Rc::downgrade(&listener));
        Subscription {
            _listener: Box::new(listener),
        }
    }

    /// Deliver `event` to every live listener.
    pub(crate) fn notify(&self, event: &E) {
        let live: Vec<Listener<E>> = {
            let mut slots = self.slots.borrow_mut();
            slots.retain(|slot| slot.strong_count() > 0);
            slots.iter().filter_map(Weak::upgrade).collect()
        };
        for listener in live {
            listener(event);
        }
    }

    /// Number of listeners whose guards are still alive.
    pub(crate) fn live_count(&self) -> usize {
        self.slots
            .borrow()
            .iter()
            .filter(|slot| slot.strong_count() > 0)
            .count()
    }
}

/// Keeps a listener registered. Drop it to unsubscribe.
#[must_use = "dropping a Subscription unsubscribes its listener immediately"]
pub struct Subscription {
    _listener: Box<dyn Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Collects subscriptions for a logical scope (e.g. a bound view).
///
/// When the set is dropped, all held subscriptions are released.
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Hold `sub` until the set is dropped or cleared. Returns the set for
    /// chaining.
    pub fn hold(&mut self, sub: Subscription) -> &mut Self {
        self.subscriptions.push(sub);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release all subscriptions now; the set stays usable.
    pub fn clear(&mut self) {
        while self.subscriptions.pop().is_some() {}
    }
}

impl Default for SubscriptionSet {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for SubscriptionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionSet")
            .field("len", &self.subscriptions.len())
            .finish()
    }
}
