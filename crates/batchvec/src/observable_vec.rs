#![forbid(unsafe_code)]

//! Observable ordered container with per-item change notification.
//!
//! [`ObservableVec<T>`] is a shared, version-tracked `Vec<T>` that reports
//! every structural mutation on two channels:
//!
//! - collection changed: a [`CollectionChange`] describing the mutation;
//! - property changed: a [`PropertyChange`] naming a stale derived property.
//!
//! Each single-item mutation notifies on its own. Code in this crate that
//! needs to coalesce many mutations into one notification goes through the
//! crate-private [`mutate`](ObservableVec::mutate) /
//! [`emit`](ObservableVec::emit) pair instead.
//!
//! # Architecture
//!
//! Storage lives in an `Rc<RefCell<..>>`; clones of an `ObservableVec`
//! observe and mutate the same items. Every mutation finishes and releases
//! its storage borrow before any listener runs, so listeners are free to read
//! the collection they are observing.
//!
//! # Invariants
//!
//! 1. `version()` increments exactly once per mutating call that changed
//!    storage.
//! 2. The collection change is delivered before the property changes it
//!    implies.
//! 3. An `Err` return leaves storage untouched and delivers nothing.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Index past the end | `insert`/`remove_at`/`set`/`move_item` | `BatchError::IndexOutOfRange` |
//! | Listener mutates the collection | Reentrant call | Allowed, but later listeners see the newer state |
//! | Listener panics | Bug in listener | Propagates to the mutating caller; storage already updated |

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::change::{CollectionChange, PropertyChange};
use crate::error::BatchError;
use crate::subscription::{Listeners, Subscription};

struct Shared<T> {
    items: RefCell<Vec<T>>,
    version: Cell<u64>,
    collection: Listeners<CollectionChange<T>>,
    property: Listeners<PropertyChange>,
}

/// Shared observable sequence.
pub struct ObservableVec<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for ObservableVec<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: Clone + 'static> ObservableVec<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Wrap existing items. No notification is emitted.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            shared: Rc::new(Shared {
                items: RefCell::new(items),
                version: Cell::new(0),
                collection: Listeners::new(),
                property: Listeners::new(),
            }),
        }
    }

    // -- reads ----------------------------------------------------------------

    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.items.borrow().is_empty()
    }

    /// Clone of the item at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.shared.items.borrow().get(index).cloned()
    }

    #[must_use]
    pub fn first(&self) -> Option<T> {
        self.shared.items.borrow().first().cloned()
    }

    #[must_use]
    pub fn last(&self) -> Option<T> {
        self.shared.items.borrow().last().cloned()
    }

    /// Borrow the items for the duration of `f`.
    ///
    /// `f` must not mutate this collection.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.shared.items.borrow())
    }

    /// Snapshot of the current items.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.shared.items.borrow().clone()
    }

    /// Iterate over a snapshot taken now; later mutations are not observed.
    pub fn iter(&self) -> std::vec::IntoIter<T> {
        self.to_vec().into_iter()
    }

    /// Number of mutating calls that changed storage.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.shared.version.get()
    }

    // -- subscriptions --------------------------------------------------------

    /// Listen for collection changes.
    pub fn subscribe(&self, callback: impl Fn(&CollectionChange<T>) + 'static) -> Subscription {
        self.shared.collection.subscribe(callback)
    }

    /// Listen for property changes.
    pub fn subscribe_property(&self, callback: impl Fn(PropertyChange) + 'static) -> Subscription {
        self.shared.property.subscribe(move |p: &PropertyChange| callback(*p))
    }

    /// Live collection-change and property-change listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.shared.collection.live_count() + self.shared.property.live_count()
    }

    // -- single-item mutations ------------------------------------------------

    /// Append `item`.
    pub fn push(&self, item: T) {
        let index = self.mutate(|items| {
            items.push(item.clone());
            items.len() - 1
        });
        self.emit(CollectionChange::Add {
            items: vec![item],
            start_index: index,
        });
        self.emit_property(PropertyChange::Count);
        self.emit_property(PropertyChange::Items);
    }

    /// Insert `item` before position `index` (`index == len()` appends).
    ///
    /// # Errors
    ///
    /// [`BatchError::IndexOutOfRange`] if `index > len()`.
    pub fn insert(&self, index: usize, item: T) -> Result<(), BatchError> {
        self.check_index(index, self.len() + 1)?;
        self.mutate(|items| items.insert(index, item.clone()));
        self.emit(CollectionChange::Add {
            items: vec![item],
            start_index: index,
        });
        self.emit_property(PropertyChange::Count);
        self.emit_property(PropertyChange::Items);
        Ok(())
    }

    /// Remove and return the item at `index`.
    ///
    /// # Errors
    ///
    /// [`BatchError::IndexOutOfRange`] if `index >= len()`.
    pub fn remove_at(&self, index: usize) -> Result<T, BatchError> {
        self.check_index(index, self.len())?;
        let removed = self.mutate(|items| items.remove(index));
        self.emit(CollectionChange::Remove {
            items: vec![removed.clone()],
            start_index: Some(index),
        });
        self.emit_property(PropertyChange::Count);
        self.emit_property(PropertyChange::Items);
        Ok(removed)
    }

    /// Overwrite the item at `index`, returning the previous one.
    ///
    /// # Errors
    ///
    /// [`BatchError::IndexOutOfRange`] if `index >= len()`.
    pub fn set(&self, index: usize, item: T) -> Result<T, BatchError> {
        self.check_index(index, self.len())?;
        let old = self.mutate(|items| std::mem::replace(&mut items[index], item.clone()));
        self.emit(CollectionChange::Replace {
            new_items: vec![item],
            old_items: vec![old.clone()],
            index: Some(index),
        });
        self.emit_property(PropertyChange::Items);
        Ok(old)
    }

    /// Move the item at `from` so that it ends up at `to`.
    ///
    /// # Errors
    ///
    /// [`BatchError::IndexOutOfRange`] if either index is `>= len()`.
    pub fn move_item(&self, from: usize, to: usize) -> Result<(), BatchError> {
        let len = self.len();
        self.check_index(from, len)?;
        self.check_index(to, len)?;
        if from == to {
            return Ok(());
        }
        let moved = self.mutate(|items| {
            let item = items.remove(from);
            items.insert(to, item.clone());
            item
        });
        self.emit(CollectionChange::Move {
            items: vec![moved],
            old_index: from,
            new_index: to,
        });
        self.emit_property(PropertyChange::Items);
        Ok(())
    }

    /// Remove the first item equal to `item`. Returns whether one was found.
    pub fn remove(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        match self.index_of(item) {
            Some(index) => self.remove_at(index).is_ok(),
            None => false,
        }
    }

    /// Remove every item and report a reset.
    pub fn clear(&self) {
        self.mutate(Vec::clear);
        self.emit(CollectionChange::Reset);
        self.emit_property(PropertyChange::Count);
        self.emit_property(PropertyChange::Items);
    }

    // -- equality lookups -----------------------------------------------------

    /// Index of the first item equal to `item`.
    #[must_use]
    pub fn index_of(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.shared.items.borrow().iter().position(|x| x == item)
    }

    #[must_use]
    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.index_of(item).is_some()
    }

    // -- raw access for coalescing callers ------------------------------------

    /// Mutate storage without notifying. Bumps the version.
    pub(crate) fn mutate<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let out = f(&mut self.shared.items.borrow_mut());
        self.shared.version.set(self.shared.version.get() + 1);
        out
    }

    /// Deliver a collection change to every listener.
    pub(crate) fn emit(&self, change: CollectionChange<T>) {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            action = change.action().as_str(),
            items = change.len(),
            len = self.len(),
            "collection changed"
        );
        self.shared.collection.notify(&change);
    }

    /// Deliver a property change to every listener.
    pub(crate) fn emit_property(&self, property: PropertyChange) {
        #[cfg(feature = "tracing")]
        tracing::trace!(property = property.as_str(), "property changed");
        self.shared.property.notify(&property);
    }

    fn check_index(&self, index: usize, bound: usize) -> Result<(), BatchError> {
        if index < bound {
            Ok(())
        } else {
            Err(BatchError::IndexOutOfRange {
                index,
                len: self.len(),
            })
        }
    }
}

impl<T: Clone + 'static> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> From<Vec<T>> for ObservableVec<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableVec")
            .field("items", &self.shared.items.borrow())
            .field("version", &self.shared.version.get())
            .finish()
    }
}
