#![forbid(unsafe_code)]

//! Batch-notifying collection.
//!
//! [`BatchVec<T>`] owns an [`ObservableVec<T>`] and exposes only batch
//! mutations plus reads and subscriptions. Each batch call mutates storage
//! directly and then emits one coalesced notification, where issuing the
//! same mutation item by item would emit one per item.
//!
//! | call | collection changes | property changes (default policy) |
//! |------|--------------------|-----------------------------------|
//! | `add_range(xs)` | `Add { xs, start_index }` | `Count`, `Items` |
//! | `remove_all(p)` | `Remove { removed, None }` | none |
//! | `replace(ys)` | `Reset`, then `Add { ys, 0 }` | `Count`, `Items` |
//! | `replace_element(new, &old)` | `Replace { [new], [old], Some(i) }` | none |
//!
//! The property-change asymmetry and the empty `Remove` on a zero-match
//! `remove_all` are the default; [`BatchConfig`] switches either.
//!
//! # Invariants
//!
//! 1. Listeners observe storage only in fully-applied states.
//! 2. Within one call, notifications are delivered in the order shown above.
//! 3. Checks run before mutation: on `Err` nothing changed and nothing fired.

use std::fmt;

use crate::change::{CollectionChange, PropertyChange};
use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::observable_vec::ObservableVec;
use crate::subscription::Subscription;

/// Observable collection whose mutations notify once per batch.
///
/// Cloning yields another handle to the same items and listeners.
pub struct BatchVec<T> {
    storage: ObservableVec<T>,
    config: BatchConfig,
}

impl<T> Clone for BatchVec<T> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            config: self.config,
        }
    }
}

impl<T: Clone + 'static> BatchVec<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BatchConfig::default())
    }

    #[must_use]
    pub fn with_config(config: BatchConfig) -> Self {
        Self {
            storage: ObservableVec::new(),
            config,
        }
    }

    /// Wrap existing items. No notification is emitted.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            storage: ObservableVec::from_vec(items),
            config: BatchConfig::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> BatchConfig {
        self.config
    }

    // -- batch mutations ------------------------------------------------------

    /// Append `items` in order with a single `Add` notification, followed by
    /// `Count` and `Items` property changes.
    ///
    /// The `Add` carries the appended items and the length before the call
    /// as its start index. An empty range still notifies.
    pub fn add_range<I: IntoIterator<Item = T>>(&self, items: I) {
        let items: Vec<T> = items.into_iter().collect();

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "batch_add_range",
            len = self.storage.len(),
            added = items.len()
        )
        .entered();

        let start_index = self.storage.mutate(|storage| {
            let start = storage.len();
            storage.extend(items.iter().cloned());
            start
        });
        self.storage.emit(CollectionChange::Add { items, start_index });
        self.storage.emit_property(PropertyChange::Count);
        self.storage.emit_property(PropertyChange::Items);
    }

    /// [`add_range`](Self::add_range) for a sequence that may be absent.
    ///
    /// # Errors
    ///
    /// [`BatchError::InvalidArgument`] naming `items` if `items` is `None`.
    /// Nothing is mutated or emitted in that case.
    pub fn try_add_range<I: IntoIterator<Item = T>>(
        &self,
        items: Option<I>,
    ) -> Result<(), BatchError> {
        let items = items.ok_or(BatchError::InvalidArgument { argument: "items" })?;
        self.add_range(items);
        Ok(())
    }

    /// Remove every item matching `predicate` with a single `Remove`
    /// notification listing the removed items in storage order.
    ///
    /// The predicate sees a snapshot taken before any removal, once per item,
    /// in storage order. Survivors keep their relative order. Returns the
    /// number of removed items.
    pub fn remove_all(&self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("batch_remove_all", len = self.storage.len()).entered();

        let snapshot = self.storage.to_vec();
        let matches: Vec<bool> = snapshot.iter().map(|item| predicate(item)).collect();
        let removed: Vec<T> = snapshot
            .into_iter()
            .zip(&matches)
            .filter_map(|(item, &hit)| hit.then_some(item))
            .collect();

        if removed.is_empty() {
            if self.config.suppress_empty_removal() {
                return 0;
            }
        } else {
            self.storage.mutate(|storage| {
                let mut hits = matches.iter();
                storage.retain(|_| !hits.next().copied().unwrap_or(false));
            });
        }

        let count = removed.len();
        #[cfg(feature = "tracing")]
        tracing::debug!(removed = count, "removed matching items");

        self.storage.emit(CollectionChange::Remove {
            items: removed,
            start_index: None,
        });
        if self.config.uniform_properties() {
            self.storage.emit_property(PropertyChange::Count);
            self.storage.emit_property(PropertyChange::Items);
        }
        count
    }

    /// Replace the whole contents with `replacement`.
    ///
    /// Emits a `Reset` for the clear and then everything
    /// [`add_range`](Self::add_range) emits.
    pub fn replace<I: IntoIterator<Item = T>>(&self, replacement: I) {
        let replacement: Vec<T> = replacement.into_iter().collect();

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "batch_replace",
            len = self.storage.len(),
            replacement = replacement.len()
        )
        .entered();

        self.storage.mutate(Vec::clear);
        self.storage.emit(CollectionChange::Reset);
        self.add_range(replacement);
    }

    /// [`replace`](Self::replace) for a sequence that may be absent.
    ///
    /// # Errors
    ///
    /// [`BatchError::InvalidArgument`] naming `replacement` if it is `None`.
    /// The collection is not cleared in that case.
    pub fn try_replace<I: IntoIterator<Item = T>>(
        &self,
        replacement: Option<I>,
    ) -> Result<(), BatchError> {
        let replacement = replacement.ok_or(BatchError::InvalidArgument {
            argument: "replacement",
        })?;
        self.replace(replacement);
        Ok(())
    }

    /// Overwrite the first item equal to `old_element` with `new_element`
    /// and emit a single `Replace` notification whose old item is
    /// `old_element` itself.
    ///
    /// # Errors
    ///
    /// [`BatchError::ElementNotFound`] naming `old_element` if no item equals
    /// it. Nothing is mutated or emitted in that case.
    pub fn replace_element(&self, new_element: T, old_element: &T) -> Result<(), BatchError>
    where
        T: PartialEq,
    {
        let index = self
            .storage
            .index_of(old_element)
            .ok_or_else(|| BatchError::ElementNotFound {
                argument: "old_element",
            })?;

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("batch_replace_element", index).entered();

        self.storage
            .mutate(|storage| storage[index] = new_element.clone());

        self.storage.emit(CollectionChange::Replace {
            new_items: vec![new_element],
            old_items: vec![old_element.clone()],
            index: Some(index),
        });
        if self.config.uniform_properties() {
            self.storage.emit_property(PropertyChange::Items);
        }
        Ok(())
    }

    // -- reads ----------------------------------------------------------------

    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.storage.get(index)
    }

    #[must_use]
    pub fn first(&self) -> Option<T> {
        self.storage.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<T> {
        self.storage.last()
    }

    #[must_use]
    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.storage.contains(item)
    }

    #[must_use]
    pub fn index_of(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.storage.index_of(item)
    }

    /// Borrow the items for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        self.storage.with(f)
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.storage.to_vec()
    }

    /// Iterate over a snapshot; restartable by calling again.
    pub fn iter(&self) -> std::vec::IntoIter<T> {
        self.storage.iter()
    }

    /// Storage mutation counter. `replace` counts twice (clear, then append).
    #[must_use]
    pub fn version(&self) -> u64 {
        self.storage.version()
    }

    // -- subscriptions --------------------------------------------------------

    /// Listen for collection changes.
    pub fn subscribe(&self, callback: impl Fn(&CollectionChange<T>) + 'static) -> Subscription {
        self.storage.subscribe(callback)
    }

    /// Listen for property changes.
    pub fn subscribe_property(&self, callback: impl Fn(PropertyChange) + 'static) -> Subscription {
        self.storage.subscribe_property(callback)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.storage.listener_count()
    }
}

impl<T: Clone + 'static> Default for BatchVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> From<Vec<T>> for BatchVec<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: Clone + 'static> FromIterator<T> for BatchVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: Clone + 'static> Extend<T> for BatchVec<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.add_range(iter);
    }
}

impl<T: fmt::Debug> fmt::Debug for BatchVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchVec")
            .field("storage", &self.storage)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeAction;
    use crate::config::{EmptyRemoval, PropertyNotifications};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Event<T> {
        Collection(CollectionChange<T>),
        Property(PropertyChange),
    }

    struct Recorder<T> {
        events: Rc<RefCell<Vec<Event<T>>>>,
        _subs: [Subscription; 2],
    }

    impl<T: Clone + 'static> Recorder<T> {
        fn attach(vec: &BatchVec<T>) -> Self {
            let events = Rc::new(RefCell::new(Vec::new()));
            let c = Rc::clone(&events);
            let p = Rc::clone(&events);
            Self {
                _subs: [
                    vec.subscribe(move |change| {
                        c.borrow_mut().push(Event::Collection(change.clone()));
                    }),
                    vec.subscribe_property(move |prop| p.borrow_mut().push(Event::Property(prop))),
                ],
                events,
            }
        }

        fn take(&self) -> Vec<Event<T>> {
            std::mem::take(&mut *self.events.borrow_mut())
        }
    }

    #[test]
    fn add_range_appends_with_one_add() {
        let vec = BatchVec::from_vec(vec!["a", "b", "c"]);
        let rec = Recorder::attach(&vec);

        vec.add_range(["d", "e"]);

        assert_eq!(vec.to_vec(), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(
            rec.take(),
            vec![
                Event::Collection(CollectionChange::Add {
                    items: vec!["d", "e"],
                    start_index: 3
                }),
                Event::Property(PropertyChange::Count),
                Event::Property(PropertyChange::Items),
            ]
        );
    }

    #[test]
    fn empty_range_still_notifies() {
        let vec = BatchVec::<u8>::new();
        let rec = Recorder::attach(&vec);

        vec.add_range(Vec::new());
        let events = rec.take();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            Event::Collection(CollectionChange::Add {
                items: vec![],
                start_index: 0
            })
        );
    }

    #[test]
    fn absent_range_is_rejected_untouched() {
        let vec = BatchVec::from_vec(vec![1, 2]);
        let rec = Recorder::attach(&vec);
        let version = vec.version();

        let err = vec.try_add_range(None::<Vec<i32>>).unwrap_err();
        assert_eq!(err, BatchError::InvalidArgument { argument: "items" });
        assert_eq!(vec.to_vec(), vec![1, 2]);
        assert_eq!(vec.version(), version);
        assert!(rec.take().is_empty());

        vec.try_add_range(Some([3])).unwrap();
        assert_eq!(vec.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn remove_all_lists_removed_in_order() {
        let vec = BatchVec::from_vec(vec!["a1", "b", "c1"]);
        let rec = Recorder::attach(&vec);

        let removed = vec.remove_all(|s| s.contains('1'));

        assert_eq!(removed, 2);
        assert_eq!(vec.to_vec(), vec!["b"]);
        assert_eq!(
            rec.take(),
            vec![Event::Collection(CollectionChange::Remove {
                items: vec!["a1", "c1"],
                start_index: None
            })]
        );
    }

    #[test]
    fn remove_all_handles_duplicates() {
        let vec = BatchVec::from_vec(vec![3, 1, 3, 2, 3]);
        vec.remove_all(|&x| x == 3);
        assert_eq!(vec.to_vec(), vec![1, 2]);
    }

    #[test]
    fn remove_all_zero_matches_emits_empty_remove_by_default() {
        let vec = BatchVec::from_vec(vec![1, 2, 3]);
        let rec = Recorder::attach(&vec);
        let version = vec.version();

        assert_eq!(vec.remove_all(|_| false), 0);
        assert_eq!(
            rec.take(),
            vec![Event::Collection(CollectionChange::Remove {
                items: vec![],
                start_index: None
            })]
        );
        assert_eq!(vec.version(), version, "storage untouched");
    }

    #[test]
    fn remove_all_zero_matches_can_be_suppressed() {
        let config = BatchConfig::new().with_empty_removal(EmptyRemoval::Suppress);
        let vec = BatchVec::with_config(config);
        vec.add_range([1, 2, 3]);
        let rec = Recorder::attach(&vec);

        assert_eq!(vec.remove_all(|&x| x > 10), 0);
        assert!(rec.take().is_empty());

        assert_eq!(vec.remove_all(|&x| x > 2), 1);
        assert_eq!(rec.take().len(), 1);
    }

    #[test]
    fn predicate_may_read_the_collection() {
        let vec = BatchVec::from_vec(vec![1, 2, 3, 4]);
        let reader = vec.clone();
        let removed = vec.remove_all(|&x| x as usize == reader.len());
        assert_eq!(removed, 1);
        assert_eq!(vec.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn replace_emits_reset_then_add() {
        let vec = BatchVec::from_vec(vec!["old1", "old2", "old3"]);
        let rec = Recorder::attach(&vec);

        vec.replace(vec!["x", "y"]);

        assert_eq!(vec.to_vec(), vec!["x", "y"]);
        assert_eq!(
            rec.take(),
            vec![
                Event::Collection(CollectionChange::Reset),
                Event::Collection(CollectionChange::Add {
                    items: vec!["x", "y"],
                    start_index: 0
                }),
                Event::Property(PropertyChange::Count),
                Event::Property(PropertyChange::Items),
            ]
        );
    }

    #[test]
    fn replace_from_own_snapshot() {
        let vec = BatchVec::from_vec(vec![1, 2, 3]);
        vec.replace(vec.iter().rev());
        assert_eq!(vec.to_vec(), vec![3, 2, 1]);
    }

    #[test]
    fn absent_replacement_does_not_clear() {
        let vec = BatchVec::from_vec(vec![1]);
        let rec = Recorder::attach(&vec);
        assert_eq!(
            vec.try_replace(None::<Vec<i32>>),
            Err(BatchError::InvalidArgument {
                argument: "replacement"
            })
        );
        assert_eq!(vec.to_vec(), vec![1]);
        assert!(rec.take().is_empty());
    }

    #[test]
    fn present_replacement_resets_then_adds() {
        let vec = BatchVec::from_vec(vec![1, 2]);
        let rec = Recorder::attach(&vec);

        vec.try_replace(Some(vec![5, 6, 7])).unwrap();

        assert_eq!(vec.to_vec(), vec![5, 6, 7]);
        assert_eq!(
            rec.take(),
            vec![
                Event::Collection(CollectionChange::Reset),
                Event::Collection(CollectionChange::Add {
                    items: vec![5, 6, 7],
                    start_index: 0
                }),
                Event::Property(PropertyChange::Count),
                Event::Property(PropertyChange::Items),
            ]
        );
    }

    #[test]
    fn replace_element_overwrites_first_occurrence() {
        let vec = BatchVec::from_vec(vec!["a", "b", "a"]);
        let rec = Recorder::attach(&vec);

        vec.replace_element("z", &"a").unwrap();

        assert_eq!(vec.to_vec(), vec!["z", "b", "a"]);
        assert_eq!(
            rec.take(),
            vec![Event::Collection(CollectionChange::Replace {
                new_items: vec!["z"],
                old_items: vec!["a"],
                index: Some(0)
            })]
        );
    }

    #[test]
    fn replace_element_missing_is_not_found() {
        let vec = BatchVec::from_vec(vec![1, 2]);
        let rec = Recorder::attach(&vec);

        let err = vec.replace_element(9, &7).unwrap_err();
        assert_eq!(
            err,
            BatchError::ElementNotFound {
                argument: "old_element"
            }
        );
        assert_eq!(vec.to_vec(), vec![1, 2]);
        assert!(rec.take().is_empty());
    }

    /// Equal ignoring ASCII case, so equal values can still be told apart.
    #[derive(Debug, Clone)]
    struct Key(&'static str);

    impl PartialEq for Key {
        fn eq(&self, other: &Self) -> bool {
            self.0.eq_ignore_ascii_case(other.0)
        }
    }

    #[test]
    fn replace_element_reports_the_argument_as_old_item() {
        let vec = BatchVec::from_vec(vec![Key("ABC"), Key("x")]);
        let version = vec.version();
        let rec = Recorder::attach(&vec);

        vec.replace_element(Key("new"), &Key("abc")).unwrap();

        assert_eq!(vec.get(0).map(|k| k.0), Some("new"));
        assert_eq!(vec.version(), version + 1);
        match rec.take().as_slice() {
            [
                Event::Collection(CollectionChange::Replace {
                    new_items,
                    old_items,
                    index,
                }),
            ] => {
                assert_eq!(new_items.iter().map(|k| k.0).collect::<Vec<_>>(), ["new"]);
                assert_eq!(old_items.iter().map(|k| k.0).collect::<Vec<_>>(), ["abc"]);
                assert_eq!(*index, Some(0));
            }
            other => panic!("expected a single Replace, got {other:?}"),
        }
    }

    #[test]
    fn uniform_policy_zero_matches_still_reports_properties() {
        let config =
            BatchConfig::new().with_property_notifications(PropertyNotifications::Uniform);
        let vec = BatchVec::with_config(config);
        vec.add_range([1, 2, 3]);
        let rec = Recorder::attach(&vec);

        assert_eq!(vec.remove_all(|_| false), 0);
        assert_eq!(
            rec.take(),
            vec![
                Event::Collection(CollectionChange::Remove {
                    items: vec![],
                    start_index: None
                }),
                Event::Property(PropertyChange::Count),
                Event::Property(PropertyChange::Items),
            ]
        );
        assert_eq!(vec.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn uniform_policy_adds_property_changes() {
        let config =
            BatchConfig::new().with_property_notifications(PropertyNotifications::Uniform);
        let vec = BatchVec::with_config(config);
        vec.add_range([1, 2, 3]);
        let rec = Recorder::attach(&vec);

        vec.remove_all(|&x| x == 2);
        vec.replace_element(30, &3).unwrap();

        let props: Vec<_> = rec
            .take()
            .into_iter()
            .filter_map(|e| match e {
                Event::Property(p) => Some(p),
                Event::Collection(_) => None,
            })
            .collect();
        assert_eq!(
            props,
            vec![
                PropertyChange::Count,
                PropertyChange::Items,
                PropertyChange::Items
            ]
        );
    }

    #[test]
    fn listeners_see_post_operation_state() {
        let vec = BatchVec::<u32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let reader = vec.clone();
        let s = Rc::clone(&seen);
        let _sub = vec.subscribe(move |change| {
            s.borrow_mut().push((change.action(), reader.len()));
        });

        vec.add_range(0..5);
        vec.remove_all(|x| x % 2 == 0);
        vec.replace([7]);

        assert_eq!(
            *seen.borrow(),
            vec![
                (ChangeAction::Add, 5),
                (ChangeAction::Remove, 2),
                (ChangeAction::Reset, 0),
                (ChangeAction::Add, 1),
            ]
        );
    }

    #[test]
    fn extend_and_collect() {
        let mut vec: BatchVec<char> = "ab".chars().collect();
        let rec = Recorder::attach(&vec);
        vec.extend("cd".chars());
        assert_eq!(vec.to_vec(), vec!['a', 'b', 'c', 'd']);
        assert_eq!(rec.take().len(), 3);
    }

    #[test]
    fn reads_pass_through() {
        let vec = BatchVec::from(vec![10, 20, 30]);
        assert_eq!(vec.len(), 3);
        assert!(!vec.is_empty());
        assert_eq!(vec.get(1), Some(20));
        assert_eq!(vec.get(3), None);
        assert_eq!(vec.first(), Some(10));
        assert_eq!(vec.last(), Some(30));
        assert_eq!(vec.index_of(&30), Some(2));
        assert!(vec.contains(&20));
        assert_eq!(vec.with(|items| items.iter().sum::<i32>()), 60);
        assert_eq!(vec.iter().count(), vec.iter().count(), "restartable");
    }
}
