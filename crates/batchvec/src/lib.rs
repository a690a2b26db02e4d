#![forbid(unsafe_code)]

//! Observable ordered collections with coalesced batch notifications.
//!
//! - [`ObservableVec`]: a shared, version-tracked sequence that reports every
//!   single-item mutation as a [`CollectionChange`] plus the
//!   [`PropertyChange`]s it implies.
//! - [`BatchVec`]: wraps an `ObservableVec` and offers only batch mutations
//!   (`add_range`, `remove_all`, `replace`, `replace_element`), each emitting
//!   one notification for the whole batch instead of one per item.
//! - [`Subscription`] / [`SubscriptionSet`]: RAII guards; dropping them
//!   unsubscribes.
//! - [`BatchConfig`]: notification policy knobs.
//!
//! # Architecture
//!
//! Both collections are `Rc<RefCell<..>>` handles for single-threaded
//! shared ownership. Listeners are stored weakly and run synchronously on
//! the mutating thread, in registration order, after storage has been fully
//! updated and its borrow released.
//!
//! # Example
//!
//! ```
//! use batchvec::{BatchVec, ChangeAction};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let list = BatchVec::from_vec(vec!["a", "b", "c"]);
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = Rc::clone(&seen);
//! let _sub = list.subscribe(move |change| log.borrow_mut().push(change.action()));
//!
//! list.add_range(["d", "e"]);
//! list.remove_all(|s| *s < "c");
//!
//! assert_eq!(list.to_vec(), vec!["c", "d", "e"]);
//! assert_eq!(*seen.borrow(), vec![ChangeAction::Add, ChangeAction::Remove]);
//! ```
//!
//! # Feature Flags
//!
//! - `tracing`: debug spans around batch operations and trace events for
//!   every delivered notification.
//! - `policy-config`: load [`BatchConfig`] from TOML or JSON.

pub mod batch;
pub mod change;
pub mod config;
pub mod error;
pub mod observable_vec;
pub mod subscription;

pub use batch::BatchVec;
pub use change::{ChangeAction, CollectionChange, PropertyChange};
pub use config::{BatchConfig, EmptyRemoval, PropertyNotifications};
pub use error::BatchError;
pub use observable_vec::ObservableVec;
pub use subscription::{Subscription, SubscriptionSet};
