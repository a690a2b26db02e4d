#![forbid(unsafe_code)]

//! Notification payloads delivered to collection listeners.
//!
//! A [`CollectionChange`] is the complete description of one structural
//! operation. Listeners never see a partial change: by the time a payload is
//! delivered the storage already reflects the whole operation.
//!
//! A [`PropertyChange`] tells bound views that a derived property (the item
//! count, or the item accessor) is stale and should be re-read.

use std::fmt;

/// Kind of structural change, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    Add,
    Remove,
    Replace,
    Move,
    Reset,
}

impl ChangeAction {
    /// Stable display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Remove => "Remove",
            Self::Replace => "Replace",
            Self::Move => "Move",
            Self::Reset => "Reset",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One "collection changed" notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionChange<T> {
    /// `items` were inserted, the first of them at `start_index`.
    Add { items: Vec<T>, start_index: usize },
    /// `items` were removed. Batch removals span several positions and carry
    /// no single index.
    Remove {
        items: Vec<T>,
        start_index: Option<usize>,
    },
    /// `old_items` were overwritten by `new_items`.
    Replace {
        new_items: Vec<T>,
        old_items: Vec<T>,
        index: Option<usize>,
    },
    /// `items` moved from `old_index` to `new_index`.
    Move {
        items: Vec<T>,
        old_index: usize,
        new_index: usize,
    },
    /// The whole collection must be re-read.
    Reset,
}

impl<T> CollectionChange<T> {
    #[must_use]
    pub fn action(&self) -> ChangeAction {
        match self {
            Self::Add { .. } => ChangeAction::Add,
            Self::Remove { .. } => ChangeAction::Remove,
            Self::Replace { .. } => ChangeAction::Replace,
            Self::Move { .. } => ChangeAction::Move,
            Self::Reset => ChangeAction::Reset,
        }
    }

    /// Items that entered the collection with this change.
    #[must_use]
    pub fn new_items(&self) -> &[T] {
        match self {
            Self::Add { items, .. } | Self::Move { items, .. } => items,
            Self::Replace { new_items, .. } => new_items,
            Self::Remove { .. } | Self::Reset => &[],
        }
    }

    /// Items that left the collection with this change.
    #[must_use]
    pub fn old_items(&self) -> &[T] {
        match self {
            Self::Remove { items, .. } | Self::Move { items, .. } => items,
            Self::Replace { old_items, .. } => old_items,
            Self::Add { .. } | Self::Reset => &[],
        }
    }

    /// Number of items this change describes (new side for adds and
    /// replacements, old side for removals). `Reset` reports zero.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Remove { items, .. } => items.len(),
            _ => self.new_items().len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Derived property that became stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyChange {
    /// The number of items.
    Count,
    /// The indexed item accessor.
    Items,
}

impl PropertyChange {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::Items => "Items",
        }
    }
}

impl fmt::Display for PropertyChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
