//! Ordered, index-addressable containers used by the traversal.

use std::collections::VecDeque;

use crate::descriptor::SpecDirDescriptor;
use crate::entry::SpecFileInfo;
use crate::status::EnumErrorStatus;

/// Ordered sequence with bounds-checked peek-or-remove at any index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionIndexed<T> {
    items: VecDeque<T>,
}

/// Directory queue: traversal frontier, then the visited-directory result.
pub type CollectionDirs = CollectionIndexed<SpecDirDescriptor>;

/// Matched file records handed back to the caller.
pub type CollectionFiles = CollectionIndexed<SpecFileInfo>;

impl<T> Default for CollectionIndexed<T> {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }
}

impl<T: Clone> CollectionIndexed<T> {
    /// Return the element at `index`, removing it when `if_delete`.
    ///
    /// Bounds are checked before any mutation. Removing the head or tail is
    /// O(1); removing a middle element keeps the order of the remainder.
    pub fn peek_or_pop(&mut self, index: isize, if_delete: bool) -> (Option<T>, EnumErrorStatus) {
        let n_len = self.items.len();
        if n_len == 0 {
            return (None, EnumErrorStatus::CollectionEmpty);
        }
        if index < 0 || index as usize >= n_len {
            return (None, EnumErrorStatus::IndexOutOfBounds { index, len: n_len });
        }

        let idx = index as usize;
        if !if_delete {
            return (self.items.get(idx).cloned(), EnumErrorStatus::ErrorFree);
        }

        let item = if idx == 0 {
            self.items.pop_front()
        } else if idx == n_len - 1 {
            self.items.pop_back()
        } else {
            self.items.remove(idx)
        };
        match item {
            Some(v) => (Some(v), EnumErrorStatus::ErrorFree),
            None => (
                None,
                EnumErrorStatus::ProcessingFailure(format!(
                    "Element {idx} vanished from a collection of length {n_len}"
                )),
            ),
        }
    }

    /// Copy of the head element.
    pub fn peek_first(&mut self) -> (Option<T>, EnumErrorStatus) {
        self.peek_or_pop(0, false)
    }

    /// Copy of the tail element.
    pub fn peek_last(&mut self) -> (Option<T>, EnumErrorStatus) {
        let index = self.last_index();
        self.peek_or_pop(index, false)
    }

    /// Remove and return the head element.
    pub fn pop_first(&mut self) -> (Option<T>, EnumErrorStatus) {
        self.peek_or_pop(0, true)
    }

    /// Remove and return the tail element.
    pub fn pop_last(&mut self) -> (Option<T>, EnumErrorStatus) {
        let index = self.last_index();
        self.peek_or_pop(index, true)
    }

    fn last_index(&self) -> isize {
        self.items.len() as isize - 1
    }
}

impl<T> CollectionIndexed<T> {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the tail.
    pub fn push_back(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// Insert before position `index`; `index == len` appends.
    pub fn insert_at(&mut self, index: usize, item: T) -> EnumErrorStatus {
        let n_len = self.items.len();
        if index > n_len {
            return EnumErrorStatus::IndexOutOfBounds {
                index: index as isize,
                len: n_len,
            };
        }
        self.items.insert(index, item);
        EnumErrorStatus::ErrorFree
    }

    /// Append every element of `other`, preserving its order.
    pub fn extend_from(&mut self, other: Self) {
        self.items.extend(other.items);
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no element is held.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate from head to tail.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// Elements from head to tail.
    pub fn into_vec(self) -> Vec<T> {
        self.items.into()
    }
}

impl<T> FromIterator<T> for CollectionIndexed<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for CollectionIndexed<T> {
    type Item = T;
    type IntoIter = std::collections::vec_deque::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
