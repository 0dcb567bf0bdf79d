//! Name -> integer handle table (attribute/uniform locations and the like).
//!
//! Lookups of names that were never registered report absence instead of
//! yielding a default handle, so nothing silently binds to location 0.

use std::collections::HashMap;

use crate::{CoreError, CoreResult};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HandleTable {
    entries: HashMap<String, u32>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) `name`. Returns the previous handle, if any.
    pub fn register(&mut self, name: impl Into<String>, handle: u32) -> Option<u32> {
        self.entries.insert(name.into(), handle)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<u32> {
        self.entries.get(name).copied()
    }

    /// Like [`HandleTable::get`] but turns a miss into [`CoreError::UnknownHandle`].
    pub fn require(&self, name: &str) -> CoreResult<u32> {
        self.get(name)
            .ok_or_else(|| CoreError::UnknownHandle(name.to_owned()))
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by handle (stable order for logging).
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        let mut pairs: Vec<(&str, u32)> = self
            .entries
            .iter()
            .map(|(name, &handle)| (name.as_str(), handle))
            .collect();
        pairs.sort_by_key(|&(name, handle)| (handle, name));
        pairs.into_iter()
    }
}
