//! Identifier-indexed record tables.
//!
//! Identifiers are handed out sequentially from 0 and never reused, even
//! for the few record kinds that can be removed.

use std::collections::BTreeMap;

use crate::error::{ArcadeError, ArcadeResult};

/// Append-only table keyed by a monotonically assigned id.
#[derive(Clone, Debug)]
pub struct Registry<T> {
    entity: &'static str,
    next_id: u64,
    records: BTreeMap<u64, T>,
}

impl<T> Registry<T> {
    /// Create an empty table. `entity` names the record in `NotFound` errors.
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            next_id: 0,
            records: BTreeMap::new(),
        }
    }

    /// Identifier the next insert will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Insert a record built from its freshly assigned id.
    pub fn allocate(&mut self, build: impl FnOnce(u64) -> T) -> u64 {
        let id = self.next_id;
        self.records.insert(id, build(id));
        self.next_id += 1;
        id
    }

    /// Look up a record.
    pub fn get(&self, id: u64) -> Option<&T> {
        self.records.get(&id)
    }

    /// Look up a record or fail with `NotFound`.
    pub fn require(&self, id: u64) -> ArcadeResult<&T> {
        self.records
            .get(&id)
            .ok_or(ArcadeError::NotFound { entity: self.entity, id })
    }

    /// Mutable lookup or `NotFound`.
    pub fn require_mut(&mut self, id: u64) -> ArcadeResult<&mut T> {
        let entity = self.entity;
        self.records
            .get_mut(&id)
            .ok_or(ArcadeError::NotFound { entity, id })
    }

    /// Physically remove a record. The id stays burned.
    pub fn remove(&mut self, id: u64) -> ArcadeResult<T> {
        self.records
            .remove(&id)
            .ok_or(ArcadeError::NotFound { entity: self.entity, id })
    }

    /// Records in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &T)> {
        self.records.iter().map(|(id, record)| (*id, record))
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
