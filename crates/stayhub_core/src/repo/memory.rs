//! Map-backed repository used for tests and early prototypes.
//!
//! # Responsibility
//! - Realize the full `Repository` contract over an in-process map.
//! - Preserve insertion order for `get_all` and attribute scans.
//!
//! # Invariants
//! - `entries` and `order` always hold the same id set.
//! - Overwriting an existing id keeps its original insertion position.

use crate::model::entity::{AttrValue, Entity, EntityId};
use crate::repo::{RepoResult, Repository};
use std::collections::HashMap;

/// In-memory realization of the repository contract.
///
/// Lookup by id is O(1); attribute lookup is a linear scan in insertion
/// order, which makes "first inserted wins" deterministic for uniqueness
/// checks.
#[derive(Debug, Default)]
pub struct InMemoryRepository<T: Entity> {
    entries: HashMap<EntityId, T>,
    order: Vec<EntityId>,
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    fn add(&mut self, entity: T) -> RepoResult<()> {
        let id = entity.id();
        if self.entries.insert(id, entity).is_none() {
            self.order.push(id);
        }
        Ok(())
    }

    fn get(&self, id: EntityId) -> RepoResult<Option<T>> {
        Ok(self.entries.get(&id).cloned())
    }

    fn get_all(&self) -> RepoResult<Vec<T>> {
        Ok(self
            .order
            .iter()
            .filter_map(|id| self.entries.get(id).cloned())
            .collect())
    }

    fn update(&mut self, id: EntityId, patch: &T::Patch) -> RepoResult<Option<T>> {
        let Some(stored) = self.entries.get(&id) else {
            return Ok(None);
        };

        // Patch a clone so a rejected field leaves the stored entity intact.
        let mut updated = stored.clone();
        updated.apply_patch(patch)?;
        updated.meta_mut().touch();
        self.entries.insert(id, updated.clone());
        Ok(Some(updated))
    }

    fn delete(&mut self, id: EntityId) -> RepoResult<bool> {
        if self.entries.remove(&id).is_none() {
            return Ok(false);
        }
        self.order.retain(|stored| *stored != id);
        Ok(true)
    }

    fn get_by_attribute(&self, name: &str, value: &AttrValue) -> RepoResult<Option<T>> {
        Ok(self
            .order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .find(|entity| entity.attribute(name).as_ref() == Some(value))
            .cloned())
    }
}
