//! Registry - the ordered set of monitored entities of one kind.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::Entity;

/// An ordered sequence of entities, unique by [`Entity::key`].
///
/// Order is exactly the order the service returned; nothing is re-sorted
/// on the client side.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Registry<E> {
    entities: Vec<E>,
}

impl<E> Default for Registry<E> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
        }
    }
}

impl<E: Entity> Registry<E> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True if the registry holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Look up an entity by key.
    pub fn get(&self, key: &str) -> Option<&E> {
        self.entities.iter().find(|e| e.key() == key)
    }

    /// Look up an entity by key for in-place update.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut E> {
        self.entities.iter_mut().find(|e| e.key() == key)
    }

    /// Iterate in service order.
    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.entities.iter()
    }

    /// Keys in service order.
    pub fn keys(&self) -> Vec<String> {
        self.entities.iter().map(|e| e.key().to_string()).collect()
    }
}

impl<E: Entity> TryFrom<Vec<E>> for Registry<E> {
    type Error = DuplicateKey;

    fn try_from(entities: Vec<E>) -> Result<Self, Self::Error> {
        let mut seen = HashSet::with_capacity(entities.len());
        for entity in &entities {
            if !seen.insert(entity.key()) {
                return Err(DuplicateKey {
                    kind: E::KIND,
                    field: E::KEY_FIELD,
                    key: entity.key().to_string(),
                });
            }
        }
        Ok(Self { entities })
    }
}

impl<'a, E> IntoIterator for &'a Registry<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

/// A list response named the same entity twice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("duplicate {kind} {field} '{key}' in registry")]
pub struct DuplicateKey {
    pub kind: &'static str,
    pub field: &'static str,
    pub key: String,
}
