//! core::relationship
//!
//! Typed relationships between two owners and the store contract the
//! renumbering pass uses to keep relationship places in sync with
//! relationship-derived metadata.
//!
//! A relationship has a left and a right item, each with its own place.
//! The place on a side is the position of the derived value among the
//! same-field values of the owner on that side.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{OwnerId, RelationshipId};

/// Errors from relationship storage.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelationshipError {
    #[error("relationship {0} does not exist")]
    NotFound(RelationshipId),

    #[error("relationship {0} already exists")]
    Duplicate(RelationshipId),
}

/// Which end of a relationship an owner sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// A typed relationship between two items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub left_item: OwnerId,
    pub right_item: OwnerId,
    pub left_place: u32,
    pub right_place: u32,
    #[serde(rename = "type")]
    pub relationship_type: String,
}

impl Relationship {
    pub fn new(
        id: RelationshipId,
        relationship_type: impl Into<String>,
        left_item: OwnerId,
        right_item: OwnerId,
    ) -> Self {
        Self {
            id,
            left_item,
            right_item,
            left_place: 0,
            right_place: 0,
            relationship_type: relationship_type.into(),
        }
    }

    /// The side `owner` is on. An owner that is not the left item is
    /// treated as the right item.
    pub fn side_of(&self, owner: OwnerId) -> Side {
        if self.left_item == owner {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// The owner on the opposite side of `owner`.
    pub fn other(&self, owner: OwnerId) -> OwnerId {
        match self.side_of(owner) {
            Side::Left => self.right_item,
            Side::Right => self.left_item,
        }
    }

    pub fn place(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left_place,
            Side::Right => self.right_place,
        }
    }

    pub fn set_place(&mut self, side: Side, place: u32) {
        match side {
            Side::Left => self.left_place = place,
            Side::Right => self.right_place = place,
        }
    }
}

/// Relationship persistence as seen by the metadata engine.
pub trait RelationshipStore {
    /// Look a relationship up. Absence is not an error.
    fn find(&self, id: RelationshipId) -> Option<Relationship>;

    /// Persist a changed relationship.
    fn update(&mut self, relationship: &Relationship) -> Result<(), RelationshipError>;
}

/// Relationship store held in memory, ordered by id.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRelationshipStore {
    relationships: BTreeMap<RelationshipId, Relationship>,
}

impl InMemoryRelationshipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new relationship.
    ///
    /// # Errors
    ///
    /// Returns [`RelationshipError::Duplicate`] if the id is taken.
    pub fn insert(&mut self, relationship: Relationship) -> Result<(), RelationshipError> {
        if self.relationships.contains_key(&relationship.id) {
            return Err(RelationshipError::Duplicate(relationship.id));
        }
        self.relationships.insert(relationship.id, relationship);
        Ok(())
    }

    pub fn remove(&mut self, id: RelationshipId) -> Option<Relationship> {
        self.relationships.remove(&id)
    }

    pub fn get(&self, id: RelationshipId) -> Option<&Relationship> {
        self.relationships.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    /// Relationships that have `owner` on either side.
    pub fn involving(&self, owner: OwnerId) -> Vec<&Relationship> {
        self.relationships
            .values()
            .filter(|r| r.left_item == owner || r.right_item == owner)
            .collect()
    }
}

impl RelationshipStore for InMemoryRelationshipStore {
    fn find(&self, id: RelationshipId) -> Option<Relationship> {
        self.relationships.get(&id).cloned()
    }

    fn update(&mut self, relationship: &Relationship) -> Result<(), RelationshipError> {
        match self.relationships.get_mut(&relationship.id) {
            Some(existing) => {
                *existing = relationship.clone();
                Ok(())
            }
            None => Err(RelationshipError::NotFound(relationship.id)),
        }
    }
}
