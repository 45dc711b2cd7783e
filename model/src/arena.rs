use std::ops::{Index, IndexMut};

use serde::Serialize;

use crate::Entity;

/// Handle to an [`Entity`] stored in an [`EntityArena`].
///
/// A handle is only meaningful for the arena that produced it; the IDL side
/// and the header side each own their own arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(usize);

impl EntityId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Flat, append-only owner of entities. Insertion order is preserved and is
/// the order every consumer iterates in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EntityArena {
    entities: Vec<Entity>,
}

impl EntityArena {
    pub fn new() -> Self {
        EntityArena { entities: Vec::new() }
    }

    pub fn push(&mut self, entity: Entity) -> EntityId {
        self.entities.push(entity);
        EntityId(self.entities.len() - 1)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> {
        (0..self.entities.len()).map(EntityId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().enumerate().map(|(i, e)| (EntityId(i), e))
    }

    /// First entity whose original name is exactly `name`.
    pub fn find(&self, name: &str) -> Option<EntityId> {
        self.iter().find(|(_, e)| e.original_name == name).map(|(id, _)| id)
    }

    /// First entity whose normalized name is `normalized`.
    pub fn find_by_normalized(&self, normalized: &str) -> Option<EntityId> {
        self.iter().find(|(_, e)| e.normalized_name == normalized).map(|(id, _)| id)
    }
}

impl Index<EntityId> for EntityArena {
    type Output = Entity;

    fn index(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }
}

impl IndexMut<EntityId> for EntityArena {
    fn index_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.0]
    }
}
