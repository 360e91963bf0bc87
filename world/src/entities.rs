//! Authoritative entity storage and identifier allocation.

use sandsink_core::{CellCoord, Entity, EntityId, TileKind};

/// Registry that stores entities ordered by identifier.
///
/// Identifiers are allocated monotonically and the counter survives
/// [`EntityRegistry::clear`], so an identifier is never handed out twice
/// during the lifetime of a world.
#[derive(Debug)]
pub(crate) struct EntityRegistry {
    entries: Vec<Entity>,
    next_entity_id: EntityId,
}

impl EntityRegistry {
    /// Creates an empty registry whose first identifier is `1`.
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_entity_id: EntityId::new(1),
        }
    }

    /// Creates an entity and returns its freshly allocated identifier.
    pub(crate) fn spawn(&mut self, kind: TileKind, position: CellCoord, layer: u8) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id = EntityId::new(id.get().saturating_add(1));
        self.entries.push(Entity::new(id, kind, position, layer));
        id
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entries
            .binary_search_by_key(&id, Entity::id)
            .ok()
            .and_then(|index| self.entries.get(index))
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entries
            .binary_search_by_key(&id, Entity::id)
            .ok()
            .and_then(|index| self.entries.get_mut(index))
    }

    /// Iterates over live entities in ascending identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entries.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drops every entity, returning how many were alive.
    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }
}
