#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Sandsink.

mod entities;
mod mutation;
mod occupancy;

use log::{info, warn};
use sandsink_core::{CellCoord, CellRectSize, Command, EntityId, Event, Level, TileKind};

use self::{entities::EntityRegistry, occupancy::OccupancyGrid};

/// Represents the authoritative Sandsink world state.
///
/// A world starts empty; [`Command::LoadLevel`] populates it. Every
/// mutation goes through [`apply`], every read through [`query`].
#[derive(Debug)]
pub struct World {
    level_name: Option<String>,
    entities: EntityRegistry,
    occupancy: OccupancyGrid,
    actor: Option<EntityId>,
}

impl World {
    /// Creates an empty world with no level loaded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            level_name: None,
            entities: EntityRegistry::new(),
            occupancy: OccupancyGrid::new(CellRectSize::new(0, 0)),
            actor: None,
        }
    }

    fn load_level(&mut self, level: Level, out_events: &mut Vec<Event>) {
        if let Err(reason) = level.validate() {
            warn!("rejected level {:?}: {reason}", level.name());
            out_events.push(Event::LevelRejected { reason });
            return;
        }

        if self.level_name.is_some() {
            self.clear_level(out_events);
        }

        self.occupancy = OccupancyGrid::new(level.size());
        for (layer_index, layer) in level.layers().iter().enumerate() {
            let layer_index = u8::try_from(layer_index).unwrap_or(u8::MAX);
            for (column, row, kind) in layer.tiles() {
                let (Ok(column), Ok(row)) = (i32::try_from(column), i32::try_from(row)) else {
                    continue;
                };
                let cell = CellCoord::new(column, row);
                let id = self.entities.spawn(kind, cell, layer_index);
                self.occupancy.add(cell, id);
                if kind == TileKind::Actor {
                    self.actor = Some(id);
                }
            }
        }

        let bounds = self.occupancy.bounds();
        info!(
            "loaded level {:?}: {} entities on a {}x{} grid",
            level.name(),
            self.entities.len(),
            bounds.size().width(),
            bounds.size().height()
        );
        self.level_name = Some(level.name().to_owned());
        out_events.push(Event::LevelLoaded {
            entities: self.entities.len(),
            bounds,
        });
    }

    fn clear_level(&mut self, out_events: &mut Vec<Event>) {
        let dropped = self.entities.clear();
        self.occupancy = OccupancyGrid::new(CellRectSize::new(0, 0));
        self.actor = None;
        if let Some(name) = self.level_name.take() {
            info!("cleared level {name:?} ({dropped} entities)");
        }
        out_events.push(Event::LevelCleared { entities: dropped });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadLevel { level } => world.load_level(level, out_events),
        Command::ApplyMoves { plan } => {
            mutation::apply_plan(&mut world.occupancy, &mut world.entities, &plan, out_events);
            if !plan.is_empty() && query::level_completed(world) {
                if let Some(actor) = world.actor {
                    info!("actor {} reached an exit", actor.get());
                    out_events.push(Event::LevelCompleted { actor });
                }
            }
        }
        Command::ClearLevel => world.clear_level(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{OccupancyGrid, World};
    use sandsink_core::{CellCoord, CellRect, Entity, EntityId, TileKind};

    use crate::entities::EntityRegistry;

    /// Name of the loaded level, if any.
    #[must_use]
    pub fn level_name(world: &World) -> Option<&str> {
        world.level_name.as_deref()
    }

    /// The actor of the loaded level.
    #[must_use]
    pub fn actor(world: &World) -> Option<&Entity> {
        world.actor.and_then(|id| world.entities.get(id))
    }

    /// Looks an entity up by identifier.
    #[must_use]
    pub fn entity(world: &World, id: EntityId) -> Option<&Entity> {
        world.entities.get(id)
    }

    /// Iterates over live entities in ascending identifier order.
    pub fn entities(world: &World) -> impl Iterator<Item = &Entity> {
        world.entities.iter()
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(world: &World) -> usize {
        world.entities.len()
    }

    /// Current logical extent of the occupancy grid.
    #[must_use]
    pub fn bounds(world: &World) -> CellRect {
        world.occupancy.bounds()
    }

    /// Minimal rectangle over every occupied cell; [`CellRect::EMPTY`] when nothing is placed.
    #[must_use]
    pub fn filled_extent(world: &World) -> CellRect {
        world.occupancy.filled_extent(|_| true)
    }

    /// Minimal rectangle over cells holding an occupant on one of the listed layers.
    #[must_use]
    pub fn filled_extent_of_layers(world: &World, layers: &[u8]) -> CellRect {
        world.occupancy.filled_extent(|id| {
            world
                .entities
                .get(id)
                .is_some_and(|entity| layers.contains(&entity.layer()))
        })
    }

    /// Reports whether the actor shares its cell with an exit.
    #[must_use]
    pub fn level_completed(world: &World) -> bool {
        actor(world).is_some_and(|actor| {
            occupancy_view(world)
                .occupants(actor.position())
                .any(|entity| entity.kind() == TileKind::Exit)
        })
    }

    /// Exposes a read-only view of the occupancy grid.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        OccupancyView {
            grid: &world.occupancy,
            entities: &world.entities,
        }
    }

    /// Read-only view joining the occupancy grid with entity records.
    #[derive(Clone, Copy, Debug)]
    pub struct OccupancyView<'a> {
        grid: &'a OccupancyGrid,
        entities: &'a EntityRegistry,
    }

    impl<'a> OccupancyView<'a> {
        /// Identifiers occupying the cell in insertion order; empty outside the grid.
        #[must_use]
        pub fn occupant_ids(&self, cell: CellCoord) -> &'a [EntityId] {
            let grid = self.grid;
            grid.get(cell)
        }

        /// Entities occupying the cell in insertion order; empty outside the grid.
        pub fn occupants(&self, cell: CellCoord) -> impl Iterator<Item = &'a Entity> + 'a {
            let entities = self.entities;
            self.occupant_ids(cell)
                .iter()
                .filter_map(move |id| entities.get(*id))
        }

        /// Reports whether the cell has no occupant at all.
        #[must_use]
        pub fn is_gap(&self, cell: CellCoord) -> bool {
            self.grid.get(cell).is_empty()
        }

        /// Looks an entity up by identifier.
        #[must_use]
        pub fn entity(&self, id: EntityId) -> Option<&'a Entity> {
            let entities = self.entities;
            entities.get(id)
        }

        /// Current logical extent of the grid.
        #[must_use]
        pub fn bounds(&self) -> CellRect {
            self.grid.bounds()
        }

        /// Iterates over every cell of the grid with its occupants, rows top to bottom.
        pub fn cells(&self) -> impl Iterator<Item = (CellCoord, &'a [EntityId])> + 'a {
            let grid = self.grid;
            grid.cells()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandsink_core::{CellRect, LevelError, MovePlan, Offset};

    fn level(layers: &[&str]) -> Level {
        Level::from_layer_texts("test", layers).expect("valid layer text")
    }

    fn loaded(layers: &[&str]) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::LoadLevel {
                level: level(layers),
            },
            &mut events,
        );
        assert!(matches!(events.last(), Some(Event::LevelLoaded { .. })));
        world
    }

    #[test]
    fn load_creates_one_entity_per_tile_and_layer() {
        let world = loaded(&["111\n111", "040\n003", "200\n000"]);

        assert_eq!(query::entity_count(&world), 9);
        assert_eq!(
            query::bounds(&world),
            CellRect::from_origin_and_size(CellCoord::new(0, 0), CellRectSize::new(3, 2))
        );

        let actor = query::actor(&world).expect("actor present");
        assert_eq!(actor.position(), CellCoord::new(0, 0));
        assert_eq!(actor.layer(), 2);

        let view = query::occupancy_view(&world);
        let kinds: Vec<_> = view
            .occupants(CellCoord::new(1, 0))
            .map(|entity| entity.kind())
            .collect();
        assert_eq!(kinds, vec![TileKind::Sand, TileKind::Crate]);
        for entity in query::entities(&world) {
            assert!(view.occupant_ids(entity.position()).contains(&entity.id()));
        }
    }

    #[test]
    fn layers_of_different_sizes_use_the_largest_extent() {
        let world = loaded(&["11", "0\n0\n2"]);
        assert_eq!(query::bounds(&world).size(), CellRectSize::new(2, 3));
    }

    #[test]
    fn invalid_level_is_rejected_without_touching_state() {
        let mut world = loaded(&["11\n11", "20\n00"]);
        let before: Vec<_> = query::entities(&world).map(|e| (e.id(), e.position())).collect();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::LoadLevel {
                level: level(&["11\n11"]),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::LevelRejected {
                reason: LevelError::MissingActor,
            }]
        );
        let after: Vec<_> = query::entities(&world).map(|e| (e.id(), e.position())).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn reloading_keeps_identifiers_unique() {
        let mut world = loaded(&["11", "20"]);
        let first_ids: Vec<_> = query::entities(&world).map(|e| e.id()).collect();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::LoadLevel {
                level: level(&["11", "02"]),
            },
            &mut events,
        );

        assert!(matches!(events.first(), Some(Event::LevelCleared { entities: 3 })));
        let second_ids: Vec<_> = query::entities(&world).map(|e| e.id()).collect();
        assert_eq!(second_ids.len(), 3);
        assert!(second_ids.iter().all(|id| !first_ids.contains(id)));
    }

    #[test]
    fn clear_level_drops_everything() {
        let mut world = loaded(&["11", "20"]);
        let mut events = Vec::new();

        apply(&mut world, Command::ClearLevel, &mut events);

        assert_eq!(events, vec![Event::LevelCleared { entities: 3 }]);
        assert_eq!(query::entity_count(&world), 0);
        assert!(query::actor(&world).is_none());
        assert_eq!(query::filled_extent(&world), CellRect::EMPTY);
        assert!(query::level_name(&world).is_none());
    }

    #[test]
    fn applying_moves_onto_exit_reports_completion() {
        let mut world = loaded(&["11", "03", "20"]);
        let actor = query::actor(&world).expect("actor").id();
        let mut plan = MovePlan::new();
        plan.record_move(actor, Offset::new(1, 0));
        let mut events = Vec::new();

        apply(&mut world, Command::ApplyMoves { plan }, &mut events);

        assert!(query::level_completed(&world));
        assert_eq!(events.last(), Some(&Event::LevelCompleted { actor }));
    }

    #[test]
    fn filled_extent_can_be_limited_to_layers() {
        let world = loaded(&["110\n000", "000\n004", "200\n000"]);

        let everything = query::filled_extent(&world);
        assert_eq!(everything.size(), CellRectSize::new(3, 2));

        let ground = query::filled_extent_of_layers(&world, &[0]);
        assert_eq!(ground.origin(), CellCoord::new(0, 0));
        assert_eq!(ground.size(), CellRectSize::new(2, 1));
    }

    #[test]
    fn occupancy_view_reports_gaps() {
        let world = loaded(&["10", "20"]);
        let view = query::occupancy_view(&world);

        assert!(!view.is_gap(CellCoord::new(0, 0)));
        assert!(view.is_gap(CellCoord::new(1, 0)));
        assert!(view.is_gap(CellCoord::new(-3, 9)));
        assert_eq!(view.occupants(CellCoord::new(99, 0)).count(), 0);
    }
}
