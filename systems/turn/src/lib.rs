#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn controller that owns a Sandsink world and advances it one actor step at a time.
//!
//! Each turn resolves the actor's step with the pure movement system and,
//! when legal, submits the resulting plan to the world. Illegal steps leave
//! every entity and the grid exactly as they were.

use log::{debug, info};
use sandsink_core::{
    CellCoord, CellRect, Command, Direction, Entity, EntityId, Event, Level, LevelError, MovePlan,
    MoveSet, Resolution,
};
use sandsink_system_movement::Movement;
use sandsink_world::{self as world, query, World};

/// Progress of the level currently loaded into a [`TurnController`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LevelPhase {
    /// The actor has not reached an exit yet; turns are processed.
    Playing,
    /// The actor stands on an exit; turns are ignored until another level is loaded.
    Completed,
}

/// Owns the world of one level at a time and processes actor turns.
///
/// A controller only exists once a level has been set up successfully, so
/// every turn runs against a valid world with exactly one actor.
#[derive(Debug)]
pub struct TurnController {
    world: World,
    movement: Movement,
    level: Level,
    phase: LevelPhase,
    turn_count: u32,
    events: Vec<Event>,
}

impl TurnController {
    /// Sets the level up in a fresh world.
    pub fn setup(level: Level) -> Result<Self, LevelError> {
        let mut world = World::new();
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::LoadLevel {
                level: level.clone(),
            },
            &mut events,
        );
        rejection(&events)?;

        let mut controller = Self {
            world,
            movement: Movement,
            level,
            phase: LevelPhase::Playing,
            turn_count: 0,
            events,
        };
        controller.refresh_phase();
        Ok(controller)
    }

    /// Tears the current level down and sets `level` up in the same world.
    ///
    /// Entity identifiers keep increasing across reloads. On error the
    /// current level stays loaded and untouched.
    pub fn reload(&mut self, level: Level) -> Result<(), LevelError> {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::LoadLevel {
                level: level.clone(),
            },
            &mut events,
        );
        rejection(&events)?;

        self.level = level;
        self.finish_load(events);
        Ok(())
    }

    /// Sets the current level up again from its initial layout.
    pub fn restart(&mut self) {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::LoadLevel {
                level: self.level.clone(),
            },
            &mut events,
        );
        debug!("restarted level {:?}", self.level.name());
        self.finish_load(events);
    }

    /// Resolves one actor step and applies it when legal.
    ///
    /// Returns the displacement of every entity that moved. An empty set
    /// means the step was illegal, or the level is already completed, and
    /// nothing changed.
    pub fn process_turn(&mut self, direction: Direction) -> MoveSet {
        self.events.clear();
        if self.phase == LevelPhase::Completed {
            debug!("ignoring {direction:?}: level already completed");
            return MoveSet::new();
        }

        let plan = match self.preview(direction) {
            Resolution::Legal(plan) if !plan.is_empty() => plan,
            Resolution::Legal(_) | Resolution::Illegal(_) => return MoveSet::new(),
        };
        let moves = plan.to_move_set();
        world::apply(&mut self.world, Command::ApplyMoves { plan }, &mut self.events);
        self.turn_count = self.turn_count.saturating_add(1);

        if self
            .events
            .iter()
            .any(|event| matches!(event, Event::LevelCompleted { .. }))
        {
            info!(
                "level {:?} completed after {} turns",
                self.level.name(),
                self.turn_count
            );
            self.phase = LevelPhase::Completed;
        }
        moves
    }

    /// Resolves one actor step without applying it.
    #[must_use]
    pub fn preview(&self, direction: Direction) -> Resolution {
        match query::actor(&self.world) {
            Some(actor) => {
                self.movement
                    .resolve(actor, direction, query::occupancy_view(&self.world))
            }
            None => Resolution::Legal(MovePlan::new()),
        }
    }

    /// Reports whether the actor shares its cell with an exit.
    #[must_use]
    pub fn check_level_completed(&self) -> bool {
        query::level_completed(&self.world)
    }

    /// Progress of the loaded level.
    #[must_use]
    pub fn phase(&self) -> LevelPhase {
        self.phase
    }

    /// Number of legal turns applied since the level was set up.
    #[must_use]
    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    /// Level the controller is playing, in its initial layout.
    #[must_use]
    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Events emitted by the world during the last turn or load.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Read-only access to the world for rendering.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Entities standing on the cell; empty outside the grid.
    pub fn occupants(&self, cell: CellCoord) -> impl Iterator<Item = &Entity> + '_ {
        query::occupancy_view(&self.world).occupants(cell)
    }

    /// Current extent of the grid.
    #[must_use]
    pub fn bounds(&self) -> CellRect {
        query::bounds(&self.world)
    }

    /// Minimal rectangle over every occupied cell.
    #[must_use]
    pub fn filled_extent(&self) -> CellRect {
        query::filled_extent(&self.world)
    }

    /// Iterates over every entity in ascending identifier order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        query::entities(&self.world)
    }

    /// Looks an entity up by identifier.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        query::entity(&self.world, id)
    }

    /// The level's actor.
    #[must_use]
    pub fn actor(&self) -> Option<&Entity> {
        query::actor(&self.world)
    }

    fn finish_load(&mut self, events: Vec<Event>) {
        self.events = events;
        self.turn_count = 0;
        self.refresh_phase();
    }

    fn refresh_phase(&mut self) {
        self.phase = if self.check_level_completed() {
            LevelPhase::Completed
        } else {
            LevelPhase::Playing
        };
    }
}

fn rejection(events: &[Event]) -> Result<(), LevelError> {
    match events.iter().find_map(|event| match event {
        Event::LevelRejected { reason } => Some(reason.clone()),
        _ => None,
    }) {
        Some(reason) => Err(reason),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(layers: &[&str]) -> Level {
        Level::from_layer_texts("unit", layers).expect("valid layers")
    }

    #[test]
    fn setup_rejects_invalid_levels() {
        let error = TurnController::setup(level(&["11\n11"])).expect_err("missing actor");
        assert_eq!(error, LevelError::MissingActor);
    }

    #[test]
    fn failed_reload_keeps_the_current_level() {
        let mut controller = TurnController::setup(level(&["111\n111", "200\n000"])).expect("setup");
        let _ = controller.process_turn(Direction::East);

        let error = controller
            .reload(level(&["11\n11", "22\n00"]))
            .expect_err("two actors");

        assert_eq!(error, LevelError::MultipleActors { count: 2 });
        assert_eq!(controller.turn_count(), 1);
        assert_eq!(
            controller.actor().map(Entity::position),
            Some(CellCoord::new(1, 0))
        );
    }

    #[test]
    fn restart_restores_the_initial_layout() {
        let mut controller = TurnController::setup(level(&["111\n111", "200\n000"])).expect("setup");
        let first_actor = controller.actor().map(Entity::id);
        assert!(!controller.process_turn(Direction::East).is_empty());

        controller.restart();

        assert_eq!(controller.turn_count(), 0);
        assert_eq!(
            controller.actor().map(Entity::position),
            Some(CellCoord::new(0, 0))
        );
        assert_ne!(controller.actor().map(Entity::id), first_actor);
    }

    #[test]
    fn actor_starting_on_an_exit_is_already_completed() {
        let controller = TurnController::setup(level(&["11\n11", "30\n00", "20\n00"])).expect("setup");
        assert_eq!(controller.phase(), LevelPhase::Completed);
    }
}
