#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure movement resolver that decides which entities a single actor step moves.

use log::debug;
use sandsink_core::{
    CellCoord, Direction, Entity, MovePlan, MoveRejection, Offset, Resolution,
};
use sandsink_world::query::OccupancyView;

/// Pure system that turns an actor step into a move plan or a rejection.
///
/// The resolver reads the occupancy view only; sink flags and
/// displacements travel back to the world inside the returned plan.
#[derive(Clone, Copy, Debug, Default)]
pub struct Movement;

impl Movement {
    /// Resolves one step of `actor` toward `direction`.
    ///
    /// Pushing recurses through pushable occupants of the target cell. Every
    /// entity recorded in the returned plan moves together or not at all.
    #[must_use]
    pub fn resolve(
        &self,
        actor: &Entity,
        direction: Direction,
        occupancy: OccupancyView<'_>,
    ) -> Resolution {
        let mut plan = MovePlan::new();
        let resolver = ChainResolver { occupancy };
        match resolver.resolve_entity(actor, direction.offset(), &mut plan) {
            Ok(()) => {
                debug!(
                    "actor {} moving {direction:?}: {} entities",
                    actor.id().get(),
                    plan.len()
                );
                Resolution::Legal(plan)
            }
            Err(rejection) => {
                debug!(
                    "actor {} moving {direction:?} rejected: {rejection:?}",
                    actor.id().get()
                );
                Resolution::Illegal(rejection)
            }
        }
    }
}

#[derive(Clone, Copy)]
struct ChainResolver<'a> {
    occupancy: OccupancyView<'a>,
}

impl ChainResolver<'_> {
    fn resolve_entity(
        &self,
        entity: &Entity,
        step: Offset,
        plan: &mut MovePlan,
    ) -> Result<(), MoveRejection> {
        if entity.is_actor() {
            self.resolve_actor(entity, step, plan)
        } else if entity.is_pushable() {
            self.resolve_pushed(entity, step, plan)
        } else {
            Err(MoveRejection::Immovable { entity: entity.id() })
        }
    }

    fn resolve_actor(
        &self,
        actor: &Entity,
        step: Offset,
        plan: &mut MovePlan,
    ) -> Result<(), MoveRejection> {
        let target = actor.position().offset_by(step);
        if self.occupancy.is_gap(target) {
            let jump = step.scaled(2);
            let landing = actor.position().offset_by(jump);
            if self.is_solid_ground(landing) {
                plan.record_move(actor.id(), jump);
                return Ok(());
            }
            return Err(MoveRejection::UnsafeLanding { cell: landing });
        }

        for occupant in self.occupancy.occupants(target) {
            if occupant.is_pushable() {
                self.resolve_entity(occupant, step, plan)?;
            } else if !occupant.is_walkable() {
                return Err(MoveRejection::Blocked {
                    blocker: occupant.id(),
                    cell: target,
                });
            }
        }
        plan.record_move(actor.id(), step);
        Ok(())
    }

    fn resolve_pushed(
        &self,
        entity: &Entity,
        step: Offset,
        plan: &mut MovePlan,
    ) -> Result<(), MoveRejection> {
        let target = entity.position().offset_by(step);
        if self.occupancy.is_gap(target) {
            plan.record_sink(entity.id(), step);
            return Ok(());
        }

        if let Some(blocker) = self
            .occupancy
            .occupants(target)
            .find(|occupant| !occupant.is_walkable())
        {
            return Err(MoveRejection::Blocked {
                blocker: blocker.id(),
                cell: target,
            });
        }
        plan.record_move(entity.id(), step);
        Ok(())
    }

    /// Non-empty cell whose occupants are all walkable.
    fn is_solid_ground(&self, cell: CellCoord) -> bool {
        !self.occupancy.is_gap(cell)
            && self
                .occupancy
                .occupants(cell)
                .all(|occupant| occupant.is_walkable())
    }
}
