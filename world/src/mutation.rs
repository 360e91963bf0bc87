//! Applies resolved move plans to the occupancy grid.

use log::debug;
use sandsink_core::{CellCoord, Event, EntityId, MovePlan, Offset, PlannedMove};

use crate::{entities::EntityRegistry, occupancy::OccupancyGrid};

/// Moves every entity in `plan`, growing and renormalizing the grid first when required.
///
/// Events are pushed in a fixed order: an optional `GridResized`, one
/// `EntityMoved` per entry in ascending identifier order, then one
/// `EntitySank` per entity that sank.
///
/// # Panics
///
/// Panics before touching any state when the plan names an entity that is
/// not alive in the registry.
pub(crate) fn apply_plan(
    grid: &mut OccupancyGrid,
    entities: &mut EntityRegistry,
    plan: &MovePlan,
    out_events: &mut Vec<Event>,
) {
    if plan.is_empty() {
        return;
    }

    let departures: Vec<(EntityId, CellCoord, PlannedMove)> = plan
        .iter()
        .map(|(id, planned)| {
            let Some(entity) = entities.get(id) else {
                panic!("move plan references unknown entity {}", id.get());
            };
            (id, entity.position(), planned)
        })
        .collect();

    for (id, from, _) in &departures {
        grid.remove(*from, *id);
    }

    let previous = grid.bounds();
    let required = departures
        .iter()
        .fold(previous, |bounds, (_, from, planned)| {
            bounds.including(from.offset_by(planned.displacement))
        });

    let shift = if required == previous {
        Offset::ZERO
    } else {
        grid.resize(required, entities);
        let shift = CellCoord::new(0, 0).offset_from(required.origin());
        debug!(
            "grid grew from {}x{} to {}x{}, coordinates shifted by {shift:?}",
            previous.size().width(),
            previous.size().height(),
            required.size().width(),
            required.size().height()
        );
        out_events.push(Event::GridResized {
            previous,
            current: grid.bounds(),
            shift,
        });
        shift
    };

    let mut sunk = Vec::new();
    for (id, from, planned) in departures {
        let to = from.offset_by(planned.displacement).offset_by(shift);
        grid.add(to, id);
        let Some(entity) = entities.get_mut(id) else {
            continue;
        };
        entity.relocate(to);
        out_events.push(Event::EntityMoved {
            entity: id,
            from,
            to,
            displacement: planned.displacement,
        });
        if planned.sinks {
            entity.sink();
            sunk.push(Event::EntitySank {
                entity: id,
                layer: entity.layer(),
            });
        }
    }
    out_events.extend(sunk);
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandsink_core::{CellRect, CellRectSize, TileKind};

    struct Fixture {
        grid: OccupancyGrid,
        entities: EntityRegistry,
    }

    impl Fixture {
        fn new(size: CellRectSize) -> Self {
            Self {
                grid: OccupancyGrid::new(size),
                entities: EntityRegistry::new(),
            }
        }

        fn place(&mut self, kind: TileKind, cell: CellCoord) -> EntityId {
            let id = self.entities.spawn(kind, cell, kind.default_layer());
            self.grid.add(cell, id);
            id
        }

        fn position(&self, id: EntityId) -> CellCoord {
            self.entities.get(id).expect("entity alive").position()
        }
    }

    #[test]
    fn moves_within_bounds_keep_the_frame() {
        let mut fixture = Fixture::new(CellRectSize::new(3, 1));
        let actor = fixture.place(TileKind::Actor, CellCoord::new(0, 0));
        let mut plan = MovePlan::new();
        plan.record_move(actor, Offset::new(1, 0));
        let mut events = Vec::new();

        apply_plan(&mut fixture.grid, &mut fixture.entities, &plan, &mut events);

        assert_eq!(fixture.position(actor), CellCoord::new(1, 0));
        assert!(fixture.grid.get(CellCoord::new(0, 0)).is_empty());
        assert_eq!(fixture.grid.get(CellCoord::new(1, 0)), &[actor]);
        assert_eq!(
            events,
            vec![Event::EntityMoved {
                entity: actor,
                from: CellCoord::new(0, 0),
                to: CellCoord::new(1, 0),
                displacement: Offset::new(1, 0),
            }]
        );
    }

    #[test]
    fn destination_before_origin_shifts_every_entity() {
        let mut fixture = Fixture::new(CellRectSize::new(2, 1));
        let crate_id = fixture.place(TileKind::Crate, CellCoord::new(0, 0));
        let sand = fixture.place(TileKind::Sand, CellCoord::new(1, 0));
        let mut plan = MovePlan::new();
        plan.record_sink(crate_id, Offset::new(-1, 0));
        let mut events = Vec::new();

        apply_plan(&mut fixture.grid, &mut fixture.entities, &plan, &mut events);

        assert_eq!(fixture.grid.bounds().size(), CellRectSize::new(3, 1));
        assert_eq!(fixture.position(crate_id), CellCoord::new(0, 0));
        assert_eq!(fixture.position(sand), CellCoord::new(2, 0));
        assert_eq!(fixture.grid.get(CellCoord::new(0, 0)), &[crate_id]);
        assert_eq!(fixture.grid.get(CellCoord::new(2, 0)), &[sand]);

        let sunk = fixture.entities.get(crate_id).expect("crate alive");
        assert!(sunk.is_walkable());
        assert!(!sunk.is_pushable());
        assert_eq!(sunk.layer(), 0);

        assert_eq!(
            events.first(),
            Some(&Event::GridResized {
                previous: CellRect::from_origin_and_size(
                    CellCoord::new(0, 0),
                    CellRectSize::new(2, 1)
                ),
                current: CellRect::from_origin_and_size(
                    CellCoord::new(0, 0),
                    CellRectSize::new(3, 1)
                ),
                shift: Offset::new(1, 0),
            })
        );
        assert!(matches!(events.last(), Some(Event::EntitySank { layer: 0, .. })));
    }

    #[test]
    fn destination_past_far_edge_grows_without_shift() {
        let mut fixture = Fixture::new(CellRectSize::new(2, 2));
        let crate_id = fixture.place(TileKind::Crate, CellCoord::new(1, 1));
        let mut plan = MovePlan::new();
        plan.record_sink(crate_id, Offset::new(0, 1));
        let mut events = Vec::new();

        apply_plan(&mut fixture.grid, &mut fixture.entities, &plan, &mut events);

        assert_eq!(fixture.grid.bounds().size(), CellRectSize::new(2, 3));
        assert_eq!(fixture.position(crate_id), CellCoord::new(1, 2));
        assert!(matches!(
            events.first(),
            Some(Event::GridResized { shift, .. }) if shift.is_zero()
        ));
    }

    #[test]
    #[should_panic(expected = "unknown entity")]
    fn unknown_entities_are_rejected() {
        let mut fixture = Fixture::new(CellRectSize::new(1, 1));
        let mut plan = MovePlan::new();
        plan.record_move(EntityId::new(42), Offset::new(1, 0));
        let mut events = Vec::new();

        apply_plan(&mut fixture.grid, &mut fixture.entities, &plan, &mut events);
    }
}
