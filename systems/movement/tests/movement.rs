use sandsink_core::{
    CellCoord, Command, Direction, Entity, EntityId, Event, Level, MoveRejection, Offset,
    PlannedMove, Resolution, TileKind,
};
use sandsink_system_movement::Movement;
use sandsink_world::{self as world, query, World};

const FLOOR: &str = "11111\n11111\n11111";
const ACTOR_AT_ONE_ONE: &str = "00000\n02000\n00000";

fn load(layers: &[&str]) -> World {
    let level = Level::from_layer_texts("movement", layers).expect("valid layers");
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(&mut world, Command::LoadLevel { level }, &mut events);
    assert!(
        matches!(events.as_slice(), [Event::LevelLoaded { .. }]),
        "unexpected load events: {events:?}"
    );
    world
}

fn resolve_east(world: &World) -> Resolution {
    let actor = query::actor(world).expect("actor present");
    Movement.resolve(actor, Direction::East, query::occupancy_view(world))
}

fn entity_at(world: &World, kind: TileKind, cell: CellCoord) -> EntityId {
    query::entities(world)
        .find(|entity| entity.kind() == kind && entity.position() == cell)
        .map(Entity::id)
        .expect("entity at cell")
}

fn actor_id(world: &World) -> EntityId {
    query::actor(world).expect("actor present").id()
}

fn step(columns: i32) -> PlannedMove {
    PlannedMove {
        displacement: Offset::new(columns, 0),
        sinks: false,
    }
}

#[test]
fn step_onto_floor_moves_only_the_actor() {
    let world = load(&[FLOOR, ACTOR_AT_ONE_ONE]);

    let resolution = resolve_east(&world);

    let plan = resolution.plan().expect("legal step");
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.get(actor_id(&world)), Some(step(1)));
}

#[test]
fn gap_is_jumped_when_the_far_cell_is_ground() {
    let world = load(&["11111\n11011\n11111", ACTOR_AT_ONE_ONE]);

    let resolution = resolve_east(&world);

    let plan = resolution.plan().expect("legal jump");
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.get(actor_id(&world)), Some(step(2)));
}

#[test]
fn jump_into_water_is_rejected() {
    let world = load(&["11111\n11001\n11111", ACTOR_AT_ONE_ONE]);

    assert_eq!(
        resolve_east(&world),
        Resolution::Illegal(MoveRejection::UnsafeLanding {
            cell: CellCoord::new(3, 1),
        })
    );
}

#[test]
fn jump_onto_standing_obstacles_is_rejected() {
    for obstacle in ["00000\n00050\n00000", "00000\n00040\n00000"] {
        let world = load(&["11111\n11011\n11111", obstacle, ACTOR_AT_ONE_ONE]);

        assert_eq!(
            resolve_east(&world),
            Resolution::Illegal(MoveRejection::UnsafeLanding {
                cell: CellCoord::new(3, 1),
            }),
            "obstacle layer {obstacle:?}"
        );
    }
}

#[test]
fn rock_blocks_the_actor() {
    let world = load(&[FLOOR, "00000\n00500\n00000", ACTOR_AT_ONE_ONE]);
    let rock = entity_at(&world, TileKind::Rock, CellCoord::new(2, 1));

    assert_eq!(
        resolve_east(&world),
        Resolution::Illegal(MoveRejection::Blocked {
            blocker: rock,
            cell: CellCoord::new(2, 1),
        })
    );
}

#[test]
fn crate_is_pushed_onto_floor_with_the_actor() {
    let world = load(&[FLOOR, "00000\n00400\n00000", ACTOR_AT_ONE_ONE]);
    let crate_id = entity_at(&world, TileKind::Crate, CellCoord::new(2, 1));

    let resolution = resolve_east(&world);

    let plan = resolution.plan().expect("legal push");
    assert_eq!(plan.len(), 2);
    assert_eq!(plan.get(crate_id), Some(step(1)));
    assert_eq!(plan.get(actor_id(&world)), Some(step(1)));
}

#[test]
fn crate_pushed_into_water_is_flagged_to_sink() {
    let world = load(&["11111\n11101\n11111", "00000\n00400\n00000", ACTOR_AT_ONE_ONE]);
    let crate_id = entity_at(&world, TileKind::Crate, CellCoord::new(2, 1));

    let resolution = resolve_east(&world);

    let plan = resolution.plan().expect("legal push");
    assert_eq!(
        plan.get(crate_id),
        Some(PlannedMove {
            displacement: Offset::new(1, 0),
            sinks: true,
        })
    );
    assert_eq!(plan.get(actor_id(&world)), Some(step(1)));
}

#[test]
fn crate_pushed_past_the_edge_sinks() {
    let world = load(&[FLOOR, "00000\n00004\n00000", "00000\n00020\n00000"]);
    let crate_id = entity_at(&world, TileKind::Crate, CellCoord::new(4, 1));

    let resolution = resolve_east(&world);

    let plan = resolution.plan().expect("legal push");
    assert_eq!(plan.get(crate_id).map(|planned| planned.sinks), Some(true));
}

#[test]
fn crate_against_rock_or_crate_is_blocked() {
    for (code, kind) in [('5', TileKind::Rock), ('4', TileKind::Crate)] {
        let standing = format!("00000\n004{code}0\n00000");
        let world = load(&[FLOOR, standing.as_str(), ACTOR_AT_ONE_ONE]);
        let blocker = entity_at(&world, kind, CellCoord::new(3, 1));

        assert_eq!(
            resolve_east(&world),
            Resolution::Illegal(MoveRejection::Blocked {
                blocker,
                cell: CellCoord::new(3, 1),
            })
        );
    }
}

#[test]
fn exit_is_walkable() {
    let world = load(&[FLOOR, "00000\n00300\n00000", ACTOR_AT_ONE_ONE]);

    assert!(resolve_east(&world).is_legal());
}

#[test]
fn entities_that_are_neither_actor_nor_pushable_are_immovable() {
    let world = load(&[FLOOR, "00000\n00000\n50000", ACTOR_AT_ONE_ONE]);
    let rock_id = entity_at(&world, TileKind::Rock, CellCoord::new(0, 2));
    let rock = query::entity(&world, rock_id).expect("rock present");

    assert_eq!(
        Movement.resolve(rock, Direction::North, query::occupancy_view(&world)),
        Resolution::Illegal(MoveRejection::Immovable { entity: rock_id })
    );
}

#[test]
fn resolving_leaves_the_world_untouched() {
    let world = load(&["11111\n11101\n11111", "00000\n00400\n00000", ACTOR_AT_ONE_ONE]);
    let snapshot: Vec<_> = query::entities(&world)
        .map(|entity| (entity.id(), entity.position(), entity.layer(), entity.is_pushable()))
        .collect();

    let first = resolve_east(&world);
    let second = resolve_east(&world);

    assert_eq!(first, second);
    let after: Vec<_> = query::entities(&world)
        .map(|entity| (entity.id(), entity.position(), entity.layer(), entity.is_pushable()))
        .collect();
    assert_eq!(snapshot, after);
    assert_eq!(
        query::bounds(&world),
        sandsink_core::CellRect::from_origin_and_size(
            CellCoord::new(0, 0),
            sandsink_core::CellRectSize::new(5, 3)
        )
    );
}
