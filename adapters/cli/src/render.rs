//! Plain-text rendering of the occupancy grid.

use sandsink_core::{CellCoord, Entity, TileKind};
use sandsink_world::{query, World};

const WATER: char = '~';

/// Draws the grid row by row, one character per cell.
///
/// Each cell shows its top-most occupant; cells without occupants are water.
#[must_use]
pub(crate) fn render(world: &World) -> String {
    let view = query::occupancy_view(world);
    let bounds = view.bounds();
    let mut text = String::new();
    for row in bounds.origin().row()..bounds.end_row() {
        for column in bounds.origin().column()..bounds.end_column() {
            let glyph = view
                .occupants(CellCoord::new(column, row))
                .max_by_key(|entity| entity.layer())
                .map_or(WATER, glyph);
            text.push(glyph);
        }
        text.push('\n');
    }
    text
}

fn glyph(entity: &Entity) -> char {
    match entity.kind() {
        TileKind::Sand => '.',
        TileKind::Waterlily => 'o',
        TileKind::Exit => '>',
        TileKind::Crate if entity.is_pushable() => '#',
        TileKind::Crate => '_',
        TileKind::Rock => 'A',
        TileKind::Actor => '@',
    }
}
