//! Dense, growable index from grid cells to the entities standing on them.

use sandsink_core::{CellCoord, CellRect, CellRectSize, EntityId};

use crate::entities::EntityRegistry;

/// Row-major grid of occupant lists covering `[0, columns) × [0, rows)`.
///
/// Occupants keep their insertion order. Storage is reallocated only by
/// [`OccupancyGrid::resize`], which also rewrites the positions of every
/// entity it re-homes.
#[derive(Clone, Debug)]
pub(crate) struct OccupancyGrid {
    columns: u32,
    rows: u32,
    cells: Vec<Vec<EntityId>>,
}

impl OccupancyGrid {
    pub(crate) fn new(size: CellRectSize) -> Self {
        let capacity = usize::try_from(size.area()).unwrap_or(0);
        Self {
            columns: size.width(),
            rows: size.height(),
            cells: vec![Vec::new(); capacity],
        }
    }

    /// Current logical extent; the origin is always the zero cell.
    pub(crate) fn bounds(&self) -> CellRect {
        CellRect::from_origin_and_size(
            CellCoord::new(0, 0),
            CellRectSize::new(self.columns, self.rows),
        )
    }

    /// Occupants of the cell. Cells outside the bounds are empty.
    pub(crate) fn get(&self, cell: CellCoord) -> &[EntityId] {
        self.index(cell)
            .and_then(|index| self.cells.get(index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn add(&mut self, cell: CellCoord, entity: EntityId) {
        debug_assert!(
            self.bounds().contains(cell),
            "entity {} added outside the grid at {cell:?}",
            entity.get()
        );
        if let Some(occupants) = self.index(cell).and_then(|index| self.cells.get_mut(index)) {
            occupants.push(entity);
        }
    }

    pub(crate) fn remove(&mut self, cell: CellCoord, entity: EntityId) {
        if let Some(occupants) = self.index(cell).and_then(|index| self.cells.get_mut(index)) {
            occupants.retain(|occupant| *occupant != entity);
        }
    }

    /// Grows storage to cover `bounds`, expressed in the current frame.
    ///
    /// Every occupant is re-homed relative to `bounds.origin()`, which
    /// becomes the new zero cell, and its recorded position is updated in
    /// `entities`. `bounds` must contain the current extent.
    pub(crate) fn resize(&mut self, bounds: CellRect, entities: &mut EntityRegistry) {
        debug_assert!(
            bounds.contains_rect(&self.bounds()),
            "grid may only grow: {bounds:?} does not cover {:?}",
            self.bounds()
        );

        let origin = bounds.origin();
        let mut resized = Self::new(bounds.size());
        let old_columns = self.columns.max(1);
        for (index, occupants) in std::mem::take(&mut self.cells).into_iter().enumerate() {
            if occupants.is_empty() {
                continue;
            }
            let Some(old_cell) = cell_at(index, old_columns) else {
                continue;
            };
            let new_cell = CellCoord::new(
                old_cell.column() - origin.column(),
                old_cell.row() - origin.row(),
            );
            for id in &occupants {
                if let Some(entity) = entities.get_mut(*id) {
                    entity.relocate(new_cell);
                }
            }
            if let Some(slot) = resized
                .index(new_cell)
                .and_then(|new_index| resized.cells.get_mut(new_index))
            {
                *slot = occupants;
            }
        }

        *self = resized;
    }

    /// Minimal rectangle over cells holding at least one occupant accepted by `include`.
    ///
    /// Returns [`CellRect::EMPTY`] when no occupant matches.
    pub(crate) fn filled_extent<F>(&self, mut include: F) -> CellRect
    where
        F: FnMut(EntityId) -> bool,
    {
        let columns = self.columns.max(1);
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, occupants)| occupants.iter().any(|id| include(*id)))
            .filter_map(|(index, _)| cell_at(index, columns))
            .fold(CellRect::EMPTY, CellRect::including)
    }

    /// Iterates over every cell with its occupants, rows top to bottom.
    pub(crate) fn cells(&self) -> impl Iterator<Item = (CellCoord, &[EntityId])> + '_ {
        let columns = self.columns.max(1);
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(index, occupants)| {
                cell_at(index, columns).map(|cell| (cell, occupants.as_slice()))
            })
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let column = u32::try_from(cell.column()).ok()?;
        let row = u32::try_from(cell.row()).ok()?;
        if column < self.columns && row < self.rows {
            let row = usize::try_from(row).ok()?;
            let column = usize::try_from(column).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

fn cell_at(index: usize, columns: u32) -> Option<CellCoord> {
    let index = u32::try_from(index).ok()?;
    let column = i32::try_from(index % columns).ok()?;
    let row = i32::try_from(index / columns).ok()?;
    Some(CellCoord::new(column, row))
}
