#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Sandsink engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! changed. Systems such as the movement resolver only read world state and
//! answer with plans that travel back to the world inside commands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest level footprint accepted when loading or saving level files.
pub const MIN_LEVEL_SIZE: CellRectSize = CellRectSize::new(2, 2);

/// Largest level footprint accepted when loading or saving level files.
pub const MAX_LEVEL_SIZE: CellRectSize = CellRectSize::new(30, 30);

/// Maximum number of layers a level may describe, bounded by the layer index width.
pub const MAX_LAYERS: usize = 256;

/// Closed set of tiles that may appear in a level layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileKind {
    /// Dry ground that the actor can walk on.
    Sand,
    /// The single player-controlled entity.
    Actor,
    /// Goal tile that completes the level once the actor stands on it.
    Exit,
    /// Block that the actor can push and that sinks into water.
    Crate,
    /// Immovable obstacle.
    Rock,
    /// Floating pad that behaves like ground.
    Waterlily,
}

impl TileKind {
    /// Every tile kind in code order.
    pub const ALL: [TileKind; 6] = [
        TileKind::Sand,
        TileKind::Actor,
        TileKind::Exit,
        TileKind::Crate,
        TileKind::Rock,
        TileKind::Waterlily,
    ];

    /// Numeric code used by the level text format. `0` is reserved for an empty cell.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Sand => 1,
            Self::Actor => 2,
            Self::Exit => 3,
            Self::Crate => 4,
            Self::Rock => 5,
            Self::Waterlily => 6,
        }
    }

    /// Resolves a numeric code back into a tile kind. Returns `None` for `0` and unknown codes.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Sand),
            2 => Some(Self::Actor),
            3 => Some(Self::Exit),
            4 => Some(Self::Crate),
            5 => Some(Self::Rock),
            6 => Some(Self::Waterlily),
            _ => None,
        }
    }

    /// Reports whether freshly created entities of this kind can be pushed.
    #[must_use]
    pub const fn is_initially_pushable(self) -> bool {
        matches!(self, Self::Crate)
    }

    /// Reports whether freshly created entities of this kind can be walked onto.
    #[must_use]
    pub const fn is_initially_walkable(self) -> bool {
        matches!(self, Self::Sand | Self::Exit | Self::Waterlily)
    }

    /// Layer the level editor paints this kind onto.
    ///
    /// Ground sits on the background layer, obstacles and goals on the
    /// standing layer, and the actor above everything else.
    #[must_use]
    pub const fn default_layer(self) -> u8 {
        match self {
            Self::Sand | Self::Waterlily => 0,
            Self::Exit | Self::Crate | Self::Rock => 1,
            Self::Actor => 2,
        }
    }
}

/// Unique identifier assigned to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as signed column and row coordinates.
///
/// Coordinates are signed because move destinations may fall before the
/// grid origin until the world renormalizes them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the cell reached by applying the provided offset.
    #[must_use]
    pub const fn offset_by(self, offset: Offset) -> Self {
        Self {
            column: self.column + offset.columns(),
            row: self.row + offset.rows(),
        }
    }

    /// Offset that leads from `origin` to this cell.
    #[must_use]
    pub const fn offset_from(self, origin: CellCoord) -> Offset {
        Offset::new(self.column - origin.column, self.row - origin.row)
    }
}

/// Signed displacement between two cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset {
    columns: i32,
    rows: i32,
}

impl Offset {
    /// Displacement that leaves a cell unchanged.
    pub const ZERO: Offset = Offset::new(0, 0);

    /// Creates a displacement from column and row deltas.
    #[must_use]
    pub const fn new(columns: i32, rows: i32) -> Self {
        Self { columns, rows }
    }

    /// Column delta.
    #[must_use]
    pub const fn columns(&self) -> i32 {
        self.columns
    }

    /// Row delta.
    #[must_use]
    pub const fn rows(&self) -> i32 {
        self.rows
    }

    /// Multiplies both deltas by `factor`.
    #[must_use]
    pub const fn scaled(self, factor: i32) -> Self {
        Self::new(self.columns * factor, self.rows * factor)
    }

    /// Returns the displacement pointing the other way.
    #[must_use]
    pub const fn negated(self) -> Self {
        Self::new(-self.columns, -self.rows)
    }

    /// Reports whether the displacement is zero on both axes.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.columns == 0 && self.rows == 0
    }
}

/// Cardinal directions available to the actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in clockwise order starting north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Unit displacement associated with the direction.
    #[must_use]
    pub const fn offset(self) -> Offset {
        match self {
            Self::North => Offset::new(0, -1),
            Self::East => Offset::new(1, 0),
            Self::South => Offset::new(0, 1),
            Self::West => Offset::new(-1, 0),
        }
    }

    /// Maps an axis-aligned unit displacement back onto a direction.
    ///
    /// The zero offset ("no input") and anything that is not a unit step
    /// yield `None`.
    #[must_use]
    pub const fn from_offset(offset: Offset) -> Option<Self> {
        match (offset.columns(), offset.rows()) {
            (0, -1) => Some(Self::North),
            (1, 0) => Some(Self::East),
            (0, 1) => Some(Self::South),
            (-1, 0) => Some(Self::West),
            _ => None,
        }
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Degenerate rectangle anchored at the zero cell.
    pub const EMPTY: CellRect =
        CellRect::from_origin_and_size(CellCoord::new(0, 0), CellRectSize::new(0, 0));

    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Smallest rectangle containing exactly the provided cell.
    #[must_use]
    pub const fn around_cell(cell: CellCoord) -> Self {
        Self::from_origin_and_size(cell, CellRectSize::new(1, 1))
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Column one past the right edge.
    #[must_use]
    pub const fn end_column(&self) -> i32 {
        self.origin.column() + self.size.width() as i32
    }

    /// Row one past the bottom edge.
    #[must_use]
    pub const fn end_row(&self) -> i32 {
        self.origin.row() + self.size.height() as i32
    }

    /// Reports whether the rectangle covers no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size.width() == 0 || self.size.height() == 0
    }

    /// Reports whether the cell lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() >= self.origin.column()
            && cell.row() >= self.origin.row()
            && cell.column() < self.end_column()
            && cell.row() < self.end_row()
    }

    /// Reports whether every cell of `other` lies inside this rectangle.
    ///
    /// Empty rectangles are contained by everything.
    #[must_use]
    pub const fn contains_rect(&self, other: &CellRect) -> bool {
        other.is_empty()
            || (other.origin.column() >= self.origin.column()
                && other.origin.row() >= self.origin.row()
                && other.end_column() <= self.end_column()
                && other.end_row() <= self.end_row())
    }

    /// Smallest rectangle covering both this rectangle and the provided cell.
    #[must_use]
    pub fn including(self, cell: CellCoord) -> Self {
        self.union(&Self::around_cell(cell))
    }

    /// Smallest rectangle covering both rectangles. Empty inputs are ignored.
    #[must_use]
    pub fn union(self, other: &CellRect) -> Self {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return *other;
        }

        let min_column = self.origin.column().min(other.origin.column());
        let min_row = self.origin.row().min(other.origin.row());
        let max_column = self.end_column().max(other.end_column());
        let max_row = self.end_row().max(other.end_row());

        Self::from_origin_and_size(
            CellCoord::new(min_column, min_row),
            CellRectSize::new(
                max_column.abs_diff(min_column),
                max_row.abs_diff(min_row),
            ),
        )
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of cells covered.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Single occupant of one grid cell.
///
/// Entities compare, order and hash by identifier alone, so two distinct
/// entities never collide even when every other field matches.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    kind: TileKind,
    position: CellCoord,
    layer: u8,
    pushable: bool,
    walkable: bool,
}

impl Entity {
    /// Creates an entity whose capability flags follow its kind.
    #[must_use]
    pub const fn new(id: EntityId, kind: TileKind, position: CellCoord, layer: u8) -> Self {
        Self {
            id,
            kind,
            position,
            layer,
            pushable: kind.is_initially_pushable(),
            walkable: kind.is_initially_walkable(),
        }
    }

    /// Identifier allocated by the world.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Tile kind the entity was created from.
    #[must_use]
    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    /// Cell currently occupied by the entity.
    #[must_use]
    pub const fn position(&self) -> CellCoord {
        self.position
    }

    /// Stacking layer; `0` is the sunk background plane.
    #[must_use]
    pub const fn layer(&self) -> u8 {
        self.layer
    }

    /// Reports whether the entity can be pushed.
    #[must_use]
    pub const fn is_pushable(&self) -> bool {
        self.pushable
    }

    /// Reports whether the entity can be walked onto.
    #[must_use]
    pub const fn is_walkable(&self) -> bool {
        self.walkable
    }

    /// Reports whether the entity is the actor.
    #[must_use]
    pub const fn is_actor(&self) -> bool {
        matches!(self.kind, TileKind::Actor)
    }

    /// Moves the entity's recorded position. The occupancy index is not touched.
    pub fn relocate(&mut self, position: CellCoord) {
        self.position = position;
    }

    /// Turns a pushable entity into walkable ground one layer lower.
    ///
    /// Sinking is irreversible; calling it on an entity that already sank
    /// or was never pushable leaves the entity unchanged.
    pub fn sink(&mut self) {
        if !self.pushable {
            return;
        }
        self.pushable = false;
        self.walkable = true;
        self.layer = self.layer.saturating_sub(1);
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}

impl std::hash::Hash for Entity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

/// Rectangular array of optional tiles forming one level layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayer {
    width: u32,
    height: u32,
    tiles: Vec<Option<TileKind>>,
}

impl TileLayer {
    /// Creates an empty layer of the provided dimensions.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let capacity = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            tiles: vec![None; capacity],
        }
    }

    /// Builds a layer from row-major rows. Every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<Option<TileKind>>>) -> Result<Self, LevelError> {
        let width = rows.first().map_or(0, Vec::len);
        let mut tiles = Vec::with_capacity(width * rows.len());
        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(LevelError::RaggedLayer {
                    row: row_index,
                    expected: width,
                    found: row.len(),
                });
            }
            tiles.extend_from_slice(row);
        }

        let width = u32::try_from(width).map_err(|_| LevelError::LayerTooWide)?;
        let height = u32::try_from(rows.len()).map_err(|_| LevelError::LayerTooWide)?;
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    /// Parses rows of digit codes, one row per line.
    ///
    /// Leading and trailing blank lines are ignored, as is a trailing `\r`
    /// on each row. `0` marks an empty cell.
    pub fn parse(text: &str) -> Result<Self, LevelError> {
        let mut rows = Vec::new();
        for (row_index, line) in text.trim_matches(['\n', '\r']).lines().enumerate() {
            let line = line.trim_end_matches('\r');
            let mut row = Vec::with_capacity(line.len());
            for (column, symbol) in line.chars().enumerate() {
                let code = symbol
                    .to_digit(10)
                    .and_then(|digit| u8::try_from(digit).ok())
                    .ok_or(LevelError::UnknownTileCode {
                        symbol,
                        row: row_index,
                        column,
                    })?;
                if code == 0 {
                    row.push(None);
                    continue;
                }
                let kind = TileKind::from_code(code).ok_or(LevelError::UnknownTileCode {
                    symbol,
                    row: row_index,
                    column,
                })?;
                row.push(Some(kind));
            }
            rows.push(row);
        }
        Self::from_rows(rows)
    }

    /// Width of the layer in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the layer in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Tile stored at the provided column and row, if any.
    #[must_use]
    pub fn get(&self, column: u32, row: u32) -> Option<TileKind> {
        self.index(column, row)
            .and_then(|index| self.tiles.get(index).copied().flatten())
    }

    /// Stores a tile, ignoring coordinates outside the layer.
    pub fn set(&mut self, column: u32, row: u32, tile: Option<TileKind>) {
        if let Some(slot) = self
            .index(column, row)
            .and_then(|index| self.tiles.get_mut(index))
        {
            *slot = tile;
        }
    }

    /// Iterates over non-empty tiles, rows top to bottom and columns left to right.
    pub fn tiles(&self) -> impl Iterator<Item = (u32, u32, TileKind)> + '_ {
        let width = self.width.max(1);
        self.tiles.iter().enumerate().filter_map(move |(index, tile)| {
            let index = u32::try_from(index).ok()?;
            tile.map(|kind| (index % width, index / width, kind))
        })
    }

    /// Renders the layer as digit rows padded with empty cells to the provided size.
    #[must_use]
    pub fn to_text(&self, size: CellRectSize) -> String {
        let mut lines = Vec::with_capacity(usize::try_from(size.height()).unwrap_or(0));
        for row in 0..size.height() {
            let line: String = (0..size.width())
                .map(|column| {
                    let code = self.get(column, row).map_or(0, TileKind::code);
                    char::from(b'0' + code)
                })
                .collect();
            lines.push(line);
        }
        lines.join("\n")
    }

    fn index(&self, column: u32, row: u32) -> Option<usize> {
        if column < self.width && row < self.height {
            let row = usize::try_from(row).ok()?;
            let column = usize::try_from(column).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Level description consumed once at setup time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    name: String,
    layers: Vec<TileLayer>,
}

impl Level {
    /// Creates a level from ordered layers; the first layer is layer `0`.
    #[must_use]
    pub fn new(name: impl Into<String>, layers: Vec<TileLayer>) -> Self {
        Self {
            name: name.into(),
            layers,
        }
    }

    /// Parses each provided text block as a layer, in order.
    pub fn from_layer_texts(name: impl Into<String>, layers: &[&str]) -> Result<Self, LevelError> {
        let layers = layers
            .iter()
            .map(|text| TileLayer::parse(text))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(name, layers))
    }

    /// Display name of the level.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered layers composing the level.
    #[must_use]
    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    /// Maximum width and height across every layer.
    #[must_use]
    pub fn size(&self) -> CellRectSize {
        let width = self.layers.iter().map(TileLayer::width).max().unwrap_or(0);
        let height = self.layers.iter().map(TileLayer::height).max().unwrap_or(0);
        CellRectSize::new(width, height)
    }

    /// Reports whether either dimension is below [`MIN_LEVEL_SIZE`].
    #[must_use]
    pub fn is_too_small(&self) -> bool {
        let size = self.size();
        size.width() < MIN_LEVEL_SIZE.width() || size.height() < MIN_LEVEL_SIZE.height()
    }

    /// Reports whether either dimension exceeds [`MAX_LEVEL_SIZE`].
    #[must_use]
    pub fn is_too_large(&self) -> bool {
        let size = self.size();
        size.width() > MAX_LEVEL_SIZE.width() || size.height() > MAX_LEVEL_SIZE.height()
    }

    /// Number of tiles of the provided kind across every layer.
    #[must_use]
    pub fn count_of(&self, kind: TileKind) -> usize {
        self.layers
            .iter()
            .flat_map(|layer| layer.tiles())
            .filter(|(_, _, tile)| *tile == kind)
            .count()
    }

    /// Checks the structural requirements for setting the level up.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.layers.is_empty() {
            return Err(LevelError::NoLayers);
        }
        if self.layers.len() > MAX_LAYERS {
            return Err(LevelError::TooManyLayers {
                count: self.layers.len(),
            });
        }
        if self.size().area() == 0 {
            return Err(LevelError::EmptyLevel);
        }
        match self.count_of(TileKind::Actor) {
            0 => Err(LevelError::MissingActor),
            1 => Ok(()),
            count => Err(LevelError::MultipleActors { count }),
        }
    }
}

/// Reasons a level cannot be parsed or set up.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LevelError {
    /// The level does not contain any layer.
    #[error("level has no layers")]
    NoLayers,
    /// Every layer has zero width or height.
    #[error("level covers no cells")]
    EmptyLevel,
    /// More layers than a layer index can address.
    #[error("level has {count} layers, at most 256 are supported")]
    TooManyLayers {
        /// Number of layers found.
        count: usize,
    },
    /// No actor tile in any layer.
    #[error("level has no actor")]
    MissingActor,
    /// More than one actor tile.
    #[error("level has {count} actors, exactly one is required")]
    MultipleActors {
        /// Number of actors found.
        count: usize,
    },
    /// A layer row differs in length from the first row.
    #[error("layer row {row} has {found} cells, expected {expected}")]
    RaggedLayer {
        /// Zero-based row index.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// A layer dimension does not fit the coordinate range.
    #[error("layer dimensions exceed the supported range")]
    LayerTooWide,
    /// A layer cell holds a symbol that is not a known tile code.
    #[error("unknown tile code {symbol:?} at row {row}, column {column}")]
    UnknownTileCode {
        /// Offending character.
        symbol: char,
        /// Zero-based row index.
        row: usize,
        /// Zero-based column index.
        column: usize,
    },
}

/// Single entry of a [`MovePlan`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedMove {
    /// Displacement applied to the entity.
    pub displacement: Offset,
    /// Indicates whether the entity sinks when the move is applied.
    pub sinks: bool,
}

/// Candidate set of moves produced by the resolver and applied by the world.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePlan {
    entries: BTreeMap<EntityId, PlannedMove>,
}

impl MovePlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a plain displacement for the entity.
    pub fn record_move(&mut self, entity: EntityId, displacement: Offset) {
        let _ = self.entries.insert(
            entity,
            PlannedMove {
                displacement,
                sinks: false,
            },
        );
    }

    /// Records a displacement after which the entity sinks.
    pub fn record_sink(&mut self, entity: EntityId, displacement: Offset) {
        let _ = self.entries.insert(
            entity,
            PlannedMove {
                displacement,
                sinks: true,
            },
        );
    }

    /// Planned move for the entity, if any.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<PlannedMove> {
        self.entries.get(&entity).copied()
    }

    /// Reports whether the plan moves the entity.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entries.contains_key(&entity)
    }

    /// Iterates over entries in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, PlannedMove)> + '_ {
        self.entries.iter().map(|(id, planned)| (*id, *planned))
    }

    /// Number of entities moved by the plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the plan moves nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops sink flags, keeping the displacement of every entry.
    #[must_use]
    pub fn to_move_set(&self) -> MoveSet {
        let mut moves = MoveSet::new();
        for (id, planned) in self.iter() {
            moves.insert(id, planned.displacement);
        }
        moves
    }
}

/// Mapping from moved entity to its applied displacement.
///
/// An empty set means the turn was illegal and nothing changed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSet {
    entries: BTreeMap<EntityId, Offset>,
}

impl MoveSet {
    /// Creates an empty move set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the displacement applied to the entity.
    pub fn insert(&mut self, entity: EntityId, displacement: Offset) {
        let _ = self.entries.insert(entity, displacement);
    }

    /// Displacement applied to the entity, if it moved.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<Offset> {
        self.entries.get(&entity).copied()
    }

    /// Reports whether the entity moved.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entries.contains_key(&entity)
    }

    /// Iterates over entries in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, Offset)> + '_ {
        self.entries.iter().map(|(id, offset)| (*id, *offset))
    }

    /// Number of moved entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether nothing moved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reasons the resolver refused a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveRejection {
    /// A non-walkable occupant stands in the way.
    Blocked {
        /// Occupant that blocked the move.
        blocker: EntityId,
        /// Cell holding the blocker.
        cell: CellCoord,
    },
    /// The actor tried to jump a gap but the landing cell is not solid walkable ground.
    UnsafeLanding {
        /// Landing cell that was rejected.
        cell: CellCoord,
    },
    /// The entity asked to move is neither the actor nor pushable.
    Immovable {
        /// Entity that cannot move.
        entity: EntityId,
    },
}

/// Outcome of resolving a single move request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The move is legal; the plan lists every entity that moves.
    Legal(MovePlan),
    /// The move is illegal; nothing may change.
    Illegal(MoveRejection),
}

impl Resolution {
    /// Reports whether the move is legal.
    #[must_use]
    pub const fn is_legal(&self) -> bool {
        matches!(self, Self::Legal(_))
    }

    /// Plan of a legal resolution.
    #[must_use]
    pub fn plan(&self) -> Option<&MovePlan> {
        match self {
            Self::Legal(plan) => Some(plan),
            Self::Illegal(_) => None,
        }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces any loaded level with a freshly set up one.
    LoadLevel {
        /// Level to populate entities and the grid from.
        level: Level,
    },
    /// Applies a resolved plan to the occupancy grid and entities.
    ApplyMoves {
        /// Plan produced by the movement resolver.
        plan: MovePlan,
    },
    /// Tears the current level down, dropping every entity.
    ClearLevel,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a level was set up.
    LevelLoaded {
        /// Number of entities created.
        entities: usize,
        /// Initial extent of the grid.
        bounds: CellRect,
    },
    /// Reports that a level failed validation; the previous state is untouched.
    LevelRejected {
        /// Specific reason the level was refused.
        reason: LevelError,
    },
    /// Confirms that the loaded level was torn down.
    LevelCleared {
        /// Number of entities dropped.
        entities: usize,
    },
    /// Announces that the grid grew and every coordinate shifted.
    GridResized {
        /// Extent before growing, in the old frame.
        previous: CellRect,
        /// Extent after growing; the origin is always the zero cell.
        current: CellRect,
        /// Displacement added to every coordinate of the old frame.
        shift: Offset,
    },
    /// Confirms that an entity moved.
    EntityMoved {
        /// Entity that moved.
        entity: EntityId,
        /// Cell before the move, in the frame before any resize.
        from: CellCoord,
        /// Cell after the move, in the current frame.
        to: CellCoord,
        /// Displacement applied.
        displacement: Offset,
    },
    /// Confirms that a pushed entity sank and became ground.
    EntitySank {
        /// Entity that sank.
        entity: EntityId,
        /// Layer the entity now occupies.
        layer: u8,
    },
    /// Announces that the actor reached an exit.
    LevelCompleted {
        /// Actor standing on the exit.
        actor: EntityId,
    },
}
