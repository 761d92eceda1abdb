#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wall solver that turns a boolean room layout into renderable tile descriptors.
//!
//! Every cell is classified from its own floor flag and the floor flags of
//! its four direct neighbours. Floor cells become floor tiles, solid cells
//! bordering floor on exactly one side become walls facing that floor, and
//! solid cells bordering floor on two adjacent sides become corners. Any
//! other pattern carries no geometry.

use crypt_crawler_core::{CrawlerError, Orientation, TileDescriptor, TileId};
use crypt_crawler_world::{Level, LevelLayout};
use rand::{seq::SliceRandom, Rng};
use tracing::info;

/// Submesh indices of a tile mesh grouped by the role their name announces.
///
/// Wall submeshes are authored facing south and corners facing south-west;
/// the solver rotates them into place through the cell orientation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileSet {
    floors: Vec<TileId>,
    walls: Vec<TileId>,
    corners: Vec<TileId>,
    walltorches: Vec<TileId>,
}

impl TileSet {
    /// Groups submeshes by name.
    ///
    /// Names containing `walltorch` are checked before `wall`, so torch
    /// variants never end up among the plain walls. At least one floor and
    /// one wall submesh are required.
    pub fn classify<S: AsRef<str>>(names: &[S]) -> Result<Self, CrawlerError> {
        let mut set = Self {
            floors: Vec::new(),
            walls: Vec::new(),
            corners: Vec::new(),
            walltorches: Vec::new(),
        };
        for (index, name) in names.iter().enumerate() {
            let name = name.as_ref();
            let id = u8::try_from(index).map(TileId::new).map_err(|_| {
                CrawlerError::Configuration(format!(
                    "submesh `{name}` at index {index} does not fit a tile id"
                ))
            })?;
            if name.contains("floor") {
                set.floors.push(id);
            } else if name.contains("walltorch") {
                set.walltorches.push(id);
            } else if name.contains("wall") {
                set.walls.push(id);
            } else if name.contains("corner") {
                set.corners.push(id);
            }
        }

        if set.floors.is_empty() {
            return Err(CrawlerError::Configuration(
                "tile mesh has no submesh named like `floor`".into(),
            ));
        }
        if set.walls.is_empty() {
            return Err(CrawlerError::Configuration(
                "tile mesh has no submesh named like `wall`".into(),
            ));
        }
        Ok(set)
    }

    /// Tile laid on every floor cell.
    #[must_use]
    pub fn floor(&self) -> TileId {
        self.floors[0]
    }

    /// Every plain wall variant.
    #[must_use]
    pub fn walls(&self) -> &[TileId] {
        &self.walls
    }

    /// Reports whether `tile` is one of the plain wall variants.
    #[must_use]
    pub fn is_wall(&self, tile: TileId) -> bool {
        self.walls.contains(&tile)
    }

    /// Corner tile, if the mesh provides one.
    #[must_use]
    pub fn corner(&self) -> Option<TileId> {
        self.corners.first().copied()
    }

    /// Wall tile carrying a torch, if the mesh provides one.
    #[must_use]
    pub fn walltorch(&self) -> Option<TileId> {
        self.walltorches.first().copied()
    }
}

/// Floor flags of a cell's direct neighbours.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Neighbours {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

impl Neighbours {
    fn of(layout: &LevelLayout, x: i64, y: i64) -> Self {
        Self {
            left: layout.is_floor(x - 1, y),
            right: layout.is_floor(x + 1, y),
            up: layout.is_floor(x, y - 1),
            down: layout.is_floor(x, y + 1),
        }
    }
}

/// Role a solid cell plays given the floor around it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
    Wall(Orientation),
    Corner(Orientation),
}

impl Shape {
    fn of(neighbours: Neighbours) -> Option<Self> {
        let Neighbours {
            left,
            right,
            up,
            down,
        } = neighbours;
        match (left, right, up, down) {
            (false, false, true, false) => Some(Self::Wall(Orientation::NORTH)),
            (false, false, false, true) => Some(Self::Wall(Orientation::SOUTH)),
            (false, true, false, false) => Some(Self::Wall(Orientation::EAST)),
            (true, false, false, false) => Some(Self::Wall(Orientation::WEST)),
            (true, false, true, false) => Some(Self::Corner(Orientation::WEST)),
            (false, true, true, false) => Some(Self::Corner(Orientation::NORTH)),
            (true, false, false, true) => Some(Self::Corner(Orientation::SOUTH)),
            (false, true, false, true) => Some(Self::Corner(Orientation::EAST)),
            _ => None,
        }
    }
}

/// Classifies layouts into solved levels using one mesh's tile set.
#[derive(Clone, Debug)]
pub struct WallSolver {
    tiles: TileSet,
}

impl WallSolver {
    /// Creates a solver emitting tiles from `tiles`.
    #[must_use]
    pub fn new(tiles: TileSet) -> Self {
        Self { tiles }
    }

    /// Tile set the solver emits.
    #[must_use]
    pub fn tiles(&self) -> &TileSet {
        &self.tiles
    }

    /// Solves the layout into a level whose walkable tile is the floor tile.
    ///
    /// South-facing walls draw a random wall variant from `rng`; every other
    /// case is deterministic. Fails when the layout is malformed or a corner
    /// is required but the tile set has none.
    pub fn solve<R: Rng + ?Sized>(
        &self,
        layout: &LevelLayout,
        rng: &mut R,
    ) -> Result<Level, CrawlerError> {
        layout.validate()?;

        let mut descriptors = Vec::with_capacity(layout.tiles.len());
        let (mut floors, mut walls, mut corners, mut unset) = (0usize, 0usize, 0usize, 0usize);
        for y in 0..i64::from(layout.h) {
            for x in 0..i64::from(layout.w) {
                let descriptor = if layout.is_floor(x, y) {
                    floors += 1;
                    TileDescriptor::new(self.tiles.floor(), Orientation::SOUTH)
                } else {
                    match Shape::of(Neighbours::of(layout, x, y)) {
                        Some(Shape::Wall(orientation)) => {
                            walls += 1;
                            TileDescriptor::new(self.wall_tile(orientation, rng), orientation)
                        }
                        Some(Shape::Corner(orientation)) => {
                            corners += 1;
                            let corner = self.tiles.corner().ok_or_else(|| {
                                CrawlerError::Configuration(format!(
                                    "cell ({x}, {y}) needs a corner but the tile mesh has none"
                                ))
                            })?;
                            TileDescriptor::new(corner, orientation)
                        }
                        None => {
                            unset += 1;
                            TileDescriptor::UNSET
                        }
                    }
                };
                descriptors.push(descriptor);
            }
        }

        info!(
            width = layout.w,
            height = layout.h,
            floors,
            walls,
            corners,
            unset,
            "wall_solve_complete"
        );
        Level::new(
            layout.w,
            layout.h,
            layout.spacing,
            descriptors,
            self.tiles.floor(),
        )
    }

    fn wall_tile<R: Rng + ?Sized>(&self, orientation: Orientation, rng: &mut R) -> TileId {
        let walls = self.tiles.walls();
        if orientation == Orientation::SOUTH {
            if let Some(tile) = walls.choose(rng) {
                return *tile;
            }
        }
        walls[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn walltorch_names_are_not_plain_walls() {
        let set = TileSet::classify(&["floor", "walltorch", "wall_a", "corner", "wall_b"])
            .expect("tile set");
        assert_eq!(set.floor(), TileId::new(0));
        assert_eq!(set.walltorch(), Some(TileId::new(1)));
        assert_eq!(set.walls(), &[TileId::new(2), TileId::new(4)]);
        assert_eq!(set.corner(), Some(TileId::new(3)));
        assert!(!set.is_wall(TileId::new(1)));
    }

    #[test]
    fn missing_floor_or_wall_is_a_configuration_error() {
        assert!(matches!(
            TileSet::classify(&["wall", "corner"]),
            Err(CrawlerError::Configuration(_))
        ));
        assert!(matches!(
            TileSet::classify(&["floor", "walltorch"]),
            Err(CrawlerError::Configuration(_))
        ));
    }

    #[test]
    fn corner_patterns_require_a_corner_mesh() {
        let solver = WallSolver::new(TileSet::classify(&["floor", "wall"]).expect("tile set"));
        let layout = LevelLayout::from_ascii(5, "...\n...\n..#").expect("layout");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            solver.solve(&layout, &mut rng),
            Err(CrawlerError::Configuration(_))
        ));
    }

    #[test]
    fn unclassified_shapes_have_no_geometry() {
        let none = Neighbours {
            left: false,
            right: false,
            up: false,
            down: false,
        };
        assert_eq!(Shape::of(none), None);
        assert_eq!(
            Shape::of(Neighbours {
                left: true,
                right: true,
                ..none
            }),
            None
        );
    }
}
