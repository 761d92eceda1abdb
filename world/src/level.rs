use crypt_crawler_core::{CrawlerError, Light, Orientation, TileDescriptor, TileId};
use glam::Vec3;
use serde::Deserialize;

const MAX_SPACING: u32 = 12;

/// Boolean room layout consumed by the wall solver.
///
/// Cells are stored row-major; a non-zero entry marks floor.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LevelLayout {
    /// Number of columns.
    pub w: u32,
    /// Number of rows.
    pub h: u32,
    /// Power-of-two exponent of the tile edge length in world units.
    pub spacing: u32,
    /// Row-major floor flags.
    pub tiles: Vec<u8>,
}

impl LevelLayout {
    /// Parses an ASCII map where `.` marks floor and every other character is solid.
    ///
    /// Rows may be ragged; short rows are padded with solid cells.
    pub fn from_ascii(spacing: u32, map: &str) -> Result<Self, CrawlerError> {
        let rows: Vec<&str> = map
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
        let mut tiles = Vec::with_capacity(width * rows.len());
        for row in &rows {
            let mut count = 0;
            for ch in row.chars() {
                tiles.push(u8::from(ch == '.'));
                count += 1;
            }
            tiles.extend(std::iter::repeat(0).take(width - count));
        }

        let layout = Self {
            w: to_u32(width)?,
            h: to_u32(rows.len())?,
            spacing,
            tiles,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Checks that the tile data matches the declared dimensions.
    pub fn validate(&self) -> Result<(), CrawlerError> {
        if self.w == 0 || self.h == 0 {
            return Err(CrawlerError::MalformedLevel(format!(
                "level dimensions {}x{} must be non-zero",
                self.w, self.h
            )));
        }
        if self.spacing > MAX_SPACING {
            return Err(CrawlerError::MalformedLevel(format!(
                "spacing exponent {} exceeds {MAX_SPACING}",
                self.spacing
            )));
        }
        let expected = u64::from(self.w) * u64::from(self.h);
        if self.tiles.len() as u64 != expected {
            return Err(CrawlerError::MalformedLevel(format!(
                "expected {expected} tiles for a {}x{} level, found {}",
                self.w,
                self.h,
                self.tiles.len()
            )));
        }
        Ok(())
    }

    /// Reports whether the cell is floor. Out-of-range cells are never floor.
    #[must_use]
    pub fn is_floor(&self, x: i64, y: i64) -> bool {
        cell_index(self.w, self.h, x, y)
            .and_then(|index| self.tiles.get(index))
            .map_or(false, |tile| *tile != 0)
    }
}

/// Solved level holding per-cell tile descriptors and the fixed lights.
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    width: u32,
    height: u32,
    spacing: u32,
    tiles: Vec<TileDescriptor>,
    floor_tile: TileId,
    lights: Vec<Light>,
}

impl Level {
    /// Creates a level from solved descriptors.
    ///
    /// `floor_tile` identifies the descriptor that actors can walk on; every
    /// other descriptor, including cells without geometry, blocks movement.
    pub fn new(
        width: u32,
        height: u32,
        spacing: u32,
        tiles: Vec<TileDescriptor>,
        floor_tile: TileId,
    ) -> Result<Self, CrawlerError> {
        let expected = u64::from(width) * u64::from(height);
        if width == 0 || height == 0 || tiles.len() as u64 != expected {
            return Err(CrawlerError::MalformedLevel(format!(
                "{} descriptors do not fill a {width}x{height} level",
                tiles.len()
            )));
        }
        if spacing > MAX_SPACING {
            return Err(CrawlerError::MalformedLevel(format!(
                "spacing exponent {spacing} exceeds {MAX_SPACING}"
            )));
        }
        Ok(Self {
            width,
            height,
            spacing,
            tiles,
            floor_tile,
            lights: Vec::new(),
        })
    }

    /// Builds a collision-only level: floor cells receive `floor_tile`, the rest no geometry.
    pub fn from_layout(layout: &LevelLayout, floor_tile: TileId) -> Result<Self, CrawlerError> {
        layout.validate()?;
        let tiles = layout
            .tiles
            .iter()
            .map(|tile| {
                if *tile != 0 {
                    TileDescriptor::new(floor_tile, Orientation::SOUTH)
                } else {
                    TileDescriptor::UNSET
                }
            })
            .collect();
        Self::new(layout.w, layout.h, layout.spacing, tiles, floor_tile)
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Power-of-two exponent of the tile edge length.
    #[must_use]
    pub const fn spacing(&self) -> u32 {
        self.spacing
    }

    /// Edge length of a single tile in world units.
    #[must_use]
    pub fn tile_size(&self) -> f32 {
        (1u32 << self.spacing) as f32
    }

    /// Total extent of the level along X in world units.
    #[must_use]
    pub fn world_width(&self) -> f32 {
        self.width as f32 * self.tile_size()
    }

    /// Total extent of the level along Z in world units.
    #[must_use]
    pub fn world_depth(&self) -> f32 {
        self.height as f32 * self.tile_size()
    }

    /// Tile chosen for walkable cells.
    #[must_use]
    pub const fn floor_tile(&self) -> TileId {
        self.floor_tile
    }

    /// Row-major descriptors.
    #[must_use]
    pub fn tiles(&self) -> &[TileDescriptor] {
        &self.tiles
    }

    /// Descriptor at the provided cell, or `None` outside the level.
    #[must_use]
    pub fn descriptor(&self, x: i64, y: i64) -> Option<TileDescriptor> {
        cell_index(self.width, self.height, x, y).map(|index| self.tiles[index])
    }

    /// Replaces the tile at the provided cell, keeping its facing.
    pub fn set_tile(&mut self, x: i64, y: i64, tile: TileId) -> Result<(), CrawlerError> {
        let index = cell_index(self.width, self.height, x, y).ok_or(CrawlerError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })?;
        self.tiles[index] = self.tiles[index].with_tile(tile);
        Ok(())
    }

    /// Reports whether actors may stand in the cell. Out-of-range cells are blocked.
    #[must_use]
    pub fn is_floor(&self, x: i64, y: i64) -> bool {
        self.descriptor(x, y)
            .map_or(false, |descriptor| descriptor.tile() == Some(self.floor_tile))
    }

    /// Reports whether the cell blocks movement and sight.
    #[must_use]
    pub fn is_solid(&self, x: i64, y: i64) -> bool {
        !self.is_floor(x, y)
    }

    /// Converts a world coordinate into the index of the tile containing it.
    #[must_use]
    pub fn world_to_tile(&self, value: f32) -> i64 {
        (value / self.tile_size()).floor() as i64
    }

    /// Reports whether the world-space point lies over a walkable tile.
    #[must_use]
    pub fn is_floor_at(&self, position: Vec3) -> bool {
        self.is_floor(
            self.world_to_tile(position.x),
            self.world_to_tile(position.z),
        )
    }

    /// World-space center of the cell at floor height.
    #[must_use]
    pub fn tile_center(&self, x: i64, y: i64) -> Vec3 {
        let size = self.tile_size();
        Vec3::new((x as f32 + 0.5) * size, 0.0, (y as f32 + 0.5) * size)
    }

    /// Center of the first walkable cell in row-major order.
    #[must_use]
    pub fn first_floor_center(&self) -> Option<Vec3> {
        let width = usize::try_from(self.width).ok()?;
        let index = self
            .tiles
            .iter()
            .position(|descriptor| descriptor.tile() == Some(self.floor_tile))?;
        Some(self.tile_center((index % width) as i64, (index / width) as i64))
    }

    /// Derives the boolean floor layout of the solved level.
    #[must_use]
    pub fn floor_layout(&self) -> LevelLayout {
        LevelLayout {
            w: self.width,
            h: self.height,
            spacing: self.spacing,
            tiles: self
                .tiles
                .iter()
                .map(|descriptor| u8::from(descriptor.tile() == Some(self.floor_tile)))
                .collect(),
        }
    }

    /// Encodes the grid as interleaved `[tile, orientation]` pairs.
    #[must_use]
    pub fn to_interleaved(&self) -> Vec<i8> {
        self.tiles
            .iter()
            .flat_map(|descriptor| descriptor.to_pair())
            .collect()
    }

    /// Lights placed in the level.
    #[must_use]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Mutable access to the placed lights.
    pub fn lights_mut(&mut self) -> &mut [Light] {
        &mut self.lights
    }

    /// Appends a light to the level.
    pub fn push_light(&mut self, light: Light) {
        self.lights.push(light);
    }
}

fn cell_index(width: u32, height: u32, x: i64, y: i64) -> Option<usize> {
    if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
        return None;
    }
    usize::try_from(x + y * i64::from(width)).ok()
}

fn to_u32(value: usize) -> Result<u32, CrawlerError> {
    u32::try_from(value)
        .map_err(|_| CrawlerError::MalformedLevel(format!("dimension {value} is too large")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_layout_pads_ragged_rows() {
        let layout = LevelLayout::from_ascii(5, "#..\n#.\n").expect("layout");
        assert_eq!((layout.w, layout.h), (3, 2));
        assert_eq!(layout.tiles, vec![0, 1, 1, 0, 1, 0]);
    }

    #[test]
    fn validation_rejects_mismatched_tile_count() {
        let layout = LevelLayout {
            w: 3,
            h: 3,
            spacing: 5,
            tiles: vec![1; 8],
        };
        assert!(matches!(
            layout.validate(),
            Err(CrawlerError::MalformedLevel(_))
        ));
    }

    #[test]
    fn out_of_range_cells_are_solid() {
        let layout = LevelLayout::from_ascii(5, "..\n..").expect("layout");
        let level = Level::from_layout(&layout, TileId::new(0)).expect("level");
        assert!(level.is_floor(1, 1));
        assert!(level.is_solid(-1, 0));
        assert!(level.is_solid(0, 2));
        assert!(level.is_solid(2, 0));
    }

    #[test]
    fn set_tile_reports_out_of_bounds() {
        let layout = LevelLayout::from_ascii(5, ".").expect("layout");
        let mut level = Level::from_layout(&layout, TileId::new(0)).expect("level");
        assert_eq!(
            level.set_tile(3, 0, TileId::new(1)),
            Err(CrawlerError::OutOfBounds {
                x: 3,
                y: 0,
                width: 1,
                height: 1,
            })
        );
    }

    #[test]
    fn world_coordinates_map_onto_power_of_two_tiles() {
        let layout = LevelLayout::from_ascii(5, "...").expect("layout");
        let level = Level::from_layout(&layout, TileId::new(0)).expect("level");
        assert_eq!(level.tile_size(), 32.0);
        assert_eq!(level.world_to_tile(31.9), 0);
        assert_eq!(level.world_to_tile(32.0), 1);
        assert_eq!(level.world_to_tile(-0.1), -1);
        assert_eq!(level.first_floor_center(), Some(Vec3::new(16.0, 0.0, 16.0)));
    }
}
