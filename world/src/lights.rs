use glam::Vec3;

use crate::Level;

/// Coarse bucket grid over world space used for approximate nearest-light queries.
///
/// Buckets hold indices into [`Level::lights`]. A light is registered in
/// every bucket its influence reaches so that point queries only need to
/// inspect the bucket containing the query point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LightGraph {
    width: u32,
    height: u32,
    spacing: u32,
    buckets: Vec<Vec<usize>>,
}

impl LightGraph {
    /// Bucket exponent offset relative to the level's tile spacing.
    pub const SPACING_OFFSET: u32 = 2;

    /// Creates an empty grid of `width` by `height` buckets spanning `2^spacing` units each.
    #[must_use]
    pub fn new(width: u32, height: u32, spacing: u32) -> Self {
        let count = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            spacing,
            buckets: vec![Vec::new(); count],
        }
    }

    /// Creates an empty grid covering the level with buckets four tiles wide.
    #[must_use]
    pub fn for_level(level: &Level) -> Self {
        let spacing = level.spacing() + Self::SPACING_OFFSET;
        let tiles_per_bucket = 1u32 << Self::SPACING_OFFSET;
        Self::new(
            level.width().div_ceil(tiles_per_bucket),
            level.height().div_ceil(tiles_per_bucket),
            spacing,
        )
    }

    /// Edge length of a bucket in world units.
    #[must_use]
    pub fn bucket_size(&self) -> f32 {
        (1u32 << self.spacing) as f32
    }

    /// Number of buckets along X and Z.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Index of the bucket containing the planar position, or `None` outside the grid.
    #[must_use]
    pub fn bucket_index(&self, x: f32, z: f32) -> Option<usize> {
        let size = self.bucket_size();
        let column = (x / size).floor();
        let row = (z / size).floor();
        if column < 0.0 || row < 0.0 || column >= self.width as f32 || row >= self.height as f32 {
            return None;
        }
        usize::try_from(column as u64 + row as u64 * u64::from(self.width)).ok()
    }

    /// Index of the bucket nearest the planar position, clamping onto the grid edge.
    ///
    /// Returns `None` only for an empty grid.
    #[must_use]
    pub fn clamped_bucket_index(&self, x: f32, z: f32) -> Option<usize> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let size = self.bucket_size();
        let column = (x / size).floor().clamp(0.0, (self.width - 1) as f32);
        let row = (z / size).floor().clamp(0.0, (self.height - 1) as f32);
        usize::try_from(column as u64 + row as u64 * u64::from(self.width)).ok()
    }

    /// Registers a light in the bucket at `bucket`. Duplicate registrations are ignored.
    pub fn insert(&mut self, bucket: usize, light: usize) {
        if let Some(entries) = self.buckets.get_mut(bucket) {
            if !entries.contains(&light) {
                entries.push(light);
            }
        }
    }

    /// Light indices registered in the bucket at `bucket`.
    #[must_use]
    pub fn bucket(&self, bucket: usize) -> &[usize] {
        self.buckets.get(bucket).map_or(&[], Vec::as_slice)
    }

    /// Light indices registered in the bucket containing `position`.
    #[must_use]
    pub fn lights_near(&self, position: Vec3) -> &[usize] {
        self.bucket_index(position.x, position.z)
            .map_or(&[], |bucket| self.bucket(bucket))
    }

    /// Total number of light registrations across all buckets.
    #[must_use]
    pub fn registrations(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Number of buckets holding at least one light.
    #[must_use]
    pub fn occupied_buckets(&self) -> usize {
        self.buckets.iter().filter(|bucket| !bucket.is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LevelLayout;
    use crypt_crawler_core::TileId;

    #[test]
    fn level_grid_rounds_partial_buckets_up() {
        let layout = LevelLayout {
            w: 9,
            h: 4,
            spacing: 5,
            tiles: vec![1; 36],
        };
        let level = Level::from_layout(&layout, TileId::new(0)).expect("level");
        let graph = LightGraph::for_level(&level);
        assert_eq!(graph.dimensions(), (3, 1));
        assert_eq!(graph.bucket_size(), 128.0);
    }

    #[test]
    fn positions_outside_grid_have_no_bucket() {
        let graph = LightGraph::new(2, 2, 4);
        assert_eq!(graph.bucket_index(-1.0, 0.0), None);
        assert_eq!(graph.bucket_index(32.0, 0.0), None);
        assert_eq!(graph.bucket_index(17.0, 17.0), Some(3));
        assert!(graph.lights_near(Vec3::new(40.0, 0.0, 40.0)).is_empty());
    }

    #[test]
    fn clamped_lookup_snaps_onto_the_grid_edge() {
        let graph = LightGraph::new(2, 2, 4);
        assert_eq!(graph.clamped_bucket_index(-40.0, -3.0), Some(0));
        assert_eq!(graph.clamped_bucket_index(100.0, -3.0), Some(1));
        assert_eq!(graph.clamped_bucket_index(-1.0, 50.0), Some(2));
        assert_eq!(graph.clamped_bucket_index(17.0, 17.0), Some(3));
        assert_eq!(LightGraph::new(0, 3, 4).clamped_bucket_index(0.0, 0.0), None);
    }

    #[test]
    fn duplicate_insertions_are_collapsed() {
        let mut graph = LightGraph::new(1, 1, 4);
        graph.insert(0, 7);
        graph.insert(0, 7);
        graph.insert(5, 1);
        assert_eq!(graph.bucket(0), &[7]);
        assert_eq!(graph.registrations(), 1);
    }
}
