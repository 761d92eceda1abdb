use glam::Vec3;

use crate::Level;

/// Circular body another mover may not overlap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    /// World-space center of the body.
    pub position: Vec3,
    /// Collision radius of the body.
    pub radius: f32,
}

/// Resolves a requested planar move of a disc against the tile grid and nearby bodies.
///
/// Each axis is tested on its own against the grid line the disc's leading
/// edge would cross, sampling the two cells the disc spans on the other axis.
/// A blocked axis has its delta zeroed so the mover slides along walls. After
/// both deltas are applied, the first overlapping obstacle pushes the mover
/// back onto the boundary of their combined radii; later overlaps are left
/// for subsequent ticks.
///
/// Resolution is discrete: a delta larger than a tile can tunnel through a
/// one-tile wall.
pub fn resolve_move(
    level: &Level,
    obstacles: impl IntoIterator<Item = Obstacle>,
    position: &mut Vec3,
    dx: f32,
    dy: f32,
    radius: f32,
) {
    let mut dx = dx;
    let mut dy = dy;

    if dx != 0.0 {
        let column = level.world_to_tile(position.x + radius.copysign(dx) + dx);
        let top = level.world_to_tile(position.z - radius);
        let bottom = level.world_to_tile(position.z + radius);
        if level.is_solid(column, top) || level.is_solid(column, bottom) {
            dx = 0.0;
        }
    }

    if dy != 0.0 {
        let row = level.world_to_tile(position.z + radius.copysign(dy) + dy);
        let left = level.world_to_tile(position.x - radius);
        let right = level.world_to_tile(position.x + radius);
        if level.is_solid(left, row) || level.is_solid(right, row) {
            dy = 0.0;
        }
    }

    position.x += dx;
    position.z += dy;

    for obstacle in obstacles {
        let combined = radius + obstacle.radius;
        let offset_x = position.x - obstacle.position.x;
        let offset_z = position.z - obstacle.position.z;
        let distance_sq = offset_x * offset_x + offset_z * offset_z;
        if distance_sq >= combined * combined {
            continue;
        }

        let distance = distance_sq.sqrt();
        let (normal_x, normal_z) = if distance > f32::EPSILON {
            (offset_x / distance, offset_z / distance)
        } else {
            fallback_normal(dx, dy)
        };
        position.x = obstacle.position.x + normal_x * combined;
        position.z = obstacle.position.z + normal_z * combined;
        break;
    }
}

fn fallback_normal(dx: f32, dy: f32) -> (f32, f32) {
    let length = (dx * dx + dy * dy).sqrt();
    if length > f32::EPSILON {
        (-dx / length, -dy / length)
    } else {
        (1.0, 0.0)
    }
}

/// Marches a ray between two points, sampling one tile per step.
///
/// The step count is the larger of the tile deltas on either axis. Returns
/// `false` on the first solid sample.
#[must_use]
pub fn line_of_sight(level: &Level, from: Vec3, to: Vec3) -> bool {
    let start_x = level.world_to_tile(from.x);
    let start_z = level.world_to_tile(from.z);
    let steps = (level.world_to_tile(to.x) - start_x)
        .abs()
        .max((level.world_to_tile(to.z) - start_z).abs());
    if steps == 0 {
        return !level.is_solid(start_x, start_z);
    }

    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let x = from.x + (to.x - from.x) * t;
        let z = from.z + (to.z - from.z) * t;
        if level.is_solid(level.world_to_tile(x), level.world_to_tile(z)) {
            return false;
        }
    }
    true
}
