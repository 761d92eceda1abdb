#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level populator scattering torches and enemies over a solved level.
//!
//! Placement is rejection sampled with bounded attempt budgets, so an
//! unlucky or cramped level is under-filled rather than looping forever.
//! After population the light bucket grid is built once and handed to the
//! scene, which only ever reads it.

use std::{collections::BTreeSet, f32::consts::TAU};

use crypt_crawler_core::{
    sq_dist_2d, ActorDef, ActorState, CrawlerError, Light, Message, MessageBus, ParticleKind,
    ParticleSpawn, FLAME_TORCH_COLOR,
};
use crypt_crawler_system_wall_solver::TileSet;
use crypt_crawler_world::{Level, LightGraph};
use glam::Vec3;
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Torch anchor inside a wall cell as fractions of the tile edge, indexed by orientation.
const TORCH_OFFSETS: [[f32; 2]; 4] = [[0.5, 0.85], [0.15, 0.5], [0.5, 0.15], [0.85, 0.5]];
/// Direction a torch flame leans out of the wall, indexed by orientation.
const TORCH_FACING: [[f32; 2]; 4] = [[0.0, 1.0], [-1.0, 0.0], [0.0, -1.0], [1.0, 0.0]];
/// Torch mounting height as a fraction of the tile edge.
const TORCH_HEIGHT: f32 = 0.75;

/// Tuning of the population pass.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PopulatorConfig {
    /// Probability that an eligible wall cell is skipped.
    pub torch_skip_chance: f64,
    /// Squared planar distance within which placed lights count as neighbours.
    pub torch_density_radius_sq: f32,
    /// A torch is rejected once this many neighbouring lights exist.
    pub torch_neighbour_limit: usize,
    /// Number of enemies the pass tries to place.
    pub enemy_target: usize,
    /// Sampling attempts before the pass gives up on the target.
    pub enemy_attempts: u32,
    /// Actor type announced for every placed enemy.
    pub enemy_kind: String,
    /// Collision radius used to space enemies apart.
    pub enemy_radius: f32,
}

impl Default for PopulatorConfig {
    fn default() -> Self {
        Self {
            torch_skip_chance: 0.45,
            torch_density_radius_sq: FLAME_TORCH_COLOR.w,
            torch_neighbour_limit: 3,
            enemy_target: 50,
            enemy_attempts: 800,
            enemy_kind: "crabby".into(),
            enemy_radius: 8.0,
        }
    }
}

impl PopulatorConfig {
    /// Checks that the tuning values are usable.
    pub fn validate(&self) -> Result<(), CrawlerError> {
        if !(0.0..=1.0).contains(&self.torch_skip_chance) {
            return Err(CrawlerError::Configuration(format!(
                "torch skip chance {} must lie in 0..=1",
                self.torch_skip_chance
            )));
        }
        if !self.torch_density_radius_sq.is_finite() || self.torch_density_radius_sq < 0.0 {
            return Err(CrawlerError::Configuration(format!(
                "torch density radius {} must be finite and non-negative",
                self.torch_density_radius_sq
            )));
        }
        if !self.enemy_radius.is_finite() || self.enemy_radius < 0.0 {
            return Err(CrawlerError::Configuration(format!(
                "enemy radius {} must be finite and non-negative",
                self.enemy_radius
            )));
        }
        if self.enemy_kind.is_empty() {
            return Err(CrawlerError::Configuration("enemy kind must not be empty".into()));
        }
        Ok(())
    }
}

/// Counts of what a population pass placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PopulationReport {
    /// Torches mounted on walls.
    pub torches: usize,
    /// Enemies announced on the bus.
    pub enemies: usize,
    /// Buckets of the light graph holding at least one light.
    pub occupied_buckets: usize,
}

/// Population pass over a solved level.
#[derive(Clone, Debug)]
pub struct Populator {
    config: PopulatorConfig,
}

impl Populator {
    /// Creates a populator after validating `config`.
    pub fn new(config: PopulatorConfig) -> Result<Self, CrawlerError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration the populator runs with.
    #[must_use]
    pub fn config(&self) -> &PopulatorConfig {
        &self.config
    }

    /// Places torches, announces enemies and builds the light graph.
    pub fn populate<R: Rng + ?Sized>(
        &self,
        level: &mut Level,
        tiles: &TileSet,
        rng: &mut R,
        bus: &mut MessageBus,
    ) -> Result<(LightGraph, PopulationReport), CrawlerError> {
        let torches = self.place_torches(level, tiles, rng, bus)?;
        let enemies = self.place_enemies(level, rng, bus);
        let graph = build_light_graph(level);
        let report = PopulationReport {
            torches,
            enemies,
            occupied_buckets: graph.occupied_buckets(),
        };
        Ok((graph, report))
    }

    /// Mounts torches on interior wall cells, returning how many were placed.
    ///
    /// The border ring is never considered. Each accepted torch swaps the
    /// cell to the walltorch tile, appends a light and announces a torch
    /// flame particle system.
    pub fn place_torches<R: Rng + ?Sized>(
        &self,
        level: &mut Level,
        tiles: &TileSet,
        rng: &mut R,
        bus: &mut MessageBus,
    ) -> Result<usize, CrawlerError> {
        let walltorch = tiles.walltorch().ok_or_else(|| {
            CrawlerError::Configuration("tile mesh has no submesh named like `walltorch`".into())
        })?;
        let size = level.tile_size();
        let mut placed = 0;
        let mut crowded = 0;

        for y in 1..i64::from(level.height()).saturating_sub(1) {
            for x in 1..i64::from(level.width()).saturating_sub(1) {
                let Some(descriptor) = level.descriptor(x, y) else {
                    continue;
                };
                let Some(tile) = descriptor.tile() else {
                    continue;
                };
                if !tiles.is_wall(tile) || rng.gen_bool(self.config.torch_skip_chance) {
                    continue;
                }

                let facing = usize::from(descriptor.orientation().get());
                let [ox, oz] = TORCH_OFFSETS.get(facing).unwrap_or(&TORCH_OFFSETS[0]);
                let position = Vec3::new(
                    (x as f32 + ox) * size,
                    TORCH_HEIGHT * size,
                    (y as f32 + oz) * size,
                );
                let neighbours = level
                    .lights()
                    .iter()
                    .filter(|light| {
                        sq_dist_2d(light.position, position) < self.config.torch_density_radius_sq
                    })
                    .count();
                if neighbours >= self.config.torch_neighbour_limit {
                    crowded += 1;
                    continue;
                }

                level.set_tile(x, y, walltorch)?;
                let [fx, fz] = TORCH_FACING.get(facing).unwrap_or(&TORCH_FACING[0]);
                bus.post(Message::ParticleSystemAdded(ParticleSpawn {
                    kind: ParticleKind::TorchFire,
                    position,
                    direction: Vec3::new(*fx, 0.0, *fz),
                }));
                level.push_light(Light::new(position, FLAME_TORCH_COLOR));
                placed += 1;
            }
        }

        info!(placed, crowded, lights = level.lights().len(), "torches_placed");
        Ok(placed)
    }

    /// Samples enemy spawn points on floor tiles and announces them as one batch.
    ///
    /// Returns the number of enemies announced, which may fall short of the
    /// target when the attempt budget runs out.
    pub fn place_enemies<R: Rng + ?Sized>(
        &self,
        level: &Level,
        rng: &mut R,
        bus: &mut MessageBus,
    ) -> usize {
        let min_dist_sq = 2.0 * self.config.enemy_radius * self.config.enemy_radius;
        let (width, depth) = (level.world_width(), level.world_depth());
        let mut accepted: Vec<ActorDef> = Vec::with_capacity(self.config.enemy_target);
        let mut attempts = 0;

        while accepted.len() < self.config.enemy_target && attempts < self.config.enemy_attempts {
            attempts += 1;
            let position = Vec3::new(rng.gen_range(0.0..width), 0.0, rng.gen_range(0.0..depth));
            if !level.is_floor_at(position) {
                continue;
            }
            if accepted
                .iter()
                .any(|other| sq_dist_2d(other.position, position) < min_dist_sq)
            {
                continue;
            }
            accepted.push(ActorDef {
                kind: self.config.enemy_kind.clone(),
                position,
                angle: rng.gen_range(0.0..TAU),
                state: ActorState::Idle,
            });
        }

        let placed = accepted.len();
        if placed < self.config.enemy_target {
            warn!(
                placed,
                target = self.config.enemy_target,
                attempts,
                "enemy_target_not_reached"
            );
        } else {
            info!(placed, attempts, "enemies_placed");
        }
        if !accepted.is_empty() {
            bus.post(Message::ActorsAdded(accepted));
        }
        placed
    }
}

/// Registers every level light in the bucket holding its center and in the
/// buckets holding the corners of its bounding square.
///
/// Corners past the level edge are clamped onto the outermost buckets, so a
/// light near the border still reaches every in-grid bucket it overlaps.
#[must_use]
pub fn build_light_graph(level: &Level) -> LightGraph {
    let mut graph = LightGraph::for_level(level);
    let mut buckets = BTreeSet::new();
    for (index, light) in level.lights().iter().enumerate() {
        buckets.clear();
        let (x, z, r) = (light.position.x, light.position.z, light.radius());
        for (px, pz) in [(x, z), (x - r, z - r), (x + r, z - r), (x - r, z + r), (x + r, z + r)] {
            if let Some(bucket) = graph.clamped_bucket_index(px, pz) {
                let _ = buckets.insert(bucket);
            }
        }
        for bucket in &buckets {
            graph.insert(*bucket, index);
        }
    }
    debug!(
        registrations = graph.registrations(),
        occupied = graph.occupied_buckets(),
        "light_graph_built"
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_from_partial_toml() {
        let config: PopulatorConfig = toml::from_str("enemy_target = 5").expect("toml");
        assert_eq!(config.enemy_target, 5);
        assert_eq!(config.enemy_attempts, 800);
        assert_eq!(config.enemy_kind, "crabby");
    }

    #[test]
    fn skip_chance_outside_unit_interval_is_rejected() {
        let config = PopulatorConfig {
            torch_skip_chance: 1.5,
            ..PopulatorConfig::default()
        };
        assert!(matches!(
            Populator::new(config),
            Err(CrawlerError::Configuration(_))
        ));
    }
}
