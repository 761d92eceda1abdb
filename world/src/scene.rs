use std::{sync::Arc, time::Duration};

use crypt_crawler_core::{sq_dist_2d, CrawlerError, InputSnapshot, Message, MessageBus, PlayerDef};
use glam::{Vec2, Vec3};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    actor::{ActorSpawner, SceneContext},
    animation::ArmatureAnimations,
    collision,
    player::{self, Player, PlayerId, PlayerTuning},
    Actor, LightGraph, Level,
};

/// Configuration of the scene simulation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Tuning of the input-driven player.
    pub player: PlayerTuning,
    /// Requires a clear line of sight before idle actors aggro.
    pub require_line_of_sight: bool,
}

/// Authoritative holder of world state.
///
/// Every position change of actors and players is resolved here against the
/// tile grid and against other bodies.
#[derive(Debug)]
pub struct Scene {
    config: SceneConfig,
    level: Level,
    graph: LightGraph,
    actors: Vec<Box<dyn Actor>>,
    players: Vec<Player>,
    local_player: Option<PlayerId>,
    next_player: u32,
    player_animations: Arc<ArmatureAnimations>,
}

impl Scene {
    /// Creates a scene over a populated level and its light graph.
    ///
    /// Fails when the player's collision disc is wider than a tile, which
    /// would break the two-cell span the movement resolver samples, or when
    /// the player's `Attack` clip ends before the configured hit frame.
    pub fn new(
        level: Level,
        graph: LightGraph,
        config: SceneConfig,
        player_animations: Arc<ArmatureAnimations>,
    ) -> Result<Self, CrawlerError> {
        validate_radius("player", config.player.radius, &level)?;
        validate_attack_clip(&player_animations, &config.player)?;
        info!(
            width = level.width(),
            height = level.height(),
            lights = level.lights().len(),
            "scene_created"
        );
        Ok(Self {
            config,
            level,
            graph,
            actors: Vec::new(),
            players: Vec::new(),
            local_player: None,
            next_player: 0,
            player_animations,
        })
    }

    /// Level the scene simulates.
    #[must_use]
    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Spatial light index built for the level.
    #[must_use]
    pub fn light_graph(&self) -> &LightGraph {
        &self.graph
    }

    /// Configuration the scene was created with.
    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Actors in insertion order.
    #[must_use]
    pub fn actors(&self) -> &[Box<dyn Actor>] {
        &self.actors
    }

    /// Players in join order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Player driven by local input, if any.
    #[must_use]
    pub fn local_player(&self) -> Option<&Player> {
        let id = self.local_player?;
        self.players.iter().find(|player| player.id() == id)
    }

    /// Number of actors that are not dead.
    #[must_use]
    pub fn live_actor_count(&self) -> usize {
        self.actors.iter().filter(|actor| !actor.is_dead()).count()
    }

    /// Adds an actor after validating its collision radius against the tile size.
    pub fn add_actor(&mut self, actor: Box<dyn Actor>) -> Result<(), CrawlerError> {
        validate_radius(actor.kind(), actor.radius(), &self.level)?;
        self.actors.push(actor);
        Ok(())
    }

    /// Adds a player at `position`. The first player to join becomes the local player.
    pub fn add_player(&mut self, def: PlayerDef, position: Vec3) -> PlayerId {
        let id = PlayerId::new(self.next_player);
        self.next_player = self.next_player.saturating_add(1);
        info!(player = id.get(), nickname = %def.nickname, "player_added");
        self.players.push(Player::new(
            id,
            def,
            position,
            Arc::clone(&self.player_animations),
        ));
        if self.local_player.is_none() {
            self.local_player = Some(id);
        }
        id
    }

    /// Routes dispatched messages addressed to the scene.
    ///
    /// `ActorsAdded` batches are constructed through `spawner` and only join
    /// the scene once every actor of the batch was built; a joining
    /// player is placed on the first floor tile. Returns the number of actors
    /// and players added.
    pub fn apply_messages(
        &mut self,
        messages: &[Message],
        spawner: &dyn ActorSpawner,
    ) -> Result<usize, CrawlerError> {
        let mut added = 0;
        for message in messages {
            match message {
                Message::ActorsAdded(defs) => {
                    let batch = defs
                        .iter()
                        .map(|def| {
                            let actor = spawner.spawn(def)?;
                            validate_radius(actor.kind(), actor.radius(), &self.level)?;
                            Ok(actor)
                        })
                        .collect::<Result<Vec<_>, CrawlerError>>()?;
                    added += batch.len();
                    self.actors.extend(batch);
                }
                Message::PlayerAdded(def) => {
                    let position = self.level.first_floor_center().ok_or_else(|| {
                        CrawlerError::InvariantViolation(
                            "level has no floor tile to place a player on".into(),
                        )
                    })?;
                    let _ = self.add_player(def.clone(), position);
                    added += 1;
                }
                Message::ParticleSystemAdded(_) => {}
            }
        }
        Ok(added)
    }

    /// Advances the simulation by one tick.
    ///
    /// The local player reacts to `input` first, so actors observe its
    /// updated position. Expired actors are pruned at the end of the tick.
    pub fn update(
        &mut self,
        time: Duration,
        dt: Duration,
        input: InputSnapshot,
        bus: &mut MessageBus,
    ) {
        let local = self.local_player;
        for player in &mut self.players {
            if Some(player.id()) == local {
                let hits = player.step(
                    input,
                    dt,
                    &self.config.player,
                    &self.level,
                    &mut self.actors,
                    bus,
                );
                if hits > 0 {
                    debug!(player = player.id().get(), hits, "player_attack_connected");
                }
            } else {
                player.step_remote(dt, &self.config.player);
            }
        }

        let target = self.local_player().map(|player| player.position);
        for index in 0..self.actors.len() {
            let (before, rest) = self.actors.split_at_mut(index);
            let Some((current, after)) = rest.split_first_mut() else {
                continue;
            };
            let mut ctx = SceneContext::new(
                &self.level,
                [&*before, &*after],
                target,
                self.config.require_line_of_sight,
                bus,
            );
            current.update(&mut ctx, time, dt);
        }

        let before = self.actors.len();
        self.actors.retain(|actor| !actor.is_expired());
        let pruned = before - self.actors.len();
        if pruned > 0 {
            debug!(pruned, remaining = self.actors.len(), "expired_actors_pruned");
        }
    }

    /// Resolves a move of the actor at `index` against tiles and every other live actor.
    pub fn move_actor(&mut self, index: usize, dx: f32, dy: f32) {
        if index >= self.actors.len() {
            return;
        }
        let (before, rest) = self.actors.split_at_mut(index);
        let Some((current, after)) = rest.split_first_mut() else {
            return;
        };
        let radius = current.radius();
        let obstacles = player::live_obstacles(before).chain(player::live_obstacles(after));
        collision::resolve_move(
            &self.level,
            obstacles,
            &mut current.body_mut().position,
            dx,
            dy,
            radius,
        );
    }

    /// Ray-marches the level between two points.
    #[must_use]
    pub fn line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        collision::line_of_sight(&self.level, from, to)
    }

    /// Indices of up to `k` lights from the bucket containing `point`, nearest first.
    ///
    /// Only the single bucket under the query point is inspected. Lights are
    /// registered in every bucket their radius reaches, but a light in a
    /// neighbouring bucket whose radius does not reach this one is never
    /// returned even if it is closer than a returned light's bucket mates.
    #[must_use]
    pub fn nearest_lights(&self, point: Vec3, k: usize) -> Vec<usize> {
        let lights = self.level.lights();
        let mut candidates: Vec<(f32, usize)> = self
            .graph
            .lights_near(point)
            .iter()
            .filter_map(|index| {
                lights
                    .get(*index)
                    .map(|light| (sq_dist_2d(light.position, point), *index))
            })
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        candidates.into_iter().take(k).map(|(_, index)| index).collect()
    }

    /// Clears every shadow slot and assigns slots `0..n` to the nearest lights of `point`.
    ///
    /// Returns the number of slots assigned.
    pub fn prioritize_shadow_lights(&mut self, point: Vec3, max_shadows: usize) -> usize {
        let nearest = self.nearest_lights(point, max_shadows);
        let lights = self.level.lights_mut();
        for light in lights.iter_mut() {
            light.shadow_index = None;
        }
        for (slot, index) in nearest.iter().enumerate() {
            if let Some(light) = lights.get_mut(*index) {
                light.shadow_index = u32::try_from(slot).ok();
            }
        }
        nearest.len()
    }

    /// Damages every live actor in a cone in front of `origin`, returning the hit count.
    pub fn attack_enemies_cone(
        &mut self,
        origin: Vec3,
        look: Vec2,
        reach: f32,
        cone_cos: f32,
        damage: f32,
        bus: &mut MessageBus,
    ) -> usize {
        player::attack_enemies_cone(
            &mut self.actors,
            origin,
            look,
            reach,
            cone_cos,
            damage,
            bus,
        )
    }
}

fn validate_radius(owner: &str, radius: f32, level: &Level) -> Result<(), CrawlerError> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(CrawlerError::InvariantViolation(format!(
            "{owner} collision radius {radius} must be finite and non-negative"
        )));
    }
    if radius * 2.0 > level.tile_size() {
        return Err(CrawlerError::InvariantViolation(format!(
            "{owner} collision diameter {} exceeds the tile size {}",
            radius * 2.0,
            level.tile_size()
        )));
    }
    Ok(())
}

fn validate_attack_clip(
    animations: &ArmatureAnimations,
    tuning: &PlayerTuning,
) -> Result<(), CrawlerError> {
    let clip = animations.clip(player::ATTACK_CLIP).ok_or_else(|| {
        CrawlerError::Configuration(format!(
            "player armature has no `{}` clip",
            player::ATTACK_CLIP
        ))
    })?;
    if clip.max_frame() < tuning.attack_hit_frame {
        return Err(CrawlerError::Configuration(format!(
            "attack hit frame {} lies past the last attack frame {}",
            tuning.attack_hit_frame,
            clip.max_frame()
        )));
    }
    Ok(())
}
