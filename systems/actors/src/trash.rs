use std::{sync::Arc, time::Duration};

use crypt_crawler_core::{
    facing_angle, sq_dist_2d, ActorDef, ActorState, Message, MessageBus, ParticleKind,
    ParticleSpawn,
};
use crypt_crawler_world::{Actor, ActorBody, AnimationController, ArmatureAnimations, SceneContext};
use glam::{Vec2, Vec3};
use serde::Deserialize;
use tracing::debug;

/// Tuning shared by every aggressive trash enemy.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrashTuning {
    /// Squared planar distance at which an idle enemy starts chasing.
    pub aggro_range_sq: f32,
    /// Squared planar distance at which an enemy stops to attack.
    pub attack_range_sq: f32,
    /// Chase speed in world units per second.
    pub chase_speed: f32,
    /// Hit points on spawn.
    pub max_hp: f32,
    /// Collision radius.
    pub radius: f32,
    /// Idle clip playback in frames per second.
    pub idle_rate: f32,
    /// Chase clip playback in frames per second.
    pub chase_rate: f32,
    /// Attack clip playback in frames per second.
    pub attack_rate: f32,
    /// Death clip playback in frames per second.
    pub death_rate: f32,
    /// Seconds a corpse stays in the scene after its death clip ends.
    pub corpse_linger_secs: f32,
}

impl Default for TrashTuning {
    fn default() -> Self {
        Self {
            aggro_range_sq: 2_600.0,
            attack_range_sq: 100.0,
            chase_speed: 48.0,
            max_hp: 3.0,
            radius: 8.0,
            idle_rate: 20.0,
            chase_rate: 30.0,
            attack_rate: 30.0,
            death_rate: 24.0,
            corpse_linger_secs: 5.0,
        }
    }
}

/// Enemy that idles until the local player draws near, then chases and attacks.
#[derive(Clone, Debug)]
pub struct AggressiveTrash {
    kind: String,
    body: ActorBody,
    hp: f32,
    tuning: TrashTuning,
    anim: AnimationController,
    corpse: Option<Duration>,
}

impl AggressiveTrash {
    /// Creates an enemy from its definition record.
    #[must_use]
    pub fn new(def: &ActorDef, tuning: TrashTuning, animations: Arc<ArmatureAnimations>) -> Self {
        Self {
            kind: def.kind.clone(),
            body: ActorBody::from_def(def),
            hp: tuning.max_hp,
            tuning,
            anim: AnimationController::new(animations),
            corpse: None,
        }
    }

    /// Remaining hit points.
    #[must_use]
    pub const fn hp(&self) -> f32 {
        self.hp
    }

    /// Hit points on spawn.
    #[must_use]
    pub const fn max_hp(&self) -> f32 {
        self.tuning.max_hp
    }

    /// Animation cursor of the enemy.
    #[must_use]
    pub fn animation(&self) -> &AnimationController {
        &self.anim
    }

    fn think(&mut self, ctx: &mut SceneContext<'_>, dt: Duration) {
        let Some(target) = ctx.local_player_position() else {
            return;
        };
        let distance_sq = sq_dist_2d(target, self.body.position);

        match self.body.state {
            ActorState::Idle => {
                if distance_sq <= self.tuning.attack_range_sq {
                    self.body.state = ActorState::Attack;
                } else if distance_sq <= self.tuning.aggro_range_sq
                    && (!ctx.requires_line_of_sight()
                        || ctx.line_of_sight(self.body.position, target))
                {
                    self.body.state = ActorState::Chase;
                }
            }
            ActorState::Chase => {
                if distance_sq <= self.tuning.attack_range_sq {
                    self.body.state = ActorState::Idle;
                    return;
                }
                let direction = Vec2::new(
                    target.x - self.body.position.x,
                    target.z - self.body.position.z,
                )
                .normalize_or_zero();
                self.body.angle = facing_angle(direction.x, direction.y);
                let step = self.tuning.chase_speed * dt.as_secs_f32();
                ctx.move_body(
                    &mut self.body.position,
                    direction.x * step,
                    direction.y * step,
                    self.tuning.radius,
                );
            }
            ActorState::Attack | ActorState::Dead => {}
        }
    }

    fn refresh_animation(&mut self) {
        if !self.body.take_state_change() {
            return;
        }
        debug!(kind = %self.kind, state = ?self.body.state, "actor_state_changed");
        match self.body.state {
            ActorState::Idle => self.anim.set("Idle", self.tuning.idle_rate),
            ActorState::Chase => self.anim.set("Walk", self.tuning.chase_rate),
            ActorState::Attack => self.anim.set("Attack", self.tuning.attack_rate),
            ActorState::Dead => self.anim.set("Death", self.tuning.death_rate),
        }
    }
}

impl Actor for AggressiveTrash {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn body(&self) -> &ActorBody {
        &self.body
    }

    fn body_mut(&mut self) -> &mut ActorBody {
        &mut self.body
    }

    fn radius(&self) -> f32 {
        self.tuning.radius
    }

    fn is_expired(&self) -> bool {
        self.corpse.map_or(false, |lingered| {
            lingered.as_secs_f32() >= self.tuning.corpse_linger_secs
        })
    }

    fn update(&mut self, ctx: &mut SceneContext<'_>, _time: Duration, dt: Duration) {
        if !self.is_dead() {
            self.think(ctx, dt);
        }
        self.refresh_animation();

        match self.body.state {
            ActorState::Attack => {
                self.anim.advance_once(dt);
                if !self.anim.is_playing() {
                    self.body.state = ActorState::Idle;
                }
            }
            ActorState::Dead => {
                self.anim.advance_once(dt);
                if !self.anim.is_playing() {
                    let lingered = self
                        .corpse
                        .map_or(Duration::ZERO, |lingered| lingered.saturating_add(dt));
                    self.corpse = Some(lingered);
                }
            }
            ActorState::Idle | ActorState::Chase => self.anim.advance_loop(dt),
        }
    }

    fn damage(&mut self, amount: f32, dir_x: f32, dir_y: f32, bus: &mut MessageBus) {
        self.hp = (self.hp - amount).max(0.0);
        if self.hp <= 0.0 && self.body.state != ActorState::Dead {
            self.body.state = ActorState::Dead;
            debug!(kind = %self.kind, "actor_died");
        }
        bus.post(Message::ParticleSystemAdded(ParticleSpawn {
            kind: ParticleKind::Blood,
            position: self.body.position + Vec3::Y * self.tuning.radius,
            direction: Vec3::new(dir_x, 0.0, dir_y),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crabby() -> AggressiveTrash {
        let def = ActorDef {
            kind: "crabby".into(),
            position: Vec3::new(40.0, 0.0, 40.0),
            angle: 0.0,
            state: ActorState::Idle,
        };
        AggressiveTrash::new(
            &def,
            TrashTuning::default(),
            Arc::new(ArmatureAnimations::default()),
        )
    }

    #[test]
    fn every_hit_splatters_blood_along_the_hit() {
        let mut crabby = crabby();
        let mut bus = MessageBus::new();
        crabby.damage(1.0, 1.0, 0.0, &mut bus);
        crabby.damage(1.0, 0.0, -1.0, &mut bus);

        assert_eq!(crabby.body().state, ActorState::Idle);
        let directions: Vec<Vec3> = bus
            .iter_pending()
            .map(|message| match message {
                Message::ParticleSystemAdded(spawn) => {
                    assert_eq!(spawn.kind, ParticleKind::Blood);
                    spawn.direction
                }
                other => panic!("unexpected message {other:?}"),
            })
            .collect();
        assert_eq!(directions, vec![Vec3::X, Vec3::NEG_Z]);
    }

    #[test]
    fn hit_points_bottom_out_at_zero_and_kill() {
        let mut crabby = crabby();
        let mut bus = MessageBus::new();
        crabby.damage(10.0, 0.0, 1.0, &mut bus);
        assert_eq!(crabby.hp(), 0.0);
        assert!(crabby.is_dead());
        assert!(!crabby.is_expired());

        crabby.damage(1.0, 0.0, 1.0, &mut bus);
        assert_eq!(crabby.hp(), 0.0);
        assert_eq!(bus.pending(), 2);
    }

    #[test]
    fn tuning_reads_partial_toml() {
        let tuning: TrashTuning = toml::from_str("chase_speed = 64.0").expect("toml");
        assert_eq!(tuning.chase_speed, 64.0);
        assert_eq!(tuning.aggro_range_sq, 2_600.0);
        assert_eq!(tuning.attack_range_sq, 100.0);
    }
}
