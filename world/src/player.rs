use std::{sync::Arc, time::Duration};

use crypt_crawler_core::{
    facing_angle, InputButtons, InputSnapshot, MessageBus, PlayerDef, PlayerState,
};
use glam::{Quat, Vec2, Vec3};
use serde::Deserialize;

use crate::{
    animation::{AnimationController, ArmatureAnimations},
    collision::{self, Obstacle},
    Actor, Level,
};

pub(crate) const ATTACK_CLIP: &str = "Attack";

/// Identifier assigned to a player when it joins the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a player identifier with the provided numeric value.
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

/// Tuning knobs for the input-driven player.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Running speed in world units per second.
    pub run_speed: f32,
    /// Collision radius.
    pub radius: f32,
    /// Slerp factor applied to the rendered rotation once per tick.
    ///
    /// The factor is not scaled by the tick duration, so smoothing assumes a
    /// nominal tick rate and converges faster at higher frame rates.
    pub rotation_smoothing: f32,
    /// Distance beyond the target's radius that a swing still connects.
    pub attack_reach: f32,
    /// Minimum cosine between facing and target direction for a hit.
    pub attack_cone_cos: f32,
    /// Frame of the attack clip on which the hit is applied.
    pub attack_hit_frame: f32,
    /// Hit points removed per connecting swing.
    pub attack_damage: f32,
    /// Idle clip playback in frames per second.
    pub idle_rate: f32,
    /// Run clip playback in frames per second.
    pub run_rate: f32,
    /// Attack clip playback in frames per second.
    pub attack_rate: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            run_speed: 96.0,
            radius: 6.0,
            rotation_smoothing: 0.25,
            attack_reach: 14.0,
            attack_cone_cos: 0.5,
            attack_hit_frame: 8.0,
            attack_damage: 1.0,
            idle_rate: 20.0,
            run_rate: 30.0,
            attack_rate: 30.0,
        }
    }
}

/// Player record held by the scene.
#[derive(Clone, Debug)]
pub struct Player {
    id: PlayerId,
    /// Schema the player joined with.
    pub def: PlayerDef,
    /// World-space position.
    pub position: Vec3,
    /// Target facing.
    pub rotation: Quat,
    /// Facing presented to renderers, smoothed towards [`Player::rotation`].
    pub render_rotation: Quat,
    /// Planar facing vector, `(x, z)`.
    pub look: Vec2,
    /// Current state.
    pub state: PlayerState,
    prev_state: Option<PlayerState>,
    did_attack: bool,
    anim: AnimationController,
}

impl Player {
    pub(crate) fn new(
        id: PlayerId,
        def: PlayerDef,
        position: Vec3,
        animations: Arc<ArmatureAnimations>,
    ) -> Self {
        Self {
            id,
            def,
            position,
            rotation: Quat::IDENTITY,
            render_rotation: Quat::IDENTITY,
            look: Vec2::Y,
            state: PlayerState::Idle,
            prev_state: None,
            did_attack: false,
            anim: AnimationController::new(animations),
        }
    }

    /// Identifier assigned by the scene.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Reports whether the current swing already applied its hit.
    #[must_use]
    pub const fn did_attack(&self) -> bool {
        self.did_attack
    }

    /// Animation cursor of the player.
    #[must_use]
    pub fn animation(&self) -> &AnimationController {
        &self.anim
    }

    /// Advances the local player from the tick's input snapshot.
    pub(crate) fn step(
        &mut self,
        input: InputSnapshot,
        dt: Duration,
        tuning: &PlayerTuning,
        level: &Level,
        actors: &mut [Box<dyn Actor>],
        bus: &mut MessageBus,
    ) -> usize {
        if self.state != PlayerState::Attack {
            if input.buttons.contains(InputButtons::ATTACK) {
                self.state = PlayerState::Attack;
                self.did_attack = false;
            } else {
                self.run(input, dt, tuning, level, actors);
            }
        }

        self.refresh_animation(tuning);

        let mut hits = 0;
        if self.state == PlayerState::Attack {
            self.anim.advance_once(dt);
            if !self.did_attack && self.anim.frame() >= tuning.attack_hit_frame {
                hits = attack_enemies_cone(
                    actors,
                    self.position,
                    self.look,
                    tuning.attack_reach,
                    tuning.attack_cone_cos,
                    tuning.attack_damage,
                    bus,
                );
                self.did_attack = true;
            }
            if !self.anim.is_playing() {
                self.state = PlayerState::Idle;
            }
        } else {
            self.anim.advance_loop(dt);
        }

        self.render_rotation = self
            .render_rotation
            .slerp(self.rotation, tuning.rotation_smoothing.clamp(0.0, 1.0));
        hits
    }

    /// Advances animation for a player driven by something other than local input.
    pub(crate) fn step_remote(&mut self, dt: Duration, tuning: &PlayerTuning) {
        self.refresh_animation(tuning);
        self.anim.advance_loop(dt);
    }

    fn run(
        &mut self,
        input: InputSnapshot,
        dt: Duration,
        tuning: &PlayerTuning,
        level: &Level,
        actors: &[Box<dyn Actor>],
    ) {
        let axis = Vec2::new(f32::from(input.axis_h), f32::from(input.axis_v));
        if axis == Vec2::ZERO {
            self.state = PlayerState::Idle;
            return;
        }

        let direction = axis.normalize();
        self.state = PlayerState::Running;
        self.look = direction;
        self.rotation = Quat::from_rotation_y(facing_angle(direction.x, direction.y));

        let distance = tuning.run_speed * dt.as_secs_f32();
        collision::resolve_move(
            level,
            live_obstacles(actors),
            &mut self.position,
            direction.x * distance,
            direction.y * distance,
            tuning.radius,
        );
    }

    fn refresh_animation(&mut self, tuning: &PlayerTuning) {
        if self.prev_state == Some(self.state) {
            return;
        }
        match self.state {
            PlayerState::Idle => self.anim.set("Idle", tuning.idle_rate),
            PlayerState::Running => self.anim.set("Run", tuning.run_rate),
            PlayerState::Attack => self.anim.set(ATTACK_CLIP, tuning.attack_rate),
        }
        self.prev_state = Some(self.state);
    }
}

pub(crate) fn live_obstacles(actors: &[Box<dyn Actor>]) -> impl Iterator<Item = Obstacle> + '_ {
    actors
        .iter()
        .filter(|actor| !actor.is_dead())
        .map(|actor| Obstacle {
            position: actor.body().position,
            radius: actor.radius(),
        })
}

/// Damages every live actor inside a cone in front of `origin`.
///
/// An actor is hit when it lies within `reach` plus its own radius and the
/// cosine between `look` and the direction towards it is at least
/// `cone_cos`. Actors standing on `origin` are always hit. Returns the number
/// of actors hit.
pub(crate) fn attack_enemies_cone(
    actors: &mut [Box<dyn Actor>],
    origin: Vec3,
    look: Vec2,
    reach: f32,
    cone_cos: f32,
    damage: f32,
    bus: &mut MessageBus,
) -> usize {
    let look = look.normalize_or_zero();
    let mut hits = 0;
    for actor in actors.iter_mut().filter(|actor| !actor.is_dead()) {
        let offset = Vec2::new(
            actor.body().position.x - origin.x,
            actor.body().position.z - origin.z,
        );
        let limit = reach + actor.radius();
        if offset.length_squared() > limit * limit {
            continue;
        }
        let direction = offset.normalize_or_zero();
        if direction != Vec2::ZERO && direction.dot(look) < cone_cos {
            continue;
        }
        let hit = if direction == Vec2::ZERO { look } else { direction };
        actor.damage(damage, hit.x, hit.y, bus);
        hits += 1;
    }
    hits
}
