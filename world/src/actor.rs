use std::{fmt, time::Duration};

use crypt_crawler_core::{ActorDef, ActorState, CrawlerError, Message, MessageBus};
use glam::Vec3;

use crate::{
    collision::{self, Obstacle},
    Level,
};

/// State shared by every actor variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorBody {
    /// World-space position.
    pub position: Vec3,
    /// Facing in radians.
    pub angle: f32,
    /// Current state.
    pub state: ActorState,
    /// State observed on the previous tick, `None` before the first tick.
    pub prev_state: Option<ActorState>,
}

impl ActorBody {
    /// Creates a body that has not been ticked yet.
    #[must_use]
    pub const fn new(position: Vec3, angle: f32, state: ActorState) -> Self {
        Self {
            position,
            angle,
            state,
            prev_state: None,
        }
    }

    /// Creates a body from a definition record.
    #[must_use]
    pub fn from_def(def: &ActorDef) -> Self {
        Self::new(def.position, def.angle, def.state)
    }

    /// Records the current state as observed, returning whether it changed since the last call.
    pub fn take_state_change(&mut self) -> bool {
        let changed = self.prev_state != Some(self.state);
        self.prev_state = Some(self.state);
        changed
    }
}

/// Behaviour shared by everything the scene simulates besides players.
pub trait Actor: fmt::Debug {
    /// Registered type tag the actor was created from.
    fn kind(&self) -> &str;

    /// Shared state of the actor.
    fn body(&self) -> &ActorBody;

    /// Mutable shared state of the actor.
    fn body_mut(&mut self) -> &mut ActorBody;

    /// Collision radius. Zero disables actor-vs-actor pushes for this actor.
    fn radius(&self) -> f32 {
        0.0
    }

    /// Reports whether the actor is dead. Dead actors no longer collide or get hit.
    fn is_dead(&self) -> bool {
        self.body().state == ActorState::Dead
    }

    /// Reports whether the actor can be removed from the scene.
    fn is_expired(&self) -> bool {
        false
    }

    /// Advances the actor by one tick.
    fn update(&mut self, _ctx: &mut SceneContext<'_>, _time: Duration, _dt: Duration) {}

    /// Applies a hit of `amount` arriving along the planar direction `(dir_x, dir_y)`.
    fn damage(&mut self, _amount: f32, _dir_x: f32, _dir_y: f32, _bus: &mut MessageBus) {}
}

/// Constructs actors from definition records.
pub trait ActorSpawner {
    /// Builds the actor described by `def`.
    fn spawn(&self, def: &ActorDef) -> Result<Box<dyn Actor>, CrawlerError>;
}

/// Read access to the scene handed to an actor while it updates.
///
/// The updating actor is borrowed separately, so the context only exposes the
/// actors before and after it in the scene's list.
pub struct SceneContext<'a> {
    level: &'a Level,
    others: [&'a [Box<dyn Actor>]; 2],
    local_player: Option<Vec3>,
    require_line_of_sight: bool,
    bus: &'a mut MessageBus,
}

impl<'a> SceneContext<'a> {
    pub(crate) fn new(
        level: &'a Level,
        others: [&'a [Box<dyn Actor>]; 2],
        local_player: Option<Vec3>,
        require_line_of_sight: bool,
        bus: &'a mut MessageBus,
    ) -> Self {
        Self {
            level,
            others,
            local_player,
            require_line_of_sight,
            bus,
        }
    }

    /// Level the scene simulates.
    #[must_use]
    pub fn level(&self) -> &Level {
        self.level
    }

    /// Position of the local player, if one joined.
    #[must_use]
    pub const fn local_player_position(&self) -> Option<Vec3> {
        self.local_player
    }

    /// Reports whether aggro should be gated on line of sight.
    #[must_use]
    pub const fn requires_line_of_sight(&self) -> bool {
        self.require_line_of_sight
    }

    /// Ray-marches the level between two points.
    #[must_use]
    pub fn line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        collision::line_of_sight(self.level, from, to)
    }

    /// Every other actor in the scene.
    pub fn other_actors(&self) -> impl Iterator<Item = &dyn Actor> + '_ {
        self.others
            .iter()
            .flat_map(|slice| slice.iter().map(|actor| actor.as_ref()))
    }

    /// Resolves a requested move of the updating actor against tiles and other live actors.
    pub fn move_body(&self, position: &mut Vec3, dx: f32, dy: f32, radius: f32) {
        let obstacles = self
            .other_actors()
            .filter(|actor| !actor.is_dead())
            .map(|actor| Obstacle {
                position: actor.body().position,
                radius: actor.radius(),
            });
        collision::resolve_move(self.level, obstacles, position, dx, dy, radius);
    }

    /// Queues a message on the scene's bus.
    pub fn post(&mut self, message: Message) {
        self.bus.post(message);
    }
}

impl fmt::Debug for SceneContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneContext")
            .field("others", &(self.others[0].len() + self.others[1].len()))
            .field("local_player", &self.local_player)
            .field("require_line_of_sight", &self.require_line_of_sight)
            .finish()
    }
}
