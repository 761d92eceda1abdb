#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative scene state for Crypt Crawler.
//!
//! The [`Scene`] owns the solved [`Level`], its [`LightGraph`], every
//! [`Actor`] and every [`Player`]. Movement requests from actors and players
//! are resolved against the tile grid and against other bodies here, and the
//! scene answers the spatial queries AI and renderers depend on.

mod actor;
mod animation;
mod collision;
mod level;
mod lights;
mod player;
mod scene;

pub use actor::{Actor, ActorBody, ActorSpawner, SceneContext};
pub use animation::{AnimationController, ArmatureAnimations, Clip, ClipSource, Tween};
pub use collision::{line_of_sight, resolve_move, Obstacle};
pub use level::{Level, LevelLayout};
pub use lights::LightGraph;
pub use player::{Player, PlayerId, PlayerTuning};
pub use scene::{Scene, SceneConfig};
