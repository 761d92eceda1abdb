#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Crypt Crawler simulation.
//!
//! This crate defines the vocabulary that connects the level pipeline, the
//! authoritative scene, and the actor systems. Load-time passes produce
//! [`TileDescriptor`] grids and [`Light`] records, systems announce side
//! effects by posting [`Message`] values onto a [`MessageBus`], and the
//! per-tick player state machine reads an [`InputSnapshot`].

mod error;
mod input;
mod messages;

use std::f32::consts::FRAC_PI_2;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

pub use error::CrawlerError;
pub use input::{InputAction, InputButtons, InputSnapshot, InputState};
pub use messages::{Message, MessageBus, MessageKind, ParticleKind, ParticleSpawn};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Crypt Crawler.";

/// Color and squared influence radius of a wall-mounted flame torch.
pub const FLAME_TORCH_COLOR: Vec4 = Vec4::new(1.0, 0.56, 0.22, 9_216.0);

/// Identifier of a renderable submesh selected for a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(u8);

impl TileId {
    /// Creates a tile identifier from the submesh index.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the submesh index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Rotational facing of a tile expressed in quarter turns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Orientation(u8);

impl Orientation {
    /// Facing applied to floors, south walls and south-west corners.
    pub const SOUTH: Self = Self(0);
    /// Facing applied to west walls and north-west corners.
    pub const WEST: Self = Self(1);
    /// Facing applied to north walls and north-east corners.
    pub const NORTH: Self = Self(2);
    /// Facing applied to east walls and south-east corners.
    pub const EAST: Self = Self(3);

    /// Creates an orientation, wrapping the provided quarter turns into `0..4`.
    #[must_use]
    pub const fn new(quarter_turns: u8) -> Self {
        Self(quarter_turns & 3)
    }

    /// Number of quarter turns applied to the tile.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Post-solve descriptor selecting a mesh variant and its rotational facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileDescriptor {
    tile: Option<TileId>,
    orientation: Orientation,
}

impl TileDescriptor {
    /// Descriptor for a cell that carries no geometry.
    pub const UNSET: Self = Self {
        tile: None,
        orientation: Orientation::SOUTH,
    };

    /// Creates a descriptor for the provided tile and facing.
    #[must_use]
    pub const fn new(tile: TileId, orientation: Orientation) -> Self {
        Self {
            tile: Some(tile),
            orientation,
        }
    }

    /// Tile selected for the cell, or `None` when the cell has no geometry.
    #[must_use]
    pub const fn tile(&self) -> Option<TileId> {
        self.tile
    }

    /// Facing applied to the tile.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Reports whether the cell was left without geometry.
    #[must_use]
    pub const fn is_unset(&self) -> bool {
        self.tile.is_none()
    }

    /// Returns a copy of the descriptor with the tile replaced, keeping its facing.
    #[must_use]
    pub const fn with_tile(self, tile: TileId) -> Self {
        Self {
            tile: Some(tile),
            orientation: self.orientation,
        }
    }

    /// Encodes the descriptor as the `[tile, orientation]` pair consumed by renderers.
    ///
    /// Cells without geometry encode both slots as `-1`.
    #[must_use]
    pub fn to_pair(self) -> [i8; 2] {
        match self.tile.and_then(|tile| i8::try_from(tile.get()).ok()) {
            Some(tile) => [tile, self.orientation.get() as i8],
            None => [-1, -1],
        }
    }
}

/// Point light placed in the level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    /// World-space center of the light.
    pub position: Vec3,
    /// RGB color with the squared influence radius stored in alpha.
    pub color: Vec4,
    /// Shadow map slot assigned for the current frame, if any.
    pub shadow_index: Option<u32>,
}

impl Light {
    /// Creates a light without a shadow slot.
    #[must_use]
    pub const fn new(position: Vec3, color: Vec4) -> Self {
        Self {
            position,
            color,
            shadow_index: None,
        }
    }

    /// Squared influence radius of the light.
    #[must_use]
    pub fn radius_squared(&self) -> f32 {
        self.color.w
    }

    /// Influence radius of the light in world units.
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius_squared().max(0.0).sqrt()
    }
}

/// States an AI-driven actor moves through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorState {
    /// Standing still and watching for a target.
    #[default]
    Idle,
    /// Moving towards the local player.
    Chase,
    /// Terminal state entered when hit points reach zero.
    Dead,
    /// Playing a one-shot attack.
    Attack,
}

impl ActorState {
    /// Numeric code of the state as exchanged with renderers and level data.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Chase => 1,
            Self::Dead => 2,
            Self::Attack => 3,
        }
    }

    /// Resolves a numeric state code, returning `None` for unknown codes.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Idle),
            1 => Some(Self::Chase),
            2 => Some(Self::Dead),
            3 => Some(Self::Attack),
            _ => None,
        }
    }
}

/// States the input-driven player moves through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlayerState {
    /// No movement input is held.
    #[default]
    Idle,
    /// Moving along the input axis.
    Running,
    /// Playing a melee swing.
    Attack,
}

/// Definition record used to construct a concrete actor.
#[derive(Clone, Debug, PartialEq)]
pub struct ActorDef {
    /// Registered type tag resolved by the actor factory.
    pub kind: String,
    /// World-space spawn position.
    pub position: Vec3,
    /// Initial facing in radians.
    pub angle: f32,
    /// Initial state of the actor.
    pub state: ActorState,
}

/// Slots of the gear array carried by a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GearSlot {
    /// Helmets and hats.
    Head,
    /// Chest armor.
    Torso,
    /// Leg armor.
    Legs,
    /// Gloves and gauntlets.
    Hands,
}

impl GearSlot {
    /// Index of the slot inside [`PlayerDef::gear`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Head => 0,
            Self::Torso => 1,
            Self::Legs => 2,
            Self::Hands => 3,
        }
    }
}

/// Schema announced when a player joins the scene.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerDef {
    /// Display name of the player.
    pub nickname: String,
    /// Equipped item identifiers indexed by [`GearSlot`].
    pub gear: [u32; 4],
    /// Head mesh variant.
    pub head: u32,
    /// Body mesh variant.
    pub body: u32,
    /// Skin tint variant.
    pub skin: u32,
}

/// Squared distance between two points measured on the XZ plane.
#[must_use]
pub fn sq_dist_2d(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz
}

/// Yaw that makes a model face along the planar direction `(dx, dz)`.
#[must_use]
pub fn facing_angle(dx: f32, dz: f32) -> f32 {
    (-dz).atan2(dx) + FRAC_PI_2
}
