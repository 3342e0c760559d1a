//! # `msg_locomotion`
//!
//! A 3D rigidbody character locomotion controller with physics backend abstraction.
//!
//! This crate provides a responsive, tuneable character controller that:
//! - Drives a dynamic rigidbody by rewriting its velocity every physics step
//! - Classifies contacts into walkable ground, stairs and steep walls
//! - Snaps to the ground over small bumps and ledges instead of launching off them
//! - Supports ground jumps, wall jumps and a configurable number of air jumps
//! - Takes "up" from an arbitrary gravity field, including planet-style gravity
//! - Abstracts the physics backend for easy swapping (Rapier3D included)
//!
//! ## Architecture
//!
//! Each physics step runs in three phases:
//! 1. **Sensors**: the backend feeds the contacts of the last step, and a
//!    snap probe hit when useful, into [`CharacterController`]
//! 2. **Solver**: [`CharacterController::physics_step`] resolves ground,
//!    accelerates toward the desired velocity, jumps and applies gravity
//! 3. **Sync**: marker components and the optional gravity alignment follow
//!    the new state
//!
//! Player input is sampled once per rendered frame from [`MovementIntent`].
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use msg_locomotion::prelude::*;
//!
//! // Controller components for a player character
//! let controller = CharacterController::new();
//! let config = ControllerConfig::player();
//! let intent = MovementIntent::default();
//! assert!(config.validate().is_ok());
//!
//! // These are spawned together with the backend's physics components
//! ```
//!
//! [`CharacterController`]: controller::CharacterController
//! [`CharacterController::physics_step`]: controller::CharacterController::physics_step
//! [`MovementIntent`]: intent::MovementIntent

use bevy::prelude::*;

pub mod backend;
pub mod collision;
pub mod config;
pub mod contact;
pub mod controller;
pub mod gravity;
pub mod intent;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::CharacterPhysicsBackend;
    pub use crate::collision::{GroundProbe, ProbeHit};
    pub use crate::config::{ConfigError, ControllerConfig, SurfaceKind};
    pub use crate::contact::{ContactAccumulator, ContactKind};
    pub use crate::controller::CharacterController;
    pub use crate::gravity::{CharacterGravity, GravityProvider, GravitySample};
    pub use crate::intent::{InputBasis, InputSpace, MovementIntent};
    pub use crate::state::{Airborne, Grounded, MovementState, OnSteep};
    pub use crate::{CharacterControllerPlugin, CharacterControllerSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Rapier3dBackend, Rapier3dCharacterBundle};
}

/// System sets of one controller physics step, run in this order in
/// [`FixedUpdate`].
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterControllerSet {
    /// Backend systems gather contacts and probe hits.
    Sensors,
    /// The locomotion solver runs and writes body velocities.
    Solver,
    /// Marker components and orientation follow the solved state.
    Sync,
}

/// Main plugin for the character controller system.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (velocity access, contacts, ray casts).
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier3dBackend`)
///
/// # Examples
///
/// With Rapier3D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use msg_locomotion::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
///     .add_plugins(CharacterControllerPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct CharacterControllerPlugin<B: backend::CharacterPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for CharacterControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for CharacterControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<controller::CharacterController>();
        app.register_type::<config::ControllerConfig>();
        app.register_type::<config::SurfaceKind>();
        app.register_type::<gravity::CharacterGravity>();
        app.register_type::<intent::MovementIntent>();
        app.register_type::<intent::InputSpace>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::OnSteep>();

        app.configure_sets(
            FixedUpdate,
            (
                CharacterControllerSet::Sensors,
                CharacterControllerSet::Solver,
                CharacterControllerSet::Sync,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        // Input is sampled per rendered frame and consumed by the fixed step
        app.add_systems(Update, systems::sample_movement_input);

        app.add_systems(
            FixedUpdate,
            systems::apply_locomotion::<B>.in_set(CharacterControllerSet::Solver),
        );
        app.add_systems(
            FixedUpdate,
            (systems::sync_state_markers, systems::align_to_gravity)
                .in_set(CharacterControllerSet::Sync),
        );
    }
}
