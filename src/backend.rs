//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement
//! to work with the character controller. The solver itself never talks to a
//! physics engine: it reads and writes body velocity through the backend, and
//! the backend's plugin feeds contacts and snap probe hits into each
//! [`CharacterController`](crate::controller::CharacterController) during
//! [`CharacterControllerSet::Sensors`](crate::CharacterControllerSet::Sensors).

use bevy::prelude::*;

/// Trait for physics backend implementations.
///
/// Implement this trait to integrate a physics engine with the character
/// controller. For an example implementation, see the `rapier` module's
/// `Rapier3dBackend`.
///
/// A backend plugin is expected to:
/// - call [`CharacterController::on_contact`] once per contact point
///   touching the character during the last physics step;
/// - fill [`CharacterController::ground_probe`] with the snap probe hit when
///   [`CharacterController::wants_ground_probe`] is `true`.
///
/// [`CharacterController::on_contact`]: crate::controller::CharacterController::on_contact
/// [`CharacterController::ground_probe`]: crate::controller::CharacterController::ground_probe
/// [`CharacterController::wants_ground_probe`]: crate::controller::CharacterController::wants_ground_probe
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// The velocity component type used by this backend.
    type VelocityComponent: Component;

    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec3;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3);

    /// Get the current position of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .or_else(|| world.get::<GlobalTransform>(entity).map(|t| t.translation()))
            .unwrap_or(Vec3::ZERO)
    }

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
