//! Core controller systems.
//!
//! These systems drive [`CharacterController`] from the ECS. They are generic
//! over the physics backend so different physics engines can be used.

use bevy::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::config::ControllerConfig;
use crate::controller::CharacterController;
use crate::gravity::{CharacterGravity, GravityProvider};
use crate::intent::{InputBasis, InputSpace, MovementIntent};
use crate::state::{Airborne, Grounded, OnSteep};

/// Sample movement intents into the controllers.
///
/// Runs once per rendered frame. Input is mapped through the [`InputSpace`]
/// entity's transform when present, and jump presses are latched until the
/// next physics step consumes them.
pub fn sample_movement_input(
    mut q_characters: Query<(
        &ControllerConfig,
        &mut MovementIntent,
        &mut CharacterController,
        Option<&InputSpace>,
    )>,
    q_spaces: Query<&GlobalTransform>,
) {
    for (config, mut intent, mut controller, input_space) in &mut q_characters {
        let basis = input_space
            .and_then(|space| q_spaces.get(space.0).ok())
            .map(InputBasis::from_transform)
            .unwrap_or_default();

        let jump = intent.take_jump_edge();
        controller.sample_input(config, intent.axis, jump, basis);
    }
}

/// Run one solver step for every character.
///
/// Reads the body velocity through the backend, runs
/// [`CharacterController::physics_step`] on the contacts and probe hit
/// gathered during [`CharacterControllerSet::Sensors`], and writes the
/// resulting velocity back to the body.
///
/// [`CharacterControllerSet::Sensors`]: crate::CharacterControllerSet::Sensors
pub fn apply_locomotion<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let entities: Vec<(Entity, ControllerConfig, CharacterGravity, CharacterController)> = world
        .query::<(
            Entity,
            &ControllerConfig,
            Option<&CharacterGravity>,
            &CharacterController,
        )>()
        .iter(world)
        .map(|(e, config, gravity, controller)| {
            (
                e,
                *config,
                gravity.copied().unwrap_or_default(),
                controller.clone(),
            )
        })
        .collect();

    for (entity, config, gravity, mut controller) in entities {
        let velocity = B::get_velocity(world, entity);
        let position = B::get_position(world, entity);

        if !controller.is_initialized() {
            if let Err(error) = config.validate() {
                warn!("character {entity}: {error}");
            }
            controller.init(velocity, position, &gravity);
            debug!(
                "character {entity} initialized with up axis {:?}",
                controller.state.up_axis
            );
        }

        // The backend already cast the probe with this config's mask
        let cached = controller.ground_probe.take();
        let mut probe = move |_: Vec3, _: Vec3, max_distance: f32, _: u32| {
            cached.filter(|hit| hit.distance <= max_distance)
        };

        let velocity =
            controller.physics_step(&config, velocity, position, &gravity, &mut probe, dt);
        if velocity.is_finite() {
            B::set_velocity(world, entity, velocity);
        } else {
            warn!("character {entity}: solver produced non-finite velocity {velocity:?}");
        }

        if let Some(mut stored) = world.get_mut::<CharacterController>(entity) {
            *stored = controller;
        }
    }
}

/// Synchronize state marker components with the controller state.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &CharacterController,
        Has<Grounded>,
        Has<Airborne>,
        Option<&OnSteep>,
    )>,
) {
    for (entity, controller, has_grounded, has_airborne, on_steep) in &q_controllers {
        if !controller.is_initialized() {
            continue;
        }

        // Sync Grounded/Airborne
        if controller.is_grounded() && !has_grounded {
            commands.entity(entity).insert(Grounded);
            commands.entity(entity).remove::<Airborne>();
        } else if !controller.is_grounded() && has_grounded {
            commands.entity(entity).remove::<Grounded>();
            commands.entity(entity).insert(Airborne);
        } else if !controller.is_grounded() && !has_airborne && !has_grounded {
            commands.entity(entity).insert(Airborne);
        }

        // Sync OnSteep, only while not grounded
        let steep = controller.is_on_steep() && !controller.is_grounded();
        let normal = controller.state.steep_normal.normalize_or_zero();
        match (steep, on_steep) {
            (true, Some(current)) if current.normal == normal => {}
            (true, _) => {
                commands.entity(entity).insert(OnSteep::new(normal));
            }
            (false, Some(_)) => {
                commands.entity(entity).remove::<OnSteep>();
            }
            (false, None) => {}
        }
    }
}

/// Rotate characters so their local up follows gravity.
///
/// Only affects characters whose config enables
/// [`ControllerConfig::align_to_gravity`]. Bodies should have their rotation
/// locked so the physics engine does not fight this system.
pub fn align_to_gravity(
    mut q_characters: Query<(&ControllerConfig, Option<&CharacterGravity>, &mut Transform)>,
) {
    for (config, gravity, mut transform) in &mut q_characters {
        if !config.align_to_gravity {
            continue;
        }
        let up = gravity
            .copied()
            .unwrap_or_default()
            .sample(transform.translation)
            .up;
        let current = transform.rotation * Vec3::Y;
        let correction = Quat::from_rotation_arc(current, up);
        if correction.is_near_identity() {
            continue;
        }
        transform.rotation = (correction * transform.rotation).normalize();
    }
}
