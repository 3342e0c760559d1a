//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.
//!
//! Rapier should run in the fixed schedule so the controller sees the
//! contacts of exactly one physics step per solver step:
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bevy_rapier3d::prelude::*;
//! use msg_locomotion::prelude::*;
//!
//! App::new()
//!     .add_plugins(DefaultPlugins)
//!     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
//!     .add_plugins(CharacterControllerPlugin::<Rapier3dBackend>::default())
//!     .run();
//! ```

use bevy::prelude::*;
use bevy_rapier3d::geometry::Group;
use bevy_rapier3d::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::collision::ProbeHit;
use crate::config::ControllerConfig;
use crate::controller::CharacterController;
use crate::gravity::{CharacterGravity, GravityProvider};
use crate::CharacterControllerSet;

/// Rapier3D physics backend for the character controller.
///
/// Velocity is read from and written to the [`Velocity`] component. Contact
/// gathering and the snap probe are handled by dedicated Rapier systems that
/// receive the Rapier context as a system parameter.
pub struct Rapier3dBackend;

impl CharacterPhysicsBackend for Rapier3dBackend {
    type VelocityComponent = Velocity;

    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }
}

/// Plugin that sets up Rapier3D-specific systems for the character controller.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        // Contacts first: the probe is skipped for characters already touching ground
        app.add_systems(
            FixedUpdate,
            (rapier_collect_contacts, rapier_ground_probe)
                .chain()
                .in_set(CharacterControllerSet::Sensors),
        );
    }
}

/// Collision membership bits of a collider.
///
/// Colliders without [`CollisionGroups`] belong to every group.
fn memberships_of(groups: Option<&CollisionGroups>) -> u32 {
    groups.map_or(Group::ALL.bits(), |groups| groups.memberships.bits())
}

/// Feed the contacts of the last Rapier step into each controller.
///
/// Every solver contact of the step contributes its surface normal once,
/// pointing from the touched surface toward the character.
fn rapier_collect_contacts(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<(Entity, &ControllerConfig, &mut CharacterController)>,
    q_groups: Query<&CollisionGroups>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, config, mut controller) in &mut q_controllers {
        for pair in context.contact_pairs_with(entity) {
            if !pair.has_any_active_contact() {
                continue;
            }

            let collider1: Option<Entity> = pair.collider1().into();
            let collider2: Option<Entity> = pair.collider2().into();
            let (is_first, other) = if collider1 == Some(entity) {
                (true, collider2)
            } else {
                (false, collider1)
            };
            let Some(other) = other else {
                continue;
            };
            let surface = config.surface_kind(memberships_of(q_groups.get(other).ok()));

            for manifold in pair.manifolds() {
                // Manifold normals point away from the first collider
                let normal = if is_first {
                    -manifold.normal()
                } else {
                    manifold.normal()
                };
                for _ in 0..manifold.num_solver_contacts() {
                    controller.on_contact(config, normal, surface);
                }
            }
        }
    }
}

/// Cast the snap probe for characters that may snap this step.
fn rapier_ground_probe(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<(
        Entity,
        &GlobalTransform,
        &ControllerConfig,
        Option<&CharacterGravity>,
        Option<&Velocity>,
        &mut CharacterController,
    )>,
    q_groups: Query<&CollisionGroups>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, transform, config, gravity, velocity, mut controller) in &mut q_controllers {
        let velocity = velocity.map(|v| v.linvel).unwrap_or(Vec3::ZERO);
        if !controller.wants_ground_probe(config, velocity) {
            controller.ground_probe = None;
            continue;
        }

        let origin = transform.translation();
        let down = -gravity.copied().unwrap_or_default().sample(origin).up;
        controller.ground_probe = rapier_raycast(
            &context,
            origin,
            down,
            config.probe_distance,
            entity,
            config.probe_mask,
        )
        .map(|mut hit| {
            hit.memberships = memberships_of(hit.entity.and_then(|e| q_groups.get(e).ok()));
            hit
        });
    }
}

/// Perform a raycast using RapierContext.
///
/// Only colliders whose memberships intersect `mask` are hit. The returned
/// hit carries no membership bits; callers fill them in.
fn rapier_raycast(
    context: &RapierContext,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    exclude_entity: Entity,
    mask: u32,
) -> Option<ProbeHit> {
    let filter = QueryFilter::default()
        .exclude_rigid_body(exclude_entity)
        .exclude_sensors()
        .groups(CollisionGroups::new(
            Group::ALL,
            Group::from_bits_truncate(mask),
        ));

    context
        .cast_ray_and_get_normal(origin, direction, max_distance, true, filter)
        .map(|(hit_entity, hit)| {
            ProbeHit::new(
                hit.time_of_impact,
                hit.normal,
                hit.point,
                Some(hit_entity),
                0,
            )
        })
}

/// Bundle for creating a character with Rapier3D physics.
///
/// This bundle provides the Rapier3D components a controlled character
/// needs: a dynamic body whose velocity the controller drives, locked
/// rotation, no Rapier gravity (the controller applies its own) and
/// frictionless contact so the body does not stick to walls.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use msg_locomotion::prelude::*;
/// use msg_locomotion::rapier::Rapier3dCharacterBundle;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         CharacterController::new(),
///         ControllerConfig::player(),
///         MovementIntent::default(),
///         Rapier3dCharacterBundle::new(),
///         Collider::ball(0.5),
///     ));
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`]
/// - `locked_axes`: [`LockedAxes::ROTATION_LOCKED`]
/// - `gravity_scale`: 0 (gravity comes from [`CharacterGravity`])
/// - `friction`: 0, combined with [`CoefficientCombineRule::Min`]
/// - `damping`: none
#[derive(Bundle)]
pub struct Rapier3dCharacterBundle {
    /// The rigid body type. Should typically be [`RigidBody::Dynamic`] for characters.
    pub rigid_body: RigidBody,
    /// Current linear and angular velocity. Written by the controller each step.
    pub velocity: Velocity,
    /// Which axes are locked.
    pub locked_axes: LockedAxes,
    /// Scale of Rapier's own gravity.
    pub gravity_scale: GravityScale,
    /// Contact friction of the character's collider.
    pub friction: Friction,
    /// Damping coefficients for velocity reduction.
    pub damping: Damping,
}

impl Default for Rapier3dCharacterBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier3dCharacterBundle {
    /// Create a new character bundle with the defaults listed above.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            gravity_scale: GravityScale(0.0),
            friction: Friction {
                coefficient: 0.0,
                combine_rule: CoefficientCombineRule::Min,
            },
            damping: Damping {
                linear_damping: 0.0,
                angular_damping: 0.0,
            },
        }
    }

    /// Set the rigid body type for the character.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set the initial linear velocity.
    pub fn with_velocity(mut self, linvel: Vec3) -> Self {
        self.velocity = Velocity::linear(linvel);
        self
    }

    /// Set the damping coefficients for velocity reduction.
    ///
    /// Damping fights the controller's acceleration, so keep `linear` small.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }

    /// Set which axes should be locked for the rigid body.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}
