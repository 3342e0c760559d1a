//! The locomotion solver.
//!
//! [`CharacterController`] is the central hub of a character. It owns the
//! long-lived [`MovementState`] and the per-step [`ContactAccumulator`], and
//! exposes the four entry points the simulation loop drives:
//!
//! 1. [`CharacterController::init`] once, with the body's velocity.
//! 2. [`CharacterController::sample_input`] once per rendered frame.
//! 3. [`CharacterController::on_contact`] once per contact, during the step.
//! 4. [`CharacterController::physics_step`] once per fixed step, after contacts.
//!
//! None of these touch the ECS world, so the solver can be driven by any
//! physics engine.

use bevy::log::{debug, trace};
use bevy::prelude::*;

use crate::collision::{GroundProbe, ProbeHit};
use crate::config::{ControllerConfig, SlopeThresholds, SurfaceKind};
use crate::contact::{ContactAccumulator, ContactKind};
use crate::gravity::GravityProvider;
use crate::intent::InputBasis;
use crate::state::MovementState;

/// Core character controller component.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct CharacterController {
    /// Long-lived movement state.
    pub state: MovementState,
    /// Contacts gathered for the current physics step.
    pub contacts: ContactAccumulator,
    /// Snap probe result cast ahead of the step by the physics backend.
    pub ground_probe: Option<ProbeHit>,
    /// Set once `init` has run.
    pub(crate) initialized: bool,
}

impl CharacterController {
    /// Create an uninitialized controller.
    ///
    /// The ECS integration initializes it from the body on its first step.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize from the body's current velocity and the gravity at its position.
    ///
    /// Input sampled before initialization is kept.
    pub fn init(&mut self, velocity: Vec3, position: Vec3, gravity: &impl GravityProvider) {
        let sample = gravity.sample(position);
        let previous = self.state;
        self.state = MovementState::new(velocity, sample.up);
        self.state.gravity = sample.gravity;
        self.state.desired_velocity = previous.desired_velocity;
        self.state.desired_jump = previous.desired_jump;
        self.project_input_basis(InputBasis::new(previous.right_axis, previous.forward_axis));
        self.initialized = true;
    }

    /// Whether [`Self::init`] has run.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the last physics step resolved as grounded.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.state.grounded
    }

    /// Whether the last physics step touched a steep surface.
    #[inline]
    pub fn is_on_steep(&self) -> bool {
        self.state.on_steep
    }

    /// Whether the coming physics step may try to snap to ground.
    ///
    /// Backends that cast the snap probe ahead of the step use this to skip
    /// the ray cast when the step cannot use it.
    pub fn wants_ground_probe(&self, config: &ControllerConfig, velocity: Vec3) -> bool {
        !self.contacts.on_ground()
            && self.state.steps_since_last_grounded == 0
            && self.state.steps_since_last_jump >= 2
            && velocity.length() <= config.max_snap_speed
    }

    /// Sample player input. Call once per rendered frame.
    ///
    /// `axis` is clamped to unit length, so the desired speed never exceeds
    /// `max_speed`. A jump press is latched until the next physics step
    /// consumes it.
    pub fn sample_input(
        &mut self,
        config: &ControllerConfig,
        axis: Vec2,
        jump_pressed_this_frame: bool,
        basis: InputBasis,
    ) {
        let axis = axis.clamp_length_max(1.0);
        self.project_input_basis(basis);
        self.state.desired_velocity = Vec3::new(axis.x, 0.0, axis.y) * config.max_speed;
        self.state.desired_jump |= jump_pressed_this_frame;
    }

    /// Record one contact reported by the physics engine.
    ///
    /// `surface` picks the walkable threshold the normal is tested against.
    pub fn on_contact(
        &mut self,
        config: &ControllerConfig,
        normal: Vec3,
        surface: SurfaceKind,
    ) -> ContactKind {
        let min_dot = config.thresholds().min_dot(surface);
        let kind = self.contacts.record(self.state.up_axis, normal, min_dot);
        trace!("contact {normal:?} on {surface:?} classified as {kind:?}");
        kind
    }

    /// Run one fixed physics step and return the velocity to hand back to
    /// the body.
    ///
    /// `velocity` and `position` are read from the body, which is the source
    /// of truth: impulses applied outside the controller are respected.
    pub fn physics_step(
        &mut self,
        config: &ControllerConfig,
        velocity: Vec3,
        position: Vec3,
        gravity: &impl GravityProvider,
        probe: &mut impl GroundProbe,
        dt: f32,
    ) -> Vec3 {
        let sample = gravity.sample(position);
        self.state.up_axis = sample.up;
        self.state.gravity = sample.gravity;
        let thresholds = config.thresholds();

        self.update_state(config, &thresholds, velocity, position, probe);
        self.adjust_velocity(config, dt);

        if self.state.desired_jump {
            self.state.desired_jump = false;
            self.jump(config);
        }

        self.state.velocity += self.state.gravity * dt;

        self.state.grounded = self.contacts.on_ground();
        self.state.on_steep = self.contacts.on_steep();
        self.contacts.clear();

        self.state.velocity
    }

    fn project_input_basis(&mut self, basis: InputBasis) {
        let up = self.state.up_axis;
        // Keep the previous axis when input space looks straight along up
        if let Some(right) = project_on_plane(basis.right, up).try_normalize() {
            self.state.right_axis = right;
        }
        if let Some(forward) = project_on_plane(basis.forward, up).try_normalize() {
            self.state.forward_axis = forward;
        }
    }

    fn update_state(
        &mut self,
        config: &ControllerConfig,
        thresholds: &SlopeThresholds,
        velocity: Vec3,
        position: Vec3,
        probe: &mut impl GroundProbe,
    ) {
        let state = &mut self.state;
        state.steps_since_last_grounded = state.steps_since_last_grounded.saturating_add(1);
        state.steps_since_last_jump = state.steps_since_last_jump.saturating_add(1);
        state.velocity = velocity;
        state.contact_normal = self.contacts.ground_normal_sum;
        state.steep_normal = self.contacts.steep_normal_sum;

        if self.contacts.on_ground()
            || self.snap_to_ground(config, thresholds, position, probe)
            || self.check_steep_contacts(thresholds)
        {
            let state = &mut self.state;
            state.steps_since_last_grounded = 0;
            if state.steps_since_last_jump > 1 {
                state.jump_phase = 0;
            }
            if self.contacts.ground_contact_count > 1 {
                state.contact_normal = state.contact_normal.normalize_or_zero();
            }
        } else {
            self.state.contact_normal = self.state.up_axis;
        }
    }

    fn snap_to_ground(
        &mut self,
        config: &ControllerConfig,
        thresholds: &SlopeThresholds,
        position: Vec3,
        probe: &mut impl GroundProbe,
    ) -> bool {
        let state = &mut self.state;
        if state.steps_since_last_grounded > 1 || state.steps_since_last_jump <= 2 {
            return false;
        }
        let speed = state.velocity.length();
        if speed > config.max_snap_speed {
            return false;
        }
        let Some(hit) = probe.cast(
            position,
            -state.up_axis,
            config.probe_distance,
            config.probe_mask,
        ) else {
            return false;
        };
        if hit.memberships & config.probe_mask == 0 {
            return false;
        }
        let min_dot = thresholds.min_dot(config.surface_kind(hit.memberships));
        if state.up_axis.dot(hit.normal) < min_dot {
            return false;
        }

        self.contacts.ground_contact_count = 1;
        state.contact_normal = hit.normal;
        let dot = state.velocity.dot(hit.normal);
        if dot > 0.0 {
            state.velocity = (state.velocity - hit.normal * dot).normalize_or_zero() * speed;
        }
        debug!("snapped to ground {} below, normal {:?}", hit.distance, hit.normal);
        true
    }

    fn check_steep_contacts(&mut self, thresholds: &SlopeThresholds) -> bool {
        if self.contacts.steep_contact_count <= 1 {
            return false;
        }
        let steep_normal = self.contacts.steep_normal_sum.normalize_or_zero();
        self.state.steep_normal = steep_normal;
        if self.state.up_axis.dot(steep_normal) < thresholds.ground {
            return false;
        }

        self.contacts.steep_contact_count = 0;
        self.contacts.ground_contact_count = 1;
        self.state.contact_normal = steep_normal;
        debug!("promoted steep contacts to ground, normal {steep_normal:?}");
        true
    }

    fn adjust_velocity(&mut self, config: &ControllerConfig, dt: f32) {
        let state = &mut self.state;
        let x_axis = project_on_plane(state.right_axis, state.contact_normal).normalize_or_zero();
        let z_axis = project_on_plane(state.forward_axis, state.contact_normal).normalize_or_zero();

        let current_x = state.velocity.dot(x_axis);
        let current_z = state.velocity.dot(z_axis);

        let max_speed_change = config.acceleration(self.contacts.on_ground()) * dt;
        let new_x = move_towards(current_x, state.desired_velocity.x, max_speed_change);
        let new_z = move_towards(current_z, state.desired_velocity.z, max_speed_change);

        state.velocity += x_axis * (new_x - current_x) + z_axis * (new_z - current_z);
    }

    fn jump(&mut self, config: &ControllerConfig) {
        let state = &mut self.state;
        let direction = if self.contacts.on_ground() {
            state.contact_normal
        } else if self.contacts.on_steep() {
            state.jump_phase = 0;
            state.steep_normal
        } else if config.max_air_jumps > 0 && state.jump_phase <= config.max_air_jumps {
            if state.jump_phase == 0 && config.ledge_consumes_ground_jump {
                state.jump_phase = 1;
            }
            state.contact_normal
        } else {
            trace!("jump refused at phase {}", state.jump_phase);
            return;
        };

        state.steps_since_last_jump = 0;
        state.jump_phase += 1;

        let mut jump_speed = (2.0 * state.gravity.length() * config.jump_height).sqrt();
        let direction = (direction + state.up_axis)
            .try_normalize()
            .unwrap_or(state.up_axis);
        let aligned_speed = state.velocity.dot(direction);
        if aligned_speed > 0.0 {
            jump_speed = (jump_speed - aligned_speed).max(0.0);
        }
        state.velocity += direction * jump_speed;
        debug!(
            "jump {} along {direction:?} adds {jump_speed}",
            state.jump_phase
        );
    }
}

/// Remove the component of `direction` along `normal`.
#[inline]
pub fn project_on_plane(direction: Vec3, normal: Vec3) -> Vec3 {
    direction - normal * direction.dot(normal)
}

/// Move `current` toward `target` by at most `max_delta`, never overshooting.
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}
