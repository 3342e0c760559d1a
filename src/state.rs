//! Movement state and state marker components.
//!
//! [`MovementState`] is the long-lived per-character state the solver
//! mutates every physics step. The marker components mirror its resolved
//! grounded/steep state so other systems can filter on them.

use bevy::prelude::*;

/// Long-lived movement state of one character.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct MovementState {
    /// Linear velocity, synchronized with the physics body each step.
    pub velocity: Vec3,
    /// Target velocity along the input basis: `x` along `right_axis`,
    /// `z` along `forward_axis`.
    pub desired_velocity: Vec3,
    /// Input right axis, perpendicular to `up_axis`.
    pub right_axis: Vec3,
    /// Input forward axis, perpendicular to `up_axis`.
    pub forward_axis: Vec3,
    /// Resolved ground plane normal. Equals `up_axis` while airborne.
    pub contact_normal: Vec3,
    /// Sum of the steep contact normals seen during the last step.
    pub steep_normal: Vec3,
    /// "Up" as defined by gravity at the body's position.
    pub up_axis: Vec3,
    /// Gravity sampled during the last step.
    pub gravity: Vec3,
    /// Jumps consumed since the last ground contact.
    pub jump_phase: u32,
    /// Physics steps since the character was last grounded.
    pub steps_since_last_grounded: u32,
    /// Physics steps since the character last jumped.
    pub steps_since_last_jump: u32,
    /// A jump was requested and not yet consumed by a physics step.
    pub desired_jump: bool,
    /// Whether the last step resolved as grounded.
    pub grounded: bool,
    /// Whether the last step registered steep contacts.
    pub on_steep: bool,
}

impl Default for MovementState {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            desired_velocity: Vec3::ZERO,
            right_axis: Vec3::X,
            forward_axis: Vec3::NEG_Z,
            contact_normal: Vec3::Y,
            steep_normal: Vec3::ZERO,
            up_axis: Vec3::Y,
            gravity: Vec3::ZERO,
            jump_phase: 0,
            steps_since_last_grounded: 0,
            steps_since_last_jump: 0,
            desired_jump: false,
            grounded: false,
            on_steep: false,
        }
    }
}

impl MovementState {
    /// Create a state starting from the body's current velocity.
    pub fn new(velocity: Vec3, up_axis: Vec3) -> Self {
        Self {
            velocity,
            up_axis,
            contact_normal: up_axis,
            ..default()
        }
    }

    /// Whether the character is neither grounded nor on a steep surface.
    #[inline]
    pub fn is_airborne(&self) -> bool {
        !self.grounded && !self.on_steep
    }

    /// Speed along the up axis (positive = rising).
    #[inline]
    pub fn vertical_speed(&self) -> f32 {
        self.velocity.dot(self.up_axis)
    }
}

/// Marker component indicating the character is grounded.
///
/// Added automatically when a physics step resolves ground, either from
/// real contacts, a ground snap or a promoted steep corner.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is airborne.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component indicating the character is touching a steep surface
/// without standing on ground.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct OnSteep {
    /// Averaged normal of the steep contacts.
    pub normal: Vec3,
}

impl Default for OnSteep {
    fn default() -> Self {
        Self { normal: Vec3::X }
    }
}

impl OnSteep {
    /// Create a new steep contact state.
    pub fn new(normal: Vec3) -> Self {
        Self { normal }
    }
}
