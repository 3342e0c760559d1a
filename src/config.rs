//! Controller configuration.
//!
//! This module defines the tunable movement parameters of a character,
//! the surface classes used for slope thresholds, and validation of the
//! numeric ranges.

use bevy::prelude::*;
use thiserror::Error;

/// Surface class of a collider the character touches or probes.
///
/// Each class carries its own walkable slope threshold. Stairs are usually
/// modelled as invisible ramps, so they allow a steeper angle than ordinary
/// ground.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceKind {
    /// Ordinary ground, limited by `max_ground_angle`.
    #[default]
    Ground,
    /// Stair geometry, limited by `max_stairs_angle`.
    Stairs,
}

/// Cosine thresholds derived from the configured slope angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeThresholds {
    /// Minimum `dot(up, normal)` for ordinary ground.
    pub ground: f32,
    /// Minimum `dot(up, normal)` for stairs.
    pub stairs: f32,
}

impl SlopeThresholds {
    /// Minimum up-alignment for the given surface class.
    #[inline]
    pub fn min_dot(&self, surface: SurfaceKind) -> f32 {
        match surface {
            SurfaceKind::Ground => self.ground,
            SurfaceKind::Stairs => self.stairs,
        }
    }
}

/// Errors reported by [`ControllerConfig::validate`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// A speed, acceleration, height or distance is negative or not finite.
    #[error("`{field}` must be finite and non-negative, got {value}")]
    NegativeOrNonFinite {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },
    /// A slope angle lies outside `[0, 90]` degrees.
    #[error("`{field}` must lie within 0..=90 degrees, got {value}")]
    AngleOutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },
}

/// Configuration parameters for the locomotion controller.
///
/// Angles are in degrees and converted to cosine thresholds once per
/// physics step via [`ControllerConfig::thresholds`].
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct ControllerConfig {
    // === Movement Settings ===
    /// Maximum horizontal speed reached at full input (units/second).
    pub max_speed: f32,

    /// Acceleration toward the desired velocity while grounded (units/second^2).
    pub max_acceleration: f32,

    /// Acceleration toward the desired velocity while airborne (units/second^2).
    pub max_air_acceleration: f32,

    // === Jump Settings ===
    /// Apex height of a jump from rest, against the local gravity magnitude.
    pub jump_height: f32,

    /// Number of extra jumps allowed before landing again.
    pub max_air_jumps: u32,

    /// Whether walking off a ledge uses up the ground jump.
    ///
    /// When `true` the first air jump after leaving the ground without jumping
    /// counts as the second jump, so only `max_air_jumps - 1` more remain.
    pub ledge_consumes_ground_jump: bool,

    // === Slope Settings ===
    /// Steepest ordinary ground that still counts as walkable (degrees).
    pub max_ground_angle: f32,

    /// Steepest stair surface that still counts as walkable (degrees).
    pub max_stairs_angle: f32,

    // === Ground Snap Settings ===
    /// Speed above which the character is never snapped back to the ground.
    pub max_snap_speed: f32,

    /// Length of the downward snap probe ray.
    pub probe_distance: f32,

    /// Collision membership bits the snap probe ray can hit.
    ///
    /// Only filters the probe. Contacts are classified regardless of it.
    pub probe_mask: u32,

    /// Collision membership bits treated as stairs.
    pub stairs_mask: u32,

    // === Orientation ===
    /// Rotate the body so its local up follows the gravity up axis.
    pub align_to_gravity: bool,
}

/// Defaults to a single ground jump and no air jumps.
///
/// `ledge_consumes_ground_jump` is on, so an air jump after walking off a
/// ledge counts as the second jump. Turn it off with
/// [`ControllerConfig::with_ledge_consumes_ground_jump`].
impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Movement settings
            max_speed: 10.0,
            max_acceleration: 10.0,
            max_air_acceleration: 1.0,

            // Jump settings
            jump_height: 2.0,
            max_air_jumps: 0,
            ledge_consumes_ground_jump: true,

            // Slope settings
            max_ground_angle: 25.0,
            max_stairs_angle: 50.0,

            // Ground snap settings
            max_snap_speed: 100.0,
            probe_distance: 1.0,
            probe_mask: u32::MAX,
            stairs_mask: 0,

            // Orientation
            align_to_gravity: false,
        }
    }
}

impl ControllerConfig {
    /// Create a config optimized for responsive player control.
    pub fn player() -> Self {
        Self {
            max_acceleration: 50.0,
            max_air_acceleration: 20.0,
            max_air_jumps: 1,
            ..default()
        }
    }

    /// Create a config for levels with steep stair ramps and ledges.
    ///
    /// Stairs on collision group 2 may be as steep as 60 degrees, and the
    /// snap probe reaches a little further.
    pub fn stairs_friendly() -> Self {
        Self {
            max_stairs_angle: 60.0,
            probe_distance: 1.5,
            stairs_mask: 1 << 1,
            ..default()
        }
    }

    /// Cosine thresholds for the configured slope angles.
    pub fn thresholds(&self) -> SlopeThresholds {
        SlopeThresholds {
            ground: self.max_ground_angle.to_radians().cos(),
            stairs: self.max_stairs_angle.to_radians().cos(),
        }
    }

    /// Classify a collider by its collision membership bits.
    ///
    /// Colliders in `stairs_mask` are stairs, everything else is ground.
    pub fn surface_kind(&self, memberships: u32) -> SurfaceKind {
        if memberships & self.stairs_mask != 0 {
            SurfaceKind::Stairs
        } else {
            SurfaceKind::Ground
        }
    }

    /// Acceleration limit for the current grounded state.
    #[inline]
    pub fn acceleration(&self, grounded: bool) -> f32 {
        if grounded {
            self.max_acceleration
        } else {
            self.max_air_acceleration
        }
    }

    /// Check that every numeric parameter lies in its valid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("max_speed", self.max_speed),
            ("max_acceleration", self.max_acceleration),
            ("max_air_acceleration", self.max_air_acceleration),
            ("jump_height", self.jump_height),
            ("max_snap_speed", self.max_snap_speed),
            ("probe_distance", self.probe_distance),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NegativeOrNonFinite { field, value });
            }
        }

        let angles = [
            ("max_ground_angle", self.max_ground_angle),
            ("max_stairs_angle", self.max_stairs_angle),
        ];
        for (field, value) in angles {
            if !(0.0..=90.0).contains(&value) {
                return Err(ConfigError::AngleOutOfRange { field, value });
            }
        }

        Ok(())
    }

    /// Builder: set max speed.
    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Builder: set ground and air acceleration.
    pub fn with_acceleration(mut self, ground: f32, air: f32) -> Self {
        self.max_acceleration = ground;
        self.max_air_acceleration = air;
        self
    }

    /// Builder: set jump height.
    pub fn with_jump_height(mut self, height: f32) -> Self {
        self.jump_height = height;
        self
    }

    /// Builder: set the number of air jumps.
    pub fn with_air_jumps(mut self, jumps: u32) -> Self {
        self.max_air_jumps = jumps;
        self
    }

    /// Builder: choose whether walking off a ledge uses up the ground jump.
    pub fn with_ledge_consumes_ground_jump(mut self, consumes: bool) -> Self {
        self.ledge_consumes_ground_jump = consumes;
        self
    }

    /// Builder: set the ground and stairs slope limits (degrees).
    pub fn with_slope_limits(mut self, ground: f32, stairs: f32) -> Self {
        self.max_ground_angle = ground;
        self.max_stairs_angle = stairs;
        self
    }

    /// Builder: set ground snap parameters.
    pub fn with_snap(mut self, max_speed: f32, probe_distance: f32) -> Self {
        self.max_snap_speed = max_speed;
        self.probe_distance = probe_distance;
        self
    }

    /// Builder: set the probe and stairs membership masks.
    pub fn with_masks(mut self, probe: u32, stairs: u32) -> Self {
        self.probe_mask = probe;
        self.stairs_mask = stairs;
        self
    }

    /// Builder: enable or disable aligning the body to gravity.
    pub fn with_align_to_gravity(mut self, enabled: bool) -> Self {
        self.align_to_gravity = enabled;
        self
    }
}
