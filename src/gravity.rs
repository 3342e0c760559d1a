//! Gravity providers.
//!
//! The controller never assumes gravity points down the world Y axis. Each
//! physics step it asks a [`GravityProvider`] for the gravity at the body's
//! position, and derives its "up" axis from that.

use bevy::prelude::*;

/// Standard earth gravity, in units/second^2.
pub const STANDARD_GRAVITY: f32 = 9.81;

/// Gravity at a point, plus the "up" direction it implies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravitySample {
    /// Gravity acceleration vector.
    pub gravity: Vec3,
    /// Unit vector opposite to gravity, `Vec3::Y` for zero gravity.
    pub up: Vec3,
}

impl GravitySample {
    /// Build a sample from a gravity vector.
    pub fn from_gravity(gravity: Vec3) -> Self {
        Self {
            gravity,
            up: (-gravity).try_normalize().unwrap_or(Vec3::Y),
        }
    }
}

/// Source of gravity for a character.
pub trait GravityProvider {
    /// Gravity and up axis at `position`.
    fn sample(&self, position: Vec3) -> GravitySample;
}

impl GravityProvider for Vec3 {
    fn sample(&self, _position: Vec3) -> GravitySample {
        GravitySample::from_gravity(*self)
    }
}

/// Gravity field affecting a character.
///
/// Characters without this component use [`CharacterGravity::default`],
/// standard downward gravity.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub enum CharacterGravity {
    /// Constant gravity everywhere.
    Uniform(Vec3),
    /// Gravity pulling toward a point, as on a small planet.
    Spherical {
        /// Center of attraction.
        center: Vec3,
        /// Gravity magnitude.
        strength: f32,
    },
    /// No gravity. Up stays `Vec3::Y`.
    Weightless,
}

impl Default for CharacterGravity {
    fn default() -> Self {
        Self::Uniform(Vec3::new(0.0, -STANDARD_GRAVITY, 0.0))
    }
}

impl CharacterGravity {
    /// Create a spherical gravity field.
    pub fn spherical(center: Vec3, strength: f32) -> Self {
        Self::Spherical { center, strength }
    }
}

impl GravityProvider for CharacterGravity {
    fn sample(&self, position: Vec3) -> GravitySample {
        match *self {
            Self::Uniform(gravity) => GravitySample::from_gravity(gravity),
            Self::Spherical { center, strength } => {
                // At the exact center there is no defined direction
                let Some(up) = (position - center).try_normalize() else {
                    return GravitySample {
                        gravity: Vec3::ZERO,
                        up: Vec3::Y,
                    };
                };
                GravitySample {
                    gravity: -up * strength,
                    up,
                }
            }
            Self::Weightless => GravitySample {
                gravity: Vec3::ZERO,
                up: Vec3::Y,
            },
        }
    }
}
