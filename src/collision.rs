//! Ground probe results.
//!
//! The snap probe is a single downward ray cast. Backends report what it hit
//! through [`ProbeHit`], and the controller consumes it through the
//! [`GroundProbe`] seam so the core can be driven without a physics engine.

use bevy::prelude::*;

/// Information about a probe ray hit.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct ProbeHit {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at the hit point.
    pub normal: Vec3,
    /// World position of the hit point.
    pub point: Vec3,
    /// Entity that was hit (if any).
    pub entity: Option<Entity>,
    /// Collision membership bits of the hit collider.
    pub memberships: u32,
}

impl ProbeHit {
    /// Create a probe hit.
    pub fn new(
        distance: f32,
        normal: Vec3,
        point: Vec3,
        entity: Option<Entity>,
        memberships: u32,
    ) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
            memberships,
        }
    }

    /// Create a hit on an untagged surface, for callers without layer data.
    pub fn on_ground(distance: f32, normal: Vec3) -> Self {
        Self::new(distance, normal, Vec3::ZERO, None, u32::MAX)
    }
}

/// A downward ray query used for ground snapping.
///
/// Implemented for closures so tests and custom engines can supply hits
/// directly.
pub trait GroundProbe {
    /// Cast a ray and return the first hit within `max_distance` whose
    /// collider is in `mask`.
    fn cast(&mut self, origin: Vec3, direction: Vec3, max_distance: f32, mask: u32)
        -> Option<ProbeHit>;
}

impl<F> GroundProbe for F
where
    F: FnMut(Vec3, Vec3, f32, u32) -> Option<ProbeHit>,
{
    fn cast(
        &mut self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: u32,
    ) -> Option<ProbeHit> {
        self(origin, direction, max_distance, mask)
    }
}
