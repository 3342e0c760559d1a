//! Per-step contact accumulation.
//!
//! Every contact reported by the physics engine during a step is classified
//! against the gravity up axis and folded into running normal sums. The
//! solver reads the totals once and then clears them.

use bevy::prelude::*;

/// Contacts whose up-alignment is at or below this value are overhangs or
/// ceilings and are ignored.
pub const MIN_STEEP_DOT: f32 = -0.01;

/// Classification of a single contact normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// Walkable ground.
    Ground,
    /// A wall or slope too steep to stand on.
    Steep,
    /// An overhang or ceiling.
    Ignored,
}

/// Running totals of the contacts seen during one physics step.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactAccumulator {
    /// Number of ground contacts.
    pub ground_contact_count: u32,
    /// Number of steep contacts.
    pub steep_contact_count: u32,
    /// Sum of all ground contact normals.
    pub ground_normal_sum: Vec3,
    /// Sum of all steep contact normals.
    pub steep_normal_sum: Vec3,
}

impl ContactAccumulator {
    /// Classify `normal` against `up_axis` and add it to the matching sum.
    ///
    /// `min_dot` is the walkable threshold of the touched surface.
    pub fn record(&mut self, up_axis: Vec3, normal: Vec3, min_dot: f32) -> ContactKind {
        let up_dot = up_axis.dot(normal);
        if up_dot >= min_dot {
            self.ground_contact_count += 1;
            self.ground_normal_sum += normal;
            ContactKind::Ground
        } else if up_dot > MIN_STEEP_DOT {
            self.steep_contact_count += 1;
            self.steep_normal_sum += normal;
            ContactKind::Steep
        } else {
            ContactKind::Ignored
        }
    }

    /// Whether any ground contact was recorded (or synthesized).
    #[inline]
    pub fn on_ground(&self) -> bool {
        self.ground_contact_count > 0
    }

    /// Whether any steep contact was recorded.
    #[inline]
    pub fn on_steep(&self) -> bool {
        self.steep_contact_count > 0
    }

    /// Reset all totals for the next step.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUND_DOT: f32 = 0.9;

    #[test]
    fn flat_ground_is_ground() {
        let mut contacts = ContactAccumulator::default();
        let kind = contacts.record(Vec3::Y, Vec3::Y, GROUND_DOT);

        assert_eq!(kind, ContactKind::Ground);
        assert_eq!(contacts.ground_contact_count, 1);
        assert_eq!(contacts.ground_normal_sum, Vec3::Y);
        assert!(contacts.on_ground());
        assert!(!contacts.on_steep());
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut contacts = ContactAccumulator::default();
        let normal = Vec3::new(0.6, 0.8, 0.0);
        assert_eq!(contacts.record(Vec3::Y, normal, 0.8), ContactKind::Ground);
    }

    #[test]
    fn vertical_wall_is_steep() {
        let mut contacts = ContactAccumulator::default();
        let kind = contacts.record(Vec3::Y, Vec3::X, GROUND_DOT);

        assert_eq!(kind, ContactKind::Steep);
        assert_eq!(contacts.steep_contact_count, 1);
        assert_eq!(contacts.steep_normal_sum, Vec3::X);
        assert!(!contacts.on_ground());
    }

    #[test]
    fn slightly_overhanging_wall_is_still_steep() {
        let mut contacts = ContactAccumulator::default();
        let normal = Vec3::new(1.0, -0.005, 0.0).normalize();
        assert_eq!(contacts.record(Vec3::Y, normal, GROUND_DOT), ContactKind::Steep);
    }

    #[test]
    fn ceiling_is_ignored() {
        let mut contacts = ContactAccumulator::default();
        let kind = contacts.record(Vec3::Y, Vec3::NEG_Y, GROUND_DOT);

        assert_eq!(kind, ContactKind::Ignored);
        assert_eq!(contacts, ContactAccumulator::default());
    }

    #[test]
    fn stairs_threshold_accepts_steeper_normal() {
        // 40 degree slope: steep for ordinary ground, walkable as stairs
        let normal = Vec3::new(40f32.to_radians().sin(), 40f32.to_radians().cos(), 0.0);
        let ground_dot = 25f32.to_radians().cos();
        let stairs_dot = 50f32.to_radians().cos();

        let mut contacts = ContactAccumulator::default();
        assert_eq!(contacts.record(Vec3::Y, normal, ground_dot), ContactKind::Steep);
        assert_eq!(contacts.record(Vec3::Y, normal, stairs_dot), ContactKind::Ground);
    }

    #[test]
    fn classification_follows_custom_up_axis() {
        // Standing on a wall of a spherical world where "up" is +X
        let mut contacts = ContactAccumulator::default();
        assert_eq!(contacts.record(Vec3::X, Vec3::X, GROUND_DOT), ContactKind::Ground);
        assert_eq!(contacts.record(Vec3::X, Vec3::Y, GROUND_DOT), ContactKind::Steep);
    }

    #[test]
    fn recording_is_order_independent() {
        let normals = [
            Vec3::Y,
            Vec3::new(0.1, 0.99, 0.0).normalize(),
            Vec3::Z,
            Vec3::NEG_Y,
            Vec3::new(-0.7, 0.3, 0.0).normalize(),
        ];

        let mut forward = ContactAccumulator::default();
        for normal in normals {
            forward.record(Vec3::Y, normal, GROUND_DOT);
        }
        let mut backward = ContactAccumulator::default();
        for normal in normals.iter().rev() {
            backward.record(Vec3::Y, *normal, GROUND_DOT);
        }

        assert_eq!(forward.ground_contact_count, backward.ground_contact_count);
        assert_eq!(forward.steep_contact_count, backward.steep_contact_count);
        assert!((forward.ground_normal_sum - backward.ground_normal_sum).length() < 1e-5);
        assert!((forward.steep_normal_sum - backward.steep_normal_sum).length() < 1e-5);
    }

    #[test]
    fn clear_resets_everything() {
        let mut contacts = ContactAccumulator::default();
        contacts.record(Vec3::Y, Vec3::Y, GROUND_DOT);
        contacts.record(Vec3::Y, Vec3::X, GROUND_DOT);

        contacts.clear();
        assert_eq!(contacts, ContactAccumulator::default());
    }
}
