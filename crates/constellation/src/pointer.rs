//! The user's pointer (mouse cursor, touch point, etc). Particles near it get pushed away and
//! linked to it.

use glam::DVec2;

/// Default distance within which the pointer affects particles.
pub const INFLUENCE_RADIUS: f64 = 150.0;

/// Default maximum distance a particle is pushed by the pointer in a single tick.
pub const PUSH_STRENGTH: f64 = 3.0;

/// `PointerState`
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct PointerState {
    /// Where the pointer is. `None` when it's off the surface or has never moved.
    pub position: Option<DVec2>,
    /// Particles closer than this are pushed away and linked to the pointer.
    pub influence_radius: f64,
    /// How far a particle sitting right under the pointer gets pushed in one tick.
    pub push_strength: f64,
}

impl Default for PointerState {
    fn default() -> Self {
        Self::new(INFLUENCE_RADIUS, PUSH_STRENGTH)
    }
}

impl PointerState {
    /// Instantiate an absent pointer.
    #[must_use]
    pub const fn new(influence_radius: f64, push_strength: f64) -> Self {
        Self {
            position: None,
            influence_radius,
            push_strength,
        }
    }

    /// Is the pointer over the surface?
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.position.is_some()
    }

    /// The distance from the pointer to a point, but only if it's within the influence radius.
    #[must_use]
    pub fn distance_within_influence(&self, point: DVec2) -> Option<f64> {
        let distance = self.position?.distance(point);
        (distance < self.influence_radius).then_some(distance)
    }

    /// How far a particle at the given point should be pushed this tick. The push is directly
    /// away from the pointer and falls off linearly: full strength at the pointer, nothing at the
    /// edge of the influence radius.
    #[must_use]
    pub fn repulsion(&self, point: DVec2) -> DVec2 {
        let Some(pointer) = self.position else {
            return DVec2::ZERO;
        };
        let Some(distance) = self.distance_within_influence(point) else {
            return DVec2::ZERO;
        };

        // Measured towards the pointer then negated, so a particle sitting exactly under the
        // pointer is pushed along -x.
        let towards = pointer - point;
        let force = (self.influence_radius - distance) / self.influence_radius;
        let angle = towards.y.atan2(towards.x);
        -DVec2::from_angle(angle) * force * self.push_strength
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn pointer_at(x: f64, y: f64) -> PointerState {
        PointerState {
            position: Some(DVec2::new(x, y)),
            ..PointerState::default()
        }
    }

    #[test]
    fn absent_pointers_dont_push() {
        let pointer = PointerState::default();
        assert!(!pointer.is_present());
        assert_eq!(pointer.repulsion(DVec2::new(1.0, 1.0)), DVec2::ZERO);
        assert_eq!(pointer.distance_within_influence(DVec2::ZERO), None);
    }

    #[test]
    fn push_is_away_from_the_pointer() {
        let pointer = pointer_at(100.0, 100.0);
        let push = pointer.repulsion(DVec2::new(150.0, 100.0));
        assert!(push.x > 0.0);
        assert!(push.y.abs() < 1e-9);

        let push = pointer.repulsion(DVec2::new(100.0, 40.0));
        assert!(push.y < 0.0);
        assert!(push.x.abs() < 1e-9);
    }

    #[test]
    fn push_falls_off_linearly() {
        let pointer = pointer_at(0.0, 0.0);
        for distance in [0.5, 30.0, 75.0, 149.0] {
            let push = pointer.repulsion(DVec2::new(0.0, distance));
            let expected = (INFLUENCE_RADIUS - distance) / INFLUENCE_RADIUS * PUSH_STRENGTH;
            assert!((push.length() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn particle_right_under_the_pointer_goes_left() {
        let pointer = pointer_at(100.0, 100.0);
        let push = pointer.repulsion(DVec2::new(100.0, 100.0));
        assert!((push.x + PUSH_STRENGTH).abs() < 1e-9);
        assert!(push.y.abs() < 1e-9);
    }

    #[test]
    fn no_push_at_or_beyond_the_influence_radius() {
        let pointer = pointer_at(0.0, 0.0);
        assert_eq!(pointer.repulsion(DVec2::new(150.0, 0.0)), DVec2::ZERO);
        assert_eq!(pointer.repulsion(DVec2::new(0.0, 151.0)), DVec2::ZERO);
    }
}
