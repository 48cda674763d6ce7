//! FormationPlanner: deterministic per-agent slot layout
//!
//! Pure geometry: given the centroid and the agent count, produce one slot
//! pose per agent. Layout rule: a symmetric line along the formation-local Y
//! axis, centered on the centroid, `spacing` meters between adjacent slots.
//! The arithmetic mean of the returned positions is always the centroid.

use crate::geometry::Pose;

/// Slot offsets relative to the formation frame, one per agent.
///
/// Offsets are independent of the centroid; slot i sits at
/// `y = (i - (n-1)/2) * spacing`. n = 0 yields an empty vector.
pub fn relative_offsets(n: usize, spacing: f64) -> Vec<Pose> {
    let mut offsets = Vec::with_capacity(n);
    let mid = (n.saturating_sub(1)) as f64 / 2.0;
    for i in 0..n {
        let y = (i as f64 - mid) * spacing;
        offsets.push(Pose::from_xyz(0.0, y, 0.0));
    }
    offsets
}

/// Absolute slot poses for n agents around `centroid`.
///
/// Each slot carries the centroid's orientation; the line is laid out in the
/// centroid's local Y axis, so a yawed formation rotates with it.
pub fn compute_offsets(centroid: &Pose, n: usize, spacing: f64) -> Vec<Pose> {
    relative_offsets(n, spacing)
        .into_iter()
        .map(|offset| Pose {
            position: centroid
                .orientation
                .rotate(&offset.position)
                .add(&centroid.position),
            orientation: centroid.orientation,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec3;

    const EPS: f64 = 1e-9;

    fn mean_position(poses: &[Pose]) -> Vec3 {
        let sum = poses
            .iter()
            .fold(Vec3::ZERO, |acc, p| acc.add(&p.position));
        sum.scale(1.0 / poses.len() as f64)
    }

    #[test]
    fn test_zero_agents_yields_empty() {
        assert!(compute_offsets(&Pose::from_xyz(1.0, 0.0, 1.0), 0, 1.0).is_empty());
    }

    #[test]
    fn test_mean_equals_centroid_for_small_fleets() {
        let centroid = Pose::from_xyz(1.0, 0.0, 1.0);
        for n in 1..=4 {
            let slots = compute_offsets(&centroid, n, 1.0);
            assert_eq!(slots.len(), n);
            let mean = mean_position(&slots);
            assert!(mean.distance(&centroid.position) < EPS, "n={n}");
        }
    }

    #[test]
    fn test_two_agents_symmetric_about_centroid() {
        let centroid = Pose::from_xyz(1.0, 0.0, 1.0);
        let slots = compute_offsets(&centroid, 2, 1.0);
        assert!((slots[0].position.y + 0.5).abs() < EPS);
        assert!((slots[1].position.y - 0.5).abs() < EPS);
        assert!((slots[0].position.x - 1.0).abs() < EPS);
        assert!((slots[1].position.x - 1.0).abs() < EPS);
    }

    #[test]
    fn test_deterministic_given_n() {
        let centroid = Pose::from_xyz(2.0, -1.0, 3.0);
        assert_eq!(
            compute_offsets(&centroid, 3, 0.8),
            compute_offsets(&centroid, 3, 0.8)
        );
    }

    #[test]
    fn test_yawed_centroid_rotates_line() {
        let centroid = Pose::from_xyz_yaw(0.0, 0.0, 1.0, std::f64::consts::FRAC_PI_2);
        let slots = compute_offsets(&centroid, 2, 2.0);
        // Local +Y rotated by 90 degrees points along world -X
        assert!((slots[0].position.x - 1.0).abs() < EPS);
        assert!((slots[1].position.x + 1.0).abs() < EPS);
        assert!(slots[0].position.y.abs() < EPS);
    }
}
