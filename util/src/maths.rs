//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the unsigned angular distance between two angles in degrees.
///
/// The distance is computed modulo a full revolution, so that angles on
/// either side of the +/-180 degree wrap (for example 179 and -179) are
/// considered close. Inputs are expected to be within one revolution of each
/// other.
pub fn ang_dist_deg<T>(a: T, b: T) -> T
where
    T: Float,
{
    let half_rev = T::from(180.0).unwrap();

    half_rev - ((a - b).abs() - half_rev).abs()
}

/// Check if two angles in degrees are equal to within the given tolerance,
/// respecting modular math.
pub fn ang_equal_deg<T>(a: T, b: T, tol: T) -> bool
where
    T: Float,
{
    ang_dist_deg(a, b) < tol
}

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ang_dist_deg() {
        assert_eq!(ang_dist_deg(0f64, 0f64), 0f64);
        assert_eq!(ang_dist_deg(10f64, 20f64), 10f64);
        assert_eq!(ang_dist_deg(20f64, 10f64), 10f64);
        assert_eq!(ang_dist_deg(0f64, 180f64), 180f64);

        // Distances wrap over the +/-180 degree boundary
        assert!((ang_dist_deg(179f64, -179f64) - 2f64).abs() < 1e-9);
        assert!((ang_dist_deg(359f64, 1f64) - 2f64).abs() < 1e-9);
    }

    #[test]
    fn test_ang_equal_deg() {
        // Wraparound law: 179 and -179 are within a 3 degree tolerance
        assert!(ang_equal_deg(179f64, -179f64, 3f64));
        assert!(ang_equal_deg(-179f64, 179f64, 3f64));

        // Symmetric under swapping of the two angles
        assert_eq!(
            ang_equal_deg(12.5f64, 14.0f64, 2f64),
            ang_equal_deg(14.0f64, 12.5f64, 2f64)
        );

        assert!(!ang_equal_deg(0f64, 90f64, 3f64));
        assert!(!ang_equal_deg(0f64, 180f64, 3f64));
    }

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 1f64), (0f64, 100f64), 0.5f64), 50f64);
        assert_eq!(lin_map((-1f64, 1f64), (0f64, 10f64), 0f64), 5f64);
    }
}
