//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit a value to the range `[min, max]`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle in degrees into the range `[0, 360)`.
pub fn wrap_deg_360<T>(angle_deg: T) -> T
where
    T: Float
{
    let full_turn = T::from(360.0).unwrap_or_else(T::max_value);
    let wrapped = rem_euclid(angle_deg, full_turn);

    // Round-off can land exactly on a full turn
    if wrapped >= full_turn { T::zero() } else { wrapped }
}

/// Arithmetic mean of a set of values, or `None` if the set is empty.
pub fn mean<T>(values: &[T]) -> Option<T>
where
    T: Float
{
    if values.is_empty() {
        return None;
    }

    let sum = values.iter().fold(T::zero(), |acc, v| acc + *v);
    T::from(values.len()).map(|n| sum / n)
}

/// Circular mean of a set of angles in degrees.
///
/// Each angle is treated as a unit vector and the direction of the vector sum
/// is returned in the range `(-180, 180]`. Returns `None` if the set is empty
/// or if the vectors cancel out so that no direction is defined.
pub fn circular_mean_deg<T>(angles_deg: &[T]) -> Option<T>
where
    T: Float
{
    if angles_deg.is_empty() {
        return None;
    }

    let (sum_sin, sum_cos) = angles_deg.iter().fold(
        (T::zero(), T::zero()),
        |(s, c), a| {
            let rad = a.to_radians();
            (s + rad.sin(), c + rad.cos())
        }
    );

    let epsilon = T::from(1e-9).unwrap_or_else(T::epsilon);
    if sum_sin.hypot(sum_cos) < epsilon {
        return None;
    }

    Some(sum_sin.atan2(sum_cos).to_degrees())
}

#[cfg(test)]
mod test {
    use super::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&150f64, &0.0, &100.0), 100.0);
        assert_eq!(clamp(&-3f64, &0.0, &100.0), 0.0);
        assert_eq!(clamp(&42f64, &0.0, &100.0), 42.0);
    }

    #[test]
    fn test_wrap_deg_360() {
        assert!((wrap_deg_360(370f64) - 10.0).abs() < TOL);
        assert!((wrap_deg_360(-10f64) - 350.0).abs() < TOL);
        assert!((wrap_deg_360(720f64)).abs() < TOL);
        assert!((wrap_deg_360(359.5f64) - 359.5).abs() < TOL);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean::<f64>(&[]), None);
        assert_eq!(mean(&[1f64, 2.0, 3.0, 6.0]), Some(3.0));
    }

    #[test]
    fn test_circular_mean_deg() {
        // Plain case agrees with the arithmetic mean
        let m = circular_mean_deg(&[10f64, 20.0, 30.0]).unwrap();
        assert!((m - 20.0).abs() < TOL);

        // Straddling the wrap boundary gives 0, not 180
        let m = circular_mean_deg(&[350f64, 10.0]).unwrap();
        assert!(m.abs() < 1e-6);

        // Opposite directions have no mean
        assert_eq!(circular_mean_deg(&[90f64, -90.0]), None);
        assert_eq!(circular_mean_deg::<f64>(&[]), None);
    }
}
