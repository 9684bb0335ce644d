//! Minimal three-vector helpers on plain `[f64; 3]` arrays.

/// A Cartesian three-vector.
pub type Vec3 = [f64; 3];

/// Dot product.
pub fn dot(a: &Vec3, b: &Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Cross product `a × b`.
pub fn cross(a: &Vec3, b: &Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Squared Euclidean norm.
pub fn norm2(a: &Vec3) -> f64 {
    dot(a, a)
}

/// Euclidean norm.
pub fn norm(a: &Vec3) -> f64 {
    norm2(a).sqrt()
}

/// `a * k`.
pub fn scale(a: &Vec3, k: f64) -> Vec3 {
    [a[0] * k, a[1] * k, a[2] * k]
}

/// `a + b`.
pub fn add(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// `a - b`.
pub fn sub(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Unit vector along `a`, or `None` for the zero vector.
pub fn normalize(a: &Vec3) -> Option<Vec3> {
    let n = norm(a);
    if n > 0.0 && n.is_finite() {
        Some(scale(a, 1.0 / n))
    } else {
        None
    }
}

/// Actively rotate `v` into a frame whose z-axis points along `axis`.
///
/// The returned vector has component `v[2]` along `axis` and its
/// transverse components `v[0]`, `v[1]` along an arbitrary orthonormal
/// pair perpendicular to `axis`. The length of `v` is preserved. A zero
/// `axis` leaves `v` unchanged.
pub fn rotate_onto(v: &Vec3, axis: &Vec3) -> Vec3 {
    let Some(ez) = normalize(axis) else {
        return *v;
    };
    // Seed the transverse basis with the coordinate axis least aligned with ez.
    let seed = if ez[0].abs() < 0.9 {
        [1.0, 0.0, 0.0]
    } else {
        [0.0, 1.0, 0.0]
    };
    let ex = match normalize(&sub(&seed, &scale(&ez, dot(&seed, &ez)))) {
        Some(ex) => ex,
        None => return *v,
    };
    let ey = cross(&ez, &ex);
    add(
        &add(&scale(&ex, v[0]), &scale(&ey, v[1])),
        &scale(&ez, v[2]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn cross_of_unit_axes() {
        assert_eq!(cross(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]);
        assert_eq!(cross(&[0.0, 0.0, 1.0], &[1.0, 0.0, 0.0]), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn normalize_zero_is_none() {
        assert!(normalize(&[0.0; 3]).is_none());
        assert!(normalize(&[f64::NAN, 0.0, 0.0]).is_none());
    }

    #[test]
    fn rotate_onto_z_axis_is_identity() {
        let v = [0.3, -0.4, 0.5];
        let r = rotate_onto(&v, &[0.0, 0.0, 2.0]);
        for i in 0..3 {
            assert!((r[i] - v[i]).abs() < 1e-15);
        }
    }

    fn arb_vec() -> impl Strategy<Value = Vec3> {
        prop::array::uniform3(-10.0f64..10.0)
    }

    proptest! {
        #[test]
        fn rotate_onto_preserves_length_and_projection(v in arb_vec(), axis in arb_vec()) {
            prop_assume!(norm(&axis) > 1e-3);
            let r = rotate_onto(&v, &axis);
            let ez = normalize(&axis).unwrap();
            prop_assert!((norm(&r) - norm(&v)).abs() < 1e-9);
            prop_assert!((dot(&r, &ez) - v[2]).abs() < 1e-9);
        }
    }
}
