//! Read-only collaborator interfaces: geometry, fields, randomness.
//!
//! The tracker treats each of these as an external service. Geometry
//! and field sources are shared read-only across worker threads, so they
//! must be `Send + Sync`; each worker owns its own [`McGenerator`].

use crate::collision::Collision;
use crate::error::GeometryError;
use crate::id::SolidId;
use crate::solid::{Solid, SolidSet};
use crate::vec3::{self, Vec3};

/// Magnetic field value and spatial derivatives at one point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BFieldSample {
    /// Field components [T].
    pub b: Vec3,
    /// Spatial derivatives `gradient[i][j] = ∂Bᵢ/∂xⱼ` [T/m].
    pub gradient: [[f64; 3]; 3],
    /// Field magnitude |B| [T].
    pub magnitude: f64,
    /// Gradient of the magnitude, ∂|B|/∂xⱼ [T/m].
    pub magnitude_gradient: Vec3,
}

impl BFieldSample {
    /// The field-free sample.
    pub const ZERO: Self = Self {
        b: [0.0; 3],
        gradient: [[0.0; 3]; 3],
        magnitude: 0.0,
        magnitude_gradient: [0.0; 3],
    };

    /// Derive magnitude and its gradient from components and their
    /// derivatives: ∂|B|/∂xⱼ = Σᵢ Bᵢ ∂Bᵢ/∂xⱼ / |B|.
    pub fn from_components(b: Vec3, gradient: [[f64; 3]; 3]) -> Self {
        let magnitude = vec3::norm(&b);
        let mut magnitude_gradient = [0.0; 3];
        if magnitude > 0.0 {
            for (j, g) in magnitude_gradient.iter_mut().enumerate() {
                *g = (b[0] * gradient[0][j] + b[1] * gradient[1][j] + b[2] * gradient[2][j])
                    / magnitude;
            }
        }
        Self {
            b,
            gradient,
            magnitude,
            magnitude_gradient,
        }
    }

    /// Unit vector along the field, or `None` where the field vanishes.
    pub fn direction(&self) -> Option<Vec3> {
        if self.magnitude > 0.0 {
            Some(vec3::scale(&self.b, 1.0 / self.magnitude))
        } else {
            None
        }
    }

    /// Row-major 4×4 layout used by track records: rows are
    /// `(Bx, ∂Bx/∂x, ∂Bx/∂y, ∂Bx/∂z)`, ..., `(|B|, ∂|B|/∂x, ...)`.
    pub fn as_table(&self) -> [[f64; 4]; 4] {
        let mut t = [[0.0; 4]; 4];
        for i in 0..3 {
            t[i][0] = self.b[i];
            t[i][1..].copy_from_slice(&self.gradient[i]);
        }
        t[3][0] = self.magnitude;
        t[3][1..].copy_from_slice(&self.magnitude_gradient);
        t
    }
}

/// Electric potential and field at one point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EFieldSample {
    /// Electric potential [V].
    pub potential: f64,
    /// Electric field [V/m].
    pub e: Vec3,
}

impl EFieldSample {
    /// The field-free sample.
    pub const ZERO: Self = Self {
        potential: 0.0,
        e: [0.0; 3],
    };
}

/// Source of electromagnetic fields.
///
/// Implementations must be pure functions of `(t, position)`.
pub trait FieldSource: Send + Sync {
    /// Magnetic field and derivatives at `position` and lab time `t`.
    fn b_field(&self, t: f64, position: &Vec3) -> BFieldSample;

    /// Electric potential and field at `position` and lab time `t`.
    fn e_field(&self, t: f64, position: &Vec3) -> EFieldSample;
}

/// Geometry kernel: solids, their priorities, and segment crossings.
pub trait Geometry: Send + Sync {
    /// Whether the straight segment `p1 → p2` stays inside the overall
    /// simulation bounding volume.
    fn check_segment(&self, p1: &Vec3, p2: &Vec3) -> bool;

    /// All surface crossings of the straight segment from `p1` at time
    /// `t1` to `p2` at time `t2`, sorted by increasing `s`.
    ///
    /// A crossing located exactly on the shared end of two consecutive
    /// segments must be reported by only one of them.
    fn collisions(
        &self,
        t1: f64,
        p1: &Vec3,
        t2: f64,
        p2: &Vec3,
    ) -> Result<Vec<Collision>, GeometryError>;

    /// The set of solids containing `position` at time `t`. Always
    /// contains the default solid.
    fn solids_at(&self, t: f64, position: &Vec3) -> SolidSet;

    /// Look up a solid by id.
    fn solid(&self, id: SolidId) -> Option<&Solid>;

    /// The lowest-priority solid filling all space not covered by others.
    fn default_solid(&self) -> &Solid;
}

/// Random-number source for stochastic decisions.
///
/// Each worker owns an independent generator; the tracker never shares
/// one between particles running concurrently.
pub trait McGenerator {
    /// Uniform draw in `[min, max)`.
    fn uniform(&mut self, min: f64, max: f64) -> f64;

    /// Draw a polarisation of ±1, choosing +1 with probability
    /// `(1 + projection) / 2`.
    fn dice_polarisation(&mut self, projection: f64) -> f64 {
        if self.uniform(0.0, 1.0) < 0.5 * (1.0 + projection) {
            1.0
        } else {
            -1.0
        }
    }

    /// Uniform azimuth in `[0, 2π)`.
    fn azimuth(&mut self) -> f64 {
        self.uniform(0.0, 2.0 * std::f64::consts::PI)
    }

    /// Exponentially distributed draw with the given mean.
    fn exponential(&mut self, mean: f64) -> f64 {
        -mean * (1.0 - self.uniform(0.0, 1.0)).ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    impl McGenerator for Fixed {
        fn uniform(&mut self, min: f64, max: f64) -> f64 {
            min + self.0 * (max - min)
        }
    }

    #[test]
    fn magnitude_gradient_from_components() {
        // B = (0, 0, 2 + x): |B| = 2 + x, d|B|/dx = 1.
        let s = BFieldSample::from_components(
            [0.0, 0.0, 2.0],
            [[0.0; 3], [0.0; 3], [1.0, 0.0, 0.0]],
        );
        assert_eq!(s.magnitude, 2.0);
        assert_eq!(s.magnitude_gradient, [1.0, 0.0, 0.0]);
        assert_eq!(s.direction(), Some([0.0, 0.0, 1.0]));
    }

    #[test]
    fn zero_field_has_no_direction() {
        assert!(BFieldSample::ZERO.direction().is_none());
        let s = BFieldSample::from_components([0.0; 3], [[1.0; 3]; 3]);
        assert_eq!(s.magnitude_gradient, [0.0; 3]);
    }

    #[test]
    fn table_layout() {
        let jacobian = [[0.5, 0.0, 0.0], [0.0; 3], [0.0; 3]];
        let s = BFieldSample::from_components([1.0, 0.0, 0.0], jacobian);
        let t = s.as_table();
        assert_eq!(t[0], [1.0, 0.5, 0.0, 0.0]);
        assert_eq!(t[3][0], 1.0);
        assert_eq!(t[3][1], 0.5);
    }

    #[test]
    fn dice_polarisation_follows_threshold() {
        assert_eq!(Fixed(0.3).dice_polarisation(0.0), 1.0);
        assert_eq!(Fixed(0.7).dice_polarisation(0.0), -1.0);
        assert_eq!(Fixed(0.999).dice_polarisation(1.0), 1.0);
        assert_eq!(Fixed(0.0).dice_polarisation(-1.0), -1.0);
    }

    #[test]
    fn exponential_of_zero_draw_is_zero() {
        assert_eq!(Fixed(0.0).exponential(5.0), 0.0);
    }
}
