//! Field sources for tests.

use spintrack_core::{BFieldSample, EFieldSample, FieldSource, Vec3};

/// Homogeneous magnetic field, no electric field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformB(pub Vec3);

impl FieldSource for UniformB {
    fn b_field(&self, _t: f64, _position: &Vec3) -> BFieldSample {
        BFieldSample::from_components(self.0, [[0.0; 3]; 3])
    }

    fn e_field(&self, _t: f64, _position: &Vec3) -> EFieldSample {
        EFieldSample::ZERO
    }
}

/// Magnetic field given by a closure of time and position, with zero
/// spatial derivatives. No electric field.
pub struct FnField<F> {
    f: F,
}

impl<F> FnField<F>
where
    F: Fn(f64, &Vec3) -> Vec3 + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> FieldSource for FnField<F>
where
    F: Fn(f64, &Vec3) -> Vec3 + Send + Sync,
{
    fn b_field(&self, t: f64, position: &Vec3) -> BFieldSample {
        BFieldSample::from_components((self.f)(t, position), [[0.0; 3]; 3])
    }

    fn e_field(&self, _t: f64, _position: &Vec3) -> EFieldSample {
        EFieldSample::ZERO
    }
}
