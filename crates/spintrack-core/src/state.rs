//! The particle state vector and spin vector.

use crate::vec3::Vec3;

/// Number of components in a [`StateVector`].
pub const STATE_VARIABLES: usize = 8;

/// Spin orientation of a particle.
///
/// Its length is nominally 1 but is allowed to drift by rounding; the
/// scalar polarisation is always recomputed as the normalized projection
/// onto the local field direction. The zero vector means "undefined"
/// (the particle is in a field-free region).
pub type SpinVector = Vec3;

/// The integrated particle state `{x, y, z, vx, vy, vz, τ, s}`.
///
/// Position in m, velocity in m/s, proper time τ in s, and a scalar
/// polarisation marker `s` in `[-1, 1]`. The polarisation slot never
/// changes under the equation of motion; it only jumps at spin collapse
/// or boundary hooks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StateVector(pub [f64; STATE_VARIABLES]);

impl StateVector {
    /// Build a state vector from its parts.
    pub fn new(position: Vec3, velocity: Vec3, proper_time: f64, polarisation: f64) -> Self {
        Self([
            position[0],
            position[1],
            position[2],
            velocity[0],
            velocity[1],
            velocity[2],
            proper_time,
            polarisation,
        ])
    }

    /// Position in m.
    pub fn position(&self) -> Vec3 {
        [self.0[0], self.0[1], self.0[2]]
    }

    /// Velocity in m/s.
    pub fn velocity(&self) -> Vec3 {
        [self.0[3], self.0[4], self.0[5]]
    }

    /// Overwrite the velocity components.
    pub fn set_velocity(&mut self, v: Vec3) {
        self.0[3..6].copy_from_slice(&v);
    }

    /// Magnitude of the velocity.
    pub fn speed(&self) -> f64 {
        crate::vec3::norm(&self.velocity())
    }

    /// Proper time in s.
    pub fn proper_time(&self) -> f64 {
        self.0[6]
    }

    /// Polarisation marker in `[-1, 1]`.
    pub fn polarisation(&self) -> f64 {
        self.0[7]
    }

    /// Overwrite the polarisation marker.
    pub fn set_polarisation(&mut self, p: f64) {
        self.0[7] = p;
    }

    /// Straight-line distance between the positions of two states.
    pub fn distance_to(&self, other: &StateVector) -> f64 {
        crate::vec3::norm(&crate::vec3::sub(&other.position(), &self.position()))
    }

    /// The raw component array.
    pub fn as_array(&self) -> &[f64; STATE_VARIABLES] {
        &self.0
    }
}

impl From<[f64; STATE_VARIABLES]> for StateVector {
    fn from(y: [f64; STATE_VARIABLES]) -> Self {
        Self(y)
    }
}
