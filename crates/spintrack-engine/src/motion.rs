//! Relativistic equation of motion for the 8-component state vector.

use spintrack_core::{FieldSource, PhysicalConstants, STATE_VARIABLES};
use spintrack_ode::OdeSystem;

use crate::kind::ParticleProperties;

/// Right-hand side `dy/dt` of `{x, y, z, vx, vy, vz, τ, s}`.
///
/// The force is gravity plus, if present, the Lorentz force (charged
/// particles) and the dipole force `s·μ·∇|B|` (finite moment and
/// non-zero polarisation). Velocities follow the relativistic law
/// `dv/dt = (F − v (v·F)/c²) / (γ m)`, proper time advances at `1/γ`,
/// and the polarisation slot is constant.
pub struct EquationOfMotion<'a> {
    props: &'a ParticleProperties,
    constants: &'a PhysicalConstants,
    field: Option<&'a dyn FieldSource>,
    // Rest mass [kg].
    mass_kg: f64,
}

impl<'a> EquationOfMotion<'a> {
    /// Bind the equation to a particle kind and its environment.
    pub fn new(
        props: &'a ParticleProperties,
        constants: &'a PhysicalConstants,
        field: Option<&'a dyn FieldSource>,
    ) -> Self {
        let c = constants.speed_of_light;
        Self {
            props,
            constants,
            field,
            mass_kg: props.mass * constants.elementary_charge / (c * c),
        }
    }

    /// Total force [N] acting on a particle in state `y` at time `t`.
    pub fn force(&self, t: f64, y: &[f64; STATE_VARIABLES]) -> [f64; 3] {
        let mut f = [0.0, 0.0, -self.constants.gravity * self.mass_kg];
        let Some(field) = self.field else {
            return f;
        };
        let p = [y[0], y[1], y[2]];
        let q = self.props.charge;
        let dipole = self.props.magnetic_moment != 0.0 && y[7] != 0.0;
        if q == 0.0 && !dipole {
            return f;
        }
        let b = field.b_field(t, &p);
        if q != 0.0 {
            let e = field.e_field(t, &p).e;
            f[0] += q * (e[0] + y[4] * b.b[2] - y[5] * b.b[1]);
            f[1] += q * (e[1] + y[5] * b.b[0] - y[3] * b.b[2]);
            f[2] += q * (e[2] + y[3] * b.b[1] - y[4] * b.b[0]);
        }
        if dipole {
            let k = y[7] * self.props.magnetic_moment;
            for (fi, g) in f.iter_mut().zip(b.magnitude_gradient) {
                *fi += k * g;
            }
        }
        f
    }

    /// Evaluate `dy/dt`.
    pub fn derivatives(&self, t: f64, y: &[f64; STATE_VARIABLES]) -> [f64; STATE_VARIABLES] {
        let mut dydt = [0.0; STATE_VARIABLES];
        self.rhs(t, y, &mut dydt);
        dydt
    }
}

impl OdeSystem<STATE_VARIABLES> for EquationOfMotion<'_> {
    fn rhs(&self, t: f64, y: &[f64; STATE_VARIABLES], dydt: &mut [f64; STATE_VARIABLES]) {
        let c2 = self.constants.speed_of_light * self.constants.speed_of_light;
        let f = self.force(t, y);
        let v = [y[3], y[4], y[5]];
        let inverse_gamma = (1.0 - (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]) / c2).sqrt();
        let v_dot_f = v[0] * f[0] + v[1] * f[1] + v[2] * f[2];
        let k = inverse_gamma / self.mass_kg;

        dydt[0] = v[0];
        dydt[1] = v[1];
        dydt[2] = v[2];
        for i in 0..3 {
            dydt[3 + i] = k * (f[i] - v[i] * v_dot_f / c2);
        }
        dydt[6] = inverse_gamma;
        dydt[7] = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::Lifetime;
    use spintrack_core::{BFieldSample, EFieldSample, Vec3};

    const NEUTRON_MASS: f64 = 939_565_420.52;

    struct Gradient;

    impl FieldSource for Gradient {
        // |B| = 1 + x
        fn b_field(&self, _: f64, p: &Vec3) -> BFieldSample {
            BFieldSample::from_components(
                [0.0, 0.0, 1.0 + p[0]],
                [[0.0; 3], [0.0; 3], [1.0, 0.0, 0.0]],
            )
        }
        fn e_field(&self, _: f64, _: &Vec3) -> EFieldSample {
            EFieldSample::ZERO
        }
    }

    struct UniformB(f64);

    impl FieldSource for UniformB {
        fn b_field(&self, _: f64, _: &Vec3) -> BFieldSample {
            BFieldSample::from_components([0.0, 0.0, self.0], [[0.0; 3]; 3])
        }
        fn e_field(&self, _: f64, _: &Vec3) -> EFieldSample {
            EFieldSample::ZERO
        }
    }

    fn props(charge: f64, moment: f64) -> ParticleProperties {
        ParticleProperties {
            charge,
            mass: NEUTRON_MASS,
            magnetic_moment: moment,
            gyromagnetic_ratio: 0.0,
            lifetime: Lifetime::Stable,
            max_trajectory_length: f64::INFINITY,
        }
    }

    #[test]
    fn free_fall_acceleration() {
        let p = props(0.0, 0.0);
        let k = PhysicalConstants::default();
        let eom = EquationOfMotion::new(&p, &k, None);
        let y = [0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 0.0, 1.0];
        let d = eom.derivatives(0.0, &y);
        assert_eq!(&d[..3], &[1.0, 2.0, 3.0]);
        assert!(d[3].abs() < 1e-12 && d[4].abs() < 1e-12);
        assert!((d[5] + k.gravity).abs() < 1e-12);
        assert!((d[6] - 1.0).abs() < 1e-15);
        assert_eq!(d[7], 0.0);
    }

    #[test]
    fn dipole_force_follows_polarisation() {
        let moment = -9.662_365_1e-27;
        let p = props(0.0, moment);
        let k = PhysicalConstants::without_gravity();
        let eom = EquationOfMotion::new(&p, &k, Some(&Gradient));
        let up = eom.force(0.0, &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        let down = eom.force(0.0, &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -1.0]);
        assert_eq!(up[0], moment);
        assert_eq!(down[0], -moment);
        let none = eom.force(0.0, &[0.0; 8]);
        assert_eq!(none, [0.0; 3]);
    }

    #[test]
    fn lorentz_force_is_perpendicular() {
        let k = PhysicalConstants::without_gravity();
        let p = props(k.elementary_charge, 0.0);
        let field = UniformB(1.0);
        let eom = EquationOfMotion::new(&p, &k, Some(&field));
        let y = [0.0, 0.0, 0.0, 100.0, 0.0, 0.0, 0.0, 0.0];
        let d = eom.derivatives(0.0, &y);
        // v × B = (100, 0, 0) × (0, 0, 1) = (0, -100, 0)
        assert!(d[3].abs() < 1e-9);
        assert!(d[4] < 0.0);
        assert_eq!(d[5], 0.0);
    }
}
