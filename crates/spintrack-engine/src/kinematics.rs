//! Relativistic energy laws. Pure functions, no state.
//!
//! Energies are in eV and masses in eV/c². At low speed the closed
//! forms lose all precision to cancellation (`γ − 1` for tiny `β`), so
//! both directions switch to a Taylor series whenever the series
//! truncation error is smaller than the rounding error of the closed
//! form.

use spintrack_core::{vec3, FieldSource, PhysicalConstants, StateVector, Vec3};

use crate::kind::ParticleProperties;

/// Lorentz factor γ for a velocity.
pub fn lorentz_factor(v: &Vec3, c: f64) -> f64 {
    1.0 / (1.0 - vec3::norm2(v) / (c * c)).sqrt()
}

/// Kinetic energy [eV] of a particle of mass `mass` [eV/c²] moving with
/// velocity `v` [m/s].
pub fn kinetic_energy(mass: f64, v: &Vec3, c: f64) -> f64 {
    let v2 = vec3::norm2(v);
    let beta2 = v2 / (c * c);
    let gamma = 1.0 / (1.0 - beta2).sqrt();
    if beta2.powi(4) < f64::EPSILON / (gamma - 1.0) {
        // mc²(γ−1) = mv²(1/2 + 3/8 β² + 5/16 β⁴ + 35/128 β⁶ + O(β⁸))
        mass / (c * c)
            * v2
            * (0.5 + beta2 * (3.0 / 8.0 + beta2 * (5.0 / 16.0 + beta2 * 35.0 / 128.0)))
    } else {
        mass * (gamma - 1.0)
    }
}

/// Speed [m/s] of a particle of mass `mass` [eV/c²] with kinetic energy
/// `energy` [eV].
pub fn speed_from_energy(energy: f64, mass: f64, c: f64) -> f64 {
    let x = energy / mass; // γ − 1
    let beta = (1.0 - 1.0 / ((x + 1.0) * (x + 1.0))).sqrt();
    if x.powf(3.5) < f64::EPSILON / (1.0 - beta) {
        let s2 = std::f64::consts::SQRT_2;
        c * ((2.0 * x).sqrt() - 3.0 * x.powf(1.5) / (2.0 * s2) + 23.0 * x.powf(2.5) / (16.0 * s2))
    } else {
        c * beta
    }
}

/// Potential energy [eV] at state `y`: magnetic dipole, electrostatic
/// and gravitational terms. Dipole and electrostatic terms vanish when
/// their property (moment, charge) is zero or no field is present.
pub fn potential_energy(
    props: &ParticleProperties,
    constants: &PhysicalConstants,
    t: f64,
    y: &StateVector,
    field: Option<&dyn FieldSource>,
) -> f64 {
    let mut u = 0.0;
    if let Some(field) = field {
        let p = y.position();
        if props.magnetic_moment != 0.0 {
            let b = field.b_field(t, &p);
            u -= y.polarisation() * props.magnetic_moment / constants.elementary_charge
                * b.magnitude;
        }
        if props.charge != 0.0 {
            let e = field.e_field(t, &p);
            u += props.charge / constants.elementary_charge * e.potential;
        }
    }
    let c2 = constants.speed_of_light * constants.speed_of_light;
    u + props.mass / c2 * constants.gravity * y.position()[2]
}

/// Kinetic plus potential energy [eV].
pub fn total_energy(
    props: &ParticleProperties,
    constants: &PhysicalConstants,
    t: f64,
    y: &StateVector,
    field: Option<&dyn FieldSource>,
) -> f64 {
    kinetic_energy(props.mass, &y.velocity(), constants.speed_of_light)
        + potential_energy(props, constants, t, y, field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::Lifetime;
    use proptest::prelude::*;
    use spintrack_core::{BFieldSample, EFieldSample};

    const C: f64 = 299_792_458.0;
    const NEUTRON_MASS: f64 = 939_565_420.52;

    struct Constant {
        b: f64,
        potential: f64,
    }

    impl FieldSource for Constant {
        fn b_field(&self, _: f64, _: &Vec3) -> BFieldSample {
            BFieldSample::from_components([0.0, 0.0, self.b], [[0.0; 3]; 3])
        }
        fn e_field(&self, _: f64, _: &Vec3) -> EFieldSample {
            EFieldSample {
                potential: self.potential,
                e: [0.0; 3],
            }
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
    fn kinetic_energy_matches_classical_limit() {
        // A 5 m/s neutron: E = mv²/2 with m in eV/c².
        let e = kinetic_energy(NEUTRON_MASS, &[5.0, 0.0, 0.0], C);
        let classical = 0.5 * NEUTRON_MASS / (C * C) * 25.0;
        assert!((e - classical).abs() / classical < 1e-12);
        assert_eq!(kinetic_energy(NEUTRON_MASS, &[0.0; 3], C), 0.0);
    }

    #[test]
    fn kinetic_energy_relativistic() {
        // β = 0.6 → γ = 1.25.
        let e = kinetic_energy(1.0, &[0.6 * C, 0.0, 0.0], C);
        assert!((e - 0.25).abs() < 1e-12);
    }

    #[test]
    fn speed_from_small_energy() {
        // 100 neV neutron ≈ 4.37 m/s.
        let v = speed_from_energy(100e-9, NEUTRON_MASS, C);
        let classical = (2.0 * 100e-9 / NEUTRON_MASS).sqrt() * C;
        assert!((v - classical).abs() / classical < 1e-9);
        assert_eq!(speed_from_energy(0.0, NEUTRON_MASS, C), 0.0);
    }

    #[test]
    fn gravity_only_potential() {
        let k = PhysicalConstants::default();
        let y = StateVector::new([0.0, 0.0, 2.0], [0.0; 3], 0.0, 1.0);
        let u = potential_energy(&props(0.0, 0.0), &k, 0.0, &y, None);
        let expect = NEUTRON_MASS / (C * C) * k.gravity * 2.0;
        assert!((u - expect).abs() < 1e-18);
    }

    #[test]
    fn dipole_and_electrostatic_terms() {
        let k = PhysicalConstants::without_gravity();
        let field = Constant {
            b: 2.0,
            potential: 10.0,
        };
        let y = StateVector::new([0.0; 3], [0.0; 3], 0.0, -1.0);
        let moment = 1e-26;
        let u = potential_energy(&props(0.0, moment), &k, 0.0, &y, Some(&field));
        assert!((u - moment / k.elementary_charge * 2.0).abs() < 1e-15);

        let q = k.elementary_charge;
        let u = potential_energy(&props(q, 0.0), &k, 0.0, &y, Some(&field));
        assert!((u - 10.0).abs() < 1e-12);

        // No field: only gravity (zero here).
        assert_eq!(potential_energy(&props(q, moment), &k, 0.0, &y, None), 0.0);
    }

    proptest! {
        #[test]
        fn energy_speed_inverse(log_e in -12.0f64..9.0) {
            let energy = 10f64.powf(log_e);
            let v = speed_from_energy(energy, NEUTRON_MASS, C);
            let back = kinetic_energy(NEUTRON_MASS, &[v, 0.0, 0.0], C);
            prop_assert!((back - energy).abs() / energy < 1e-6);
        }
    }
}
