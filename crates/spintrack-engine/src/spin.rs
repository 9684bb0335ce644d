//! Spin precession along one trajectory sub-segment.
//!
//! [`SpinIntegrator::step`] advances the spin vector from one waypoint
//! to the next. Which of four regimes applies depends on the field
//! magnitude at both ends and on whether the segment touches one of the
//! configured full-integration windows:
//!
//! 1. field vanishes at the end: the spin becomes the zero vector;
//! 2. field appears from zero: the spin is set (anti)parallel to it;
//! 3. inside a window and below `Bmax`: the Bloch equation
//!    `dS/dt = Ω(t) × S` is integrated with a nested dense stepper over
//!    a spline of the precession axis `Ω`;
//! 4. otherwise below `Bmax`: the spin is parallel-transported, keeping
//!    its projection onto the field and drawing a new azimuth.
//!
//! Whenever `|B|` at the end exceeds `Bmax` the spin then collapses onto
//! the field direction, optionally redrawing the polarisation.

use log::debug;
use spintrack_core::{
    vec3, BFieldSample, JobNumber, McGenerator, ParticleNumber, SpinVector, Vec3,
    STATE_VARIABLES,
};
use spintrack_log::{LogError, RecordSink, SpinRecord};
use spintrack_ode::{CubicSpline, DenseOutput, DenseStepper, OdeError, OdeSystem, Tolerances};

use crate::config::TrackingOptions;
use crate::context::TrackingContext;
use crate::kind::{ParticleProperties, Waypoint};
use crate::motion::EquationOfMotion;

// ── Diagnostics ────────────────────────────────────────────────────

/// Time-weighted running mean and variance of the precession frequency.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LarmorStats {
    weight: f64,
    mean: f64,
    m2: f64,
}

impl LarmorStats {
    /// Add a sample `omega` [rad/s] held for `weight` seconds.
    pub fn add(&mut self, omega: f64, weight: f64) {
        if weight.is_nan() || weight <= 0.0 {
            return;
        }
        self.weight += weight;
        let delta = omega - self.mean;
        self.mean += weight / self.weight * delta;
        self.m2 += weight * delta * (omega - self.mean);
    }

    /// Weighted mean, or 0 without samples.
    pub fn mean(&self) -> f64 {
        if self.weight > 0.0 {
            self.mean
        } else {
            0.0
        }
    }

    /// Weighted standard deviation, or 0 without samples.
    pub fn std_dev(&self) -> f64 {
        if self.weight > 0.0 {
            (self.m2 / self.weight).max(0.0).sqrt()
        } else {
            0.0
        }
    }

    /// Total sample weight [s].
    pub fn total_time(&self) -> f64 {
        self.weight
    }
}

/// Spin vector plus its flip and precession diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub struct SpinState {
    /// Current spin vector. Zero means undefined (no field).
    pub spin: SpinVector,
    /// Number of polarisation sign changes at collapse.
    pub flips: u64,
    /// Probability that no flip occurred at any collapse so far.
    pub no_flip_probability: f64,
    /// Precession frequency statistics over integrated sub-steps.
    pub larmor: LarmorStats,
}

impl SpinState {
    /// Fresh state with the given spin.
    pub fn new(spin: SpinVector) -> Self {
        Self {
            spin,
            flips: 0,
            no_flip_probability: 1.0,
            larmor: LarmorStats::default(),
        }
    }

    /// Normalized projection of the spin onto `b`; 0 if either vanishes.
    pub fn projection_onto(&self, b: &Vec3) -> f64 {
        let n = vec3::norm(&self.spin) * vec3::norm(b);
        if n > 0.0 {
            vec3::dot(&self.spin, b) / n
        } else {
            0.0
        }
    }
}

/// What a spin step did to the particle's polarisation.
#[derive(Clone, Debug, PartialEq)]
pub enum SpinOutcome {
    /// The state vector's polarisation is unchanged.
    Unchanged,
    /// A collapse redrew the polarisation; the state vector must take
    /// this value and the trajectory integrator must restart.
    PolarisationChanged(f64),
    /// The nested integration failed.
    Failed(OdeError),
}

// ── Precession axis ────────────────────────────────────────────────

/// Precession axis Ω [rad/s] of a particle with gyromagnetic ratio
/// `gyro` in state `y` (with derivative `dydt`), magnetic field `b` and
/// electric field `e`.
///
/// Sum of the relativistic magnetic term
/// `−γ_g/γ ((1−γ) B∥ + γ B − γ (v×E)/c²)` and Thomas precession
/// `γ²/(γ+1) (a×v)/c²`. The electric term is only included when
/// `include_e` is set.
pub fn precession_axis(
    gyro: f64,
    b: &Vec3,
    e: &Vec3,
    y: &[f64; STATE_VARIABLES],
    dydt: &[f64; STATE_VARIABLES],
    c: f64,
    include_e: bool,
) -> Vec3 {
    let v = [y[3], y[4], y[5]];
    let a = [dydt[3], dydt[4], dydt[5]];
    let c2 = c * c;
    let v2 = vec3::norm2(&v);
    let gamma = 1.0 / (1.0 - v2 / c2).sqrt();
    let b_parallel = if v2 > 0.0 {
        vec3::scale(&v, vec3::dot(b, &v) / v2)
    } else {
        [0.0; 3]
    };
    let mut field = vec3::add(
        &vec3::scale(&b_parallel, 1.0 - gamma),
        &vec3::scale(b, gamma),
    );
    if include_e {
        field = vec3::sub(&field, &vec3::scale(&vec3::cross(&v, e), gamma / c2));
    }
    let omega_b = vec3::scale(&field, -gyro / gamma);
    let omega_t = vec3::scale(&vec3::cross(&a, &v), gamma * gamma / (gamma + 1.0) / c2);
    vec3::add(&omega_b, &omega_t)
}

/// Bloch equation over a splined precession axis.
struct Precession {
    axis: [CubicSpline; 3],
}

impl Precession {
    fn omega(&self, t: f64) -> Vec3 {
        [
            self.axis[0].eval(t),
            self.axis[1].eval(t),
            self.axis[2].eval(t),
        ]
    }
}

impl OdeSystem<3> for Precession {
    fn rhs(&self, t: f64, s: &[f64; 3], dsdt: &mut [f64; 3]) {
        *dsdt = vec3::cross(&self.omega(t), s);
    }
}

// ── SpinIntegrator ─────────────────────────────────────────────────

/// Advances a particle's spin segment by segment.
pub struct SpinIntegrator<'a> {
    props: &'a ParticleProperties,
    ctx: &'a TrackingContext<'a>,
    options: &'a TrackingOptions,
    kind: &'a str,
    job: JobNumber,
    particle: ParticleNumber,
    next_log: f64,
}

impl<'a> SpinIntegrator<'a> {
    /// Integrator for one particle; spin logging starts at `t0`.
    pub fn new(
        props: &'a ParticleProperties,
        ctx: &'a TrackingContext<'a>,
        options: &'a TrackingOptions,
        kind: &'a str,
        particle: ParticleNumber,
        t0: f64,
    ) -> Self {
        Self {
            props,
            ctx,
            options,
            kind,
            job: ctx.job,
            particle,
            next_log: t0,
        }
    }

    /// Advance `state` from `from` to `to` along `trajectory`.
    ///
    /// Returns `Err` only if writing a spin record fails.
    pub fn step(
        &mut self,
        from: &Waypoint,
        to: &Waypoint,
        trajectory: &dyn DenseOutput<STATE_VARIABLES>,
        state: &mut SpinState,
        mc: &mut dyn McGenerator,
        sink: &mut dyn RecordSink,
    ) -> Result<SpinOutcome, LogError> {
        let Some(field) = self.ctx.field else {
            return Ok(SpinOutcome::Unchanged);
        };
        if self.props.gyromagnetic_ratio == 0.0 || from.t == to.t {
            return Ok(SpinOutcome::Unchanged);
        }

        let b1 = field.b_field(from.t, &from.y.position());
        let b2 = field.b_field(to.t, &to.y.position());

        if b2.magnitude == 0.0 {
            if state.spin != [0.0; 3] {
                debug!("#{}: field vanished at t={}, spin undefined", self.particle, to.t);
            }
            state.spin = [0.0; 3];
            return Ok(SpinOutcome::Unchanged);
        }
        if b1.magnitude == 0.0 {
            debug!("#{}: entering magnetic field at t={}", self.particle, to.t);
            let pol = if self.options.flip_spin {
                if mc.uniform(0.0, 1.0) < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            } else {
                from.y.polarisation()
            };
            state.spin = vec3::scale(&b2.b, pol / b2.magnitude);
            return Ok(SpinOutcome::Unchanged);
        }

        let mut pol = if vec3::norm(&state.spin) > 0.0 {
            state.projection_onto(&b1.b)
        } else {
            from.y.polarisation()
        };

        let b_max = self.options.spin_b_max;
        let below = b1.magnitude < b_max || b2.magnitude < b_max;
        let active = self.options.in_spin_window(from.t) || self.options.in_spin_window(to.t);

        if active && below {
            if let Err(e) = self.integrate(from, to, &b1, trajectory, state, sink)? {
                return Ok(SpinOutcome::Failed(e));
            }
            pol = state.projection_onto(&b2.b);
        } else if below {
            let s = if pol * pol >= 1.0 {
                [0.0, 0.0, pol]
            } else {
                let az = mc.azimuth();
                let r = (1.0 - pol * pol).sqrt();
                [r * az.sin(), r * az.cos(), pol]
            };
            state.spin = vec3::rotate_onto(&s, &b2.b);
        }

        if b2.magnitude > b_max {
            return Ok(self.collapse(to, &b2, pol, state, mc));
        }
        Ok(SpinOutcome::Unchanged)
    }

    /// Collapse the spin onto the field at `to`.
    fn collapse(
        &self,
        to: &Waypoint,
        b2: &BFieldSample,
        projection: f64,
        state: &mut SpinState,
        mc: &mut dyn McGenerator,
    ) -> SpinOutcome {
        let old = to.y.polarisation();
        let new = if self.options.flip_spin {
            let new = mc.dice_polarisation(projection);
            state.no_flip_probability *= 0.5 * (1.0 + old * projection);
            if new != old {
                state.flips += 1;
            }
            new
        } else {
            old
        };
        state.spin = vec3::scale(&b2.b, new / b2.magnitude);
        if new != old {
            SpinOutcome::PolarisationChanged(new)
        } else {
            SpinOutcome::Unchanged
        }
    }

    /// Integrate the Bloch equation over `[from.t, to.t]`.
    fn integrate(
        &mut self,
        from: &Waypoint,
        to: &Waypoint,
        b1: &BFieldSample,
        trajectory: &dyn DenseOutput<STATE_VARIABLES>,
        state: &mut SpinState,
        sink: &mut dyn RecordSink,
    ) -> Result<Result<(), OdeError>, LogError> {
        let Some(field) = self.ctx.field else {
            return Ok(Ok(()));
        };
        let cfg = &self.ctx.config;
        let c = self.ctx.constants.speed_of_light;
        let gyro = self.props.gyromagnetic_ratio;
        let eom = EquationOfMotion::new(self.props, &self.ctx.constants, self.ctx.field);
        let (t1, t2) = (from.t, to.t);
        let n = cfg.spin_interpolation_intervals;

        let mut ts = Vec::with_capacity(n + 1);
        let mut axis: [Vec<f64>; 3] = Default::default();
        for i in 0..=n {
            let t = if i == n {
                t2
            } else {
                t1 + i as f64 * (t2 - t1) / n as f64
            };
            let y = trajectory.calc_state(t);
            let dydt = eom.derivatives(t, &y);
            let p = [y[0], y[1], y[2]];
            let b = field.b_field(t, &p);
            let e = field.e_field(t, &p);
            let omega = precession_axis(
                gyro,
                &b.b,
                &e.e,
                &y,
                &dydt,
                c,
                self.options.e_field_spin_precession,
            );
            let weight = (if i == 0 || i == n { 0.5 } else { 1.0 }) * (t2 - t1) / n as f64;
            state.larmor.add(vec3::norm(&omega), weight);
            ts.push(t);
            for (k, a) in axis.iter_mut().enumerate() {
                a.push(omega[k]);
            }
        }

        let splines = (
            CubicSpline::new(&ts, &axis[0]),
            CubicSpline::new(&ts, &axis[1]),
            CubicSpline::new(&ts, &axis[2]),
        );
        let system = match splines {
            (Ok(x), Ok(y), Ok(z)) => Precession { axis: [x, y, z] },
            // Sample times collapsed under rounding: the segment is too
            // short for the spin to move.
            _ => return Ok(Ok(())),
        };

        let tolerances = Tolerances::new(cfg.spin_tolerance, cfg.spin_tolerance);
        let mut stepper = DenseStepper::<3>::new(tolerances)
            .with_max_failed_attempts(cfg.max_failed_attempts);
        stepper.initialize(state.spin, t1, (std::f64::consts::PI / gyro / b1.magnitude).abs());

        if self.next_log < t1 {
            self.next_log = t1;
        }
        let mut steps = 0u64;
        loop {
            if let Err(e) = stepper.do_step(&system) {
                return Ok(Err(e));
            }
            steps += 1;
            if self.options.spin_log {
                let until = stepper.current_time().min(t2);
                while self.next_log <= until {
                    let t = self.next_log;
                    let y = trajectory.calc_state(t);
                    sink.spin(
                        self.kind,
                        &SpinRecord {
                            job: self.job,
                            particle: self.particle,
                            t,
                            spin: stepper.calc_state(t),
                            omega: system.omega(t),
                            b: field.b_field(t, &[y[0], y[1], y[2]]).b,
                        },
                    )?;
                    self.next_log += self.options.spin_log_interval;
                }
            }
            if stepper.current_time() >= t2 {
                state.spin = stepper.calc_state(t2);
                break;
            }
            if steps >= cfg.max_spin_steps {
                return Ok(Err(OdeError::TooManySteps {
                    limit: cfg.max_spin_steps,
                }));
            }
        }
        debug!(
            "#{}: spin sub-step {:.3e} s in {} steps, |S|={:.12}",
            self.particle,
            t2 - t1,
            steps,
            vec3::norm(&state.spin)
        );
        Ok(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const C: f64 = 299_792_458.0;

    #[test]
    fn larmor_stats_weighted() {
        let mut s = LarmorStats::default();
        assert_eq!(s.mean(), 0.0);
        assert_eq!(s.std_dev(), 0.0);
        s.add(1.0, 1.0);
        s.add(3.0, 3.0);
        assert!((s.mean() - 2.5).abs() < 1e-12);
        // var = (1·2.25 + 3·0.25) / 4 = 0.75
        assert!((s.std_dev() - 0.75f64.sqrt()).abs() < 1e-12);
        s.add(100.0, 0.0);
        assert!((s.total_time() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn axis_at_rest_is_minus_gamma_b() {
        let y = [0.0; 8];
        let d = [0.0; 8];
        let omega = precession_axis(2.0, &[0.0, 0.0, 3.0], &[0.0; 3], &y, &d, C, true);
        assert_eq!(omega, [0.0, 0.0, -6.0]);
    }

    #[test]
    fn electric_term_only_when_enabled() {
        let y = [0.0, 0.0, 0.0, 1e6, 0.0, 0.0, 0.0, 1.0];
        let d = [0.0; 8];
        let e = [0.0, 1e6, 0.0];
        let b = [0.0, 0.0, 1e-3];
        let off = precession_axis(1.0, &b, &e, &y, &d, C, false);
        let on = precession_axis(1.0, &b, &e, &y, &d, C, true);
        assert_ne!(off[2], on[2]);
        assert_eq!(off[0], on[0]);
    }

    #[test]
    fn projection_handles_zero_vectors() {
        let s = SpinState::new([0.0; 3]);
        assert_eq!(s.projection_onto(&[0.0, 0.0, 1.0]), 0.0);
        let s = SpinState::new([0.0, 0.0, 2.0]);
        assert_eq!(s.projection_onto(&[0.0, 0.0, 0.5]), 1.0);
        assert_eq!(s.projection_onto(&[0.0; 3]), 0.0);
    }

    proptest! {
        #[test]
        fn thomas_term_perpendicular_to_velocity(
            vx in -1e7f64..1e7, vy in -1e7f64..1e7, ax in -1e9f64..1e9, az in -1e9f64..1e9,
        ) {
            let y = [0.0, 0.0, 0.0, vx, vy, 0.0, 0.0, 1.0];
            let d = [vx, vy, 0.0, ax, 0.0, az, 1.0, 0.0];
            let omega = precession_axis(0.0, &[0.0; 3], &[0.0; 3], &y, &d, C, false);
            let v = [vx, vy, 0.0];
            let scale = vec3::norm(&omega) * vec3::norm(&v);
            prop_assert!(vec3::dot(&omega, &v).abs() <= 1e-9 * scale.max(1e-300));
        }
    }
}
