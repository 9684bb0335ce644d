//! Adaptive Dormand–Prince 5(4) stepper with dense output.
//!
//! Usage mirrors a classic dense-output stepper: [`initialize`] with a
//! start state and a step-size guess, call [`do_step`] repeatedly (each
//! call performs exactly one accepted step, retrying rejected attempts
//! internally), and evaluate [`calc_state`] anywhere inside the last
//! accepted interval `[previous_time, current_time]`.
//!
//! [`initialize`]: DenseStepper::initialize
//! [`do_step`]: DenseStepper::do_step
//! [`calc_state`]: DenseOutput::calc_state

use crate::error::OdeError;
use crate::tableau::*;

/// System of ordinary differential equations `dy/dt = f(t, y)`.
pub trait OdeSystem<const N: usize> {
    /// Evaluate the right-hand side into `dydt`.
    fn rhs(&self, t: f64, y: &[f64; N], dydt: &mut [f64; N]);
}

/// Anything that can evaluate a trajectory at an arbitrary time inside
/// its current interval.
pub trait DenseOutput<const N: usize> {
    /// State at time `t`.
    fn calc_state(&self, t: f64) -> [f64; N];
}

/// Error tolerances. A step is accepted when every component satisfies
/// `|err_i| <= atol + rtol * max(|y_i|, |y_new_i|)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    /// Absolute tolerance.
    pub atol: f64,
    /// Relative tolerance.
    pub rtol: f64,
}

impl Tolerances {
    /// Create tolerances.
    pub fn new(atol: f64, rtol: f64) -> Self {
        Self { atol, rtol }
    }
}

/// Step-size controller: `h_new = safety * h * err^(-1/5)`, clamped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepController {
    /// Safety factor.
    pub safety: f64,
    /// Maximum growth factor per step.
    pub max_factor: f64,
    /// Minimum reduction factor per step.
    pub min_factor: f64,
}

impl Default for StepController {
    fn default() -> Self {
        Self {
            safety: 0.9,
            max_factor: 5.0,
            min_factor: 0.2,
        }
    }
}

impl StepController {
    /// Step size adjustment factor for a normalized error estimate.
    pub fn factor(&self, error: f64) -> f64 {
        if error == 0.0 {
            return self.max_factor;
        }
        (self.safety * error.powf(-0.2)).clamp(self.min_factor, self.max_factor)
    }
}

/// Counters for diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepperStats {
    /// Right-hand side evaluations.
    pub fn_evals: u64,
    /// Accepted steps.
    pub accepted_steps: u64,
    /// Rejected attempts.
    pub rejected_steps: u64,
}

/// Adaptive Dormand–Prince 5(4) stepper with continuous extension.
#[derive(Clone, Debug)]
pub struct DenseStepper<const N: usize> {
    tol: Tolerances,
    controller: StepController,
    max_failed_attempts: u32,
    initialized: bool,
    t: f64,
    t_old: f64,
    y: [f64; N],
    dydt: [f64; N],
    dydt_valid: bool,
    h: f64,
    // Coefficients of the continuous extension on [t_old, t].
    cont: [[f64; N]; 5],
    /// Integration statistics.
    pub stats: StepperStats,
}

impl<const N: usize> DenseStepper<N> {
    /// Create an uninitialized stepper with the given tolerances.
    pub fn new(tol: Tolerances) -> Self {
        Self {
            tol,
            controller: StepController::default(),
            max_failed_attempts: 500,
            initialized: false,
            t: 0.0,
            t_old: 0.0,
            y: [0.0; N],
            dydt: [0.0; N],
            dydt_valid: false,
            h: 0.0,
            cont: [[0.0; N]; 5],
            stats: StepperStats::default(),
        }
    }

    /// Override the step-size controller.
    pub fn with_controller(mut self, controller: StepController) -> Self {
        self.controller = controller;
        self
    }

    /// Number of consecutive rejected attempts tolerated in one
    /// [`do_step`](Self::do_step) before it fails. Default: 500.
    pub fn with_max_failed_attempts(mut self, attempts: u32) -> Self {
        self.max_failed_attempts = attempts.max(1);
        self
    }

    /// (Re)start integration from `y` at time `t` with step guess `h`.
    ///
    /// Discards the previous dense-output interval.
    pub fn initialize(&mut self, y: [f64; N], t: f64, h: f64) {
        self.initialized = true;
        self.t = t;
        self.t_old = t;
        self.y = y;
        self.dydt_valid = false;
        self.h = h;
        self.cont = [[0.0; N]; 5];
        self.cont[0] = y;
    }

    /// Time at the end of the last accepted step.
    pub fn current_time(&self) -> f64 {
        self.t
    }

    /// Time at the start of the last accepted step.
    pub fn previous_time(&self) -> f64 {
        self.t_old
    }

    /// State at [`current_time`](Self::current_time).
    pub fn current_state(&self) -> &[f64; N] {
        &self.y
    }

    /// Step size proposed for the next step.
    pub fn current_time_step(&self) -> f64 {
        self.h
    }

    /// Perform one accepted step.
    ///
    /// Rejected attempts shrink the step and retry; after
    /// `max_failed_attempts` consecutive rejections the step fails.
    pub fn do_step<S: OdeSystem<N>>(&mut self, sys: &S) -> Result<(), OdeError> {
        if !self.initialized {
            return Err(OdeError::NotInitialized);
        }
        if !self.dydt_valid {
            sys.rhs(self.t, &self.y, &mut self.dydt);
            self.stats.fn_evals += 1;
            if !all_finite(&self.dydt) {
                return Err(OdeError::NonFinite { t: self.t });
            }
            self.dydt_valid = true;
        }

        let mut failed = 0u32;
        let mut saw_non_finite = false;
        loop {
            let h = self.h;
            if !(h.is_finite() && h > 0.0) || self.t + h == self.t {
                return Err(OdeError::StepSizeUnderflow { t: self.t, h });
            }

            let attempt = self.attempt(sys, h);
            self.stats.fn_evals += 6;

            match attempt {
                Some((y_new, k7, k, err)) if err <= 1.0 => {
                    self.accept(h, y_new, k7, &k);
                    self.h = h * self.controller.factor(err);
                    self.stats.accepted_steps += 1;
                    return Ok(());
                }
                Some((_, _, _, err)) => {
                    self.h = h * self.controller.factor(err).min(1.0);
                }
                None => {
                    saw_non_finite = true;
                    self.h = h * self.controller.min_factor;
                }
            }
            self.stats.rejected_steps += 1;
            failed += 1;
            if failed >= self.max_failed_attempts {
                return Err(if saw_non_finite {
                    OdeError::NonFinite { t: self.t }
                } else {
                    OdeError::StepSizeUnderflow { t: self.t, h: self.h }
                });
            }
        }
    }

    /// One trial step of size `h`. Returns `None` if any stage is non-finite.
    #[allow(clippy::type_complexity)]
    fn attempt<S: OdeSystem<N>>(
        &self,
        sys: &S,
        h: f64,
    ) -> Option<([f64; N], [f64; N], [[f64; N]; 6], f64)> {
        let t = self.t;
        let y = &self.y;
        let k1 = self.dydt;
        let mut k2 = [0.0; N];
        let mut k3 = [0.0; N];
        let mut k4 = [0.0; N];
        let mut k5 = [0.0; N];
        let mut k6 = [0.0; N];
        let mut k7 = [0.0; N];
        let mut tmp = [0.0; N];

        for i in 0..N {
            tmp[i] = y[i] + h * A21 * k1[i];
        }
        sys.rhs(t + C2 * h, &tmp, &mut k2);
        for i in 0..N {
            tmp[i] = y[i] + h * (A31 * k1[i] + A32 * k2[i]);
        }
        sys.rhs(t + C3 * h, &tmp, &mut k3);
        for i in 0..N {
            tmp[i] = y[i] + h * (A41 * k1[i] + A42 * k2[i] + A43 * k3[i]);
        }
        sys.rhs(t + C4 * h, &tmp, &mut k4);
        for i in 0..N {
            tmp[i] = y[i] + h * (A51 * k1[i] + A52 * k2[i] + A53 * k3[i] + A54 * k4[i]);
        }
        sys.rhs(t + C5 * h, &tmp, &mut k5);
        for i in 0..N {
            tmp[i] = y[i]
                + h * (A61 * k1[i] + A62 * k2[i] + A63 * k3[i] + A64 * k4[i] + A65 * k5[i]);
        }
        sys.rhs(t + h, &tmp, &mut k6);

        let mut y_new = [0.0; N];
        for i in 0..N {
            y_new[i] =
                y[i] + h * (B1 * k1[i] + B3 * k3[i] + B4 * k4[i] + B5 * k5[i] + B6 * k6[i]);
        }
        sys.rhs(t + h, &y_new, &mut k7);

        if !all_finite(&y_new) || !all_finite(&k7) {
            return None;
        }

        let mut err = 0.0f64;
        for i in 0..N {
            let e = h
                * (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i]
                    + E7 * k7[i]);
            let sc = self.tol.atol + self.tol.rtol * y[i].abs().max(y_new[i].abs());
            err = err.max(e.abs() / sc);
        }
        if !err.is_finite() {
            return None;
        }
        Some((y_new, k7, [k1, k2, k3, k4, k5, k6], err))
    }

    fn accept(&mut self, h: f64, y_new: [f64; N], k7: [f64; N], k: &[[f64; N]; 6]) {
        let [k1, _, k3, k4, k5, k6] = k;
        for i in 0..N {
            let ydiff = y_new[i] - self.y[i];
            let bspl = h * k1[i] - ydiff;
            self.cont[0][i] = self.y[i];
            self.cont[1][i] = ydiff;
            self.cont[2][i] = bspl;
            self.cont[3][i] = ydiff - h * k7[i] - bspl;
            self.cont[4][i] = h
                * (D1 * k1[i] + D3 * k3[i] + D4 * k4[i] + D5 * k5[i] + D6 * k6[i]
                    + D7 * k7[i]);
        }
        self.t_old = self.t;
        self.t += h;
        self.y = y_new;
        self.dydt = k7;
    }
}

impl<const N: usize> DenseOutput<N> for DenseStepper<N> {
    /// Evaluate the continuous extension of the last accepted step.
    ///
    /// Exact at both ends of the interval; extrapolates outside it.
    fn calc_state(&self, t: f64) -> [f64; N] {
        let h = self.t - self.t_old;
        if h == 0.0 {
            return self.y;
        }
        let theta = (t - self.t_old) / h;
        let theta1 = 1.0 - theta;
        let c = &self.cont;
        let mut out = [0.0; N];
        for i in 0..N {
            out[i] = c[0][i]
                + theta * (c[1][i] + theta1 * (c[2][i] + theta * (c[3][i] + theta1 * c[4][i])));
        }
        out
    }
}

fn all_finite<const N: usize>(v: &[f64; N]) -> bool {
    v.iter().all(|x| x.is_finite())
}
