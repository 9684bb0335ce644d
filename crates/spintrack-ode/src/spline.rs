//! Parabolically terminated cubic spline.
//!
//! The end conditions force the first and last intervals to be
//! parabolas (`M₀ = M₁`, `Mₙ = Mₙ₋₁` on the second derivatives), so
//! quadratic data is reproduced exactly. Evaluation outside the node
//! range extrapolates with the nearest end polynomial.

use crate::error::SplineError;

/// A cubic spline through `(x_i, y_i)` nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    // Second derivatives at the nodes.
    ms: Vec<f64>,
}

impl CubicSpline {
    /// Build a spline through the given nodes.
    ///
    /// # Errors
    ///
    /// Returns `Err` if fewer than two nodes are given, the slices differ
    /// in length, or the abscissae are not strictly increasing.
    pub fn new(xs: &[f64], ys: &[f64]) -> Result<Self, SplineError> {
        if xs.len() != ys.len() {
            return Err(SplineError::LengthMismatch {
                xs: xs.len(),
                ys: ys.len(),
            });
        }
        let n = xs.len();
        if n < 2 {
            return Err(SplineError::TooFewPoints { count: n });
        }
        for i in 1..n {
            if !(xs[i] > xs[i - 1]) || !xs[i].is_finite() {
                return Err(SplineError::NotIncreasing { index: i });
            }
        }

        let ms = if n == 2 {
            vec![0.0; 2]
        } else {
            second_derivatives(xs, ys)
        };
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            ms,
        })
    }

    /// Evaluate the spline at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        // Interval index, clamped so out-of-range x uses an end polynomial.
        let i = self
            .xs
            .partition_point(|&xi| xi <= x)
            .saturating_sub(1)
            .min(n - 2);
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        let (m0, m1) = (self.ms[i], self.ms[i + 1]);
        let h = x1 - x0;
        let a = x1 - x;
        let b = x - x0;
        m0 * a * a * a / (6.0 * h)
            + m1 * b * b * b / (6.0 * h)
            + (y0 / h - m0 * h / 6.0) * a
            + (y1 / h - m1 * h / 6.0) * b
    }

    /// Node abscissae.
    pub fn knots(&self) -> &[f64] {
        &self.xs
    }
}

/// Solve the tridiagonal system for the node second derivatives.
fn second_derivatives(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let mut lower = vec![0.0; n];
    let mut diag = vec![0.0; n];
    let mut upper = vec![0.0; n];
    let mut rhs = vec![0.0; n];

    // M0 - M1 = 0
    diag[0] = 1.0;
    upper[0] = -1.0;
    for i in 1..n - 1 {
        let h0 = xs[i] - xs[i - 1];
        let h1 = xs[i + 1] - xs[i];
        lower[i] = h0;
        diag[i] = 2.0 * (h0 + h1);
        upper[i] = h1;
        rhs[i] = 6.0 * ((ys[i + 1] - ys[i]) / h1 - (ys[i] - ys[i - 1]) / h0);
    }
    // Mn - Mn-1 = 0
    lower[n - 1] = -1.0;
    diag[n - 1] = 1.0;

    // Thomas algorithm.
    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];
    c[0] = upper[0] / diag[0];
    d[0] = rhs[0] / diag[0];
    for i in 1..n {
        let denom = diag[i] - lower[i] * c[i - 1];
        c[i] = upper[i] / denom;
        d[i] = (rhs[i] - lower[i] * d[i - 1]) / denom;
    }
    let mut m = vec![0.0; n];
    m[n - 1] = d[n - 1];
    for i in (0..n - 1).rev() {
        m[i] = d[i] - c[i] * m[i + 1];
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn passes_through_nodes() {
        let xs = [0.0, 0.5, 1.5, 2.0, 3.0];
        let ys = [1.0, -1.0, 2.0, 0.5, 0.0];
        let s = CubicSpline::new(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert!((s.eval(*x) - y).abs() < 1e-12);
        }
    }

    #[test]
    fn reproduces_quadratics_exactly() {
        let xs: Vec<f64> = (0..=10).map(|i| i as f64 * 0.1).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * x * x - x + 2.0).collect();
        let s = CubicSpline::new(&xs, &ys).unwrap();
        for k in 0..=40 {
            let x = k as f64 * 0.025;
            let expect = 3.0 * x * x - x + 2.0;
            assert!((s.eval(x) - expect).abs() < 1e-10, "x={x}");
        }
    }

    #[test]
    fn two_nodes_is_linear() {
        let s = CubicSpline::new(&[0.0, 2.0], &[1.0, 5.0]).unwrap();
        assert!((s.eval(1.0) - 3.0).abs() < 1e-15);
        assert!((s.eval(3.0) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            CubicSpline::new(&[0.0], &[1.0]),
            Err(SplineError::TooFewPoints { count: 1 })
        );
        assert_eq!(
            CubicSpline::new(&[0.0, 1.0], &[1.0]),
            Err(SplineError::LengthMismatch { xs: 2, ys: 1 })
        );
        assert_eq!(
            CubicSpline::new(&[0.0, 1.0, 1.0], &[1.0, 2.0, 3.0]),
            Err(SplineError::NotIncreasing { index: 2 })
        );
    }

    proptest! {
        #[test]
        fn linear_data_is_reproduced(a in -5.0f64..5.0, b in -5.0f64..5.0, x in 0.0f64..1.0) {
            let xs: Vec<f64> = (0..=10).map(|i| i as f64 * 0.1).collect();
            let ys: Vec<f64> = xs.iter().map(|x| a * x + b).collect();
            let s = CubicSpline::new(&xs, &ys).unwrap();
            prop_assert!((s.eval(x) - (a * x + b)).abs() < 1e-9);
        }
    }
}
