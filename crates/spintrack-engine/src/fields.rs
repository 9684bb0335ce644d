//! Analytic field models and the [`FieldManager`] that sums them.
//!
//! Each model is active only inside an axis-aligned box and contributes
//! nothing elsewhere. The manager adds all contributions and derives
//! `|B|` and `∇|B|` once, so individual models only provide components
//! and their Jacobian.

use spintrack_core::{BFieldSample, EFieldSample, FieldSource, Vec3};

/// Field components and Jacobian `∂Bᵢ/∂xⱼ`.
pub type BContribution = (Vec3, [[f64; 3]; 3]);

/// A magnetic field model.
pub trait MagneticField: Send + Sync {
    /// Contribution at `p`, or `None` outside the model's region.
    fn b_field(&self, t: f64, p: &Vec3) -> Option<BContribution>;
}

/// An electric field model.
pub trait ElectricField: Send + Sync {
    /// Contribution at `p`, or `None` outside the model's region.
    fn e_field(&self, t: f64, p: &Vec3) -> Option<EFieldSample>;
}

/// Axis-aligned region in which a model is switched on (bounds inclusive).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldBounds {
    /// Lower corner [m].
    pub min: Vec3,
    /// Upper corner [m].
    pub max: Vec3,
}

impl FieldBounds {
    /// A box from two corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// All of space.
    pub fn everywhere() -> Self {
        Self {
            min: [f64::NEG_INFINITY; 3],
            max: [f64::INFINITY; 3],
        }
    }

    /// Whether `p` lies inside the box.
    pub fn contains(&self, p: &Vec3) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }
}

// ── Models ─────────────────────────────────────────────────────────

/// Homogeneous magnetic field.
#[derive(Clone, Debug)]
pub struct UniformField {
    b: Vec3,
    bounds: FieldBounds,
}

impl UniformField {
    /// Field `b` [T] inside `bounds`.
    pub fn new(b: Vec3, bounds: FieldBounds) -> Self {
        Self { b, bounds }
    }
}

impl MagneticField for UniformField {
    fn b_field(&self, _: f64, p: &Vec3) -> Option<BContribution> {
        self.bounds.contains(p).then_some((self.b, [[0.0; 3]; 3]))
    }
}

/// `B_z = a₁·x + a₂`.
#[derive(Clone, Debug)]
pub struct LinearFieldZ {
    a1: f64,
    a2: f64,
    bounds: FieldBounds,
}

impl LinearFieldZ {
    /// `a1` in T/m, `a2` in T.
    pub fn new(a1: f64, a2: f64, bounds: FieldBounds) -> Self {
        Self { a1, a2, bounds }
    }
}

impl MagneticField for LinearFieldZ {
    fn b_field(&self, _: f64, p: &Vec3) -> Option<BContribution> {
        if !self.bounds.contains(p) {
            return None;
        }
        let mut grad = [[0.0; 3]; 3];
        grad[2][0] = self.a1;
        Some(([0.0, 0.0, self.a1 * p[0] + self.a2], grad))
    }
}

/// Divergence-free field decaying along x:
///
/// ```text
/// B_x = a₁·e^(−a₂x+a₃) + c₁
/// B_y = y·a₁a₂/2·e^(−a₂x+a₃) + c₂
/// B_z = z·a₁a₂/2·e^(−a₂x+a₃) + c₂
/// ```
#[derive(Clone, Debug)]
pub struct ExponentialFieldX {
    a1: f64,
    a2: f64,
    a3: f64,
    c1: f64,
    c2: f64,
    bounds: FieldBounds,
}

impl ExponentialFieldX {
    /// `a1`, `c1`, `c2` in T; `a2` in 1/m; `a3` dimensionless.
    pub fn new(a1: f64, a2: f64, a3: f64, c1: f64, c2: f64, bounds: FieldBounds) -> Self {
        Self {
            a1,
            a2,
            a3,
            c1,
            c2,
            bounds,
        }
    }
}

impl MagneticField for ExponentialFieldX {
    fn b_field(&self, _: f64, p: &Vec3) -> Option<BContribution> {
        if !self.bounds.contains(p) {
            return None;
        }
        let (x, y, z) = (p[0], p[1], p[2]);
        let ex = (-self.a2 * x + self.a3).exp();
        let half = self.a1 * self.a2 / 2.0 * ex;
        let b = [self.a1 * ex + self.c1, y * half + self.c2, z * half + self.c2];
        let grad = [
            [-self.a1 * self.a2 * ex, 0.0, 0.0],
            [-self.a2 * y * half, half, 0.0],
            [-self.a2 * z * half, 0.0, half],
        ];
        Some((b, grad))
    }
}

/// Homogeneous electric field with potential `V = −E·(p − reference)`.
#[derive(Clone, Debug)]
pub struct UniformElectricField {
    e: Vec3,
    reference: Vec3,
    bounds: FieldBounds,
}

impl UniformElectricField {
    /// Field `e` [V/m], zero potential at `reference`.
    pub fn new(e: Vec3, reference: Vec3, bounds: FieldBounds) -> Self {
        Self {
            e,
            reference,
            bounds,
        }
    }
}

impl ElectricField for UniformElectricField {
    fn e_field(&self, _: f64, p: &Vec3) -> Option<EFieldSample> {
        if !self.bounds.contains(p) {
            return None;
        }
        let d = spintrack_core::vec3::sub(p, &self.reference);
        Some(EFieldSample {
            potential: -spintrack_core::vec3::dot(&self.e, &d),
            e: self.e,
        })
    }
}

// ── FieldManager ───────────────────────────────────────────────────

/// Sum of any number of magnetic and electric models.
#[derive(Default)]
pub struct FieldManager {
    magnetic: Vec<Box<dyn MagneticField>>,
    electric: Vec<Box<dyn ElectricField>>,
}

impl FieldManager {
    /// A manager with no models (zero field everywhere).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a magnetic model.
    pub fn add_magnetic(&mut self, field: impl MagneticField + 'static) {
        self.magnetic.push(Box::new(field));
    }

    /// Add an electric model.
    pub fn add_electric(&mut self, field: impl ElectricField + 'static) {
        self.electric.push(Box::new(field));
    }

    /// Builder form of [`add_magnetic`](Self::add_magnetic).
    pub fn with_magnetic(mut self, field: impl MagneticField + 'static) -> Self {
        self.add_magnetic(field);
        self
    }

    /// Builder form of [`add_electric`](Self::add_electric).
    pub fn with_electric(mut self, field: impl ElectricField + 'static) -> Self {
        self.add_electric(field);
        self
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.magnetic.len() + self.electric.len()
    }

    /// Whether no model is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FieldSource for FieldManager {
    fn b_field(&self, t: f64, p: &Vec3) -> BFieldSample {
        let mut b = [0.0; 3];
        let mut grad = [[0.0; 3]; 3];
        for (bi, gi) in self.magnetic.iter().filter_map(|f| f.b_field(t, p)) {
            for i in 0..3 {
                b[i] += bi[i];
                for j in 0..3 {
                    grad[i][j] += gi[i][j];
                }
            }
        }
        BFieldSample::from_components(b, grad)
    }

    fn e_field(&self, t: f64, p: &Vec3) -> EFieldSample {
        let mut sum = EFieldSample::ZERO;
        for s in self.electric.iter().filter_map(|f| f.e_field(t, p)) {
            sum.potential += s.potential;
            for i in 0..3 {
                sum.e[i] += s.e[i];
            }
        }
        sum
    }
}
