//! Deterministic random draws.

use spintrack_core::McGenerator;

/// Replays a fixed sequence of unit draws, cycling when exhausted.
///
/// An empty script always draws 0.5. Counts every draw and, separately,
/// every polarisation dice.
#[derive(Clone, Debug, Default)]
pub struct ScriptedGenerator {
    script: Vec<f64>,
    next: usize,
    pub draws: usize,
    pub dice: usize,
}

impl ScriptedGenerator {
    pub fn new(script: impl Into<Vec<f64>>) -> Self {
        Self {
            script: script.into(),
            ..Self::default()
        }
    }

    /// Always draws `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    fn unit(&mut self) -> f64 {
        self.draws += 1;
        if self.script.is_empty() {
            return 0.5;
        }
        let v = self.script[self.next % self.script.len()];
        self.next += 1;
        v
    }
}

impl McGenerator for ScriptedGenerator {
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.unit()
    }

    fn dice_polarisation(&mut self, projection: f64) -> f64 {
        self.dice += 1;
        if self.unit() < 0.5 * (1.0 + projection) {
            1.0
        } else {
            -1.0
        }
    }
}
