//! Integrator constants, per-run tracking options, and their validation.
//!
//! [`IntegratorConfig`] holds the numerical constants of the tracker.
//! [`TrackingOptions`] holds the user-facing switches, parsed from a
//! string-keyed [`OptionMap`] by [`TrackingOptions::from_options`].

use std::error::Error;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

/// String-keyed option table, in the order the keys were read.
pub type OptionMap = IndexMap<String, String>;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while parsing or validating configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A value could not be parsed for its key.
    InvalidValue {
        /// The option key.
        key: String,
        /// The offending raw value.
        value: String,
        /// What was expected.
        reason: String,
    },
    /// `BFtimes` holds an odd number of entries.
    UnpairedTimes {
        /// Number of entries found.
        count: usize,
    },
    /// A `BFtimes` window ends before it starts.
    InvertedWindow {
        /// Index of the window (pair index, not entry index).
        index: usize,
    },
    /// `snapshots` is not in ascending order.
    UnsortedSnapshots {
        /// Index of the first entry smaller than its predecessor.
        index: usize,
    },
    /// A logging interval is zero, negative, or not finite.
    InvalidInterval {
        /// The option key.
        key: &'static str,
        /// The invalid value.
        value: f64,
    },
    /// A numerical integrator parameter is out of range.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the constraint that was violated.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "option '{key}' = '{value}': {reason}")
            }
            Self::UnpairedTimes { count } => {
                write!(f, "BFtimes must hold start/end pairs, got {count} entries")
            }
            Self::InvertedWindow { index } => {
                write!(f, "BFtimes window {index} ends before it starts")
            }
            Self::UnsortedSnapshots { index } => {
                write!(f, "snapshots not ascending at entry {index}")
            }
            Self::InvalidInterval { key, value } => {
                write!(f, "{key} must be positive and finite, got {value}")
            }
            Self::InvalidParameter { name, reason } => write!(f, "{name}: {reason}"),
        }
    }
}

impl Error for ConfigError {}

// ── IntegratorConfig ───────────────────────────────────────────────

/// Numerical constants of the trajectory and spin integrators.
#[derive(Clone, Debug, PartialEq)]
pub struct IntegratorConfig {
    /// Absolute and relative tolerance of the trajectory stepper. Default: 1e-9.
    pub ode_tolerance: f64,
    /// Absolute and relative tolerance of the spin stepper. Default: 1e-12.
    pub spin_tolerance: f64,
    /// Maximum spatial length of a collision-check sub-segment [m]. Default: 0.01.
    pub max_sample_distance: f64,
    /// A crossing is exact once it lies this close to both segment ends [m].
    /// Default: 1e-8.
    pub reflect_tolerance: f64,
    /// Bisection depth at which a crossing is accepted as exact. Default: 100.
    pub max_bisection_depth: u32,
    /// Number of intervals the precession axis is sampled on. Default: 10.
    pub spin_interpolation_intervals: usize,
    /// Consecutive rejected attempts before a step fails. Default: 500.
    pub max_failed_attempts: u32,
    /// Accepted spin steps per sub-segment before it counts as an
    /// integration failure. Default: 10 000 000.
    pub max_spin_steps: u64,
    /// First step guess as a distance travelled [m]. Default: 0.001.
    pub initial_step_length: f64,
    /// First step guess for a particle at rest [s]. Default: 0.001.
    pub initial_step_at_rest: f64,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            ode_tolerance: 1e-9,
            spin_tolerance: 1e-12,
            max_sample_distance: 0.01,
            reflect_tolerance: 1e-8,
            max_bisection_depth: 100,
            spin_interpolation_intervals: 10,
            max_failed_attempts: 500,
            max_spin_steps: 10_000_000,
            initial_step_length: 0.001,
            initial_step_at_rest: 0.001,
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("must be positive and finite, got {value}"),
        })
    }
}

impl IntegratorConfig {
    /// Check every parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("ode_tolerance", self.ode_tolerance)?;
        positive("spin_tolerance", self.spin_tolerance)?;
        positive("max_sample_distance", self.max_sample_distance)?;
        positive("reflect_tolerance", self.reflect_tolerance)?;
        positive("initial_step_length", self.initial_step_length)?;
        positive("initial_step_at_rest", self.initial_step_at_rest)?;
        if self.max_bisection_depth == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_bisection_depth",
                reason: "must be at least 1".into(),
            });
        }
        if self.spin_interpolation_intervals == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "spin_interpolation_intervals",
                reason: "must be at least 1".into(),
            });
        }
        if self.max_failed_attempts == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_failed_attempts",
                reason: "must be at least 1".into(),
            });
        }
        if self.max_spin_steps == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_spin_steps",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

// ── TrackingOptions ────────────────────────────────────────────────

/// A lab-time window `[start, end)` in which spin is fully integrated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpinWindow {
    /// Window start [s], inclusive.
    pub start: f64,
    /// Window end [s], exclusive.
    pub end: f64,
}

impl SpinWindow {
    /// Whether `t` lies inside the window.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }
}

/// Per-run switches controlling logging and spin tracking.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackingOptions {
    /// Write sampled trajectory points (`tracklog`).
    pub track_log: bool,
    /// Path length between track samples [m] (`trackloginterval`). Default: 1e-3.
    pub track_log_interval: f64,
    /// Write every boundary crossing (`hitlog`).
    pub hit_log: bool,
    /// Write snapshots at the times in `snapshots` (`snapshotlog`).
    pub snapshot_log: bool,
    /// Ascending lab times for snapshots [s] (`snapshots`).
    pub snapshots: Vec<f64>,
    /// Write spin samples during integrated sub-steps (`spinlog`).
    pub spin_log: bool,
    /// Lab time between spin samples [s] (`spinloginterval`). Default: 5e-7.
    pub spin_log_interval: f64,
    /// Allow stochastic polarisation draws (`flipspin`).
    pub flip_spin: bool,
    /// Include the motional electric field in the precession axis
    /// (`simulEFieldSpinInteg`).
    pub e_field_spin_precession: bool,
    /// Field magnitude above which spin collapses onto the field [T]
    /// (`BFmaxB`). Default: +∞.
    pub spin_b_max: f64,
    /// Windows in which spin is fully integrated (`BFtimes`).
    pub spin_windows: Vec<SpinWindow>,
}

impl Default for TrackingOptions {
    fn default() -> Self {
        Self {
            track_log: false,
            track_log_interval: 1e-3,
            hit_log: false,
            snapshot_log: false,
            snapshots: Vec::new(),
            spin_log: false,
            spin_log_interval: 5e-7,
            flip_spin: false,
            e_field_spin_precession: false,
            spin_b_max: f64::INFINITY,
            spin_windows: Vec::new(),
        }
    }
}

fn raw<'a>(options: &'a OptionMap, key: &str) -> Option<&'a str> {
    options
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_owned(),
        value: value.to_owned(),
        reason: reason.to_owned(),
    }
}

fn parse_bool(options: &OptionMap, key: &str, default: bool) -> Result<bool, ConfigError> {
    match raw(options, key) {
        None => Ok(default),
        Some("1") | Some("true") => Ok(true),
        Some("0") | Some("false") => Ok(false),
        Some(v) => Err(invalid(key, v, "expected 0, 1, true or false")),
    }
}

fn parse_number<T: FromStr>(options: &OptionMap, key: &str, default: T) -> Result<T, ConfigError> {
    match raw(options, key) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| invalid(key, v, "expected a number")),
    }
}

fn parse_list(options: &OptionMap, key: &str) -> Result<Vec<f64>, ConfigError> {
    match raw(options, key) {
        None => Ok(Vec::new()),
        Some(v) => v
            .split_whitespace()
            .map(|item| {
                item.parse::<f64>()
                    .map_err(|_| invalid(key, item, "expected a whitespace-separated number list"))
            })
            .collect(),
    }
}

impl TrackingOptions {
    /// Parse and validate options. Missing or blank keys take their
    /// defaults; unknown keys are ignored.
    pub fn from_options(options: &OptionMap) -> Result<Self, ConfigError> {
        let d = Self::default();
        let times = parse_list(options, "BFtimes")?;
        if times.len() % 2 != 0 {
            return Err(ConfigError::UnpairedTimes { count: times.len() });
        }
        let parsed = Self {
            track_log: parse_bool(options, "tracklog", d.track_log)?,
            track_log_interval: parse_number(options, "trackloginterval", d.track_log_interval)?,
            hit_log: parse_bool(options, "hitlog", d.hit_log)?,
            snapshot_log: parse_bool(options, "snapshotlog", d.snapshot_log)?,
            snapshots: parse_list(options, "snapshots")?,
            spin_log: parse_bool(options, "spinlog", d.spin_log)?,
            spin_log_interval: parse_number(options, "spinloginterval", d.spin_log_interval)?,
            flip_spin: parse_bool(options, "flipspin", d.flip_spin)?,
            e_field_spin_precession: parse_bool(
                options,
                "simulEFieldSpinInteg",
                d.e_field_spin_precession,
            )?,
            spin_b_max: parse_number(options, "BFmaxB", d.spin_b_max)?,
            spin_windows: times
                .chunks_exact(2)
                .map(|w| SpinWindow {
                    start: w[0],
                    end: w[1],
                })
                .collect(),
        };
        parsed.validate()?;
        Ok(parsed)
    }

    /// Check intervals are positive, snapshots ascend and windows are
    /// well-formed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("trackloginterval", self.track_log_interval),
            ("spinloginterval", self.spin_log_interval),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidInterval { key, value });
            }
        }
        if let Some(i) = self.snapshots.windows(2).position(|w| w[1] < w[0]) {
            return Err(ConfigError::UnsortedSnapshots { index: i + 1 });
        }
        if let Some(index) = self.spin_windows.iter().position(|w| w.end < w.start) {
            return Err(ConfigError::InvertedWindow { index });
        }
        if self.spin_b_max.is_nan() {
            return Err(invalid("BFmaxB", "NaN", "expected a number"));
        }
        Ok(())
    }

    /// Whether `t` lies inside any full-integration window.
    pub fn in_spin_window(&self, t: f64) -> bool {
        self.spin_windows.iter().any(|w| w.contains(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pairs: &[(&str, &str)]) -> OptionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_for_empty_map() {
        let opts = TrackingOptions::from_options(&OptionMap::new()).unwrap();
        assert_eq!(opts, TrackingOptions::default());
        assert_eq!(opts.track_log_interval, 1e-3);
        assert!(opts.spin_b_max.is_infinite());
    }

    #[test]
    fn parses_all_keys() {
        let opts = TrackingOptions::from_options(&options(&[
            ("tracklog", "1"),
            ("trackloginterval", "0.05"),
            ("hitlog", "true"),
            ("snapshotlog", "1"),
            ("snapshots", "1 2.5   10"),
            ("spinlog", "0"),
            ("spinloginterval", "1e-6"),
            ("flipspin", "1"),
            ("simulEFieldSpinInteg", "false"),
            ("BFmaxB", "0.1"),
            ("BFtimes", "0 10 20 30"),
            ("unrelated", "whatever"),
        ]))
        .unwrap();
        assert!(opts.track_log && opts.hit_log && opts.snapshot_log && opts.flip_spin);
        assert!(!opts.spin_log && !opts.e_field_spin_precession);
        assert_eq!(opts.track_log_interval, 0.05);
        assert_eq!(opts.snapshots, vec![1.0, 2.5, 10.0]);
        assert_eq!(opts.spin_b_max, 0.1);
        assert_eq!(opts.spin_windows.len(), 2);
        assert!(opts.in_spin_window(0.0));
        assert!(!opts.in_spin_window(10.0));
        assert!(opts.in_spin_window(25.0));
    }

    #[test]
    fn blank_value_means_default() {
        let opts = TrackingOptions::from_options(&options(&[("BFmaxB", "  ")])).unwrap();
        assert!(opts.spin_b_max.is_infinite());
    }

    #[test]
    fn odd_times_rejected() {
        match TrackingOptions::from_options(&options(&[("BFtimes", "0 1 2")])) {
            Err(ConfigError::UnpairedTimes { count: 3 }) => {}
            other => panic!("expected UnpairedTimes, got {other:?}"),
        }
    }

    #[test]
    fn descending_snapshots_rejected() {
        match TrackingOptions::from_options(&options(&[("snapshots", "1 3 2")])) {
            Err(ConfigError::UnsortedSnapshots { index: 2 }) => {}
            other => panic!("expected UnsortedSnapshots, got {other:?}"),
        }
    }

    #[test]
    fn non_positive_interval_rejected() {
        match TrackingOptions::from_options(&options(&[("trackloginterval", "0")])) {
            Err(ConfigError::InvalidInterval {
                key: "trackloginterval",
                ..
            }) => {}
            other => panic!("expected InvalidInterval, got {other:?}"),
        }
    }

    #[test]
    fn bad_bool_rejected() {
        match TrackingOptions::from_options(&options(&[("hitlog", "yes")])) {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "hitlog"),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn inverted_window_rejected() {
        match TrackingOptions::from_options(&options(&[("BFtimes", "5 1")])) {
            Err(ConfigError::InvertedWindow { index: 0 }) => {}
            other => panic!("expected InvertedWindow, got {other:?}"),
        }
    }

    #[test]
    fn integrator_defaults_validate() {
        assert!(IntegratorConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_tolerance_rejected() {
        let cfg = IntegratorConfig {
            ode_tolerance: 0.0,
            ..Default::default()
        };
        match cfg.validate() {
            Err(ConfigError::InvalidParameter {
                name: "ode_tolerance",
                ..
            }) => {}
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn zero_bisection_depth_rejected() {
        let cfg = IntegratorConfig {
            max_bisection_depth: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
