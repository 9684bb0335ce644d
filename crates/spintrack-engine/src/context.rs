//! Read-only environment shared by every particle of a run.

use spintrack_core::{FieldSource, Geometry, JobNumber, PhysicalConstants, Solid, SolidId};

use crate::config::{ConfigError, IntegratorConfig};

/// Geometry, fields, constants and integrator settings.
///
/// Everything here is read-only during tracking, so one context can be
/// shared by all worker threads.
#[derive(Clone)]
pub struct TrackingContext<'a> {
    /// Solids and surface crossings.
    pub geometry: &'a dyn Geometry,
    /// Electromagnetic fields; `None` for a field-free run.
    pub field: Option<&'a dyn FieldSource>,
    /// Physical constants.
    pub constants: PhysicalConstants,
    /// Integrator constants.
    pub config: IntegratorConfig,
    /// Job number used to tag records.
    pub job: JobNumber,
}

impl<'a> TrackingContext<'a> {
    /// A field-free context with default constants.
    pub fn new(geometry: &'a dyn Geometry) -> Self {
        Self {
            geometry,
            field: None,
            constants: PhysicalConstants::default(),
            config: IntegratorConfig::default(),
            job: JobNumber::default(),
        }
    }

    /// Attach a field source.
    pub fn with_field(mut self, field: &'a dyn FieldSource) -> Self {
        self.field = Some(field);
        self
    }

    /// Replace the physical constants.
    pub fn with_constants(mut self, constants: PhysicalConstants) -> Self {
        self.constants = constants;
        self
    }

    /// Replace the integrator constants.
    pub fn with_config(mut self, config: IntegratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the job number.
    pub fn with_job(mut self, job: JobNumber) -> Self {
        self.job = job;
        self
    }

    /// Validate the integrator constants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()
    }

    /// Look up a solid, falling back to the default solid for unknown ids.
    pub fn solid(&self, id: SolidId) -> &'a Solid {
        self.geometry
            .solid(id)
            .unwrap_or_else(|| self.geometry.default_solid())
    }
}
