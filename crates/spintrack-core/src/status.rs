//! Terminal stop codes for a particle trajectory.

use std::fmt;

/// Why a particle's trajectory ended.
///
/// Mutually exclusive and write-once: the first status set on a
/// particle is final. The numeric [`code`](StopStatus::code) is the
/// value written to output records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StopStatus {
    /// Lab time or trajectory length budget exhausted without decay.
    NotFinished,
    /// The particle left the simulation bounding volume.
    HitBoundaries,
    /// The ODE solver failed numerically.
    OdeError,
    /// Proper time reached the particle's lifetime.
    Decayed,
    /// The geometry collaborator failed while searching for crossings.
    GeometryQueryError,
    /// Inconsistent solid bookkeeping: a solid entered while already
    /// occupied, left while not occupied, or crossed tangentially.
    GeometryError,
    /// Absorbed inside a material (decided by the per-step hook).
    AbsorbedInMaterial,
    /// Absorbed on a surface (decided by the per-hit hook).
    AbsorbedOnSurface,
}

impl StopStatus {
    /// Numeric stop code as written to output records.
    pub fn code(self) -> i32 {
        match self {
            Self::NotFinished => -1,
            Self::HitBoundaries => -2,
            Self::OdeError => -3,
            Self::Decayed => -4,
            Self::GeometryQueryError => -6,
            Self::GeometryError => -7,
            Self::AbsorbedInMaterial => 1,
            Self::AbsorbedOnSurface => 2,
        }
    }

    /// Whether the particle was absorbed by a material.
    pub fn is_absorbed(self) -> bool {
        matches!(self, Self::AbsorbedInMaterial | Self::AbsorbedOnSurface)
    }

    /// Whether the trajectory ended because of a failure rather than physics.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::OdeError | Self::GeometryQueryError | Self::GeometryError
        )
    }
}

impl fmt::Display for StopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFinished => "not finished",
            Self::HitBoundaries => "hit outer boundaries",
            Self::OdeError => "ODE integration error",
            Self::Decayed => "decayed",
            Self::GeometryQueryError => "geometry query error",
            Self::GeometryError => "geometry consistency error",
            Self::AbsorbedInMaterial => "absorbed in material",
            Self::AbsorbedOnSurface => "absorbed on surface",
        };
        f.write_str(s)
    }
}
