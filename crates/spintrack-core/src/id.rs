//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a solid within a geometry.
///
/// `SolidId(n)` is the n-th solid registered with the geometry. It is a
/// stable identity only; the ordering used to decide which of several
/// overlapping solids is current is the solid's separate `priority`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SolidId(pub u32);

impl fmt::Display for SolidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SolidId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Sequential number of a particle within one job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleNumber(pub u64);

impl fmt::Display for ParticleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ParticleNumber {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Job number of a simulation run, used to tag output records and
/// file names when many runs execute in parallel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobNumber(pub u64);

impl fmt::Display for JobNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobNumber {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
