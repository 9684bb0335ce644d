//! Record types, one per output stream.
//!
//! Every record renders as a single space-separated line whose columns
//! match its stream's [`Record::HEADER`].

use std::io::{self, Write};

use spintrack_core::{JobNumber, ParticleNumber, SolidId, StopStatus, Vec3};

/// A record that can be rendered as one line of a text stream.
pub trait Record {
    /// Column names, space separated, without trailing newline.
    const HEADER: &'static str;

    /// Write the record's columns followed by a newline.
    fn write_line<W: Write>(&self, w: &mut W) -> io::Result<()>;
}

fn write_vec<W: Write>(w: &mut W, v: &Vec3) -> io::Result<()> {
    write!(w, "{} {} {}", v[0], v[1], v[2])
}

// ── StatusRecord ───────────────────────────────────────────────────

/// Full description of a particle at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct EndpointRecord {
    /// Lab time [s].
    pub t: f64,
    /// Position [m].
    pub position: Vec3,
    /// Velocity [m/s].
    pub velocity: Vec3,
    /// Polarisation marker from the state vector.
    pub polarisation: f64,
    /// Total energy [eV].
    pub total_energy: f64,
    /// Kinetic energy [eV].
    pub kinetic_energy: f64,
    /// Magnetic field magnitude [T].
    pub field: f64,
    /// Electric potential [V].
    pub potential: f64,
    /// Occupied solid.
    pub solid: SolidId,
}

impl EndpointRecord {
    fn write_columns<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(w, "{} ", self.t)?;
        write_vec(w, &self.position)?;
        write!(w, " ")?;
        write_vec(w, &self.velocity)?;
        write!(
            w,
            " {} {} {} {} {} {}",
            self.polarisation,
            self.total_energy,
            self.kinetic_energy,
            self.field,
            self.potential,
            self.solid
        )
    }
}

/// End-of-run (or snapshot) summary of one particle.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusRecord {
    /// Job identifier.
    pub job: JobNumber,
    /// Particle identifier.
    pub particle: ParticleNumber,
    /// State at creation.
    pub start: EndpointRecord,
    /// State at the end (or snapshot) point.
    pub end: EndpointRecord,
    /// Terminal status, or `None` while the particle is still running
    /// (snapshots). Written as stop code 0 when unset.
    pub status: Option<StopStatus>,
    /// Number of polarisation sign changes at spin collapse.
    pub spin_flips: u64,
    /// Accumulated probability that at least one spin flip occurred.
    pub flip_probability: f64,
    /// Number of material boundaries crossed.
    pub hits: u64,
    /// Number of accepted integrator steps.
    pub steps: u64,
    /// Path length travelled [m].
    pub path_length: f64,
    /// Maximum total energy observed [eV].
    pub h_max: f64,
    /// Spin projection onto the field at the end point.
    pub bloch_polarisation: f64,
    /// Time-averaged precession frequency [rad/s].
    pub larmor_mean: f64,
    /// Standard deviation of the precession frequency [rad/s].
    pub larmor_spread: f64,
}

impl Record for StatusRecord {
    const HEADER: &'static str = "jobnumber particle \
        tstart xstart ystart zstart vxstart vystart vzstart polstart \
        Hstart Estart Bstart Ustart solidstart \
        tend xend yend zend vxend vyend vzend polend \
        Hend Eend Bend Uend solidend \
        stopID Nspinflip spinflipprob Nhit Nstep trajlength Hmax blochPolar wL delwL";

    fn write_line<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(w, "{} {} ", self.job, self.particle)?;
        self.start.write_columns(w)?;
        write!(w, " ")?;
        self.end.write_columns(w)?;
        writeln!(
            w,
            " {} {} {} {} {} {} {} {} {} {}",
            self.status.map_or(0, StopStatus::code),
            self.spin_flips,
            self.flip_probability,
            self.hits,
            self.steps,
            self.path_length,
            self.h_max,
            self.bloch_polarisation,
            self.larmor_mean,
            self.larmor_spread
        )
    }
}

// ── TrackRecord ────────────────────────────────────────────────────

/// One sampled trajectory point with the local fields.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackRecord {
    /// Job identifier.
    pub job: JobNumber,
    /// Particle identifier.
    pub particle: ParticleNumber,
    /// Polarisation marker.
    pub polarisation: f64,
    /// Lab time [s].
    pub t: f64,
    /// Position [m].
    pub position: Vec3,
    /// Velocity [m/s].
    pub velocity: Vec3,
    /// Total energy [eV].
    pub total_energy: f64,
    /// Kinetic energy [eV].
    pub kinetic_energy: f64,
    /// Magnetic field table: rows `Bx, By, Bz, |B|`, each followed by
    /// its three spatial derivatives.
    pub b: [[f64; 4]; 4],
    /// Electric field [V/m].
    pub e: Vec3,
    /// Electric potential [V].
    pub potential: f64,
}

impl Record for TrackRecord {
    const HEADER: &'static str = "jobnumber particle polarisation \
        t x y z vx vy vz H E \
        Bx dBxdx dBxdy dBxdz By dBydx dBydy dBydz \
        Bz dBzdx dBzdy dBzdz Babs dBdx dBdy dBdz Ex Ey Ez V";

    fn write_line<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(w, "{} {} {} {} ", self.job, self.particle, self.polarisation, self.t)?;
        write_vec(w, &self.position)?;
        write!(w, " ")?;
        write_vec(w, &self.velocity)?;
        write!(w, " {} {}", self.total_energy, self.kinetic_energy)?;
        for row in &self.b {
            for v in row {
                write!(w, " {v}")?;
            }
        }
        write!(w, " ")?;
        write_vec(w, &self.e)?;
        writeln!(w, " {}", self.potential)
    }
}

// ── HitRecord ──────────────────────────────────────────────────────

/// A traversed material boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct HitRecord {
    /// Job identifier.
    pub job: JobNumber,
    /// Particle identifier.
    pub particle: ParticleNumber,
    /// Lab time of the hit [s].
    pub t: f64,
    /// Position of the hit [m].
    pub position: Vec3,
    /// Velocity before the hit [m/s].
    pub velocity_before: Vec3,
    /// Polarisation before the hit.
    pub polarisation_before: f64,
    /// Velocity after the hit [m/s].
    pub velocity_after: Vec3,
    /// Polarisation after the hit.
    pub polarisation_after: f64,
    /// Surface normal.
    pub normal: Vec3,
    /// Solid being left.
    pub leaving: SolidId,
    /// Solid being entered.
    pub entering: SolidId,
}

impl Record for HitRecord {
    const HEADER: &'static str = "jobnumber particle \
        t x y z v1x v1y v1z pol1 v2x v2y v2z pol2 nx ny nz solid1 solid2";

    fn write_line<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(w, "{} {} {} ", self.job, self.particle, self.t)?;
        write_vec(w, &self.position)?;
        write!(w, " ")?;
        write_vec(w, &self.velocity_before)?;
        write!(w, " {} ", self.polarisation_before)?;
        write_vec(w, &self.velocity_after)?;
        write!(w, " {} ", self.polarisation_after)?;
        write_vec(w, &self.normal)?;
        writeln!(w, " {} {}", self.leaving, self.entering)
    }
}

// ── SpinRecord ─────────────────────────────────────────────────────

/// One sample of an integrated spin sub-step.
#[derive(Clone, Debug, PartialEq)]
pub struct SpinRecord {
    /// Job identifier.
    pub job: JobNumber,
    /// Particle identifier.
    pub particle: ParticleNumber,
    /// Lab time [s].
    pub t: f64,
    /// Spin vector.
    pub spin: Vec3,
    /// Precession axis [rad/s].
    pub omega: Vec3,
    /// Magnetic field [T].
    pub b: Vec3,
}

impl Record for SpinRecord {
    const HEADER: &'static str = "jobnumber particle t Sx Sy Sz Wx Wy Wz Bx By Bz";

    fn write_line<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(w, "{} {} {} ", self.job, self.particle, self.t)?;
        write_vec(w, &self.spin)?;
        write!(w, " ")?;
        write_vec(w, &self.omega)?;
        write!(w, " ")?;
        write_vec(w, &self.b)?;
        writeln!(w)
    }
}
