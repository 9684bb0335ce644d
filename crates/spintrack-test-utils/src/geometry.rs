//! Slab geometry with analytic plane crossings.

use spintrack_core::collision::sort_by_position;
use spintrack_core::{
    Collision, Geometry, GeometryError, Solid, SolidEntry, SolidId, SolidSet, Vec3,
};

/// One solid filling `lo < p[axis] < hi`, unbounded along the other axes.
#[derive(Clone, Debug)]
struct Slab {
    solid: Solid,
    axis: usize,
    lo: f64,
    hi: f64,
    ignored: bool,
    hidden: bool,
    everywhere: bool,
    grazing: bool,
}

impl Slab {
    fn contains(&self, p: &Vec3) -> bool {
        self.lo < p[self.axis] && p[self.axis] < self.hi
    }

    fn unit(&self, sign: f64) -> Vec3 {
        let mut n = [0.0; 3];
        n[self.axis] = sign;
        n
    }

    /// Crossings of the plane at `plane` by the straight segment.
    fn crossing(&self, plane: f64, c1: f64, c2: f64, entering: bool) -> Collision {
        let outward = if plane == self.lo { -1.0 } else { 1.0 };
        let span = if self.grazing { 0.0 } else { (c2 - c1).abs() };
        Collision {
            s: (plane - c1) / (c2 - c1),
            distnormal: if entering { -span } else { span },
            solid: self.solid.id,
            normal: self.unit(outward),
            ignored: self.ignored,
        }
    }
}

/// Axis-aligned slabs inside a world box.
///
/// The default solid (id 0, priority 0) fills everything else. A
/// position exactly on a slab face counts as outside the slab, so a
/// crossing that lands on the shared end of two segments is reported by
/// exactly one of them.
#[derive(Clone, Debug)]
pub struct SlabGeometry {
    world_min: Vec3,
    world_max: Vec3,
    default: Solid,
    slabs: Vec<Slab>,
    failing: bool,
}

impl SlabGeometry {
    pub fn new(world_min: Vec3, world_max: Vec3) -> Self {
        Self {
            world_min,
            world_max,
            default: Solid::new(SolidId(0), "vacuum", 0),
            slabs: Vec::new(),
            failing: false,
        }
    }

    /// A world box of half-width `half` around the origin.
    pub fn cube(half: f64) -> Self {
        Self::new([-half; 3], [half; 3])
    }

    pub fn with_slab(
        mut self,
        id: u32,
        name: &str,
        priority: u32,
        axis: usize,
        lo: f64,
        hi: f64,
    ) -> Self {
        self.slabs.push(Slab {
            solid: Solid::new(SolidId(id), name, priority),
            axis,
            lo,
            hi,
            ignored: false,
            hidden: false,
            everywhere: false,
            grazing: false,
        });
        self
    }

    /// Mark the most recently added slab as physically ignored.
    pub fn ignored(mut self) -> Self {
        if let Some(s) = self.slabs.last_mut() {
            s.ignored = true;
        }
        self
    }

    /// Leave the most recently added slab out of [`Geometry::solids_at`],
    /// so a particle starting inside it has inconsistent bookkeeping.
    pub fn hidden_from_lookup(mut self) -> Self {
        if let Some(s) = self.slabs.last_mut() {
            s.hidden = true;
        }
        self
    }

    /// Report the most recently added slab from [`Geometry::solids_at`]
    /// at every position, so a particle already counts as inside it.
    pub fn reported_everywhere(mut self) -> Self {
        if let Some(s) = self.slabs.last_mut() {
            s.everywhere = true;
        }
        self
    }

    /// Report crossings of the most recently added slab with zero normal
    /// distance, as if the segment only touched its faces.
    pub fn grazing(mut self) -> Self {
        if let Some(s) = self.slabs.last_mut() {
            s.grazing = true;
        }
        self
    }

    /// Make every crossing query fail.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    fn inside_world(&self, p: &Vec3) -> bool {
        (0..3).all(|i| self.world_min[i] <= p[i] && p[i] <= self.world_max[i])
    }
}

impl Geometry for SlabGeometry {
    fn check_segment(&self, p1: &Vec3, p2: &Vec3) -> bool {
        self.inside_world(p1) && self.inside_world(p2)
    }

    fn collisions(
        &self,
        _t1: f64,
        p1: &Vec3,
        _t2: f64,
        p2: &Vec3,
    ) -> Result<Vec<Collision>, GeometryError> {
        if self.failing {
            return Err(GeometryError::QueryFailed {
                reason: "scripted failure".to_owned(),
            });
        }
        let mut out = Vec::new();
        for slab in &self.slabs {
            let (c1, c2) = (p1[slab.axis], p2[slab.axis]);
            match (slab.contains(p1), slab.contains(p2)) {
                (false, true) => {
                    let plane = if c1 <= slab.lo { slab.lo } else { slab.hi };
                    out.push(slab.crossing(plane, c1, c2, true));
                }
                (true, false) => {
                    let plane = if c2 <= slab.lo { slab.lo } else { slab.hi };
                    out.push(slab.crossing(plane, c1, c2, false));
                }
                (false, false) => {
                    let (near, far) = if c1 <= slab.lo && c2 >= slab.hi {
                        (slab.lo, slab.hi)
                    } else if c1 >= slab.hi && c2 <= slab.lo {
                        (slab.hi, slab.lo)
                    } else {
                        continue;
                    };
                    out.push(slab.crossing(near, c1, c2, true));
                    out.push(slab.crossing(far, c1, c2, false));
                }
                (true, true) => {}
            }
        }
        sort_by_position(&mut out);
        Ok(out)
    }

    fn solids_at(&self, _t: f64, position: &Vec3) -> SolidSet {
        let mut set: SolidSet = self
            .slabs
            .iter()
            .filter(|s| !s.hidden && (s.everywhere || s.contains(position)))
            .map(|s| SolidEntry {
                id: s.solid.id,
                priority: s.solid.priority,
                ignored: s.ignored,
            })
            .collect();
        set.insert(SolidEntry {
            id: self.default.id,
            priority: self.default.priority,
            ignored: false,
        });
        set
    }

    fn solid(&self, id: SolidId) -> Option<&Solid> {
        if id == self.default.id {
            return Some(&self.default);
        }
        self.slabs.iter().map(|s| &s.solid).find(|s| s.id == id)
    }

    fn default_solid(&self) -> &Solid {
        &self.default
    }
}
