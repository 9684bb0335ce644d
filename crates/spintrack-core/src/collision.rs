//! Surface crossings reported by the geometry.

use std::cmp::Ordering;

use crate::id::SolidId;
use crate::vec3::Vec3;

/// How a segment crosses a solid's surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Crossing {
    /// The segment enters the solid.
    Entering,
    /// The segment leaves the solid.
    Leaving,
    /// The segment runs parallel to the surface.
    Tangential,
}

/// One crossing of a solid's surface by a straight sub-segment.
///
/// Produced by [`Geometry::collisions`](crate::Geometry::collisions) and
/// consumed immediately by the collision resolver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collision {
    /// Fractional position of the crossing along the segment, in `[0, 1]`.
    pub s: f64,
    /// Projection of the whole segment onto the outward surface normal.
    /// Negative when entering, positive when leaving, zero when tangential.
    pub distnormal: f64,
    /// The solid whose surface is crossed.
    pub solid: SolidId,
    /// Outward unit normal of the surface at the crossing.
    pub normal: Vec3,
    /// Whether the solid is physically ignored at the crossing time.
    pub ignored: bool,
}

impl Collision {
    /// Classify the crossing by the sign of `distnormal`.
    pub fn crossing(&self) -> Crossing {
        if self.distnormal < 0.0 {
            Crossing::Entering
        } else if self.distnormal > 0.0 {
            Crossing::Leaving
        } else {
            Crossing::Tangential
        }
    }

    /// Distance of the crossing from the segment start, normal to the surface.
    pub fn distance_from_start(&self) -> f64 {
        (self.s * self.distnormal).abs()
    }

    /// Distance of the crossing from the segment end, normal to the surface.
    pub fn distance_from_end(&self) -> f64 {
        ((1.0 - self.s) * self.distnormal).abs()
    }
}

/// Sort crossings by their position along the segment, earliest first.
pub fn sort_by_position(collisions: &mut [Collision]) {
    collisions.sort_by(|a, b| a.s.partial_cmp(&b.s).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coll(s: f64, distnormal: f64) -> Collision {
        Collision {
            s,
            distnormal,
            solid: SolidId(1),
            normal: [0.0, 0.0, 1.0],
            ignored: false,
        }
    }

    #[test]
    fn crossing_sign_convention() {
        assert_eq!(coll(0.5, -1.0).crossing(), Crossing::Entering);
        assert_eq!(coll(0.5, 1.0).crossing(), Crossing::Leaving);
        assert_eq!(coll(0.5, 0.0).crossing(), Crossing::Tangential);
    }

    #[test]
    fn distances_scale_with_fraction() {
        let c = coll(0.25, -2.0);
        assert_eq!(c.distance_from_start(), 0.5);
        assert_eq!(c.distance_from_end(), 1.5);
    }

    #[test]
    fn sort_puts_earliest_first() {
        let mut v = vec![coll(0.7, 1.0), coll(0.1, -1.0), coll(0.4, 1.0)];
        sort_by_position(&mut v);
        let s: Vec<f64> = v.iter().map(|c| c.s).collect();
        assert_eq!(s, vec![0.1, 0.4, 0.7]);
    }
}
