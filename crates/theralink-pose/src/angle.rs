//! Joint angle calculation
//!
//! The angle at a joint is measured between the two limb segments meeting at
//! the vertex landmark, e.g. hip→knee and knee→ankle for the knee.

use crate::LandmarkPoint;

/// Unsigned planar angle at `vertex` between the rays towards `a` and `c`, in degrees
///
/// Computed as the difference of the two rays' polar angles, folded into
/// [0, 180]. Coincident points are not guarded: they yield 0° or 180°
/// depending on the direction atan2 picks for a zero vector.
pub fn joint_angle(a: LandmarkPoint, vertex: LandmarkPoint, c: LandmarkPoint) -> f32 {
    let radians = (c.y - vertex.y).atan2(c.x - vertex.x) - (a.y - vertex.y).atan2(a.x - vertex.x);
    let angle = radians.to_degrees().abs();

    // f32 rounding near a full turn can land a hair outside the range
    if angle > 180.0 {
        (360.0 - angle).max(0.0)
    } else {
        angle
    }
}

/// Three landmarks defining one joint angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointTriple {
    pub proximal: LandmarkPoint,
    pub vertex: LandmarkPoint,
    pub distal: LandmarkPoint,
}

impl JointTriple {
    pub fn new(proximal: LandmarkPoint, vertex: LandmarkPoint, distal: LandmarkPoint) -> Self {
        Self {
            proximal,
            vertex,
            distal,
        }
    }

    pub fn angle(&self) -> f32 {
        joint_angle(self.proximal, self.vertex, self.distal)
    }
}
