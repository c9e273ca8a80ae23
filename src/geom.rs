// Copyright 2017 Matthew Plant. This file is part of DGF.
//
// DGF is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// DGF is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with DGF. If not, see <http://www.gnu.org/licenses/>.

use cgmath::{InnerSpace, Point3, Quaternion, Rotation, Vector3, Zero};
use serde::{Deserialize, Serialize};

/// Maximum tolerence for error, i.e. what we consider the floating point
/// epsilon.
pub const COLLISION_EPSILON: f64 = 1.0e-12;

/// A set of tolerances used when building contact geometry.
pub trait GeomParams {
    /// Centre distance below which two spheres are treated as concentric.
    const MIN_DISTANCE: f64;
}

/// The suggested set of tolerances.
pub struct DefaultGeomParams {}

impl GeomParams for DefaultGeomParams {
    const MIN_DISTANCE: f64 = COLLISION_EPSILON;
}

/// Axis Aligned Bounding Boxes are closed boxes aligned to the axes of the
/// coordinate system. AABBs are described by a point and three half widths.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AABB {
    pub c: Point3<f64>,
    pub r: Vector3<f64>,
}

/// The geometric state of a contact between two spheres.
///
/// The contact node sits at the middle of the overlap. Its orientation maps
/// global vectors into the contact frame, whose x axis is the normal.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactGeom {
    pub pos: Point3<f64>,
    pub ori: Quaternion<f64>,
    /// Unit normal pointing from the first particle to the second.
    pub normal: Vector3<f64>,
    /// Overlap depth. Negative when the spheres have separated but the
    /// contact is still alive.
    pub penetration: f64,
    /// Distance from the first centre to the contact point.
    pub radius1: f64,
    /// Distance from the second centre to the contact point.
    pub radius2: f64,
}

impl ContactGeom {
    /// Computes the geometry of two spheres. `c2` must already be the image of
    /// the second centre that is nearest the first.
    pub fn sphere_sphere<P: GeomParams>(
        c1: Point3<f64>,
        r1: f64,
        c2: Point3<f64>,
        r2: f64
    ) -> Self {
        let d = c2 - c1;
        let dist = d.magnitude();
        let normal = if dist > P::MIN_DISTANCE {
            d / dist
        } else {
            Vector3::unit_x()
        };
        let penetration = r1 + r2 - dist;
        let radius1 = r1 - 0.5 * penetration;
        let radius2 = r2 - 0.5 * penetration;
        ContactGeom {
            pos: c1 + normal * radius1,
            ori: contact_frame(normal),
            normal,
            penetration,
            radius1,
            radius2,
        }
    }

    /// Express a global vector in the contact frame.
    #[inline(always)]
    pub fn to_local(&self, v: Vector3<f64>) -> Vector3<f64> {
        self.ori.rotate_vector(v)
    }

    /// Express a contact frame vector globally.
    #[inline(always)]
    pub fn to_global(&self, v: Vector3<f64>) -> Vector3<f64> {
        if v.is_zero() {
            v
        } else {
            self.ori.conjugate().rotate_vector(v)
        }
    }
}

/// Orientation of a contact frame whose x axis is the normal n.
pub fn contact_frame(n: Vector3<f64>) -> Quaternion<f64> {
    Quaternion::from_arc(n, Vector3::unit_x(), None)
}

#[cfg(test)]
mod tests {
    mod geom {
        use cgmath::{InnerSpace, Point3, Vector3};

        use crate::geom::*;

        fn approx(a: Vector3<f64>, b: Vector3<f64>) -> bool {
            (a - b).magnitude() < 1.0e-9
        }

        #[test]
        fn test_sphere_sphere_overlap() {
            let g = ContactGeom::sphere_sphere::<DefaultGeomParams>(
                Point3::new(0.0, 0.0, 0.0), 1.0,
                Point3::new(1.9, 0.0, 0.0), 1.0,
            );
            assert!((g.penetration - 0.1).abs() < 1.0e-12);
            assert_eq!(g.normal, Vector3::new(1.0, 0.0, 0.0));
            assert!((g.pos.x - 0.95).abs() < 1.0e-12);
            assert!((g.radius1 - 0.95).abs() < 1.0e-12);
            assert!((g.radius2 - 0.95).abs() < 1.0e-12);
        }

        #[test]
        fn test_separated_penetration_is_negative() {
            let g = ContactGeom::sphere_sphere::<DefaultGeomParams>(
                Point3::new(0.0, 0.0, 0.0), 1.0,
                Point3::new(0.0, 3.0, 0.0), 1.5,
            );
            assert!((g.penetration + 0.5).abs() < 1.0e-12);
            assert!(approx(g.normal, Vector3::new(0.0, 1.0, 0.0)));
        }

        #[test]
        fn test_concentric_fallback() {
            let g = ContactGeom::sphere_sphere::<DefaultGeomParams>(
                Point3::new(1.0, 1.0, 1.0), 1.0,
                Point3::new(1.0, 1.0, 1.0), 1.0,
            );
            assert_eq!(g.normal, Vector3::unit_x());
            assert_eq!(g.penetration, 2.0);
        }

        #[test]
        fn test_frame_round_trip() {
            for n in &[
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(-1.0, 0.0, 0.0),
                Vector3::new(0.0, 0.0, 1.0),
                Vector3::new(1.0, 2.0, -3.0).normalize(),
            ] {
                let g = ContactGeom::sphere_sphere::<DefaultGeomParams>(
                    Point3::new(0.0, 0.0, 0.0), 1.0,
                    Point3::new(0.0, 0.0, 0.0) + *n * 1.5, 1.0,
                );
                assert!(approx(g.to_local(g.normal), Vector3::unit_x()));
                assert!(approx(g.to_global(Vector3::unit_x()), g.normal));
                let v = Vector3::new(0.3, -0.2, 0.7);
                assert!(approx(g.to_global(g.to_local(v)), v));
            }
        }
    }
}
