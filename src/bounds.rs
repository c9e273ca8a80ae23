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

use std::ops::Add;

use cgmath::{EuclideanSpace, Point3, Vector3};
use tracing::warn;

use crate::cell::PeriodicCell;
use crate::error::DemError;
use crate::field::Field;
use crate::geom::AABB;
use crate::particle::Sphere;

/// A shape that can estimate an axis aligned bound of itself.
///
/// In a periodic scene the bound is given in canonical (unsheared)
/// coordinates, since that is where overlap tests between bounds happen.
pub trait BoundEstimator {
    /// `enlarge` scales the bound when positive and is ignored otherwise.
    fn bound(&self, field: &Field, enlarge: f64, cell: Option<&PeriodicCell>) -> Result<AABB, DemError>;
}

impl BoundEstimator for Sphere {
    fn bound(&self, field: &Field, enlarge: f64, cell: Option<&PeriodicCell>) -> Result<AABB, DemError> {
        let node = field.node(self.node).ok_or(DemError::UnknownNode { node: self.node })?;
        Ok(sphere_aabb(node.pos, self.radius, enlarge, cell))
    }
}

/// Bounds a sphere of radius r centred at pos.
///
/// In a sheared cell the box is placed at the canonical image of pos, and
/// the shear of each face widens the two axes spanning it by half the excess
/// of `1/cos` over one.
pub fn sphere_aabb(pos: Point3<f64>, r: f64, enlarge: f64, cell: Option<&PeriodicCell>) -> AABB {
    let scale = if enlarge > 0.0 { enlarge } else { 1.0 };
    let mut half = Vector3::new(1.0, 1.0, 1.0) * (scale * r);
    let cell = match cell {
        Some(cell) => cell,
        None => return AABB { c: pos, r: half },
    };
    if cell.has_shear() {
        let ref_half = half;
        let cos = cell.cosines();
        for i in 0..3 {
            let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
            half[i1] += 0.5 * ref_half[i1] * (1.0 / cos[i] - 1.0);
            half[i2] += 0.5 * ref_half[i2] * (1.0 / cos[i] - 1.0);
        }
    }
    AABB {
        c: cell.unshear_point(pos),
        r: half,
    }
}

impl AABB {
    /// Build a box from two corners. Corners given in the wrong order are
    /// swapped per axis.
    pub fn from_corners(min: Point3<f64>, max: Point3<f64>) -> AABB {
        let mut lower = min;
        let mut upper = max;
        for i in 0..3 {
            if lower[i] > upper[i] {
                warn!(axis = i, min = lower[i], max = upper[i], "inverted bound corners, swapping");
                let t = lower[i];
                lower[i] = upper[i];
                upper[i] = t;
            }
        }
        AABB {
            c: Point3::from_vec((lower.to_vec() + upper.to_vec()) / 2.0),
            r: (upper - lower) / 2.0,
        }
    }

    pub fn min(&self) -> Point3<f64> {
        self.c - self.r
    }

    pub fn max(&self) -> Point3<f64> {
        self.c + self.r
    }

    /// The smallest AABB enclosing both arguments.
    pub fn combine(a: &AABB, b: &AABB) -> AABB {
        let (a_min, a_max, b_min, b_max) = (a.min(), a.max(), b.min(), b.max());
        AABB::from_corners(
            Point3::new(a_min.x.min(b_min.x), a_min.y.min(b_min.y), a_min.z.min(b_min.z)),
            Point3::new(a_max.x.max(b_max.x), a_max.y.max(b_max.y), a_max.z.max(b_max.z)),
        )
    }

    /// Closed boxes overlap when they touch.
    pub fn overlaps(&self, other: &AABB) -> bool {
        (self.c.x - other.c.x).abs() <= self.r.x + other.r.x
            && (self.c.y - other.c.y).abs() <= self.r.y + other.r.y
            && (self.c.z - other.c.z).abs() <= self.r.z + other.r.z
    }
}

impl Add<Vector3<f64>> for AABB {
    type Output = Self;

    /// Displace AABB
    fn add(self, v: Vector3<f64>) -> AABB {
        AABB{ c: self.c + v, ..self }
    }
}


#[cfg(test)]
mod tests {
    mod bounds {
        use cgmath::{Matrix3, Point3, Vector3};

        use crate::bounds::*;
        use crate::cell::PeriodicCell;
        use crate::field::{Field, FieldCaps};
        use crate::geom::AABB;
        use crate::node::Node;
        use crate::particle::Sphere;

        fn close(a: f64, b: f64) -> bool {
            (a - b).abs() < 1.0e-12
        }

        fn sheared_all_faces() -> PeriodicCell {
            PeriodicCell::new(Matrix3::from_cols(
                Vector3::new(10.0, 1.0, 2.0),
                Vector3::new(2.0, 10.0, 1.0),
                Vector3::new(1.0, 2.0, 10.0),
            )).unwrap()
        }

        #[test]
        fn test_aabb() {
            let bound1 = AABB {
                c: Point3::new(0.0, 0.0, 0.0),
                r: Vector3::new(1.0, 1.0, 1.0),
            };
            let bound2 = bound1 + Vector3::new(0.0, 2.0, 0.0);
            let bound3 = bound1 + Vector3::new(0.0, 3.0, 0.0);
            let combined = AABB::combine(&bound1, &bound2);
            assert!(bound1.overlaps(&bound2));
            assert!(!bound1.overlaps(&bound3));
            assert_eq!(combined.min(), Point3::new(-1.0, -1.0, -1.0));
            assert_eq!(combined.max(), Point3::new(1.0, 3.0, 1.0));
        }

        #[test]
        fn test_inverted_corners_are_swapped() {
            let b = AABB::from_corners(Point3::new(1.0, -1.0, 5.0), Point3::new(-1.0, 1.0, 3.0));
            assert_eq!(b.min(), Point3::new(-1.0, -1.0, 3.0));
            assert_eq!(b.max(), Point3::new(1.0, 1.0, 5.0));
        }

        #[test]
        fn test_sphere_without_cell() {
            let pos = Point3::new(1.0, 2.0, 3.0);
            for &(r, enlarge) in &[(1.0, 1.0), (0.5, 1.5), (2.0, 1.1)] {
                let b = sphere_aabb(pos, r, enlarge, None);
                let extent = b.max() - b.min();
                for i in 0..3 {
                    assert!(close(extent[i], 2.0 * r * enlarge));
                }
                assert_eq!(b.c, pos);
            }
            // Non-positive enlargement is disabled.
            let b = sphere_aabb(pos, 0.5, -1.0, None);
            assert_eq!(b.r, Vector3::new(0.5, 0.5, 0.5));
            let b = sphere_aabb(pos, 0.5, 0.0, None);
            assert_eq!(b.r, Vector3::new(0.5, 0.5, 0.5));
        }

        #[test]
        fn test_sphere_in_aligned_cell() {
            let cell = PeriodicCell::aligned(Vector3::new(10.0, 10.0, 10.0)).unwrap();
            let pos = Point3::new(1.0, 2.0, 3.0);
            let b = sphere_aabb(pos, 1.0, -1.0, Some(&cell));
            assert_eq!(b.c, pos);
            assert_eq!(b.r, Vector3::new(1.0, 1.0, 1.0));
        }

        #[test]
        fn test_shear_inflates() {
            let cell = sheared_all_faces();
            let cos = cell.cosines();
            for i in 0..3 {
                assert!(cos[i] < 1.0);
            }
            let pos = Point3::new(4.0, 5.0, 6.0);
            let plain = sphere_aabb(pos, 1.0, -1.0, None);
            let sheared = sphere_aabb(pos, 1.0, -1.0, Some(&cell));
            for i in 0..3 {
                assert!(sheared.r[i] > plain.r[i]);
                let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
                let expected = 1.0 + 0.5 * (1.0 / cos[i1] - 1.0) + 0.5 * (1.0 / cos[i2] - 1.0);
                assert!(close(sheared.r[i], expected));
            }
            assert_eq!(sheared.c, cell.unshear_point(pos));
        }

        #[test]
        fn test_single_face_shear() {
            let cell = PeriodicCell::new(Matrix3::from_cols(
                Vector3::new(10.0, 0.0, 0.0),
                Vector3::new(3.0, 10.0, 0.0),
                Vector3::new(0.0, 0.0, 10.0),
            )).unwrap();
            let b = sphere_aabb(Point3::new(0.0, 0.0, 0.0), 2.0, -1.0, Some(&cell));
            assert!(b.r.x > 2.0);
            assert!(b.r.y > 2.0);
            assert!(close(b.r.z, 2.0));
        }

        #[test]
        fn test_sphere_shape_bound() {
            let mut field = Field::new(FieldCaps::DEM);
            let node = field.add_node(Node::new(Point3::new(0.0, 0.0, 1.0)));
            let sphere = Sphere { radius: 0.25, node };
            let b = sphere.bound(&field, -1.0, None).unwrap();
            assert_eq!(b.min(), Point3::new(-0.25, -0.25, 0.75));
            field.remove_node(node);
            assert!(sphere.bound(&field, -1.0, None).is_err());
        }
    }
}
