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

use cgmath::{EuclideanSpace, InnerSpace, Matrix3, Point3, SquareMatrix, Vector3};

use crate::error::DemError;

/// A periodic, possibly sheared, simulation cell.
///
/// The cell is the parallelepiped spanned by the columns of `h_size`. Points
/// are stored in sheared (world) coordinates; "canonical" coordinates are the
/// unsheared frame in which the cell is an axis aligned box with edges `size`.
#[derive(Clone, Debug)]
pub struct PeriodicCell {
    h_size: Matrix3<f64>,
    inv_h_size: Matrix3<f64>,
    size: Vector3<f64>,
    shear_trsf: Matrix3<f64>,
    unshear_trsf: Matrix3<f64>,
    cos: Vector3<f64>,
    has_shear: bool,
}

impl PeriodicCell {
    /// Build a cell from its three edge vectors, given as matrix columns.
    pub fn new(h_size: Matrix3<f64>) -> Result<Self, DemError> {
        let inv_h_size = h_size.invert().ok_or(DemError::SingularCell)?;
        let size = Vector3::new(
            h_size.x.magnitude(),
            h_size.y.magnitude(),
            h_size.z.magnitude(),
        );
        let shear_trsf = Matrix3::from_cols(h_size.x / size.x, h_size.y / size.y, h_size.z / size.z);
        let unshear_trsf = shear_trsf.invert().ok_or(DemError::SingularCell)?;
        let mut cos = Vector3::new(1.0, 1.0, 1.0);
        for i in 0..3 {
            let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
            cos[i] = shear_trsf[i1].cross(shear_trsf[i2]).magnitude();
        }
        let mut has_shear = false;
        for col in 0..3 {
            for row in 0..3 {
                if col != row && h_size[col][row] != 0.0 {
                    has_shear = true;
                }
            }
        }
        Ok(PeriodicCell {
            h_size,
            inv_h_size,
            size,
            shear_trsf,
            unshear_trsf,
            cos,
            has_shear,
        })
    }

    /// An unsheared box cell with the given edge lengths.
    pub fn aligned(size: Vector3<f64>) -> Result<Self, DemError> {
        PeriodicCell::new(Matrix3::from_diagonal(size))
    }

    pub fn h_size(&self) -> Matrix3<f64> {
        self.h_size
    }

    /// Edge lengths of the cell.
    pub fn size(&self) -> Vector3<f64> {
        self.size
    }

    pub fn has_shear(&self) -> bool {
        self.has_shear
    }

    /// For every axis i, the cosine of the shear angle of the face spanned by
    /// the two other axes. All ones for an unsheared cell.
    pub fn cosines(&self) -> Vector3<f64> {
        self.cos
    }

    /// Map a canonical point into sheared coordinates.
    pub fn shear_point(&self, p: Point3<f64>) -> Point3<f64> {
        Point3::from_vec(self.shear_trsf * p.to_vec())
    }

    /// Map a sheared point into canonical coordinates.
    pub fn unshear_point(&self, p: Point3<f64>) -> Point3<f64> {
        Point3::from_vec(self.unshear_trsf * p.to_vec())
    }

    /// Displacement between a point and its image cell_dist cells away.
    pub fn image_shift(&self, cell_dist: Vector3<i32>) -> Vector3<f64> {
        self.h_size * Vector3::new(cell_dist.x as f64, cell_dist.y as f64, cell_dist.z as f64)
    }

    /// The same image shift expressed in canonical coordinates.
    pub fn canonical_shift(&self, cell_dist: Vector3<i32>) -> Vector3<f64> {
        Vector3::new(
            self.size.x * cell_dist.x as f64,
            self.size.y * cell_dist.y as f64,
            self.size.z * cell_dist.z as f64,
        )
    }

    /// Wrap p into the primary cell. Returns the wrapped point and the number
    /// of cells it was moved by, so that `p == wrapped + image_shift(n)`.
    pub fn wrap_point(&self, p: Point3<f64>) -> (Point3<f64>, Vector3<i32>) {
        let frac = self.inv_h_size * p.to_vec();
        let n = Vector3::new(frac.x.floor() as i32, frac.y.floor() as i32, frac.z.floor() as i32);
        (p - self.image_shift(n), n)
    }

    /// The cell distance to apply to b so that its image lies nearest a.
    pub fn min_image(&self, a: Point3<f64>, b: Point3<f64>) -> Vector3<i32> {
        let frac = self.inv_h_size * (a - b);
        Vector3::new(frac.x.round() as i32, frac.y.round() as i32, frac.z.round() as i32)
    }
}

#[cfg(test)]
mod tests {
    mod cell {
        use cgmath::{InnerSpace, Matrix3, Point3, Vector3};

        use crate::cell::PeriodicCell;
        use crate::error::DemError;

        fn sheared() -> PeriodicCell {
            // y edge leans along x
            PeriodicCell::new(Matrix3::from_cols(
                Vector3::new(10.0, 0.0, 0.0),
                Vector3::new(3.0, 10.0, 0.0),
                Vector3::new(0.0, 0.0, 10.0),
            )).unwrap()
        }

        #[test]
        fn test_aligned_cell() {
            let cell = PeriodicCell::aligned(Vector3::new(2.0, 3.0, 4.0)).unwrap();
            assert!(!cell.has_shear());
            assert_eq!(cell.cosines(), Vector3::new(1.0, 1.0, 1.0));
            let p = Point3::new(0.5, -1.0, 7.0);
            assert_eq!(cell.unshear_point(p), p);
            assert_eq!(cell.image_shift(Vector3::new(1, -1, 2)), Vector3::new(2.0, -3.0, 8.0));
        }

        #[test]
        fn test_singular_cell() {
            assert_eq!(PeriodicCell::aligned(Vector3::new(1.0, 0.0, 1.0)).unwrap_err(),
                       DemError::SingularCell);
        }

        #[test]
        fn test_sheared_cell() {
            let cell = sheared();
            assert!(cell.has_shear());
            let cos = cell.cosines();
            // Only the x-y face is sheared, which is the face opposite z.
            assert!(cos.z < 1.0);
            assert!((cos.x - 1.0).abs() < 1.0e-12);
            assert!((cos.y - 1.0).abs() < 1.0e-12);
            assert!((cos.z - 10.0 / 109.0_f64.sqrt()).abs() < 1.0e-12);

            let p = Point3::new(4.0, 5.0, 6.0);
            let q = cell.shear_point(cell.unshear_point(p));
            assert!((q - p).magnitude() < 1.0e-12);
        }

        #[test]
        fn test_wrap_point() {
            let cell = sheared();
            let p = Point3::new(25.0, -4.0, 31.0);
            let (w, n) = cell.wrap_point(p);
            assert_eq!(n, Vector3::new(2, -1, 3));
            assert!((w + cell.image_shift(n) - p).magnitude() < 1.0e-12);
        }

        #[test]
        fn test_min_image() {
            let cell = PeriodicCell::aligned(Vector3::new(10.0, 10.0, 10.0)).unwrap();
            let a = Point3::new(0.5, 5.0, 5.0);
            let b = Point3::new(9.5, 5.0, 5.0);
            let cd = cell.min_image(a, b);
            assert_eq!(cd, Vector3::new(-1, 0, 0));
            let image = b + cell.image_shift(cd);
            assert!(((image - a).magnitude() - 1.0).abs() < 1.0e-12);
            assert_eq!(cell.canonical_shift(cd), Vector3::new(-10.0, 0.0, 0.0));
        }
    }
}
