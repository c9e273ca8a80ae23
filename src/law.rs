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

use cgmath::{InnerSpace, Point3, Vector3, Zero};

use crate::contact::Contact;
use crate::dem::DemData;

/// The kinematic state of one side of a contact, as seen by a law.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Endpoint {
    pub vel: Vector3<f64>,
    pub ang_vel: Vector3<f64>,
    pub zero_point: Point3<f64>,
    pub movable: bool,
}

impl Endpoint {
    pub fn from_dem(dem: &DemData) -> Self {
        Endpoint {
            vel: dem.vel,
            ang_vel: dem.ang_vel,
            zero_point: dem.zero_point,
            movable: dem.is_movable(),
        }
    }

    /// An endpoint at rest.
    pub fn at_rest() -> Self {
        Endpoint {
            vel: Vector3::zero(),
            ang_vel: Vector3::zero(),
            zero_point: Point3::new(0.0, 0.0, 0.0),
            movable: true,
        }
    }
}

/// Global forces produced by a law, acting on the second particle of the
/// contact.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LawForces {
    pub normal: Vector3<f64>,
    pub shear: Vector3<f64>,
}

impl LawForces {
    pub fn total(&self) -> Vector3<f64> {
        self.normal + self.shear
    }
}

/// A pairwise contact law.
///
/// A law only touches the contact it is given, so laws for distinct contacts
/// may run concurrently.
pub trait ContactLaw: Sync {
    /// Updates the physics of contact and returns the forces on its second
    /// particle. Contacts without geometry or physics yield None.
    fn go(&self, contact: &mut Contact, e1: &Endpoint, e2: &Endpoint, dt: f64) -> Option<LawForces>;
}

/// Linear spring-dashpot in the normal direction, incremental spring-dashpot
/// in shear, shear capped by Coulomb friction.
#[derive(Copy, Clone, Debug, Default)]
pub struct ViscoElasticLaw;

impl ContactLaw for ViscoElasticLaw {
    fn go(&self, contact: &mut Contact, e1: &Endpoint, e2: &Endpoint, dt: f64) -> Option<LawForces> {
        let is_new = contact.is_new;
        let (geom, phys) = match (contact.geom.as_ref(), contact.phys.as_mut()) {
            (Some(geom), Some(phys)) => (geom, phys),
            _ => return None,
        };
        let n = geom.normal;
        if is_new {
            phys.shear_force = Vector3::zero();
            phys.prev_normal = n;
        }
        let mut shear = phys.shear_force;

        // Follow the rotation of the normal, then the mean spin about it.
        // Both are first order updates.
        let axis = phys.prev_normal.cross(n);
        shear -= shear.cross(axis);
        let mut spin = Vector3::zero();
        if e1.movable {
            spin += e1.ang_vel;
        }
        if e2.movable {
            spin += e2.ang_vel;
        }
        let angle = dt * 0.5 * n.dot(spin);
        shear -= shear.cross(n * angle);

        // Immovable bodies rotate about their zero point, not their centre.
        let x = geom.pos;
        let c1 = if e1.movable { n * geom.radius1 } else { x - e1.zero_point };
        let c2 = if e2.movable { -n * geom.radius2 } else { x - e2.zero_point };
        let v_rel = (e2.vel + e2.ang_vel.cross(c2)) - (e1.vel + e1.ang_vel.cross(c1));
        let v_n = n.dot(v_rel);
        let v_s = v_rel - n * v_n;

        shear -= v_s * (phys.ks * dt + phys.cs);
        let normal = n * (phys.kn * geom.penetration.max(0.0) - phys.cn * v_n);

        let max_fs = normal.magnitude2() * phys.tan_friction_angle * phys.tan_friction_angle;
        if shear.magnitude2() > max_fs {
            shear *= max_fs.sqrt() / shear.magnitude();
        }

        phys.shear_force = shear;
        phys.normal_force = normal;
        phys.prev_normal = n;
        Some(LawForces { normal, shear })
    }
}
