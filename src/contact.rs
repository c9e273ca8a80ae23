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

use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use cgmath::{Vector3, Zero};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geom::ContactGeom;
use crate::law::{ContactLaw, Endpoint, LawForces};
use crate::particle::{ParticleId, ViscoElasticMat};
use crate::pool::Pool;

pool_id!(
    /// Index of a contact within a ContactContainer.
    ContactId
);

/// Mechanical state of a viscoelastic contact.
///
/// `force` and `torque` are expressed in the contact frame and act on the
/// first particle. The second particle receives their opposite.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactPhys {
    /// Normal of the previous step, used to rotate the shear force.
    pub prev_normal: Vector3<f64>,
    /// Shear force acting on the second particle, global frame.
    pub shear_force: Vector3<f64>,
    /// Normal force acting on the second particle, global frame.
    pub normal_force: Vector3<f64>,
    pub kn: f64,
    pub ks: f64,
    pub initial_kn: f64,
    pub initial_ks: f64,
    pub cn: f64,
    pub cs: f64,
    pub tan_friction_angle: f64,
    pub force: Vector3<f64>,
    pub torque: Vector3<f64>,
}

/// Two springs (or dashpots) in series.
fn series(a: f64, b: f64) -> f64 {
    if a + b == 0.0 {
        0.0
    } else {
        a * b / (a + b)
    }
}

impl ContactPhys {
    /// Combines the materials of both particles. Stiffness and damping are
    /// put in series, friction uses the smaller of the two angles.
    pub fn from_materials(m1: &ViscoElasticMat, m2: &ViscoElasticMat) -> Self {
        let kn = series(m1.kn, m2.kn);
        let ks = series(m1.ks, m2.ks);
        ContactPhys {
            prev_normal: Vector3::zero(),
            shear_force: Vector3::zero(),
            normal_force: Vector3::zero(),
            kn,
            ks,
            initial_kn: kn,
            initial_ks: ks,
            cn: series(m1.cn, m2.cn),
            cs: series(m1.cs, m2.cs),
            tan_friction_angle: m1.friction_angle.min(m2.friction_angle).tan(),
            force: Vector3::zero(),
            torque: Vector3::zero(),
        }
    }

    /// Change the current stiffness. The initial stiffness bounds the current
    /// one from above; if the new value exceeds it, it is raised to match.
    pub fn set_stiffness(&mut self, kn: f64, ks: f64) {
        self.kn = kn;
        self.ks = ks;
        if self.kn > self.initial_kn {
            warn!(kn = self.kn, initial_kn = self.initial_kn, "normal stiffness above initial value, raising initial");
            self.initial_kn = self.kn;
        }
        if self.ks > self.initial_ks {
            warn!(ks = self.ks, initial_ks = self.initial_ks, "shear stiffness above initial value, raising initial");
            self.initial_ks = self.ks;
        }
    }

    /// Stores the total force of a law evaluation as the local force on the
    /// first particle.
    pub fn store_forces(&mut self, geom: &ContactGeom, forces: &LawForces) {
        self.force = geom.to_local(-(forces.normal + forces.shear));
        self.torque = Vector3::zero();
    }
}

/// A potential or actual interaction between two particles.
#[derive(Clone, Debug)]
pub struct Contact {
    pub id1: ParticleId,
    pub id2: ParticleId,
    pub geom: Option<ContactGeom>,
    pub phys: Option<ContactPhys>,
    /// Number of periodic cells between id1 and the image of id2 it touches.
    pub cell_dist: Vector3<i32>,
    pub is_new: bool,
}

impl Contact {
    /// A fresh contact between a and b, stored with the smaller id first.
    pub fn new(a: ParticleId, b: ParticleId) -> Self {
        let (id1, id2) = if a < b { (a, b) } else { (b, a) };
        Contact {
            id1,
            id2,
            geom: None,
            phys: None,
            cell_dist: Vector3::new(0, 0, 0),
            is_new: true,
        }
    }

    /// Real contacts carry both geometry and physics and exert forces.
    pub fn is_real(&self) -> bool {
        self.geom.is_some() && self.phys.is_some()
    }

    /// The pair key of this contact.
    #[inline(always)]
    pub fn key(&self) -> (ParticleId, ParticleId) {
        (self.id1, self.id2)
    }

    /// Runs law on this contact and stores the result. Returns false, doing
    /// nothing, for contacts that are not real.
    pub fn step<L: ContactLaw + ?Sized>(&mut self, law: &L, e1: &Endpoint, e2: &Endpoint, dt: f64) -> bool {
        let forces = match law.go(self, e1, e2, dt) {
            Some(forces) => forces,
            None => return false,
        };
        if let (Some(geom), Some(phys)) = (self.geom.as_ref(), self.phys.as_mut()) {
            phys.store_forces(geom, &forces);
        }
        self.is_new = false;
        true
    }
}

/// Owns every contact of a scene, addressable by id or by endpoint pair.
#[derive(Default)]
pub struct ContactContainer {
    contacts: Pool<Contact, ContactId>,
    by_pair: HashMap<(ParticleId, ParticleId), ContactId>,
}

fn pair_key(a: ParticleId, b: ParticleId) -> (ParticleId, ParticleId) {
    if a < b { (a, b) } else { (b, a) }
}

impl ContactContainer {
    pub fn new() -> Self {
        ContactContainer::default()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Adds a contact. A contact already stored for the same pair is
    /// replaced and keeps its id.
    pub fn insert(&mut self, contact: Contact) -> ContactId {
        let key = contact.key();
        if let Some(&id) = self.by_pair.get(&key) {
            self.contacts[id] = contact;
            return id;
        }
        let id = self.contacts.push(contact);
        self.by_pair.insert(key, id);
        id
    }

    /// The contact between a and b, in either order.
    pub fn find(&self, a: ParticleId, b: ParticleId) -> Option<ContactId> {
        self.by_pair.get(&pair_key(a, b)).cloned()
    }

    pub fn remove(&mut self, a: ParticleId, b: ParticleId) -> Option<Contact> {
        let id = self.by_pair.remove(&pair_key(a, b))?;
        self.contacts.remove(id)
    }

    pub fn get(&self, id: ContactId) -> Option<&Contact> {
        self.contacts.get(id)
    }

    pub fn get_mut(&mut self, id: ContactId) -> Option<&mut Contact> {
        self.contacts.get_mut(id)
    }

    pub fn iter<'a>(&'a self) -> impl Iterator<Item = (ContactId, &'a Contact)> + 'a {
        self.contacts.iter_with_ids()
    }

    pub fn par_iter_mut<'a>(&'a mut self) -> impl ParallelIterator<Item = &'a mut Contact> + 'a {
        self.contacts.par_iter_mut()
    }
}

impl Index<ContactId> for ContactContainer {
    type Output = Contact;

    fn index(&self, id: ContactId) -> &Contact {
        &self.contacts[id]
    }
}

impl IndexMut<ContactId> for ContactContainer {
    fn index_mut(&mut self, id: ContactId) -> &mut Contact {
        &mut self.contacts[id]
    }
}
