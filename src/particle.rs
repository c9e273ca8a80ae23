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

use serde::{Deserialize, Serialize};

use crate::contact::ContactId;
use crate::field::NodeId;

pool_id!(
    /// Identifier of a particle within a scene.
    ParticleId
);

/// A sphere anchored on a field node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sphere {
    pub radius: f64,
    pub node: NodeId,
}

/// Material of a particle obeying the viscoelastic contact law.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViscoElasticMat {
    /// Normal stiffness.
    pub kn: f64,
    /// Normal damping.
    pub cn: f64,
    /// Shear stiffness.
    pub ks: f64,
    /// Shear damping.
    pub cs: f64,
    /// Friction angle in radians.
    pub friction_angle: f64,
}

impl Default for ViscoElasticMat {
    fn default() -> Self {
        ViscoElasticMat {
            kn: 1.0e5,
            cn: 0.0,
            ks: 1.0e5,
            cs: 0.0,
            friction_angle: 0.5,
        }
    }
}

/// A particle: a shape, its material, and the contacts it takes part in.
#[derive(Clone, Debug)]
pub struct Particle {
    pub shape: Sphere,
    pub material: ViscoElasticMat,
    contacts: HashMap<ParticleId, ContactId>,
}

impl Particle {
    pub fn new(shape: Sphere, material: ViscoElasticMat) -> Self {
        Particle {
            shape,
            material,
            contacts: HashMap::new(),
        }
    }

    #[inline(always)]
    pub fn node(&self) -> NodeId {
        self.shape.node
    }

    /// The contact with peer, if there is one.
    pub fn contact_with(&self, peer: ParticleId) -> Option<ContactId> {
        self.contacts.get(&peer).cloned()
    }

    /// Every (peer, contact) pair of this particle.
    pub fn contacts<'a>(&'a self) -> impl Iterator<Item = (ParticleId, ContactId)> + 'a {
        self.contacts.iter().map(|(p, c)| (*p, *c))
    }

    pub fn num_contacts(&self) -> usize {
        self.contacts.len()
    }

    pub(crate) fn link(&mut self, peer: ParticleId, contact: ContactId) {
        self.contacts.insert(peer, contact);
    }

    pub(crate) fn unlink(&mut self, peer: ParticleId) -> Option<ContactId> {
        self.contacts.remove(&peer)
    }
}
