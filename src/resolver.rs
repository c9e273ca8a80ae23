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

use cgmath::{Vector3, Zero};
use rayon::prelude::*;
use tracing::{debug, error};

use crate::cell::PeriodicCell;
use crate::contact::ContactContainer;
use crate::dem::DemData;
use crate::error::DemError;
use crate::field::{Engine, Field, FieldCaps};
use crate::particle::{Particle, ParticleId};
use crate::pool::Pool;

fn is_finite(v: Vector3<f64>) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

/// Transfers the forces stored on contacts onto the nodes of their particles.
///
/// Each particle is resolved independently. The only shared state is the
/// accumulator of each node, so particles can be processed concurrently.
#[derive(Clone, Debug, Default)]
pub struct ContactForceResolver {
    /// Contact whose resolution is traced at debug level.
    pub watch: Option<(ParticleId, ParticleId)>,
}

impl Engine for ContactForceResolver {
    fn accepts_field(&self, field: &Field) -> bool {
        field.caps.contains(FieldCaps::DEM)
    }
}

impl ContactForceResolver {
    pub fn new() -> Self {
        ContactForceResolver::default()
    }

    /// Trace the contact between a and b.
    pub fn with_watch(a: ParticleId, b: ParticleId) -> Self {
        let key = if a < b { (a, b) } else { (b, a) };
        ContactForceResolver { watch: Some(key) }
    }

    /// Adds the load of every real contact of one particle to its node.
    ///
    /// Stops at the first contact producing a non-finite load; loads of
    /// contacts visited before it stay applied.
    pub fn apply(
        &self,
        id: ParticleId,
        particle: &Particle,
        contacts: &ContactContainer,
        field: &Field,
        cell: Option<&PeriodicCell>,
    ) -> Result<(), DemError> {
        for (_, cid) in particle.contacts() {
            let contact = match contacts.get(cid) {
                Some(contact) => contact,
                None => {
                    error!(particle = ?id, contact = ?cid, "particle refers to a missing contact");
                    return Err(DemError::DanglingContact { particle: id, contact: cid });
                },
            };
            let (geom, phys) = match (contact.geom.as_ref(), contact.phys.as_ref()) {
                (Some(geom), Some(phys)) => (geom, phys),
                _ => continue,
            };
            let sign = if id == contact.id1 {
                1.0
            } else if id == contact.id2 {
                -1.0
            } else {
                error!(particle = ?id, id1 = ?contact.id1, id2 = ?contact.id2, "particle is not an endpoint");
                return Err(DemError::NotAnEndpoint {
                    particle: id,
                    id1: contact.id1,
                    id2: contact.id2,
                });
            };
            let force = geom.to_global(phys.force) * sign;
            let torque = geom.to_global(phys.torque) * sign;
            if !is_finite(force) || !is_finite(torque) {
                error!(particle = ?id, id1 = ?contact.id1, id2 = ?contact.id2, ?force, ?torque,
                       "non-finite contact load");
                return Err(DemError::NonFiniteResult {
                    particle: id,
                    id1: contact.id1,
                    id2: contact.id2,
                });
            }

            let node = field.node(particle.node()).ok_or(DemError::UnknownNode { node: particle.node() })?;
            let dem = node
                .get::<DemData>()
                .map_err(|_| DemError::MissingNodeData { particle: id })?;
            // The second particle touches through its image cell_dist cells
            // away, so the lever arm starts from that image.
            let shift = match cell {
                Some(cell) if id == contact.id2 => cell.image_shift(contact.cell_dist),
                _ => Vector3::zero(),
            };
            let arm = geom.pos - (node.pos + shift);
            let moment = arm.cross(force) + torque;
            dem.add_force_torque(force, moment);

            if self.watch == Some(contact.key()) {
                debug!(particle = ?id, id1 = ?contact.id1, id2 = ?contact.id2, ?force, ?moment, ?arm,
                       "resolved watched contact");
            }
        }
        Ok(())
    }

    /// Resolves every particle in parallel. Returns the first error any
    /// particle ran into.
    pub fn resolve_all(
        &self,
        particles: &Pool<Particle, ParticleId>,
        contacts: &ContactContainer,
        field: &Field,
        cell: Option<&PeriodicCell>,
    ) -> Result<(), DemError> {
        particles
            .par_iter_with_ids()
            .try_for_each(|(id, particle)| self.apply(id, particle, contacts, field, cell))
    }
}
