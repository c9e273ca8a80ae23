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

use std::marker::PhantomData;

use cgmath::{Point3, Vector3};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::bounds::BoundEstimator;
use crate::cell::PeriodicCell;
use crate::config::DemConfig;
use crate::contact::{Contact, ContactContainer, ContactPhys};
use crate::dem::{DemData, ForceTorque};
use crate::error::DemError;
use crate::field::{Engine, Field, FieldCaps, NodeId};
use crate::geom::{ContactGeom, DefaultGeomParams, GeomParams, AABB};
use crate::law::{ContactLaw, Endpoint, ViscoElasticLaw};
use crate::node::Node;
use crate::particle::{Particle, ParticleId, Sphere, ViscoElasticMat};
use crate::pool::Pool;
use crate::resolver::ContactForceResolver;

fn endpoint(particles: &Pool<Particle, ParticleId>, field: &Field, id: ParticleId) -> Result<Endpoint, DemError> {
    let particle = particles.get(id).ok_or(DemError::UnknownParticle { particle: id })?;
    let node = field.node(particle.node()).ok_or(DemError::UnknownNode { node: particle.node() })?;
    let dem = node
        .get::<DemData>()
        .map_err(|_| DemError::MissingNodeData { particle: id })?;
    Ok(Endpoint::from_dem(dem))
}

/// A minimal driver for the DEM pipeline.
///
/// Each step the owner moves nodes (there is no integrator here), then calls
/// `update_contacts` and `compute_forces`, and reads the accumulated loads
/// back with `force_torque`.
pub struct DemScene<L = ViscoElasticLaw, P = DefaultGeomParams>
where
    L: ContactLaw,
    P: GeomParams
{
    pub config: DemConfig,
    pub field: Field,
    pub cell: Option<PeriodicCell>,
    particles: Pool<Particle, ParticleId>,
    contacts: ContactContainer,
    law: L,
    params: PhantomData<P>,
}

impl DemScene<ViscoElasticLaw, DefaultGeomParams> {
    pub fn new(config: DemConfig) -> Self {
        DemScene::with_law(config, ViscoElasticLaw)
    }
}

impl<L, P> DemScene<L, P>
where
    L: ContactLaw,
    P: GeomParams
{
    pub fn with_law(config: DemConfig, law: L) -> Self {
        DemScene {
            config,
            field: Field::new(FieldCaps::DEM | FieldCaps::SHARED_NODES),
            cell: None,
            particles: Pool::new(),
            contacts: ContactContainer::new(),
            law,
            params: PhantomData,
        }
    }

    /// Adds a sphere on a node of its own.
    pub fn add_particle(
        &mut self,
        pos: Point3<f64>,
        radius: f64,
        material: ViscoElasticMat,
        dem: DemData
    ) -> Result<ParticleId, DemError> {
        let mut node = Node::new(pos);
        node.set(dem)?;
        let node = self.field.add_node(node);
        Ok(self.particles.push(Particle::new(Sphere { radius, node }, material)))
    }

    /// Adds a sphere on an existing node, which may already carry other
    /// particles.
    pub fn add_particle_on(
        &mut self,
        node: NodeId,
        radius: f64,
        material: ViscoElasticMat
    ) -> Result<ParticleId, DemError> {
        if self.field.node(node).is_none() {
            return Err(DemError::UnknownNode { node });
        }
        Ok(self.particles.push(Particle::new(Sphere { radius, node }, material)))
    }

    /// Removes a particle and all of its contacts. Its node stays in the
    /// field.
    pub fn remove_particle(&mut self, id: ParticleId) -> Result<Particle, DemError> {
        let mut particle = self.particles.remove(id).ok_or(DemError::UnknownParticle { particle: id })?;
        let peers: Vec<ParticleId> = particle.contacts().map(|(peer, _)| peer).collect();
        for peer in peers {
            self.contacts.remove(id, peer);
            particle.unlink(peer);
            if let Some(p) = self.particles.get_mut(peer) {
                p.unlink(id);
            }
        }
        Ok(particle)
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    pub fn particles<'a>(&'a self) -> impl Iterator<Item = (ParticleId, &'a Particle)> + 'a {
        self.particles.iter_with_ids()
    }

    pub fn contacts(&self) -> &ContactContainer {
        &self.contacts
    }

    /// Mutable access to the node a particle sits on.
    pub fn node_mut(&mut self, id: ParticleId) -> Result<&mut Node, DemError> {
        let node = self.particles.get(id).ok_or(DemError::UnknownParticle { particle: id })?.node();
        self.field.node_mut(node).ok_or(DemError::UnknownNode { node })
    }

    /// The bound of a particle, canonical coordinates when periodic.
    pub fn bound(&self, id: ParticleId) -> Result<AABB, DemError> {
        let particle = self.particles.get(id).ok_or(DemError::UnknownParticle { particle: id })?;
        particle.shape.bound(&self.field, self.config.aabb_enlarge_factor, self.cell.as_ref())
    }

    /// Creates contacts between particles whose bounds start to overlap and
    /// removes those whose bounds stopped overlapping, then refreshes the
    /// geometry and physics of every contact.
    ///
    /// Every pair is tested; there is no broad phase. Particles sharing a
    /// node are never paired.
    pub fn update_contacts(&mut self) -> Result<(), DemError> {
        let mut bounds = Vec::with_capacity(self.particles.len());
        for (id, particle) in self.particles.iter_with_ids() {
            let b = particle.shape.bound(&self.field, self.config.aabb_enlarge_factor, self.cell.as_ref())?;
            bounds.push((id, particle.node(), self.field[particle.node()].pos, b));
        }

        for i in 0..bounds.len() {
            for j in (i + 1)..bounds.len() {
                let (a, node_a, pos_a, bound_a) = bounds[i];
                let (b, node_b, pos_b, bound_b) = bounds[j];
                // Particles of one clump never touch each other.
                if node_a == node_b {
                    continue;
                }
                let (id1, pos1, bound1, id2, pos2, bound2) = if a < b {
                    (a, pos_a, bound_a, b, pos_b, bound_b)
                } else {
                    (b, pos_b, bound_b, a, pos_a, bound_a)
                };
                let (cell_dist, shift) = match self.cell {
                    Some(ref cell) => {
                        let cd = cell.min_image(pos1, pos2);
                        (cd, cell.canonical_shift(cd))
                    },
                    None => (Vector3::new(0, 0, 0), Vector3::new(0.0, 0.0, 0.0)),
                };
                let overlapping = bound1.overlaps(&(bound2 + shift));
                match (self.contacts.find(id1, id2), overlapping) {
                    (None, true) => {
                        let mut contact = Contact::new(id1, id2);
                        contact.cell_dist = cell_dist;
                        let cid = self.contacts.insert(contact);
                        self.particles[id1].link(id2, cid);
                        self.particles[id2].link(id1, cid);
                        debug!(?id1, ?id2, ?cell_dist, "contact created");
                    },
                    (Some(cid), true) => {
                        self.contacts[cid].cell_dist = cell_dist;
                    },
                    (Some(_), false) => {
                        self.contacts.remove(id1, id2);
                        self.particles[id1].unlink(id2);
                        self.particles[id2].unlink(id1);
                        debug!(?id1, ?id2, "contact removed");
                    },
                    (None, false) => (),
                }
            }
        }

        let particles = &self.particles;
        let field = &self.field;
        let cell = self.cell.as_ref();
        self.contacts.par_iter_mut().try_for_each(|contact| -> Result<(), DemError> {
            let p1 = particles.get(contact.id1).ok_or(DemError::UnknownParticle { particle: contact.id1 })?;
            let p2 = particles.get(contact.id2).ok_or(DemError::UnknownParticle { particle: contact.id2 })?;
            let n1 = field.node(p1.node()).ok_or(DemError::UnknownNode { node: p1.node() })?;
            let n2 = field.node(p2.node()).ok_or(DemError::UnknownNode { node: p2.node() })?;
            let image2 = match cell {
                Some(cell) => n2.pos + cell.image_shift(contact.cell_dist),
                None => n2.pos,
            };
            let geom = ContactGeom::sphere_sphere::<P>(n1.pos, p1.shape.radius, image2, p2.shape.radius);
            // A contact only becomes real once the spheres touch. After that it
            // stays real until the bounds separate.
            if contact.geom.is_none() && geom.penetration < 0.0 {
                return Ok(());
            }
            contact.geom = Some(geom);
            if contact.phys.is_none() {
                contact.phys = Some(ContactPhys::from_materials(&p1.material, &p2.material));
            }
            Ok(())
        })
    }

    /// The resolver for the current `config.watch`.
    pub fn resolver(&self) -> ContactForceResolver {
        match self.config.watch {
            Some((a, b)) => ContactForceResolver::with_watch(a, b),
            None => ContactForceResolver::new(),
        }
    }

    /// Zeroes all accumulators, runs the contact law on every real contact
    /// with a time step of `config.dt` and transfers the results onto the
    /// nodes.
    pub fn compute_forces(&mut self) -> Result<(), DemError> {
        let resolver = self.resolver();
        if !resolver.accepts_field(&self.field) {
            warn!(caps = ?self.field.caps, "field does not accept contact resolution, skipping");
            return Ok(());
        }
        self.field.reset_forces();

        let particles = &self.particles;
        let field = &self.field;
        let law = &self.law;
        let dt = self.config.dt;
        self.contacts.par_iter_mut().try_for_each(|contact| -> Result<(), DemError> {
            if !contact.is_real() {
                return Ok(());
            }
            let e1 = endpoint(particles, field, contact.id1)?;
            let e2 = endpoint(particles, field, contact.id2)?;
            contact.step(law, &e1, &e2, dt);
            Ok(())
        })?;

        resolver.resolve_all(&self.particles, &self.contacts, &self.field, self.cell.as_ref())
    }

    /// Force and torque accumulated on the node of a particle. Particles
    /// sharing a node report the same totals.
    pub fn force_torque(&self, id: ParticleId) -> Result<ForceTorque, DemError> {
        let particle = self.particles.get(id).ok_or(DemError::UnknownParticle { particle: id })?;
        let node = self.field.node(particle.node()).ok_or(DemError::UnknownNode { node: particle.node() })?;
        let dem = node
            .get::<DemData>()
            .map_err(|_| DemError::MissingNodeData { particle: id })?;
        Ok(dem.force_torque())
    }
}
