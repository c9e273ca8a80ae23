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

//! The core of a discrete element method engine: per-node data storage and
//! the pipeline that turns contacts between particles into forces and torques
//! on their nodes.
//!
//! # Overview
//!
//! - `Node`: a position and orientation with one data slot per physics
//!   subsystem. Slots are addressed by `DataKind` and typed through
//!   `IndexedData`, so looking up the DEM data of a node is an index and a
//!   downcast.
//! - `DemData`: the DEM slot. Holds kinematics and a force/torque accumulator
//!   that many contacts may add to at once.
//! - `Field`: an arena of nodes. Particles refer to nodes by `NodeId`, and
//!   several particles may share one node.
//! - `PeriodicCell`: a periodic, possibly sheared, simulation box.
//! - `BoundEstimator`: axis aligned bounds of particles, inflated to remain
//!   conservative in a sheared cell.
//! - `ContactLaw`: computes the forces of a contact. `ViscoElasticLaw` is a
//!   spring-dashpot law with Coulomb friction.
//! - `ContactForceResolver`: moves the forces stored on contacts onto the
//!   accumulators of their nodes, in parallel.
//! - `DemScene`: ties the above together for one force evaluation per step.
//!   It does not integrate motion.
//!
//! The library logs through `tracing` and installs no subscriber.

pub use cgmath;

#[macro_use]
pub mod pool;
pub use pool::*;

#[macro_use]
pub mod node;
pub use node::*;

mod bounds;
pub use bounds::*;

mod cell;
pub use cell::*;

mod config;
pub use config::*;

mod contact;
pub use contact::*;

mod dem;
pub use dem::*;

mod error;
pub use error::*;

mod field;
pub use field::*;

mod geom;
pub use geom::*;

mod law;
pub use law::*;

mod particle;
pub use particle::*;

mod resolver;
pub use resolver::*;

mod scene;
pub use scene::*;
