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

use thiserror::Error;

use crate::contact::ContactId;
use crate::field::NodeId;
use crate::node::DataKind;
use crate::particle::ParticleId;

/// Errors raised while accessing node data or resolving contacts.
///
/// None of these are recoverable within a step: a failed step should be
/// reported to whoever drives the simulation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DemError {
    /// The data kind is not one of the kinds declared in `DataKind`.
    #[error("data kind {kind:?} out of range (max {max})")]
    OutOfRange { kind: DataKind, max: usize },

    /// The slot for this kind has never been set.
    #[error("node has no data of kind {kind:?}")]
    MissingData { kind: DataKind },

    /// A block was stored under a slot belonging to another kind.
    #[error("block of kind {block:?} cannot be stored in slot {slot:?}")]
    KindMismatch { slot: DataKind, block: DataKind },

    /// The node of a particle was never registered for DEM.
    #[error("node of particle {particle:?} carries no DEM data")]
    MissingNodeData { particle: ParticleId },

    /// A contact law produced a NaN or infinite force or torque.
    #[error("non-finite force/torque on particle {particle:?} from contact {id1:?}+{id2:?}")]
    NonFiniteResult {
        particle: ParticleId,
        id1: ParticleId,
        id2: ParticleId,
    },

    /// A particle lists a contact that the container no longer holds.
    #[error("particle {particle:?} refers to missing contact {contact:?}")]
    DanglingContact { particle: ParticleId, contact: ContactId },

    /// A contact was resolved for a particle that is neither of its endpoints.
    #[error("particle {particle:?} is not an endpoint of contact {id1:?}+{id2:?}")]
    NotAnEndpoint {
        particle: ParticleId,
        id1: ParticleId,
        id2: ParticleId,
    },

    /// The periodic cell matrix cannot be inverted.
    #[error("periodic cell matrix is singular")]
    SingularCell,

    /// A shape refers to a node that is not in the field.
    #[error("unknown node {node:?}")]
    UnknownNode { node: NodeId },

    /// A contact or lookup refers to a particle that is not in the scene.
    #[error("unknown particle {particle:?}")]
    UnknownParticle { particle: ParticleId },
}

#[cfg(test)]
mod tests {
    mod error {
        use crate::contact::ContactId;
        use crate::error::DemError;
        use crate::node::DataKind;
        use crate::particle::ParticleId;

        #[test]
        fn test_display_names_endpoints() {
            let e = DemError::NonFiniteResult {
                particle: ParticleId(4),
                id1: ParticleId(4),
                id2: ParticleId(9),
            };
            let s = format!("{}", e);
            assert!(s.contains("4"));
            assert!(s.contains("9"));
        }

        #[test]
        fn test_display_kind() {
            let e = DemError::OutOfRange { kind: DataKind(7), max: DataKind::LAST.0 };
            assert!(format!("{}", e).contains("7"));
            assert_ne!(e, DemError::MissingData { kind: DataKind(7) });
        }

        #[test]
        fn test_display_dangling_contact() {
            let e = DemError::DanglingContact { particle: ParticleId(2), contact: ContactId(11) };
            assert!(format!("{}", e).contains("11"));
        }
    }
}
