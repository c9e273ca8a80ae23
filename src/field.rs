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

use std::ops::{BitOr, Index, IndexMut};

use cgmath::Point3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dem::DemData;
use crate::geom::AABB;
use crate::node::Node;
use crate::pool::Pool;

pool_id!(
    /// Index of a node within its Field.
    NodeId
);

/// Capabilities a Field offers to engines.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCaps(u8);

impl FieldCaps {
    pub const NONE: FieldCaps = FieldCaps(0);
    /// Nodes carry `DemData` and particles interact through contacts.
    pub const DEM: FieldCaps = FieldCaps(0b_01);
    /// Nodes may be shared by several particles.
    pub const SHARED_NODES: FieldCaps = FieldCaps(0b_10);

    pub fn contains(self, other: FieldCaps) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for FieldCaps {
    type Output = FieldCaps;

    fn bitor(self, rhs: FieldCaps) -> FieldCaps {
        FieldCaps(self.0 | rhs.0)
    }
}

/// Something that runs over a Field once per step.
///
/// Engines state which fields they can work on instead of being tied to a
/// particular field type. Whoever schedules engines checks `accepts_field`
/// before running one.
pub trait Engine {
    fn accepts_field(&self, field: &Field) -> bool;
}

/// A spatial domain described by the nodes it references.
#[derive(Default)]
pub struct Field {
    pub caps: FieldCaps,
    nodes: Pool<Node, NodeId>,
}

impl Field {
    pub fn new(caps: FieldCaps) -> Self {
        Field {
            caps,
            nodes: Pool::new(),
        }
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node)
    }

    /// Removes a node. Anything still holding its id must be dropped first;
    /// the id will be handed out again.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes<'a>(&'a self) -> impl Iterator<Item = (NodeId, &'a Node)> + 'a {
        self.nodes.iter_with_ids()
    }

    /// The smallest box containing every node position, or None if the field
    /// has no nodes.
    pub fn bbox(&self) -> Option<AABB> {
        let mut iter = self.nodes.iter();
        let first = iter.next()?.pos;
        let (lower, upper) = iter.fold((first, first), |(lo, hi), n| {
            (
                Point3::new(lo.x.min(n.pos.x), lo.y.min(n.pos.y), lo.z.min(n.pos.z)),
                Point3::new(hi.x.max(n.pos.x), hi.y.max(n.pos.y), hi.z.max(n.pos.z)),
            )
        });
        Some(AABB::from_corners(lower, upper))
    }

    /// Zero the force accumulator of every node carrying DEM data.
    pub fn reset_forces(&self) {
        self.nodes.par_iter().for_each(|node| {
            if let Ok(dem) = node.get::<DemData>() {
                dem.reset();
            }
        });
    }
}

impl Index<NodeId> for Field {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
}

impl IndexMut<NodeId> for Field {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }
}

#[cfg(test)]
mod tests {
    mod field {
        use cgmath::{Point3, Vector3};

        use crate::dem::DemData;
        use crate::field::*;
        use crate::node::Node;

        struct DemOnly;

        impl Engine for DemOnly {
            fn accepts_field(&self, field: &Field) -> bool {
                field.caps.contains(FieldCaps::DEM)
            }
        }

        #[test]
        fn test_bbox() {
            let mut field = Field::new(FieldCaps::DEM);
            assert!(field.bbox().is_none());
            field.add_node(Node::new(Point3::new(1.0, -2.0, 0.0)));
            let gone = field.add_node(Node::new(Point3::new(100.0, 100.0, 100.0)));
            field.add_node(Node::new(Point3::new(-1.0, 4.0, 3.0)));
            field.remove_node(gone);

            let b = field.bbox().unwrap();
            assert_eq!(b.min(), Point3::new(-1.0, -2.0, 0.0));
            assert_eq!(b.max(), Point3::new(1.0, 4.0, 3.0));
        }

        #[test]
        fn test_single_node_bbox_is_degenerate() {
            let mut field = Field::default();
            field.add_node(Node::new(Point3::new(2.0, 2.0, 2.0)));
            let b = field.bbox().unwrap();
            assert_eq!(b.r, Vector3::new(0.0, 0.0, 0.0));
            assert_eq!(b.c, Point3::new(2.0, 2.0, 2.0));
        }

        #[test]
        fn test_reset_forces() {
            let mut field = Field::new(FieldCaps::DEM);
            let a = field.add_node(Node::default());
            field.add_node(Node::default());
            field[a].set(DemData::default()).unwrap();
            field[a].get::<DemData>().unwrap()
                .add_force_torque(Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, 0.0));
            assert_eq!(field[a].get::<DemData>().unwrap().force_torque().force, Vector3::new(1.0, 2.0, 3.0));
            field.reset_forces();
            assert_eq!(field[a].get::<DemData>().unwrap().force_torque().force, Vector3::new(0.0, 0.0, 0.0));
        }

        #[test]
        fn test_capabilities() {
            let engine = DemOnly;
            assert!(engine.accepts_field(&Field::new(FieldCaps::DEM | FieldCaps::SHARED_NODES)));
            assert!(!engine.accepts_field(&Field::new(FieldCaps::SHARED_NODES)));
            assert!(!engine.accepts_field(&Field::default()));
        }
    }
}
