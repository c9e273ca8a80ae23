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

use std::any::Any;
use std::fmt;

use cgmath::{Point3, Quaternion, One};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::DemError;

/// Index of a node data slot.
///
/// Every kind of per-node data gets a fixed slot, so a lookup is a single
/// array access. New physics subsystems add a constant here and implement
/// `IndexedData` for their block; `Node` itself does not change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataKind(pub usize);

impl DataKind {
    /// Contact mechanics accumulators (`DemData`).
    pub const DEM: DataKind = DataKind(0);
    /// Rendering offsets.
    pub const GL: DataKind = DataKind(1);
    /// Meshless continuum nodes.
    pub const SPARC: DataKind = DataKind(2);
    /// Beam and shell nodes.
    pub const ANCF: DataKind = DataKind(3);
    /// One past the last declared kind. Always keep last.
    pub const LAST: DataKind = DataKind(4);
}

/// A block of data attached to a node.
///
/// Blocks must be shareable between threads: several particles may resolve
/// contacts on the same node at once.
pub trait NodeData: Any + Send + Sync + fmt::Debug {
    /// The slot this block belongs in.
    fn kind(&self) -> DataKind;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A NodeData type with a statically known slot.
///
/// Implementing this gives access to the typed accessors on `Node`. Use
/// `impl_node_data!` to implement both traits at once.
pub trait IndexedData: NodeData + Sized {
    const KIND: DataKind;
}

/// Implements `NodeData` and `IndexedData` for a type bound to a kind.
#[macro_export]
macro_rules! impl_node_data {
    (
        $name:ty, $kind:expr
    ) => {
        impl $crate::node::NodeData for $name {
            #[inline(always)]
            fn kind(&self) -> $crate::node::DataKind {
                $kind
            }

            #[inline(always)]
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            #[inline(always)]
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }

        impl $crate::node::IndexedData for $name {
            const KIND: $crate::node::DataKind = $kind;
        }
    };
}

/// A point in space with an orientation, referenced by particles and carrying
/// data for each physics subsystem that touches it.
#[derive(Debug)]
pub struct Node {
    pub pos: Point3<f64>,
    pub ori: Quaternion<f64>,
    data: SmallVec<[Option<Box<dyn NodeData>>; 4]>,
}

impl Default for Node {
    fn default() -> Self {
        Node::new(Point3::new(0.0, 0.0, 0.0))
    }
}

impl Node {
    /// Create a node at pos with identity orientation and no data.
    pub fn new(pos: Point3<f64>) -> Self {
        Node {
            pos,
            ori: Quaternion::one(),
            data: SmallVec::new(),
        }
    }

    pub fn with_ori(pos: Point3<f64>, ori: Quaternion<f64>) -> Self {
        Node {
            ori,
            ..Node::new(pos)
        }
    }

    #[inline(always)]
    fn check_kind(kind: DataKind) -> Result<usize, DemError> {
        if kind.0 < DataKind::LAST.0 {
            Ok(kind.0)
        } else {
            Err(DemError::OutOfRange { kind, max: DataKind::LAST.0 - 1 })
        }
    }

    /// Determines if the slot for kind is populated. Undeclared kinds are never
    /// populated.
    pub fn has_data(&self, kind: DataKind) -> bool {
        match self.data.get(kind.0) {
            Some(slot) => slot.is_some(),
            None => false,
        }
    }

    /// Returns the block stored for kind.
    pub fn data(&self, kind: DataKind) -> Result<&dyn NodeData, DemError> {
        let ix = Node::check_kind(kind)?;
        match self.data.get(ix) {
            Some(Some(block)) => Ok(block.as_ref()),
            _ => Err(DemError::MissingData { kind }),
        }
    }

    pub fn data_mut(&mut self, kind: DataKind) -> Result<&mut dyn NodeData, DemError> {
        let ix = Node::check_kind(kind)?;
        match self.data.get_mut(ix) {
            Some(Some(block)) => Ok(block.as_mut()),
            _ => Err(DemError::MissingData { kind }),
        }
    }

    /// Stores block in the slot for kind, replacing whatever was there. The
    /// slot array grows as needed and never shrinks.
    pub fn set_data(&mut self, kind: DataKind, block: Box<dyn NodeData>) -> Result<(), DemError> {
        let ix = Node::check_kind(kind)?;
        if block.kind() != kind {
            return Err(DemError::KindMismatch { slot: kind, block: block.kind() });
        }
        while self.data.len() <= ix {
            self.data.push(None);
        }
        self.data[ix] = Some(block);
        Ok(())
    }

    /// Removes and returns the block for kind. The slot stays allocated.
    pub fn take_data(&mut self, kind: DataKind) -> Option<Box<dyn NodeData>> {
        self.data.get_mut(kind.0).and_then(Option::take)
    }

    /// Number of allocated slots, populated or not.
    pub fn slot_count(&self) -> usize {
        self.data.len()
    }

    pub fn has<T: IndexedData>(&self) -> bool {
        self.has_data(T::KIND)
    }

    /// Typed access to the block in T's slot.
    pub fn get<T: IndexedData>(&self) -> Result<&T, DemError> {
        let block = self.data(T::KIND)?;
        // set_data checks kinds, so a mismatch here means two types claim
        // the same slot.
        block.as_any().downcast_ref::<T>().ok_or(DemError::KindMismatch {
            slot: T::KIND,
            block: block.kind(),
        })
    }

    pub fn get_mut<T: IndexedData>(&mut self) -> Result<&mut T, DemError> {
        let block = self.data_mut(T::KIND)?;
        let kind = block.kind();
        block
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or(DemError::KindMismatch { slot: T::KIND, block: kind })
    }

    pub fn set<T: IndexedData>(&mut self, block: T) -> Result<(), DemError> {
        self.set_data(T::KIND, Box::new(block))
    }

    /// Returns the block in T's slot, attaching the one built by f if the
    /// slot is empty.
    pub fn get_or_insert_with<T, F>(&mut self, f: F) -> Result<&mut T, DemError>
    where
        T: IndexedData,
        F: FnOnce() -> T
    {
        if !self.has::<T>() {
            self.set(f())?;
        }
        self.get_mut::<T>()
    }
}

#[cfg(test)]
mod tests {
    mod node {
        use cgmath::Point3;

        use crate::error::DemError;
        use crate::node::*;

        #[derive(Debug, PartialEq)]
        struct Offset(f64);
        impl_node_data!(Offset, DataKind::GL);

        #[derive(Debug, PartialEq)]
        struct Marker(u32);
        impl_node_data!(Marker, DataKind::ANCF);

        #[derive(Debug)]
        struct Bogus;
        impl_node_data!(Bogus, DataKind(11));

        #[test]
        fn test_set_get_identity() {
            let mut node = Node::new(Point3::new(1.0, 2.0, 3.0));
            let block: Box<dyn NodeData> = Box::new(Offset(0.5));
            let addr = block.as_any() as *const _ as *const u8;
            node.set_data(DataKind::GL, block).unwrap();
            let got = node.data(DataKind::GL).unwrap();
            assert_eq!(got.as_any() as *const _ as *const u8, addr);
            assert_eq!(node.get::<Offset>().unwrap(), &Offset(0.5));
        }

        #[test]
        fn test_missing_and_out_of_range() {
            let node = Node::default();
            assert!(!node.has_data(DataKind::DEM));
            assert_eq!(node.data(DataKind::DEM).unwrap_err(),
                       DemError::MissingData { kind: DataKind::DEM });
            assert_eq!(node.get::<Offset>().unwrap_err(),
                       DemError::MissingData { kind: DataKind::GL });
            match node.data(DataKind(11)) {
                Err(DemError::OutOfRange { kind, .. }) => assert_eq!(kind, DataKind(11)),
                other => panic!("unexpected {:?}", other),
            }
            assert!(!node.has_data(DataKind(11)));
        }

        #[test]
        fn test_undeclared_kind_rejected() {
            let mut node = Node::default();
            assert!(node.set(Bogus).is_err());
            assert_eq!(node.slot_count(), 0);
        }

        #[test]
        fn test_kind_mismatch() {
            let mut node = Node::default();
            assert_eq!(node.set_data(DataKind::DEM, Box::new(Marker(1))).unwrap_err(),
                       DemError::KindMismatch { slot: DataKind::DEM, block: DataKind::ANCF });
            assert!(!node.has_data(DataKind::DEM));
        }

        #[test]
        fn test_grows_and_never_shrinks() {
            let mut node = Node::default();
            node.set(Marker(3)).unwrap();
            assert_eq!(node.slot_count(), 4);
            assert!(!node.has::<Offset>());
            node.set(Offset(1.0)).unwrap();
            assert_eq!(node.slot_count(), 4);
            assert!(node.take_data(DataKind::ANCF).is_some());
            assert!(!node.has::<Marker>());
            assert_eq!(node.slot_count(), 4);
        }

        #[test]
        fn test_replace_and_lazy_attach() {
            let mut node = Node::default();
            node.set(Marker(1)).unwrap();
            node.set(Marker(2)).unwrap();
            assert_eq!(node.get::<Marker>().unwrap(), &Marker(2));

            node.get_or_insert_with(|| Offset(4.0)).unwrap().0 += 1.0;
            node.get_or_insert_with(|| Offset(100.0)).unwrap().0 += 1.0;
            assert_eq!(node.get::<Offset>().unwrap(), &Offset(6.0));
        }
    }
}
