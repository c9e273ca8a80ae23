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

use std::ops::{BitOr, BitOrAssign};
use std::sync::{Mutex, PoisonError};

use cgmath::{Point3, Vector3, Zero};
use serde::{Deserialize, Serialize};

use crate::node::DataKind;

/// A set of blocked degrees of freedom.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dofs(u8);

impl Dofs {
    pub const NONE: Dofs = Dofs(0);
    pub const X: Dofs = Dofs(0b_000001);
    pub const Y: Dofs = Dofs(0b_000010);
    pub const Z: Dofs = Dofs(0b_000100);
    pub const ROT_X: Dofs = Dofs(0b_001000);
    pub const ROT_Y: Dofs = Dofs(0b_010000);
    pub const ROT_Z: Dofs = Dofs(0b_100000);
    pub const TRANSLATION: Dofs = Dofs(0b_000111);
    pub const ROTATION: Dofs = Dofs(0b_111000);
    pub const ALL: Dofs = Dofs(0b_111111);

    pub fn contains(self, other: Dofs) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Dofs {
    type Output = Dofs;

    fn bitor(self, rhs: Dofs) -> Dofs {
        Dofs(self.0 | rhs.0)
    }
}

impl BitOrAssign for Dofs {
    fn bitor_assign(&mut self, rhs: Dofs) {
        self.0 |= rhs.0;
    }
}

/// The force and torque summed onto a node during one step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ForceTorque {
    pub force: Vector3<f64>,
    pub torque: Vector3<f64>,
}

impl ForceTorque {
    pub fn zero() -> Self {
        ForceTorque {
            force: Vector3::zero(),
            torque: Vector3::zero(),
        }
    }
}

/// Per-node state of the DEM subsystem.
///
/// The kinematic fields are written by the integrator between steps and only
/// read during contact resolution. The accumulator is written concurrently by
/// every contact touching the node and is therefore behind its own lock.
#[derive(Debug)]
pub struct DemData {
    pub vel: Vector3<f64>,
    pub ang_vel: Vector3<f64>,
    pub mass: f64,
    pub inertia: Vector3<f64>,
    pub blocked: Dofs,
    /// Reference point of an immovable body. Velocities of such bodies are
    /// prescribed relative to this point rather than to their centre.
    pub zero_point: Point3<f64>,
    accum: Mutex<ForceTorque>,
}

impl_node_data!(DemData, DataKind::DEM);

impl Default for DemData {
    fn default() -> Self {
        DemData {
            vel: Vector3::zero(),
            ang_vel: Vector3::zero(),
            mass: 0.0,
            inertia: Vector3::zero(),
            blocked: Dofs::NONE,
            zero_point: Point3::new(0.0, 0.0, 0.0),
            accum: Mutex::new(ForceTorque::zero()),
        }
    }
}

impl Clone for DemData {
    fn clone(&self) -> Self {
        DemData {
            accum: Mutex::new(self.force_torque()),
            ..*self
        }
    }
}

impl DemData {
    /// DEM data for a free body of mass m with principal moments inertia.
    pub fn new(mass: f64, inertia: Vector3<f64>) -> Self {
        DemData {
            mass,
            inertia,
            ..DemData::default()
        }
    }

    /// DEM data for a body that never moves on its own.
    pub fn fixed(zero_point: Point3<f64>) -> Self {
        DemData {
            blocked: Dofs::ALL,
            zero_point,
            ..DemData::default()
        }
    }

    /// A body is movable unless all of its degrees of freedom are blocked.
    pub fn is_movable(&self) -> bool {
        self.blocked != Dofs::ALL
    }

    /// Adds a force and torque pair. The pair is added atomically with respect
    /// to other calls on the same node.
    pub fn add_force_torque(&self, force: Vector3<f64>, torque: Vector3<f64>) {
        let mut accum = self.accum.lock().unwrap_or_else(PoisonError::into_inner);
        accum.force += force;
        accum.torque += torque;
    }

    /// Zero the accumulator. Called once per step before any resolution.
    pub fn reset(&self) {
        let mut accum = self.accum.lock().unwrap_or_else(PoisonError::into_inner);
        *accum = ForceTorque::zero();
    }

    pub fn force_torque(&self) -> ForceTorque {
        *self.accum.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    mod dem {
        use std::sync::Arc;
        use std::thread;

        use cgmath::{Point3, Vector3};

        use crate::dem::*;

        #[test]
        fn test_dofs() {
            let d = Dofs::X | Dofs::ROT_Z;
            assert!(d.contains(Dofs::ROT_Z));
            assert!(!d.contains(Dofs::Y));
            assert!(d.contains(Dofs::X));
            assert!(!d.contains(Dofs::TRANSLATION));
            assert_eq!(Dofs::TRANSLATION | Dofs::ROTATION, Dofs::ALL);
        }

        #[test]
        fn test_movable() {
            assert!(DemData::new(1.0, Vector3::new(0.4, 0.4, 0.4)).is_movable());
            let mut d = DemData::default();
            d.blocked |= Dofs::TRANSLATION;
            assert!(d.is_movable());
            assert!(!DemData::fixed(Point3::new(0.0, 0.0, 0.0)).is_movable());
        }

        #[test]
        fn test_accumulate_and_reset() {
            let d = DemData::default();
            d.add_force_torque(Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 2.0));
            d.add_force_torque(Vector3::new(0.5, 1.0, 0.0), Vector3::new(0.0, 0.0, -1.0));
            let ft = d.force_torque();
            assert_eq!(ft.force, Vector3::new(1.5, 1.0, 0.0));
            assert_eq!(ft.torque, Vector3::new(0.0, 0.0, 1.0));
            assert_eq!(d.clone().force_torque(), ft);
            d.reset();
            assert_eq!(d.force_torque(), ForceTorque::zero());
        }

        #[test]
        fn test_concurrent_adds() {
            let d = Arc::new(DemData::default());
            let handles: Vec<_> = (0..8).map(|_| {
                let d = d.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        d.add_force_torque(Vector3::new(1.0, -1.0, 0.0), Vector3::new(0.0, 0.0, 1.0));
                    }
                })
            }).collect();
            for h in handles {
                h.join().unwrap();
            }
            let ft = d.force_torque();
            assert_eq!(ft.force, Vector3::new(8000.0, -8000.0, 0.0));
            assert_eq!(ft.torque, Vector3::new(0.0, 0.0, 8000.0));
        }
    }
}
