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

use serde::{Deserialize, Serialize};

use crate::particle::ParticleId;

/// Run time settings of a DemScene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemConfig {
    /// Factor by which particle bounds are scaled before overlap tests.
    /// Values that are not positive leave bounds unscaled.
    pub aabb_enlarge_factor: f64,
    /// Time step handed to contact laws.
    pub dt: f64,
    /// Contact traced by the resolver.
    pub watch: Option<(ParticleId, ParticleId)>,
}

impl Default for DemConfig {
    fn default() -> Self {
        DemConfig {
            aabb_enlarge_factor: -1.0,
            dt: 1.0e-4,
            watch: None,
        }
    }
}

impl DemConfig {
    pub fn with_dt(dt: f64) -> Self {
        DemConfig {
            dt,
            ..DemConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    mod config {
        use crate::config::DemConfig;
        use crate::particle::ParticleId;

        #[test]
        fn test_defaults() {
            let c = DemConfig::default();
            assert!(c.aabb_enlarge_factor <= 0.0);
            assert!(c.dt > 0.0);
            assert_eq!(c.watch, None);
            let c = DemConfig { watch: Some((ParticleId(0), ParticleId(1))), ..DemConfig::with_dt(0.5) };
            assert_eq!(c.dt, 0.5);
            assert_eq!(c.aabb_enlarge_factor, -1.0);
        }
    }
}
