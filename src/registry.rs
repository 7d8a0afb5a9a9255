//-------------------------------------------------------------------//
//      parfis : 3d3v particle-in-cell simulation with Monte Carlo   //
//               collisions in bounded (cylindrical) geometries      //
//-------------------------------------------------------------------//
// This program is free software: you can redistribute it and/or     //
// modify it under the terms of the GNU General Public License as    //
// published by the Free Software Foundation, version 3.             //
// This program is distributed in the hope that it will be useful,   //
// but WITHOUT ANY WARRANTY; without even the implied warranty of    //
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU  //
// General Public License for more details at                        //
// https://www.gnu.org/licenses/gpl-3.0.html.                        //
//-------------------------------------------------------------------//

//! Owned registry of live simulations addressed by integer handles.

use std::collections::BTreeMap;

use log::info;

use crate::config::Config;
use crate::simulation::Simulation;
use crate::error::Result;

#[derive(Default)]
pub struct Registry {
    sims: BTreeMap<u32, Simulation>,
    next_id: u32,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Builds a simulation from `cfg` and returns its handle. Handles are never reused.
    pub fn create(&mut self, cfg: Config) -> Result<u32> {
        let sim = Simulation::new(cfg)?;
        let id = self.next_id;
        self.next_id += 1;
        self.sims.insert(id, sim);
        info!("registered simulation {}", id);
        Ok(id)
    }

    pub fn destroy(&mut self, id: u32) -> Option<Simulation> {
        let sim = self.sims.remove(&id);
        if sim.is_some() {
            info!("destroyed simulation {}", id);
        }
        sim
    }

    pub fn clear(&mut self) {
        self.sims.clear();
    }

    pub fn get(&self, id: u32) -> Option<&Simulation> {
        self.sims.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Simulation> {
        self.sims.get_mut(&id)
    }

    pub fn ids(&self) -> Vec<u32> {
        self.sims.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sims.is_empty()
    }
}
