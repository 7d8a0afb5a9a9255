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

//! Simulation driver.
//!
//! A [`Simulation`] owns the configuration, the cell grid, the particle arena and the
//! collision tables. Work is requested through named [`Command`]s, grouped into
//! chains in the configuration (`create`, `evolve`).

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use log::{debug, info};
use rand::rngs::StdRng;

use crate::collision::CollisionModel;
use crate::config::Config;
use crate::constants::NO_STATE;
use crate::error::{ParfisError, Result};
use crate::geometry::CellGrid;
use crate::integrator::{self, PushCounters};
use crate::mirror::SimView;
use crate::specie::Specie;
use crate::store::{self, ParticleStore};

/// The two halves of a simulation, each with its own configuration and data stage.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Domain {
    System,                                                // geometry and cells
    Particle,                                              // species, gases and states
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    CreateCells,
    CreateStates,
    PushStates,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateCells => "createCells",
            Command::CreateStates => "createStates",
            Command::PushStates => "pushStates",
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            Command::CreateCells => Domain::System,
            Command::CreateStates | Command::PushStates => Domain::Particle,
        }
    }
}

impl FromStr for Command {
    type Err = ParfisError;

    fn from_str(s: &str) -> Result<Command> {
        match s {
            "createCells" => Ok(Command::CreateCells),
            "createStates" => Ok(Command::CreateStates),
            "pushStates" => Ok(Command::PushStates),
            _ => Err(ParfisError::UnknownCommand(s.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub struct Simulation {
    cfg: Config,
    grid: Option<CellGrid>,
    species: Vec<Specie>,
    model: CollisionModel,
    store: ParticleStore,
    rngs: Vec<StdRng>,
    counters: Vec<PushCounters>,
    evolve_cnt: u64,
}

impl Simulation {
    /// Validates `cfg` and loads the configuration data of both domains. Cross
    /// section files named by the configuration are read here.
    pub fn new(cfg: Config) -> Result<Simulation> {
        cfg.validate()?;
        let mut sim = Simulation {
            cfg,
            grid: None,
            species: Vec::new(),
            model: CollisionModel::default(),
            store: ParticleStore::default(),
            rngs: Vec::new(),
            counters: Vec::new(),
            evolve_cnt: 0,
        };
        sim.load_cfg_data(Domain::System)?;
        sim.load_cfg_data(Domain::Particle)?;
        Ok(sim)
    }

    pub fn from_toml_str(s: &str) -> Result<Simulation> {
        Simulation::new(Config::from_toml_str(s)?)
    }

    pub fn load_cfg_data(&mut self, domain: Domain) -> Result<()> {
        match domain {
            Domain::System => {
                let sys = &self.cfg.system;
                info!(
                    "{:?} geometry {:?} m with cells of {:?} m, timestep {:e} s",
                    sys.geometry, sys.geometry_size, sys.cell_size, sys.timestep
                );
                Ok(())
            }
            Domain::Particle => {
                let mut species = Vec::with_capacity(self.cfg.particle.specie.len());
                for (id, spec_cfg) in self.cfg.particle.specie.iter().enumerate() {
                    if self.cfg.particle.specie[..id].iter().any(|s| s.name == spec_cfg.name) {
                        return Err(ParfisError::InvalidParameter(format!("duplicate specie {}", spec_cfg.name)));
                    }
                    species.push(Specie::new(id, spec_cfg, &self.cfg.system)?);
                }
                let model = CollisionModel::load(&self.cfg, &mut species)?;
                for s in species.iter() {
                    info!(
                        "specie {}: dt = {:e} s, max_vel = {:e} m/s, max_ev = {:e} eV, push = {:?}",
                        s.name, s.dt, s.max_vel, s.max_ev, s.push
                    );
                }
                self.rngs = species.iter().map(|s| s.rng()).collect();
                self.counters = vec![PushCounters::default(); species.len()];
                self.species = species;
                self.model = model;
                if let Some(grid) = &self.grid {
                    let cells = grid.cells.len();
                    for s in self.species.iter_mut() {
                        s.head_offset = s.id * cells;
                    }
                    self.store = ParticleStore::new(cells * self.species.len());
                }
                Ok(())
            }
        }
    }

    /// Builds the data of a domain: the cell grid for [`Domain::System`], the initial
    /// states for [`Domain::Particle`].
    pub fn load_sim_data(&mut self, domain: Domain) -> Result<()> {
        match domain {
            Domain::System => self.create_cells(),
            Domain::Particle => self.create_states(),
        }
    }

    pub fn run_command(&mut self, cmd: Command) -> Result<()> {
        debug!("running {} ({:?})", cmd, cmd.domain());
        match cmd {
            Command::CreateCells | Command::CreateStates => self.load_sim_data(cmd.domain()),
            Command::PushStates => self.push_states(),
        }
    }

    pub fn run(&mut self, name: &str) -> Result<()> {
        self.run_command(name.parse()?)
    }

    /// Runs the named chain of the configuration, stopping at the first failing command.
    pub fn run_chain(&mut self, chain: &str) -> Result<()> {
        let cmds = self
            .cfg
            .chain(chain)
            .ok_or_else(|| ParfisError::UnknownCommand(format!("chain {}", chain)))?
            .iter()
            .map(|s| s.parse())
            .collect::<Result<Vec<Command>>>()?;
        for cmd in cmds {
            self.run_command(cmd)?;
        }
        Ok(())
    }

    /// Rebuilds the cell grid. Existing states are dropped.
    pub fn create_cells(&mut self) -> Result<()> {
        let grid = CellGrid::create(&self.cfg.system)?;
        let cells = grid.cells.len();
        for s in self.species.iter_mut() {
            s.head_offset = s.id * cells;
        }
        self.store = ParticleStore::new(cells * self.species.len());
        self.grid = Some(grid);
        self.evolve_cnt = 0;
        Ok(())
    }

    /// Seeds every specie from scratch.
    pub fn create_states(&mut self) -> Result<()> {
        let grid = self.grid.as_ref().ok_or(ParfisError::CellsNotCreated)?;
        let mut fresh = ParticleStore::new(grid.cells.len() * self.species.len());
        for (specie, rng) in self.species.iter().zip(self.rngs.iter_mut()) {
            store::create_states(grid, &mut fresh, specie, rng)?;
        }
        self.store = fresh;
        self.evolve_cnt = 0;
        Ok(())
    }

    /// One evolve step: every specie due on this counter value is pushed once.
    pub fn push_states(&mut self) -> Result<()> {
        let grid = self.grid.as_ref().ok_or(ParfisError::CellsNotCreated)?;
        self.store.reset_pushed();
        let mut step = PushCounters::default();
        for (i, specie) in self.species.iter().enumerate() {
            if !specie.is_active(self.evolve_cnt) {
                continue;
            }
            let cnt = integrator::push_states(grid, &mut self.store, specie, &self.model, &mut self.rngs[i]);
            self.counters[i] += cnt;
            step += cnt;
        }
        debug!(
            "step {}: pushed {}, migrated {}, reflected {}, wrapped {}, collided {}",
            self.evolve_cnt, step.pushed, step.migrated, step.reflected, step.wrapped, step.collided
        );
        self.evolve_cnt += 1;
        Ok(())
    }

    pub fn evolve_cnt(&self) -> u64 {
        self.evolve_cnt
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn grid(&self) -> Option<&CellGrid> {
        self.grid.as_ref()
    }

    pub fn species(&self) -> &[Specie] {
        &self.species
    }

    pub fn specie_id(&self, name: &str) -> Result<usize> {
        self.species
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| ParfisError::UnknownSpecie(name.to_string()))
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn model(&self) -> &CollisionModel {
        &self.model
    }

    /// Accumulated push counters per specie.
    pub fn counters(&self) -> &[PushCounters] {
        &self.counters
    }

    pub fn state_count(&self, specie_id: usize) -> usize {
        match &self.grid {
            Some(grid) => {
                let offset = self.species[specie_id].head_offset;
                (0..grid.cells.len()).map(|c| self.store.list_len(offset + c)).sum()
            }
            None => 0,
        }
    }

    pub fn view(&self) -> SimView<'_> {
        SimView::new(self.grid.as_ref(), &self.store, &self.species, &self.model, self.evolve_cnt)
    }

    /// Writes the evolve counter, the state arena and the list heads.
    pub fn save_states<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = BufWriter::new(File::create(path.as_ref())?);
        bincode::serialize_into(&mut file, &self.evolve_cnt)?;
        bincode::serialize_into(&mut file, &self.store.states)?;
        bincode::serialize_into(&mut file, &self.store.head_ids)?;
        file.flush()?;
        info!(
            "saved {} states at step {} to {}",
            self.store.len(),
            self.evolve_cnt,
            path.as_ref().display()
        );
        Ok(())
    }

    /// Replaces the states with a checkpoint written by [`Simulation::save_states`].
    /// The cells must already exist and match the layout the checkpoint was taken with.
    pub fn load_states<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let heads = match &self.grid {
            Some(grid) => grid.cells.len() * self.species.len(),
            None => return Err(ParfisError::CellsNotCreated),
        };
        let mut file = BufReader::new(File::open(path.as_ref())?);
        let evolve_cnt: u64 = bincode::deserialize_from(&mut file)?;
        let states = bincode::deserialize_from(&mut file)?;
        let head_ids: Vec<u32> = bincode::deserialize_from(&mut file)?;
        if head_ids.len() != heads {
            return Err(ParfisError::CheckpointMismatch(format!(
                "{} list heads stored, {} expected",
                head_ids.len(),
                heads
            )));
        }
        let mut loaded = ParticleStore { states, head_ids, pushed: Vec::new() };
        if loaded.states.len() >= NO_STATE as usize {
            return Err(ParfisError::CheckpointMismatch(String::from("too many states")));
        }
        loaded.check_lists()?;
        loaded.pushed = vec![false; loaded.states.len()];
        info!(
            "loaded {} states at step {} from {}",
            loaded.len(),
            evolve_cnt,
            path.as_ref().display()
        );
        self.store = loaded;
        self.evolve_cnt = evolve_cnt;
        Ok(())
    }
}
