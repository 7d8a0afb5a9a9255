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

use std::env;
use std::path::Path;
use std::time::Instant;

use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record};

use parfis::{Config, Simulation};

const CHECKPOINT: &str = "parfis_states.bin";
const REPORT_EVERY: u64 = 100;                            // evolve steps between progress lines

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Info => println!(">> parfis: {}", record.args()),
            level => println!(">> parfis: {}: {}", level, record.args()),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

//------------------------------------------------------------------------------------------//
// main                                                                                     //
// command line arguments:                                                                  //
// [1]: number of evolve steps (0 creates the initial states)                               //
// [2]: optional TOML configuration file                                                    //
//------------------------------------------------------------------------------------------//

fn main() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
    info!("starting...");

    let args: Vec<String> = env::args().collect();
    let steps: u64 = match args.get(1).map(|a| a.parse()) {
        Some(Ok(n)) => n,
        _ => {
            error!("need the number of steps as first argument, e.g. parfis 0 or parfis 1000 config.toml");
            std::process::exit(1);
        }
    };
    if let Err(err) = run(steps, args.get(2).map(String::as_str)) {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn run(steps: u64, cfg_path: Option<&str>) -> parfis::Result<()> {
    let start = Instant::now();
    let cfg = match cfg_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let mut sim = Simulation::new(cfg)?;

    let resume = steps > 0 && Path::new(CHECKPOINT).exists();
    if steps == 0 && Path::new(CHECKPOINT).exists() {
        warn!("a previous checkpoint is overwritten by the initial states");
    }
    if resume {
        sim.run("createCells")?;
        sim.load_states(CHECKPOINT)?;
    } else {
        sim.run_chain("create")?;
    }

    if steps > 0 {
        info!("running {} steps...", steps);
        for step in 1..=steps {
            sim.run_chain("evolve")?;
            if step % REPORT_EVERY == 0 || step == steps {
                let moved: u64 = sim.counters().iter().map(|c| c.migrated).sum();
                let hits: u64 = sim.counters().iter().map(|c| c.reflected).sum();
                info!(
                    "step {:8}   states {:10}   migrations {:12}   wall hits {:10}",
                    sim.evolve_cnt(),
                    sim.store().len(),
                    moved,
                    hits
                );
            }
        }
    }

    sim.save_states(CHECKPOINT)?;
    info!(
        "simulation of {} step(s) completed in {:.3} sec.",
        steps,
        0.001 * start.elapsed().as_millis() as f64
    );
    Ok(())
}
