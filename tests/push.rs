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

// Integration of free flight, wall reflections and list relinking.

use parfis::config::{GeometryKind, VelocityDistributionKind};
use parfis::integrator::PushFn;
use parfis::{Config, ParfisError, Simulation};

const R2_SLACK: f64 = 1.0e-5;                              // relative r^2 slack of the containment check

fn small_cylinder(seed: u64) -> Config {
    let mut cfg = Config::default();
    cfg.system.geometry_size = [0.02, 0.02, 0.02];
    cfg.particle.specie[0].random_seed = seed;
    cfg
}

fn assert_contained(sim: &Simulation) {
    let grid = sim.grid().unwrap();
    let view = sim.view();
    let c = grid.axis_center();
    let zmax = f64::from(grid.cell_count.z);
    for cell_id in 0..view.cells.len() {
        let cell = view.cells[cell_id].pos;
        for st in view.cell_states(0, cell_id as u32) {
            for a in 0..3 {
                assert!(st.pos.get(a) >= 0.0 && st.pos.get(a) < 1.0);
            }
            let z = f64::from(cell.z) + st.pos.z;
            assert!(z >= 0.0 && z <= zmax);
            if grid.kind == GeometryKind::Cylindrical {
                let x = f64::from(cell.x) + st.pos.x - c;
                let y = f64::from(cell.y) + st.pos.y - c;
                assert!(x * x + y * y <= grid.radius_sq() * (1.0 + R2_SLACK));
            } else {
                let x = f64::from(cell.x) + st.pos.x;
                let y = f64::from(cell.y) + st.pos.y;
                assert!(x >= 0.0 && x <= f64::from(grid.cell_count.x));
                assert!(y >= 0.0 && y <= f64::from(grid.cell_count.y));
            }
        }
    }
}

fn assert_speed_bound(sim: &Simulation) {
    let specie = &sim.species()[0];
    for st in sim.store().states.iter() {
        assert!(specie.speed_sq(&st.vel) <= 1.0 + 1e-12);
    }
}

#[test]
fn states_stay_inside_the_cylinder() {
    let mut sim = Simulation::new(small_cylinder(17)).unwrap();
    sim.run_chain("create").unwrap();
    let n = sim.store().len();
    for _ in 0..50 {
        sim.run_chain("evolve").unwrap();
    }
    assert_eq!(sim.store().check_lists().unwrap(), n);
    assert_contained(&sim);
    assert_speed_bound(&sim);
    let cnt = sim.counters()[0];
    assert!(cnt.migrated > 0);
    assert!(cnt.reflected > 0);
    assert_eq!(cnt.stuck, 0);
}

#[test]
fn odd_cell_count_cylinder_keeps_every_state_in_a_cell() {
    let mut cfg = small_cylinder(19);
    cfg.system.geometry_size = [0.021, 0.021, 0.006];
    let mut sim = Simulation::new(cfg).unwrap();
    sim.run_chain("create").unwrap();
    let n = sim.store().len();
    for _ in 0..50 {
        sim.run_chain("evolve").unwrap();
    }
    assert_eq!(sim.store().check_lists().unwrap(), n);
    assert_contained(&sim);
    assert!(sim.counters()[0].reflected > 0);
}

#[test]
fn wall_bulging_past_the_raster_fails_before_any_push() {
    let mut cfg = small_cylinder(43);
    cfg.system.geometry_size = [0.02101, 0.02101, 0.006];
    let mut sim = Simulation::new(cfg).unwrap();
    match sim.run_chain("create") {
        Err(ParfisError::UncoveredWall { count }) => assert_eq!(count, 2),
        other => panic!("expected an uncovered wall, got {:?}", other),
    }
    assert!(sim.grid().is_none());
    assert_eq!(sim.store().len(), 0);
}

#[test]
fn reflections_keep_speed() {
    let mut sim = Simulation::new(small_cylinder(23)).unwrap();
    sim.run_chain("create").unwrap();
    let specie = sim.species()[0].clone();
    let before: Vec<f64> = sim.store().states.iter().map(|s| specie.speed_sq(&s.vel)).collect();
    for _ in 0..20 {
        sim.run_chain("evolve").unwrap();
    }
    for (st, s2) in sim.store().states.iter().zip(before.iter()) {
        assert!((specie.speed_sq(&st.vel) - s2).abs() < 1e-12);
    }
}

#[test]
fn axial_field_accelerates_charged_states() {
    let mut cfg = small_cylinder(29);
    cfg.system.timestep = 1.0e-9;
    cfg.system.periodic_boundary = [0, 0, 1];
    cfg.system.field.type_e = [0, 0, 1];
    cfg.system.field.strength_e = [0.0, 0.0, 1.0e4];
    cfg.particle.specie[0].e_charge = 1;
    cfg.particle.specie[0].vel_init_dist_min = [-0.5; 3];
    cfg.particle.specie[0].vel_init_dist_max = [0.5; 3];
    let mut sim = Simulation::new(cfg).unwrap();
    let dvz = match sim.species()[0].push {
        PushFn::UniformFieldZ(dv) => dv,
        other => panic!("expected a field kick, got {:?}", other),
    };
    assert!(dvz > 0.0 && dvz < 0.01);

    sim.run_chain("create").unwrap();
    let before: Vec<f64> = sim.store().states.iter().map(|s| s.vel.z).collect();
    sim.run_chain("evolve").unwrap();
    for (st, vz) in sim.store().states.iter().zip(before.iter()) {
        assert!((st.vel.z - vz - dvz).abs() < 1e-12);
    }
    assert_contained(&sim);
}

#[test]
fn periodic_box_wraps_every_axis() {
    let mut cfg = Config::default();
    cfg.system.geometry = GeometryKind::Cubical;
    cfg.system.geometry_size = [0.008, 0.008, 0.008];
    cfg.system.periodic_boundary = [1, 1, 1];
    cfg.particle.specie[0].random_seed = 31;
    let mut sim = Simulation::new(cfg).unwrap();
    sim.run_chain("create").unwrap();
    let n = sim.store().len();
    for _ in 0..40 {
        sim.run_chain("evolve").unwrap();
    }
    assert_eq!(sim.store().check_lists().unwrap(), n);
    assert_contained(&sim);
    let cnt = sim.counters()[0];
    assert!(cnt.wrapped > 0);
    assert_eq!(cnt.reflected, 0);
}

#[test]
fn closed_box_reflects() {
    let mut cfg = Config::default();
    cfg.system.geometry = GeometryKind::Cubical;
    cfg.system.geometry_size = [0.008, 0.008, 0.008];
    cfg.particle.specie[0].random_seed = 37;
    let mut sim = Simulation::new(cfg).unwrap();
    sim.run_chain("create").unwrap();
    for _ in 0..40 {
        sim.run_chain("evolve").unwrap();
    }
    assert_contained(&sim);
    assert_speed_bound(&sim);
    assert!(sim.counters()[0].reflected > 0);
    assert_eq!(sim.counters()[0].wrapped, 0);
}

#[test]
fn subcycled_species_move_less_often() {
    let mut cfg = small_cylinder(41);
    cfg.system.timestep = 1.0e-9;
    let mut slow = cfg.particle.specie[0].clone();
    slow.name = String::from("slow");
    slow.timestep_ratio = 4;
    slow.amu_mass = 40.0;
    slow.vel_init_dist = VelocityDistributionKind::Maxwellian;
    cfg.particle.specie.push(slow);
    let mut sim = Simulation::new(cfg).unwrap();
    sim.run_chain("create").unwrap();
    let n_fast = sim.state_count(0) as u64;
    let n_slow = sim.state_count(1) as u64;
    for _ in 0..8 {
        sim.run_chain("evolve").unwrap();
    }
    assert_eq!(sim.counters()[0].pushed, 8 * n_fast);
    assert_eq!(sim.counters()[1].pushed, 2 * n_slow);
    assert_eq!(sim.store().check_lists().unwrap(), sim.store().len());
}
