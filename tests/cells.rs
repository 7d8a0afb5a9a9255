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

// Cell grid and state seeding fixtures of the reference cylinder.

use parfis::constants::PI;
use parfis::{Config, Simulation};

#[test]
fn reference_cylinder_cell_count() {
    let cfg = Config::default();
    let mut sim = Simulation::new(cfg).unwrap();
    sim.run("createCells").unwrap();
    let grid = sim.grid().unwrap();
    assert_eq!(grid.cell_count.x, 20);
    assert_eq!(grid.cell_count.y, 20);
    assert_eq!(grid.cell_count.z, 400);
    assert_eq!(grid.raster_len(), 160000);
    assert_eq!(grid.cells.len(), 139200);
    assert_eq!(grid.interior_ids.len() + grid.boundary_ids.len(), 139200);
}

#[test]
fn seeded_states_fill_the_cylinder_volume() {
    let mut cfg = Config::default();
    cfg.particle.specie[0].random_seed = 42;
    let mut sim = Simulation::new(cfg).unwrap();
    sim.run_chain("create").unwrap();

    let grid = sim.grid().unwrap();
    let box_states = (grid.raster_len() * 10) as f64;
    let ratio = sim.store().len() as f64 / box_states;
    let expected = PI / 4.0;
    assert!(
        ((ratio - expected) / expected).abs() < 0.005,
        "volume ratio {} against {}",
        ratio,
        expected
    );
    assert_eq!(sim.store().check_lists().unwrap(), sim.store().len());

    // every seeded state lies inside the cylinder
    let c = grid.axis_center();
    let view = sim.view();
    for (cell_id, cell) in view.cells.iter().enumerate().step_by(97) {
        for st in view.cell_states(0, cell_id as u32) {
            let x = f64::from(cell.pos.x) + st.pos.x - c;
            let y = f64::from(cell.pos.y) + st.pos.y - c;
            assert!(x * x + y * y < grid.radius_sq());
        }
    }
}

#[test]
fn full_cells_get_every_sample() {
    let mut cfg = Config::default();
    cfg.system.geometry_size = [0.01, 0.01, 0.01];
    cfg.particle.specie[0].random_seed = 3;
    let mut sim = Simulation::new(cfg).unwrap();
    sim.run_chain("create").unwrap();
    let view = sim.view();
    for (cell_id, &flag) in view.node_flags.iter().enumerate() {
        if flag == parfis::geometry::NODE_FULL {
            assert_eq!(view.cell_states(0, cell_id as u32).len(), 10);
        }
    }
}
