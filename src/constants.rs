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

//! Physical constants and fixed numerical limits.

// physical constants

pub const PI: f64                = std::f64::consts::PI;   // mathematical constant Pi
pub const TWO_PI: f64            = 2.0 * PI;               // two times Pi
pub const KG_IN_AMU: f64         = 1.66053906660e-27;      // atomic mass unit [kg]
pub const ELEMENTARY_CHARGE: f64 = 1.602176634e-19;        // elementary charge [C]
pub const EV_TO_J: f64           = ELEMENTARY_CHARGE;      // eV <-> Joule conversion factor
pub const K_BOLTZMANN: f64       = 1.380649e-23;           // Boltzmann's constant [J/K]
pub const AVOGADRO: f64          = 6.02214076e23;          // Avogadro's number [1/mol]
pub const ANGSTROM_SQ: f64       = 1.0e-20;                // cross sections are tabulated in [A^2]

// index space

pub type CellId = u32;                                     // compact index into the cell vector
pub type StateId = u32;                                    // index into the state arena
pub type CellPos = u16;                                    // one component of a cell grid position

pub const NO_CELL: CellId        = u32::MAX;               // absolute grid position without a cell
pub const NO_STATE: StateId      = u32::MAX;               // end of a (specie, cell) list
pub const MAX_CELL_COUNT: u64    = (u32::MAX - 1) as u64;  // raster positions addressable by CellId

// integration limits

pub const BELOW_ONE: f64         = 1.0 - f64::EPSILON / 2.0; // largest f64 below 1.0
pub const MAX_REFLECTIONS: u32   = 16;                     // reflections resolved within one step
pub const WALL_CLEARANCE: f64    = 1.0e-9;                 // relative radius kept when pulled off the wall
