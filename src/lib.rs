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

//! 3d3v particle-in-cell engine with Monte Carlo collisions.
//!
//! Particles live in an arena threaded by per-(specie, cell) lists over a grid that
//! only materializes the cells touching the geometry. A step moves every state by at
//! most one cell, reflects it off the walls and relinks it when it changes cells.

pub mod collision;
pub mod config;
pub mod constants;
pub mod error;
pub mod functable;
pub mod geometry;
pub mod integrator;
pub mod mirror;
pub mod registry;
pub mod simulation;
pub mod specie;
pub mod store;
pub mod vec3d;

pub use crate::config::Config;
pub use crate::error::{ParfisError, Result};
pub use crate::functable::FuncTable;
pub use crate::registry::Registry;
pub use crate::simulation::{Command, Domain, Simulation};
pub use crate::vec3d::Vec3D;
