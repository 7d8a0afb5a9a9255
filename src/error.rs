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

//! Error type shared by every fallible operation of the crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParfisError {
    #[error("cylindrical geometry needs equal x and y extents, got {x} and {y}")]
    AsymmetricGeometry { x: f64, y: f64 },
    #[error("cylindrical geometry needs equal x and y cell sizes, got {x} and {y}")]
    UnequalCellSize { x: f64, y: f64 },
    #[error("{count} cells exceed the grid capacity of {capacity}")]
    CellCountOverCapacity { count: u64, capacity: u64 },
    #[error("cylinder wall reaches into {count} raster cells without an inside corner")]
    UncoveredWall { count: usize },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("unknown gas: {0}")]
    UnknownGas(String),
    #[error("unknown specie: {0}")]
    UnknownSpecie(String),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("cross section table declares {declared} rows but {rows} were read")]
    RowBinMismatch { declared: usize, rows: usize },
    #[error("cross section row {row} exceeds the declared capacity of {declared} rows")]
    InsufficientCapacity { declared: usize, row: usize },
    #[error("malformed table: {0}")]
    MalformedTable(String),
    #[error("collision frequency tables of specie {specie} do not share their bins")]
    TableShapeMismatch { specie: String },
    #[error("cells must be created before states")]
    CellsNotCreated,
    #[error("broken state list: {0}")]
    BrokenList(String),
    #[error("checkpoint does not match the simulation: {0}")]
    CheckpointMismatch(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Bincode(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, ParfisError>;
