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

//! Simulation configuration.
//!
//! Everything the engine needs is read from a TOML document into [`Config`]. Missing
//! keys fall back to the reference setup: a 2 cm wide, 40 cm long cylinder cut into
//! 1 mm cells holding one neutral specie.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_CELL_COUNT;
use crate::error::{ParfisError, Result};
use crate::vec3d::Vec3D;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Cylindrical,
    Cubical,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum VelocityDistributionKind {
    Uniform,
    Maxwellian,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum CollisionKind {
    Elastic,
    Inelastic,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct FieldConfig {
    pub type_e: [i32; 3],                                  // 0 = none, 1 = uniform
    pub strength_e: [f64; 3],                              // [V/m]
    pub type_b: [i32; 3],
    pub strength_b: [f64; 3],                              // [T]
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            type_e: [0; 3],
            strength_e: [0.0; 3],
            type_b: [0; 3],
            strength_b: [0.0; 3],
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct GasConfig {
    pub name: String,
    pub amu_mass: f64,
    pub volume_fraction: f64,
    pub temperature: f64,                                  // [K]
    pub mol_density: f64,                                  // [mol/m^3]
}

impl Default for GasConfig {
    fn default() -> Self {
        GasConfig {
            name: String::from("bck"),
            amu_mass: 4.0,
            volume_fraction: 1.0,
            temperature: 0.0,
            mol_density: 0.1660539067173,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct SystemConfig {
    pub geometry: GeometryKind,
    pub timestep: f64,                                     // [s]
    pub geometry_size: [f64; 3],                           // [m]
    pub cell_size: [f64; 3],                               // [m]
    pub periodic_boundary: [i32; 3],                       // nonzero wraps the axis
    pub field: FieldConfig,
    pub gas: Vec<GasConfig>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            geometry: GeometryKind::Cylindrical,
            timestep: 1.0,
            geometry_size: [0.02, 0.02, 0.4],
            cell_size: [1.0e-3, 1.0e-3, 1.0e-3],
            periodic_boundary: [0, 0, 0],
            field: FieldConfig::default(),
            gas: Vec::new(),
        }
    }
}

const INIT_VEL_BOUND: f64 = 0.5773502691;                 // 1/sqrt(3), keeps |v| below one cell per step

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct SpecieConfig {
    pub name: String,
    pub states_per_cell: u32,
    pub timestep_ratio: u32,
    pub amu_mass: f64,
    pub e_charge: i32,
    pub vel_init_dist: VelocityDistributionKind,
    pub vel_init_dist_min: [f64; 3],                       // normalized units
    pub vel_init_dist_max: [f64; 3],
    pub vel_init_temperature: f64,                         // [K], maxwellian only
    pub random_seed: u64,                                  // 0 seeds from entropy
    pub gas_collisions: Vec<String>,
}

impl Default for SpecieConfig {
    fn default() -> Self {
        SpecieConfig {
            name: String::from("a"),
            states_per_cell: 10,
            timestep_ratio: 1,
            amu_mass: 1.0,
            e_charge: 0,
            vel_init_dist: VelocityDistributionKind::Uniform,
            vel_init_dist_min: [-INIT_VEL_BOUND; 3],
            vel_init_dist_max: [INIT_VEL_BOUND; 3],
            vel_init_temperature: 300.0,
            random_seed: 0,
            gas_collisions: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct GasCollisionConfig {
    pub name: String,                                      // "<specie>.<label>"
    pub file: String,
    pub kind: CollisionKind,
    pub threshold_ev: f64,
    pub gas: String,
}

impl Default for GasCollisionConfig {
    fn default() -> Self {
        GasCollisionConfig {
            name: String::new(),
            file: String::new(),
            kind: CollisionKind::Elastic,
            threshold_ev: 0.0,
            gas: String::from("bck"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct ParticleConfig {
    pub specie: Vec<SpecieConfig>,
    pub gas_collision: Vec<GasCollisionConfig>,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        ParticleConfig {
            specie: vec![SpecieConfig::default()],
            gas_collision: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct CommandChainConfig {
    pub create: Vec<String>,
    pub evolve: Vec<String>,
}

impl Default for CommandChainConfig {
    fn default() -> Self {
        CommandChainConfig {
            create: vec![String::from("createCells"), String::from("createStates")],
            evolve: vec![String::from("pushStates")],
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub system: SystemConfig,
    pub particle: ParticleConfig,
    pub command_chain: CommandChainConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Config> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let text = std::fs::read_to_string(path)?;
        Config::from_toml_str(&text)
    }

    /// Number of cells per axis, rounded up so the grid covers the whole geometry.
    pub fn cell_count(&self) -> Vec3D<u64> {
        let g = self.system.geometry_size;
        let c = self.system.cell_size;
        Vec3D::new(
            (g[0] / c[0]).ceil() as u64,
            (g[1] / c[1]).ceil() as u64,
            (g[2] / c[2]).ceil() as u64,
        )
    }

    pub fn chain(&self, name: &str) -> Option<&[String]> {
        match name {
            "create" => Some(&self.command_chain.create),
            "evolve" => Some(&self.command_chain.evolve),
            _ => None,
        }
    }

    /// Checks everything that must hold before cells are built.
    pub fn validate(&self) -> Result<()> {
        let sys = &self.system;
        if !(sys.timestep > 0.0) {
            return Err(ParfisError::InvalidParameter(format!("timestep = {}", sys.timestep)));
        }
        for axis in 0..3 {
            if !(sys.geometry_size[axis] > 0.0) || !(sys.cell_size[axis] > 0.0) {
                return Err(ParfisError::InvalidParameter(format!(
                    "geometry_size = {:?}, cell_size = {:?}",
                    sys.geometry_size, sys.cell_size
                )));
            }
        }
        if sys.geometry == GeometryKind::Cylindrical {
            if sys.geometry_size[0] != sys.geometry_size[1] {
                return Err(ParfisError::AsymmetricGeometry {
                    x: sys.geometry_size[0],
                    y: sys.geometry_size[1],
                });
            }
            if sys.cell_size[0] != sys.cell_size[1] {
                return Err(ParfisError::UnequalCellSize {
                    x: sys.cell_size[0],
                    y: sys.cell_size[1],
                });
            }
        }

        let count = self.cell_count();
        let total = count.x.saturating_mul(count.y).saturating_mul(count.z);
        let axis_limit = u64::from(u16::MAX);
        if total > MAX_CELL_COUNT || count.x > axis_limit || count.y > axis_limit || count.z > axis_limit {
            return Err(ParfisError::CellCountOverCapacity { count: total, capacity: MAX_CELL_COUNT });
        }

        for axis in 0..3 {
            if sys.field.type_b[axis] != 0 && sys.field.strength_b[axis] != 0.0 {
                return Err(ParfisError::InvalidParameter(String::from("magnetic fields are not integrated")));
            }
            if axis < 2 && sys.field.type_e[axis] != 0 && sys.field.strength_e[axis] != 0.0 {
                return Err(ParfisError::InvalidParameter(String::from("only an axial electric field is integrated")));
            }
        }

        for gas in sys.gas.iter() {
            if !(gas.amu_mass > 0.0) || gas.mol_density < 0.0 || gas.volume_fraction < 0.0 {
                return Err(ParfisError::InvalidParameter(format!("gas {}", gas.name)));
            }
        }

        for spec in self.particle.specie.iter() {
            if spec.timestep_ratio == 0 || !(spec.amu_mass > 0.0) {
                return Err(ParfisError::InvalidParameter(format!("specie {}", spec.name)));
            }
            for col_name in spec.gas_collisions.iter() {
                let col = self
                    .particle
                    .gas_collision
                    .iter()
                    .find(|c| &c.name == col_name)
                    .ok_or_else(|| ParfisError::InvalidParameter(format!("unknown gas collision {}", col_name)))?;
                if !sys.gas.iter().any(|g| g.name == col.gas) {
                    return Err(ParfisError::UnknownGas(col.gas.clone()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cell_count_covers_geometry() {
        let cfg = Config::default();
        assert_eq!(cfg.cell_count(), Vec3D::new(20, 20, 400));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn too_fine_cells_are_rejected() {
        let mut cfg = Config::default();
        cfg.system.cell_size = [1.0e-6, 1.0e-6, 1.0e-6];
        match cfg.validate() {
            Err(ParfisError::CellCountOverCapacity { .. }) => {}
            other => panic!("expected capacity error, got {:?}", other),
        }
    }

    #[test]
    fn cylinder_needs_square_section() {
        let mut cfg = Config::default();
        cfg.system.geometry_size = [0.02, 0.03, 0.4];
        assert!(matches!(cfg.validate(), Err(ParfisError::AsymmetricGeometry { .. })));
        cfg.system.geometry = GeometryKind::Cubical;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn toml_overrides_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            [system]
            geometry = "cubical"
            cell_size = [2.0e-3, 2.0e-3, 2.0e-3]

            [[system.gas]]
            name = "bck"
            amu_mass = 4.0

            [[particle.specie]]
            name = "electron"
            amu_mass = 0.00054858
            e_charge = -1
            gas_collisions = ["electron.elastic"]

            [[particle.gas_collision]]
            name = "electron.elastic"
            file = "simple_e.csv"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.system.geometry, GeometryKind::Cubical);
        assert_eq!(cfg.system.timestep, 1.0);
        assert_eq!(cfg.particle.specie.len(), 1);
        assert_eq!(cfg.particle.specie[0].states_per_cell, 10);
        assert_eq!(cfg.particle.gas_collision[0].kind, CollisionKind::Elastic);
        assert_eq!(cfg.chain("evolve").unwrap(), &[String::from("pushStates")][..]);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn collision_with_unknown_gas_is_rejected() {
        let mut cfg = Config::default();
        cfg.particle.specie[0].gas_collisions = vec![String::from("a.elastic")];
        cfg.particle.gas_collision.push(GasCollisionConfig {
            name: String::from("a.elastic"),
            ..GasCollisionConfig::default()
        });
        assert!(matches!(cfg.validate(), Err(ParfisError::UnknownGas(_))));
    }
}
