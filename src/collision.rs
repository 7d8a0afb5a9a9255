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

//! Monte Carlo collisions against a cold background gas.
//!
//! Cross sections are tabulated against energy in eV. Each one is turned into a
//! per-step collision frequency against the squared speed in units of `max_vel`,
//! and the frequencies of one specie are folded into a single cumulative
//! probability table (null-collision method): a draw above the last column means
//! no collision.

use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{CollisionKind, Config, GasConfig};
use crate::constants::{ANGSTROM_SQ, AVOGADRO, BELOW_ONE, KG_IN_AMU, PI, TWO_PI};
use crate::error::{ParfisError, Result};
use crate::functable::FuncTable;
use crate::specie::Specie;
use crate::vec3d::Vec3D;

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Gas {
    pub name: String,
    pub amu_mass: f64,
    pub mass: f64,                                         // [kg]
    pub volume_fraction: f64,
    pub temperature: f64,                                  // [K]
    pub mol_density: f64,                                  // [mol/m^3]
}

impl Gas {
    pub fn new(cfg: &GasConfig) -> Gas {
        Gas {
            name: cfg.name.clone(),
            amu_mass: cfg.amu_mass,
            mass: cfg.amu_mass * KG_IN_AMU,
            volume_fraction: cfg.volume_fraction,
            temperature: cfg.temperature,
            mol_density: cfg.mol_density,
        }
    }

    /// Number density [1/m^3].
    pub fn density(&self) -> f64 {
        self.mol_density * self.volume_fraction * AVOGADRO
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct GasCollision {
    pub name: String,
    pub specie_id: usize,
    pub gas_id: usize,
    pub kind: CollisionKind,
    pub threshold_ev: f64,
    pub file: String,
    pub xsec: FuncTable,                                   // [A^2] against [eV]
    pub freq: FuncTable,                                   // per step against (v / max_vel)^2
}

/// Collision frequency per specie timestep, sampled at the rows of `xsec`.
pub fn calculate_col_freq(xsec: &FuncTable, specie: &Specie, gas: &Gas) -> FuncTable {
    let inv_ev = 1.0 / specie.max_ev;
    let scale = gas.density() * ANGSTROM_SQ * specie.max_vel * specie.dt;
    let x_vec: Vec<f64> = xsec.x_vec.iter().map(|&e| e * inv_ev).collect();
    let y_vec = (0..xsec.row_count())
        .map(|i| {
            let sigma = xsec.row(i)[0].max(0.0);
            scale * sigma * x_vec[i].max(0.0).sqrt()
        })
        .collect();
    FuncTable {
        ranges: xsec.ranges.iter().map(|&r| r * inv_ev).collect(),
        nbins: xsec.nbins.clone(),
        idx: xsec.idx.iter().map(|&i| i * specie.max_ev).collect(),
        x_vec,
        y_vec,
        col_cnt: 1,
    }
}

/// Cumulative collision probabilities of one specie.
///
/// Column `c < n` holds the probability that one of the first `c + 1` collisions
/// happens within a step, column `n` the total probability `1 - exp(-sum freq)`.
pub fn calculate_col_prob(specie: &Specie, collisions: &[&GasCollision]) -> Result<FuncTable> {
    let first = match collisions.first() {
        Some(c) => &c.freq,
        None => return Err(ParfisError::InvalidParameter(format!("specie {} has no collisions", specie.name))),
    };
    for col in collisions.iter() {
        if col.freq.nbins != first.nbins || col.freq.ranges != first.ranges || col.freq.row_count() != first.row_count() {
            return Err(ParfisError::TableShapeMismatch { specie: specie.name.clone() });
        }
    }
    let n = collisions.len();
    let mut prob = FuncTable {
        ranges: first.ranges.clone(),
        nbins: first.nbins.clone(),
        idx: first.idx.clone(),
        x_vec: first.x_vec.clone(),
        y_vec: vec![0.0; first.row_count() * (n + 1)],
        col_cnt: n + 1,
    };
    for i in 0..prob.row_count() {
        let row = prob.row_mut(i);
        let mut sum = 0.0;
        for (c, col) in collisions.iter().enumerate() {
            sum += col.freq.y_vec[i];
            row[c] = sum;
        }
        let total = sum;
        let p = (1.0 - (-total).exp()).min(BELOW_ONE);
        for v in row[..n].iter_mut() {
            let rel = if total > 0.0 { *v / total } else { 0.0 };
            *v = rel * p;
        }
        row[n] = p;
    }
    Ok(prob)
}

/// Index of the collision selected by the uniform draw `u`, if any.
pub fn select_collision(prob: &FuncTable, speed_sq: f64, u: f64) -> Option<usize> {
    if prob.row_count() == 0 {
        return None;
    }
    let row = prob.row(prob.row_index(speed_sq));
    row[..prob.col_cnt - 1].iter().position(|&p| u < p)
}

/// Scatters `g` (velocity in units of `max_vel`) isotropically in the centre of mass
/// frame of a collision with a gas atom at rest. `loss` is the energy removed from
/// the collision in units of `max_ev`.
pub fn scatter_cold_gas<R: Rng>(g: Vec3D<f64>, mass_ratio: f64, loss: f64, rng: &mut R) -> Vec3D<f64> {
    let f1 = mass_ratio / (1.0 + mass_ratio);              // m / (m + M)
    let f2 = 1.0 / (1.0 + mass_ratio);                     // M / (m + M)
    let w = Vec3D::new(f1 * g.x, f1 * g.y, f1 * g.z);
    let g2 = g.norm_sq();
    if g2 == 0.0 {
        return g;
    }
    // the threshold comes off the relative energy f2 * g^2
    let gm = if loss > 0.0 { (g2 - loss / f2).max(0.0).sqrt() } else { g2.sqrt() };

    // Euler angles of the incoming direction
    let theta = if g.x == 0.0 { 0.5 * PI } else { (g.y * g.y + g.z * g.z).sqrt().atan2(g.x) };
    let phi = if g.y == 0.0 {
        if g.z > 0.0 { 0.5 * PI } else { -0.5 * PI }
    } else {
        g.z.atan2(g.y)
    };
    let chi = (1.0 - 2.0 * rng.gen::<f64>()).acos();
    let eta = TWO_PI * rng.gen::<f64>();

    let (sc, cc) = chi.sin_cos();
    let (se, ce) = eta.sin_cos();
    let (st, ct) = theta.sin_cos();
    let (sp, cp) = phi.sin_cos();
    let gx = gm * (ct * cc - st * sc * ce);
    let gy = gm * (st * cp * cc + ct * cp * sc * ce - sp * sc * se);
    let gz = gm * (st * sp * cc + ct * sp * sc * ce + cp * sc * se);
    Vec3D::new(w.x + f2 * gx, w.y + f2 * gy, w.z + f2 * gz)
}

#[derive(Clone, Debug, Default)]
pub struct CollisionModel {
    pub gases: Vec<Gas>,
    pub collisions: Vec<GasCollision>,
    pub prob: Vec<FuncTable>,
}

impl CollisionModel {
    /// Loads the cross sections of every specie and builds the frequency and
    /// probability tables. Collision and probability ids are stored on the species.
    pub fn load(cfg: &Config, species: &mut [Specie]) -> Result<CollisionModel> {
        let gases: Vec<Gas> = cfg.system.gas.iter().map(Gas::new).collect();
        let mut collisions = Vec::new();
        let mut prob = Vec::new();
        for specie in species.iter_mut() {
            specie.gas_collision_ids.clear();
            specie.prob_id = None;
            let spec_cfg = cfg
                .particle
                .specie
                .iter()
                .find(|s| s.name == specie.name)
                .ok_or_else(|| ParfisError::UnknownSpecie(specie.name.clone()))?;
            for col_name in spec_cfg.gas_collisions.iter() {
                let col_cfg = cfg
                    .particle
                    .gas_collision
                    .iter()
                    .find(|c| &c.name == col_name)
                    .ok_or_else(|| ParfisError::InvalidParameter(format!("unknown gas collision {}", col_name)))?;
                let gas_id = gases
                    .iter()
                    .position(|g| g.name == col_cfg.gas)
                    .ok_or_else(|| ParfisError::UnknownGas(col_cfg.gas.clone()))?;
                let xsec = FuncTable::load_file(&col_cfg.file)?;
                let freq = calculate_col_freq(&xsec, specie, &gases[gas_id]);
                specie.gas_collision_ids.push(collisions.len());
                collisions.push(GasCollision {
                    name: col_cfg.name.clone(),
                    specie_id: specie.id,
                    gas_id,
                    kind: col_cfg.kind,
                    threshold_ev: col_cfg.threshold_ev,
                    file: col_cfg.file.clone(),
                    xsec,
                    freq,
                });
            }
            if !specie.gas_collision_ids.is_empty() {
                let own: Vec<&GasCollision> = specie.gas_collision_ids.iter().map(|&i| &collisions[i]).collect();
                let table = calculate_col_prob(specie, &own)?;
                specie.prob_id = Some(prob.len());
                prob.push(table);
                info!(
                    "built collision probability table of specie {} with {} collision(s) and {} rows",
                    specie.name,
                    own.len(),
                    prob[prob.len() - 1].row_count()
                );
            }
        }
        Ok(CollisionModel { gases, collisions, prob })
    }

    /// Samples at most one collision for a state and updates its velocity.
    pub fn collide<R: Rng>(&self, specie: &Specie, vel: &mut Vec3D<f64>, rng: &mut R) -> bool {
        let table = match specie.prob_id {
            Some(id) => &self.prob[id],
            None => return false,
        };
        let s2 = specie.speed_sq(vel);
        let c = match select_collision(table, s2, rng.gen::<f64>()) {
            Some(c) => c,
            None => return false,
        };
        let col = &self.collisions[specie.gas_collision_ids[c]];
        let loss = match col.kind {
            CollisionKind::Elastic => 0.0,
            CollisionKind::Inelastic => col.threshold_ev / specie.max_ev,
        };
        let sc = specie.vel_scale;
        let g = Vec3D::new(vel.x * sc.x, vel.y * sc.y, vel.z * sc.z);
        let out = scatter_cold_gas(g, specie.mass / self.gases[col.gas_id].mass, loss, rng);
        *vel = Vec3D::new(out.x / sc.x, out.y / sc.y, out.z / sc.z);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn specie() -> Specie {
        let mut cfg = Config::default();
        cfg.system.timestep = 1.0e-8;
        Specie::new(0, &cfg.particle.specie[0], &cfg.system).unwrap()
    }

    fn collision(specie: &Specie, gas: &Gas, sigma: f64) -> GasCollision {
        let xsec = FuncTable::from_fn(&[0.0, 1.0, 100.0], &[100, 100], |_| sigma).unwrap();
        let freq = calculate_col_freq(&xsec, specie, gas);
        GasCollision {
            name: String::from("a.test"),
            specie_id: 0,
            gas_id: 0,
            kind: CollisionKind::Elastic,
            threshold_ev: 0.0,
            file: String::new(),
            xsec,
            freq,
        }
    }

    #[test]
    fn frequency_follows_speed() {
        let s = specie();
        let gas = Gas::new(&GasConfig::default());
        let col = collision(&s, &gas, 5.0);
        assert_eq!(col.freq.row_count(), 200);
        // x is the squared speed in units of max_vel
        let expected = gas.density() * 5.0 * ANGSTROM_SQ * s.max_vel * s.dt;
        let row = col.freq.row_index(10.0 / s.max_ev);
        let x = col.freq.x_vec[row];
        assert!((col.freq.y_vec[row] - expected * x.sqrt()).abs() < 1e-9 * expected);
        assert!((col.freq.ranges[2] - 100.0 / s.max_ev).abs() < 1e-12 * col.freq.ranges[2]);
    }

    #[test]
    fn probability_rows_are_cumulative() {
        let s = specie();
        let gas = Gas::new(&GasConfig::default());
        let a = collision(&s, &gas, 5.0);
        let b = collision(&s, &gas, 15.0);
        let prob = calculate_col_prob(&s, &[&a, &b]).unwrap();
        assert_eq!(prob.col_cnt, 3);
        assert_eq!(prob.row_count(), 200);
        for i in 0..prob.row_count() {
            let row = prob.row(i);
            assert!(row.windows(2).all(|w| w[0] <= w[1]));
            assert!(row[2] >= 0.0 && row[2] < 1.0);
            let total = a.freq.y_vec[i] + b.freq.y_vec[i];
            assert!((row[0] - 0.25 * row[2]).abs() <= 1e-12);
            assert!((row[2] - (1.0 - (-total).exp())).abs() <= 1e-12);
        }
    }

    #[test]
    fn zero_frequency_rows_never_collide() {
        let s = specie();
        let gas = Gas::new(&GasConfig::default());
        let a = collision(&s, &gas, 0.0);
        let prob = calculate_col_prob(&s, &[&a]).unwrap();
        assert!(prob.y_vec.iter().all(|&p| p == 0.0));
        assert_eq!(select_collision(&prob, 0.5, 0.0), None);
    }

    #[test]
    fn mismatched_tables_are_rejected() {
        let s = specie();
        let gas = Gas::new(&GasConfig::default());
        let a = collision(&s, &gas, 1.0);
        let mut b = collision(&s, &gas, 1.0);
        b.freq.nbins = vec![50, 150];
        assert!(matches!(
            calculate_col_prob(&s, &[&a, &b]),
            Err(ParfisError::TableShapeMismatch { .. })
        ));
    }

    #[test]
    fn selection_walks_the_columns() {
        let mut prob = FuncTable::with_layout(&[1.0], &[1], 3).unwrap();
        prob.row_mut(0).copy_from_slice(&[0.1, 0.3, 0.3]);
        assert_eq!(select_collision(&prob, 0.5, 0.05), Some(0));
        assert_eq!(select_collision(&prob, 0.5, 0.2), Some(1));
        assert_eq!(select_collision(&prob, 0.5, 0.3), None);
    }

    #[test]
    fn scattering_never_speeds_up() {
        let mut rng = StdRng::seed_from_u64(3);
        for i in 0..1000 {
            let g = Vec3D::new(0.3, -0.2 + 0.0004 * i as f64, 0.1);
            let before = g.norm_sq();
            let elastic = scatter_cold_gas(g, 0.25, 0.0, &mut rng);
            assert!(elastic.norm_sq() <= before * (1.0 + 1e-12));
            let inelastic = scatter_cold_gas(g, 0.25, 0.05, &mut rng);
            assert!(inelastic.norm_sq() <= before);
        }
        // light particles keep their speed in elastic events
        let g = Vec3D::new(0.0, 0.0, 0.5);
        let out = scatter_cold_gas(g, 1.0e-6, 0.0, &mut rng);
        assert!((out.norm_sq().sqrt() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn inelastic_loss_comes_off_the_centre_of_mass_energy() {
        let mut rng = StdRng::seed_from_u64(5);
        let loss = 0.04;
        for &mass_ratio in [1.0, 0.25, 4.0].iter() {
            let f1 = mass_ratio / (1.0 + mass_ratio);
            let f2 = 1.0 / (1.0 + mass_ratio);
            let g = Vec3D::new(0.2, 0.4, -0.3);
            let w = Vec3D::new(f1 * g.x, f1 * g.y, f1 * g.z);
            let out = scatter_cold_gas(g, mass_ratio, loss, &mut rng);
            let rel = Vec3D::new((out.x - w.x) / f2, (out.y - w.y) / f2, (out.z - w.z) / f2);
            let e_before = f2 * g.norm_sq();
            let e_after = f2 * rel.norm_sq();
            assert!((e_before - e_after - loss).abs() < 1e-12, "mass ratio {}", mass_ratio);
        }
        // below threshold the relative motion stops and the pair moves with the centre of mass
        let g = Vec3D::new(0.1, 0.0, 0.0);
        let out = scatter_cold_gas(g, 1.0, 0.5, &mut rng);
        assert!((out.x - 0.05).abs() < 1e-15 && out.y.abs() < 1e-15 && out.z.abs() < 1e-15);
    }
}
