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

//! Per-specie parameters derived from the configuration.
//!
//! Velocities are stored in cells per specie timestep, one unit per axis. The
//! derived quantities below convert between that system and physical units.

use rand::prelude::*;
use rand_distr::Normal;

use crate::config::{SpecieConfig, SystemConfig, VelocityDistributionKind};
use crate::constants::{BELOW_ONE, ELEMENTARY_CHARGE, EV_TO_J, KG_IN_AMU, K_BOLTZMANN};
use crate::error::{ParfisError, Result};
use crate::integrator::PushFn;
use crate::vec3d::Vec3D;

const MAX_VELOCITY_DRAWS: u32 = 1000;                    // maxwellian redraws before rescaling

#[derive(Clone, Debug)]
pub enum VelocityInit {
    Uniform { min: Vec3D<f64>, max: Vec3D<f64> },
    Maxwellian([Normal<f64>; 3]),
}

#[derive(Clone, Debug)]
pub struct Specie {
    pub id: usize,
    pub name: String,
    pub states_per_cell: u32,
    pub timestep_ratio: u32,
    pub dt: f64,                                           // [s]
    pub amu_mass: f64,
    pub mass: f64,                                         // [kg]
    pub charge: f64,                                       // [C]
    pub max_vel: f64,                                      // [m/s], one smallest cell per step
    pub max_ev: f64,                                       // [eV], kinetic energy at max_vel
    pub vel_scale: Vec3D<f64>,                             // cell_size / min(cell_size)
    pub head_offset: usize,                                // first head id of this specie
    pub vel_init: VelocityInit,
    pub random_seed: u64,
    pub push: PushFn,
    pub gas_collision_ids: Vec<usize>,
    pub prob_id: Option<usize>,
}

impl Specie {
    pub fn new(id: usize, cfg: &SpecieConfig, sys: &SystemConfig) -> Result<Specie> {
        if cfg.timestep_ratio == 0 || !(cfg.amu_mass > 0.0) {
            return Err(ParfisError::InvalidParameter(format!("specie {}", cfg.name)));
        }
        let cell_size = Vec3D::from(sys.cell_size);
        let min_cs = cell_size.min_component();
        let dt = sys.timestep * f64::from(cfg.timestep_ratio);
        let mass = cfg.amu_mass * KG_IN_AMU;
        let charge = f64::from(cfg.e_charge) * ELEMENTARY_CHARGE;
        let max_vel = min_cs / dt;
        let max_ev = 0.5 * mass * max_vel * max_vel / EV_TO_J;

        let vel_init = match cfg.vel_init_dist {
            VelocityDistributionKind::Uniform => VelocityInit::Uniform {
                min: Vec3D::from(cfg.vel_init_dist_min),
                max: Vec3D::from(cfg.vel_init_dist_max),
            },
            VelocityDistributionKind::Maxwellian => {
                let sigma = (K_BOLTZMANN * cfg.vel_init_temperature / mass).sqrt();
                let normal = |axis: usize| {
                    Normal::new(0.0, sigma * dt / cell_size.get(axis)).map_err(|e| {
                        ParfisError::InvalidParameter(format!("specie {} temperature: {:?}", cfg.name, e))
                    })
                };
                VelocityInit::Maxwellian([normal(0)?, normal(1)?, normal(2)?])
            }
        };

        let e_z = if sys.field.type_e[2] != 0 { sys.field.strength_e[2] } else { 0.0 };
        let push = if e_z != 0.0 && charge != 0.0 {
            PushFn::UniformFieldZ(charge * e_z * dt * dt / (mass * cell_size.z))
        } else {
            PushFn::NoField
        };

        Ok(Specie {
            id,
            name: cfg.name.clone(),
            states_per_cell: cfg.states_per_cell,
            timestep_ratio: cfg.timestep_ratio,
            dt,
            amu_mass: cfg.amu_mass,
            mass,
            charge,
            max_vel,
            max_ev,
            vel_scale: Vec3D::new(cell_size.x / min_cs, cell_size.y / min_cs, cell_size.z / min_cs),
            head_offset: 0,
            vel_init,
            random_seed: cfg.random_seed,
            push,
            gas_collision_ids: Vec::new(),
            prob_id: None,
        })
    }

    pub fn rng(&self) -> StdRng {
        if self.random_seed == 0 {
            StdRng::from_entropy()
        } else {
            StdRng::seed_from_u64(self.random_seed)
        }
    }

    /// Squared speed in units of `max_vel`, which is also the kinetic energy in units of `max_ev`.
    pub fn speed_sq(&self, vel: &Vec3D<f64>) -> f64 {
        let x = vel.x * self.vel_scale.x;
        let y = vel.y * self.vel_scale.y;
        let z = vel.z * self.vel_scale.z;
        x * x + y * y + z * z
    }

    pub fn energy_ev(&self, vel: &Vec3D<f64>) -> f64 {
        self.speed_sq(vel) * self.max_ev
    }

    pub fn is_active(&self, evolve_cnt: u64) -> bool {
        evolve_cnt % u64::from(self.timestep_ratio) == 0
    }

    pub fn sample_velocity<R: Rng>(&self, rng: &mut R) -> Vec3D<f64> {
        match &self.vel_init {
            VelocityInit::Uniform { min, max } => Vec3D::new(
                min.x + (max.x - min.x) * rng.gen::<f64>(),
                min.y + (max.y - min.y) * rng.gen::<f64>(),
                min.z + (max.z - min.z) * rng.gen::<f64>(),
            ),
            VelocityInit::Maxwellian(normal) => {
                let mut vel = Vec3D::splat(0.0);
                for _ in 0..MAX_VELOCITY_DRAWS {
                    vel = Vec3D::new(rng.sample(&normal[0]), rng.sample(&normal[1]), rng.sample(&normal[2]));
                    if self.speed_sq(&vel) < 1.0 {
                        return vel;
                    }
                }
                let scale = BELOW_ONE / self.speed_sq(&vel).sqrt();
                Vec3D::new(vel.x * scale, vel.y * scale, vel.z * scale)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn units_follow_smallest_cell() {
        let mut cfg = Config::default();
        cfg.system.timestep = 1.0e-9;
        cfg.system.cell_size = [2.0e-3, 1.0e-3, 4.0e-3];
        cfg.particle.specie[0].timestep_ratio = 2;
        let s = Specie::new(0, &cfg.particle.specie[0], &cfg.system).unwrap();
        assert_eq!(s.dt, 2.0e-9);
        assert!((s.max_vel - 5.0e5).abs() < 1e-6);
        assert_eq!(s.vel_scale, Vec3D::new(2.0, 1.0, 4.0));
        let expected_ev = 0.5 * KG_IN_AMU * 5.0e5 * 5.0e5 / EV_TO_J;
        assert!((s.max_ev - expected_ev).abs() < 1e-9 * expected_ev);
        assert!((s.speed_sq(&Vec3D::new(0.25, 0.0, 0.0)) - 0.25).abs() < 1e-15);
    }

    #[test]
    fn axial_field_selects_kick() {
        let mut cfg = Config::default();
        cfg.system.field.type_e = [0, 0, 1];
        cfg.system.field.strength_e = [0.0, 0.0, 10.0];
        let neutral = Specie::new(0, &cfg.particle.specie[0], &cfg.system).unwrap();
        assert_eq!(neutral.push, PushFn::NoField);
        cfg.particle.specie[0].e_charge = 1;
        let ion = Specie::new(0, &cfg.particle.specie[0], &cfg.system).unwrap();
        let expected = ELEMENTARY_CHARGE * 10.0 / (KG_IN_AMU * 1.0e-3);
        match ion.push {
            PushFn::UniformFieldZ(dv) => assert!((dv - expected).abs() < 1e-9 * expected),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn subcycled_specie_skips_steps() {
        let mut cfg = Config::default();
        cfg.particle.specie[0].timestep_ratio = 3;
        let s = Specie::new(0, &cfg.particle.specie[0], &cfg.system).unwrap();
        let active: Vec<u64> = (0..7).filter(|&c| s.is_active(c)).collect();
        assert_eq!(active, vec![0, 3, 6]);
    }

    #[test]
    fn maxwellian_draws_stay_below_max_speed() {
        let mut cfg = Config::default();
        cfg.system.timestep = 1.0e-8;
        cfg.particle.specie[0].vel_init_dist = VelocityDistributionKind::Maxwellian;
        cfg.particle.specie[0].vel_init_temperature = 1.0e5;
        let s = Specie::new(0, &cfg.particle.specie[0], &cfg.system).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10000 {
            assert!(s.speed_sq(&s.sample_velocity(&mut rng)) < 1.0);
        }
    }

    #[test]
    fn uniform_draws_respect_bounds() {
        let cfg = Config::default();
        let s = Specie::new(0, &cfg.particle.specie[0], &cfg.system).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let v = s.sample_velocity(&mut rng);
            for a in 0..3 {
                assert!(v.get(a).abs() <= 0.5773502692);
            }
        }
    }
}
