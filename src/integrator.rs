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

//! One timestep of free flight with wall handling.
//!
//! Interior cells are pushed first with no boundary checks at all; boundary cells are
//! pushed afterwards and every state leaving them is tested against the cylinder and
//! the planar walls.

use std::ops::AddAssign;

use log::warn;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::collision::CollisionModel;
use crate::config::GeometryKind;
use crate::constants::{CellId, StateId, BELOW_ONE, MAX_REFLECTIONS, NO_CELL, NO_STATE, WALL_CLEARANCE};
use crate::geometry::CellGrid;
use crate::specie::Specie;
use crate::store::ParticleStore;
use crate::vec3d::Vec3D;

/// Velocity update applied before the move, picked once per specie.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PushFn {
    NoField,
    UniformFieldZ(f64),                                    // dv_z per step, cell units
}

impl PushFn {
    #[inline]
    pub fn kick(&self, vel: &mut Vec3D<f64>) {
        match *self {
            PushFn::NoField => {}
            PushFn::UniformFieldZ(dvz) => vel.z += dvz,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct PushCounters {
    pub pushed: u64,
    pub migrated: u64,
    pub reflected: u64,                                    // cylinder and planar wall hits
    pub wrapped: u64,                                      // periodic crossings
    pub collided: u64,
    pub capped: u64,                                       // states slowed down to max_vel
    pub stuck: u64,                                        // reflection loops cut at the iteration cap
}

impl AddAssign for PushCounters {
    fn add_assign(&mut self, o: PushCounters) {
        self.pushed += o.pushed;
        self.migrated += o.migrated;
        self.reflected += o.reflected;
        self.wrapped += o.wrapped;
        self.collided += o.collided;
        self.capped += o.capped;
        self.stuck += o.stuck;
    }
}

/// Advances every state of `specie` by one of its timesteps.
///
/// `store.pushed` must be cleared before the first specie of a step is pushed.
pub fn push_states<R: Rng>(
    grid: &CellGrid,
    store: &mut ParticleStore,
    specie: &Specie,
    model: &CollisionModel,
    rng: &mut R,
) -> PushCounters {
    let mut cnt = PushCounters::default();
    for &(ids, boundary) in [(&grid.interior_ids, false), (&grid.boundary_ids, true)].iter() {
        for &cell_id in ids.iter() {
            let head = specie.head_offset + cell_id as usize;
            let mut sid = store.head_ids[head];
            while sid != NO_STATE {
                // the state may be relinked, its successor stays in this list
                let next = store.states[sid as usize].next;
                if !store.pushed[sid as usize] {
                    store.pushed[sid as usize] = true;
                    push_state(grid, store, specie, model, rng, sid, cell_id, boundary, &mut cnt);
                }
                sid = next;
            }
        }
    }
    cnt
}

#[allow(clippy::too_many_arguments)]
fn push_state<R: Rng>(
    grid: &CellGrid,
    store: &mut ParticleStore,
    specie: &Specie,
    model: &CollisionModel,
    rng: &mut R,
    sid: StateId,
    cell_id: CellId,
    boundary: bool,
    cnt: &mut PushCounters,
) {
    cnt.pushed += 1;
    let cell = grid.cells[cell_id as usize].pos;
    let mut state = store.states[sid as usize];

    specie.push.kick(&mut state.vel);
    let s2 = specie.speed_sq(&state.vel);
    if s2 > 1.0 {
        let scale = BELOW_ONE / s2.sqrt();
        state.vel = Vec3D::new(state.vel.x * scale, state.vel.y * scale, state.vel.z * scale);
        cnt.capped += 1;
    }
    if model.collide(specie, &mut state.vel, rng) {
        cnt.collided += 1;
    }

    let start = state.pos;
    let mut target = [i64::from(cell.x), i64::from(cell.y), i64::from(cell.z)];
    for axis in 0..3 {
        let p = state.pos.get_mut(axis);
        *p += state.vel.get(axis);
        if *p < 0.0 {
            *p += 1.0;
            target[axis] -= 1;
        } else if *p >= 1.0 {
            *p -= 1.0;
            target[axis] += 1;
        }
        if *p >= 1.0 {
            *p = BELOW_ONE;
        }
    }

    if boundary {
        if grid.kind == GeometryKind::Cylindrical {
            let c = grid.axis_center();
            let rx = target[0] as f64 + state.pos.x - c;
            let ry = target[1] as f64 + state.pos.y - c;
            if rx * rx + ry * ry >= grid.radius_sq() {
                // redo the x-y part of the step from the start point with reflections
                let r0 = (f64::from(cell.x) + start.x - c, f64::from(cell.y) + start.y - c);
                let hit = reflect_cylinder(r0, (state.vel.x, state.vel.y), grid.radius_sq());
                cnt.reflected += u64::from(hit.count);
                if hit.stuck {
                    cnt.stuck += 1;
                }
                state.vel.x = hit.vel.0;
                state.vel.y = hit.vel.1;
                let (ix, px) = split_cell(c + hit.pos.0);
                let (iy, py) = split_cell(c + hit.pos.1);
                target[0] = ix;
                target[1] = iy;
                state.pos.x = px;
                state.pos.y = py;
            }
        }
        let planar: &[usize] = match grid.kind {
            GeometryKind::Cylindrical => &[2],
            GeometryKind::Cubical => &[0, 1, 2],
        };
        for &axis in planar {
            let count = i64::from(grid.cell_count.get(axis));
            let t = target[axis];
            if t >= 0 && t < count {
                continue;
            }
            if grid.periodic[axis] {
                target[axis] = if t < 0 { count - 1 } else { 0 };
                cnt.wrapped += 1;
            } else {
                // the mirrored point lies in the cell the state came from
                target[axis] = if t < 0 { 0 } else { count - 1 };
                let v = state.vel.get_mut(axis);
                *v = -*v;
                let p = state.pos.get_mut(axis);
                *p = (1.0 - *p).min(BELOW_ONE);
                cnt.reflected += 1;
            }
        }
    }

    let new_id = grid.cell_id_at(target[0], target[1], target[2]);
    assert!(
        new_id != NO_CELL,
        "state {} left cell {:?} for grid position {:?} with no cell",
        sid,
        cell,
        target
    );
    store.states[sid as usize].pos = state.pos;
    store.states[sid as usize].vel = state.vel;
    if new_id != cell_id {
        store.set_new_cell(sid, specie.head_offset + cell_id as usize, specie.head_offset + new_id as usize);
        cnt.migrated += 1;
    }
}

fn split_cell(w: f64) -> (i64, f64) {
    let i = w.floor();
    let p = w - i;
    (i as i64, if p >= 1.0 { BELOW_ONE } else { p })
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct WallHit {
    pub pos: (f64, f64),                                   // relative to the axis, cell units
    pub vel: (f64, f64),
    pub count: u32,
    pub stuck: bool,
}

/// Moves `r` along `v` for one step inside a circle of squared radius `radius_sq`
/// centred at the origin, mirroring the radial velocity at every wall hit.
pub fn reflect_cylinder(r: (f64, f64), v: (f64, f64), radius_sq: f64) -> WallHit {
    let (mut rx, mut ry) = r;
    let (mut vx, mut vy) = v;
    let mut rem = 1.0;
    let mut count = 0;
    loop {
        let ex = rx + vx * rem;
        let ey = ry + vy * rem;
        if ex * ex + ey * ey < radius_sq {
            return WallHit { pos: (ex, ey), vel: (vx, vy), count, stuck: false };
        }
        if count == MAX_REFLECTIONS {
            let scale = radius_sq.sqrt() * (1.0 - WALL_CLEARANCE) / (ex * ex + ey * ey).sqrt();
            warn!("reflection cap reached at ({:.6}, {:.6}), pulling the state inside", ex, ey);
            return WallHit { pos: (ex * scale, ey * scale), vel: (vx, vy), count, stuck: true };
        }

        let a = vx * vx + vy * vy;
        let b = rx * vx + ry * vy;
        let c = rx * rx + ry * ry - radius_sq;
        let disc = b * b - a * c;
        // a grazing or degenerate trajectory is reflected where it stands
        let tau = if disc > 0.0 && a > 0.0 { ((-b + disc.sqrt()) / a).max(0.0).min(rem) } else { 0.0 };
        rx += vx * tau;
        ry += vy * tau;

        let norm = (rx * rx + ry * ry).sqrt();
        if norm > 0.0 {
            let (nx, ny) = (rx / norm, ry / norm);
            let mut vr = vx * nx + vy * ny;
            let vt = -vx * ny + vy * nx;
            if vr > 0.0 {
                vr = -vr;
            }
            vx = vr * nx - vt * ny;
            vy = vr * ny + vt * nx;
        }
        rem -= tau;
        count += 1;
    }
}
