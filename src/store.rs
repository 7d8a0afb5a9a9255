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

//! Particle arena and the intrusive (specie, cell) lists threaded through it.
//!
//! `head_ids[specie.head_offset + cell_id]` is the most recently inserted state of
//! that list; `next` and `prev` are arena indices with [`NO_STATE`] as terminator.

use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{StateId, NO_STATE};
use crate::error::{ParfisError, Result};
use crate::geometry::CellGrid;
use crate::specie::Specie;
use crate::vec3d::Vec3D;

#[repr(C)]
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct State {
    pub next: StateId,
    pub prev: StateId,
    pub pos: Vec3D<f64>,                                   // cell-local, each component in [0, 1)
    pub vel: Vec3D<f64>,                                   // cells per specie timestep
}

impl State {
    pub fn new(pos: Vec3D<f64>, vel: Vec3D<f64>) -> State {
        State { next: NO_STATE, prev: NO_STATE, pos, vel }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ParticleStore {
    pub states: Vec<State>,
    pub head_ids: Vec<StateId>,
    pub pushed: Vec<bool>,
}

impl ParticleStore {
    pub fn new(head_count: usize) -> ParticleStore {
        ParticleStore {
            states: Vec::new(),
            head_ids: vec![NO_STATE; head_count],
            pushed: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Appends `state` to the arena and makes it the head of list `head`.
    pub fn insert(&mut self, head: usize, mut state: State) -> StateId {
        let id = self.states.len() as StateId;
        let old = self.head_ids[head];
        state.next = old;
        state.prev = NO_STATE;
        if old != NO_STATE {
            self.states[old as usize].prev = id;
        }
        self.head_ids[head] = id;
        self.states.push(state);
        self.pushed.push(false);
        id
    }

    /// Moves state `id` from list `old_head` to the front of list `new_head`.
    pub fn set_new_cell(&mut self, id: StateId, old_head: usize, new_head: usize) {
        let i = id as usize;
        let State { next, prev, .. } = self.states[i];
        if prev == NO_STATE {
            self.head_ids[old_head] = next;
        } else {
            self.states[prev as usize].next = next;
        }
        if next != NO_STATE {
            self.states[next as usize].prev = prev;
        }

        let first = self.head_ids[new_head];
        if first != NO_STATE {
            self.states[first as usize].prev = id;
        }
        self.states[i].next = first;
        self.states[i].prev = NO_STATE;
        self.head_ids[new_head] = id;
    }

    pub fn reset_pushed(&mut self) {
        for p in self.pushed.iter_mut() {
            *p = false;
        }
    }

    pub fn list(&self, head: usize) -> ListIter<'_> {
        ListIter { store: self, cur: self.head_ids[head] }
    }

    pub fn list_len(&self, head: usize) -> usize {
        self.list(head).count()
    }

    /// Walks every list and checks link consistency, returning the number of linked states.
    ///
    /// Every state has to be reachable from exactly one head, `prev` of a head is
    /// [`NO_STATE`] and `prev` of any other state points back at its predecessor.
    pub fn check_lists(&self) -> Result<usize> {
        let n = self.states.len();
        let mut seen = vec![false; n];
        let mut linked = 0;
        for (head, &first) in self.head_ids.iter().enumerate() {
            let mut prev = NO_STATE;
            let mut cur = first;
            while cur != NO_STATE {
                let i = cur as usize;
                if i >= n {
                    return Err(ParfisError::BrokenList(format!(
                        "list {} points past the arena at {}",
                        head, cur
                    )));
                }
                if seen[i] {
                    return Err(ParfisError::BrokenList(format!("state {} is linked twice", cur)));
                }
                seen[i] = true;
                if self.states[i].prev != prev {
                    return Err(ParfisError::BrokenList(format!(
                        "state {} has prev {} instead of {}",
                        cur, self.states[i].prev, prev
                    )));
                }
                linked += 1;
                prev = cur;
                cur = self.states[i].next;
            }
        }
        if linked != n {
            return Err(ParfisError::BrokenList(format!("{} of {} states are unreachable", n - linked, n)));
        }
        Ok(linked)
    }
}

pub struct ListIter<'a> {
    store: &'a ParticleStore,
    cur: StateId,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = StateId;

    fn next(&mut self) -> Option<StateId> {
        if self.cur == NO_STATE {
            return None;
        }
        let id = self.cur;
        self.cur = self.store.states[id as usize].next;
        Some(id)
    }
}

/// Seeds `states_per_cell` samples per cell for one specie.
///
/// Draws falling outside the geometry are dropped, so boundary cells end up with
/// fewer states in proportion to the volume they cover.
pub fn create_states<R: Rng>(grid: &CellGrid, store: &mut ParticleStore, specie: &Specie, rng: &mut R) -> Result<usize> {
    let requested = grid.cells.len() as u64 * u64::from(specie.states_per_cell);
    if store.states.len() as u64 + requested >= u64::from(NO_STATE) {
        return Err(ParfisError::InvalidParameter(format!(
            "{} states of specie {} do not fit the state index",
            requested, specie.name
        )));
    }
    store.states.reserve(requested as usize);
    store.pushed.reserve(requested as usize);

    let mut created = 0;
    for (cell_id, cell) in grid.cells.iter().enumerate() {
        let full = grid.is_full(cell_id as u32);
        let head = specie.head_offset + cell_id;
        for _ in 0..specie.states_per_cell {
            let pos = Vec3D::new(rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>());
            if !full
                && !grid.contains(
                    f64::from(cell.pos.x) + pos.x,
                    f64::from(cell.pos.y) + pos.y,
                    f64::from(cell.pos.z) + pos.z,
                )
            {
                continue;
            }
            let vel = specie.sample_velocity(rng);
            store.insert(head, State::new(pos, vel));
            created += 1;
        }
    }
    if created == 0 {
        warn!("specie {} has no states", specie.name);
    } else {
        info!("created {} states of specie {}", created, specie.name);
    }
    Ok(created)
}
