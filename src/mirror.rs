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

//! Read-only flat views of a simulation for consumers outside the crate.
//!
//! Every field is a borrowed slice of the live data; nothing is copied and nothing
//! is kept in sync, a view is simply taken again after the next step.

use crate::collision::{CollisionModel, Gas};
use crate::constants::{CellId, StateId, NO_STATE};
use crate::functable::FuncTable;
use crate::geometry::{Cell, CellGrid, NodeFlag};
use crate::specie::Specie;
use crate::store::{ParticleStore, State};

#[derive(Clone, Copy, Debug)]
pub struct FuncTableView<'a> {
    pub ranges: &'a [f64],
    pub nbins: &'a [usize],
    pub idx: &'a [f64],
    pub x_vec: &'a [f64],
    pub y_vec: &'a [f64],
    pub col_cnt: usize,
}

impl<'a> From<&'a FuncTable> for FuncTableView<'a> {
    fn from(t: &'a FuncTable) -> Self {
        FuncTableView {
            ranges: &t.ranges,
            nbins: &t.nbins,
            idx: &t.idx,
            x_vec: &t.x_vec,
            y_vec: &t.y_vec,
            col_cnt: t.col_cnt,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct GasCollisionView<'a> {
    pub name: &'a str,
    pub specie_id: usize,
    pub gas_id: usize,
    pub xsec: FuncTableView<'a>,
    pub freq: FuncTableView<'a>,
}

#[derive(Clone, Debug)]
pub struct SimView<'a> {
    pub evolve_cnt: u64,
    pub cells: &'a [Cell],
    pub node_flags: &'a [NodeFlag],
    pub cell_ids: &'a [CellId],
    pub interior_ids: &'a [CellId],
    pub boundary_ids: &'a [CellId],
    pub states: &'a [State],
    pub head_ids: &'a [StateId],
    pub species: &'a [Specie],
    pub gases: &'a [Gas],
    pub gas_collisions: Vec<GasCollisionView<'a>>,
    pub prob: Vec<FuncTableView<'a>>,
}

impl<'a> SimView<'a> {
    pub fn new(
        grid: Option<&'a CellGrid>,
        store: &'a ParticleStore,
        species: &'a [Specie],
        model: &'a CollisionModel,
        evolve_cnt: u64,
    ) -> SimView<'a> {
        let (cells, node_flags, cell_ids, interior_ids, boundary_ids) = match grid {
            Some(g) => (
                &g.cells[..],
                &g.node_flags[..],
                &g.cell_ids[..],
                &g.interior_ids[..],
                &g.boundary_ids[..],
            ),
            None => (&[][..], &[][..], &[][..], &[][..], &[][..]),
        };
        SimView {
            evolve_cnt,
            cells,
            node_flags,
            cell_ids,
            interior_ids,
            boundary_ids,
            states: &store.states,
            head_ids: &store.head_ids,
            species,
            gases: &model.gases,
            gas_collisions: model
                .collisions
                .iter()
                .map(|c| GasCollisionView {
                    name: &c.name,
                    specie_id: c.specie_id,
                    gas_id: c.gas_id,
                    xsec: FuncTableView::from(&c.xsec),
                    freq: FuncTableView::from(&c.freq),
                })
                .collect(),
            prob: model.prob.iter().map(FuncTableView::from).collect(),
        }
    }

    /// States of one (specie, cell) list, head first.
    pub fn cell_states(&self, specie_id: usize, cell_id: CellId) -> Vec<&'a State> {
        let mut out = Vec::new();
        let mut cur = self.head_ids[self.species[specie_id].head_offset + cell_id as usize];
        while cur != NO_STATE {
            let st = &self.states[cur as usize];
            out.push(st);
            cur = st.next;
        }
        out
    }
}
