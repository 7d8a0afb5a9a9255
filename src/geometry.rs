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

//! Boundary-aware cell discretization.
//!
//! Cells live on a regular raster. Only cells with at least one corner strictly inside
//! the physical boundary are materialized; the rest of the raster maps to [`NO_CELL`].
//! A cylinder whose wall reaches into a raster cell with no inside corner is rejected,
//! since states could fly into that cell.
//! Materialized cells are split into *interior* cells, whose own corners and all 26
//! neighbours are fully inside, and *boundary* cells, which the integrator has to
//! check against the walls every step.

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::{GeometryKind, SystemConfig};
use crate::constants::{CellId, CellPos, MAX_CELL_COUNT, NO_CELL};
use crate::error::{ParfisError, Result};
use crate::vec3d::Vec3D;

/// One bit per corner of the unit cube, bit index `dx + 2*dy + 4*dz`.
pub type NodeFlag = u8;

pub const NODE_FULL: NodeFlag   = 0xFF;
pub const NODE_X_LOW: NodeFlag  = 0x55;                   // corners with dx = 0
pub const NODE_X_HIGH: NodeFlag = 0xAA;
pub const NODE_Y_LOW: NodeFlag  = 0x33;
pub const NODE_Y_HIGH: NodeFlag = 0xCC;
pub const NODE_Z_LOW: NodeFlag  = 0x0F;
pub const NODE_Z_HIGH: NodeFlag = 0xF0;

#[repr(C)]
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct Cell {
    pub pos: Vec3D<CellPos>,
}

#[derive(Clone, Debug)]
pub struct CellGrid {
    pub kind: GeometryKind,
    pub cell_count: Vec3D<u32>,
    pub cell_size: Vec3D<f64>,                             // [m]
    pub geometry_size: Vec3D<f64>,                         // [m]
    pub periodic: [bool; 3],
    pub cells: Vec<Cell>,
    pub node_flags: Vec<NodeFlag>,
    pub cell_ids: Vec<CellId>,                             // absolute raster index -> compact id
    pub interior_ids: Vec<CellId>,
    pub boundary_ids: Vec<CellId>,
    center: f64,                                           // cylinder axis, cell units
    radius_sq: f64,                                        // cylinder radius squared, cell units
}

impl CellGrid {
    /// Rasterizes the geometry. Nothing is returned unless the whole grid fits the index
    /// space and the geometry has the shape its kind requires.
    pub fn create(sys: &SystemConfig) -> Result<CellGrid> {
        let size = Vec3D::from(sys.geometry_size);
        let cs = Vec3D::from(sys.cell_size);
        if sys.geometry == GeometryKind::Cylindrical {
            if size.x != size.y {
                return Err(ParfisError::AsymmetricGeometry { x: size.x, y: size.y });
            }
            if cs.x != cs.y {
                return Err(ParfisError::UnequalCellSize { x: cs.x, y: cs.y });
            }
        }
        let count = Vec3D::new(
            (size.x / cs.x).ceil() as u64,
            (size.y / cs.y).ceil() as u64,
            (size.z / cs.z).ceil() as u64,
        );
        let total = count.x.saturating_mul(count.y).saturating_mul(count.z);
        let axis_limit = u64::from(CellPos::MAX);
        if total > MAX_CELL_COUNT || count.x > axis_limit || count.y > axis_limit || count.z > axis_limit {
            return Err(ParfisError::CellCountOverCapacity { count: total, capacity: MAX_CELL_COUNT });
        }
        let cell_count = Vec3D::new(count.x as u32, count.y as u32, count.z as u32);

        // the raster test runs in metres, the integrator works in cell units
        let center_m = 0.5 * size.x;
        let radius_sq_m = center_m * center_m;
        let inside_xy = |px: u32, py: u32| -> bool {
            match sys.geometry {
                GeometryKind::Cylindrical => {
                    let rx = f64::from(px) * cs.x - center_m;
                    let ry = f64::from(py) * cs.y - center_m;
                    rx * rx + ry * ry < radius_sq_m
                }
                GeometryKind::Cubical => true,
            }
        };

        let mut cells: Vec<Cell> = Vec::new();
        let mut node_flags: Vec<NodeFlag> = Vec::new();
        let mut cell_ids: Vec<CellId> = vec![NO_CELL; total as usize];

        // the x-y corner pattern is the same for every layer
        let layer = (cell_count.x * cell_count.y) as usize;
        let mut xy_flags: Vec<NodeFlag> = vec![0; layer];
        for j in 0..cell_count.y {
            for i in 0..cell_count.x {
                let mut flag: NodeFlag = 0;
                for &(dx, dy) in [(0u32, 0u32), (1, 0), (0, 1), (1, 1)].iter() {
                    if inside_xy(i + dx, j + dy) {
                        let bit: NodeFlag = 1 << (dx + 2 * dy);
                        flag |= bit | (bit << 4);
                    }
                }
                if sys.geometry == GeometryKind::Cubical {
                    if i == 0 { flag &= !NODE_X_LOW; }
                    if i == cell_count.x - 1 { flag &= !NODE_X_HIGH; }
                    if j == 0 { flag &= !NODE_Y_LOW; }
                    if j == cell_count.y - 1 { flag &= !NODE_Y_HIGH; }
                }
                xy_flags[(i + cell_count.x * j) as usize] = flag;
            }
        }

        if sys.geometry == GeometryKind::Cylindrical {
            // a cell without inside corners may still cut the disk when the axis is off the grid
            let nearest = |lo: u32, size: f64| -> f64 {
                center_m.max(f64::from(lo) * size).min(f64::from(lo + 1) * size) - center_m
            };
            let mut uncovered = 0;
            for j in 0..cell_count.y {
                for i in 0..cell_count.x {
                    if xy_flags[(i + cell_count.x * j) as usize] != 0 {
                        continue;
                    }
                    let rx = nearest(i, cs.x);
                    let ry = nearest(j, cs.y);
                    if rx * rx + ry * ry < radius_sq_m {
                        uncovered += 1;
                    }
                }
            }
            if uncovered > 0 {
                return Err(ParfisError::UncoveredWall { count: uncovered });
            }
        }

        for k in 0..cell_count.z {
            for j in 0..cell_count.y {
                for i in 0..cell_count.x {
                    let mut flag = xy_flags[(i + cell_count.x * j) as usize];
                    if k == 0 { flag &= !NODE_Z_LOW; }
                    if k == cell_count.z - 1 { flag &= !NODE_Z_HIGH; }
                    if flag == 0 {
                        continue;
                    }
                    let abs = i as usize + layer * k as usize + (cell_count.x * j) as usize;
                    cell_ids[abs] = cells.len() as CellId;
                    cells.push(Cell { pos: Vec3D::new(i as CellPos, j as CellPos, k as CellPos) });
                    node_flags.push(flag);
                }
            }
        }

        let center = center_m / cs.x;
        let mut grid = CellGrid {
            kind: sys.geometry,
            cell_count,
            cell_size: cs,
            geometry_size: size,
            periodic: [
                sys.periodic_boundary[0] != 0,
                sys.periodic_boundary[1] != 0,
                sys.periodic_boundary[2] != 0,
            ],
            cells,
            node_flags,
            cell_ids,
            interior_ids: Vec::new(),
            boundary_ids: Vec::new(),
            center,
            radius_sq: center * center,
        };
        grid.classify();
        info!(
            "created {} cells on a {}x{}x{} grid ({} interior, {} boundary)",
            grid.cells.len(),
            cell_count.x,
            cell_count.y,
            cell_count.z,
            grid.interior_ids.len(),
            grid.boundary_ids.len()
        );
        Ok(grid)
    }

    fn classify(&mut self) {
        let mut interior = Vec::new();
        let mut boundary = Vec::new();
        for (id, cell) in self.cells.iter().enumerate() {
            if self.node_flags[id] == NODE_FULL && self.neighbours_full(cell.pos) {
                interior.push(id as CellId);
            } else {
                boundary.push(id as CellId);
            }
        }
        self.interior_ids = interior;
        self.boundary_ids = boundary;
    }

    fn neighbours_full(&self, pos: Vec3D<CellPos>) -> bool {
        for dz in -1i64..=1 {
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    if dx == 0 && dy == 0 && dz == 0 {
                        continue;
                    }
                    let id = self.cell_id_at(
                        i64::from(pos.x) + dx,
                        i64::from(pos.y) + dy,
                        i64::from(pos.z) + dz,
                    );
                    if id == NO_CELL || self.node_flags[id as usize] != NODE_FULL {
                        return false;
                    }
                }
            }
        }
        true
    }

    pub fn absolute_index(&self, x: u32, y: u32, z: u32) -> usize {
        x as usize + self.cell_count.x as usize * (y as usize + self.cell_count.y as usize * z as usize)
    }

    /// Compact id at a (possibly out of range) grid position.
    pub fn cell_id_at(&self, x: i64, y: i64, z: i64) -> CellId {
        let c = self.cell_count;
        if x < 0 || y < 0 || z < 0 || x >= i64::from(c.x) || y >= i64::from(c.y) || z >= i64::from(c.z) {
            return NO_CELL;
        }
        self.cell_ids[self.absolute_index(x as u32, y as u32, z as u32)]
    }

    pub fn is_full(&self, id: CellId) -> bool {
        self.node_flags[id as usize] == NODE_FULL
    }

    /// Axis of the cylinder (x and y), in cell units.
    pub fn axis_center(&self) -> f64 {
        self.center
    }

    pub fn radius_sq(&self) -> f64 {
        self.radius_sq
    }

    /// Exact geometric test of a point given in cell units.
    pub fn contains(&self, x: f64, y: f64, z: f64) -> bool {
        let c = self.cell_count;
        if z < 0.0 || z > f64::from(c.z) {
            return false;
        }
        match self.kind {
            GeometryKind::Cylindrical => {
                let rx = x - self.center;
                let ry = y - self.center;
                rx * rx + ry * ry < self.radius_sq
            }
            GeometryKind::Cubical => x >= 0.0 && y >= 0.0 && x <= f64::from(c.x) && y <= f64::from(c.y),
        }
    }

    pub fn raster_len(&self) -> usize {
        self.cell_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubical(n: f64) -> SystemConfig {
        SystemConfig {
            geometry: GeometryKind::Cubical,
            geometry_size: [n * 1.0e-3, n * 1.0e-3, n * 1.0e-3],
            ..SystemConfig::default()
        }
    }

    #[test]
    fn default_cylinder_cell_count() {
        let grid = CellGrid::create(&SystemConfig::default()).unwrap();
        assert_eq!(grid.cell_count, Vec3D::new(20, 20, 400));
        assert_eq!(grid.raster_len(), 160000);
        assert_eq!(grid.cells.len(), 139200);
        assert_eq!(grid.node_flags.len(), grid.cells.len());
    }

    #[test]
    fn partitions_are_disjoint_and_complete() {
        let mut sys = SystemConfig::default();
        sys.geometry_size[2] = 0.01;
        let grid = CellGrid::create(&sys).unwrap();
        let mut seen = vec![0u8; grid.cells.len()];
        for &id in grid.interior_ids.iter().chain(grid.boundary_ids.iter()) {
            seen[id as usize] += 1;
        }
        assert!(seen.iter().all(|&s| s == 1));
        for &id in grid.interior_ids.iter() {
            assert!(grid.is_full(id));
        }
        // bottom and top layers always carry a wall
        for &id in grid.interior_ids.iter() {
            let z = grid.cells[id as usize].pos.z;
            assert!(z > 0 && u32::from(z) < grid.cell_count.z - 1);
        }
    }

    #[test]
    fn id_map_round_trips() {
        let grid = CellGrid::create(&cubical(4.0)).unwrap();
        for (id, cell) in grid.cells.iter().enumerate() {
            let p = cell.pos;
            assert_eq!(grid.cell_id_at(i64::from(p.x), i64::from(p.y), i64::from(p.z)), id as CellId);
        }
        assert_eq!(grid.cell_id_at(-1, 0, 0), NO_CELL);
        assert_eq!(grid.cell_id_at(0, 0, 4), NO_CELL);
    }

    #[test]
    fn cubical_faces_are_clipped() {
        let grid = CellGrid::create(&cubical(5.0)).unwrap();
        assert_eq!(grid.cells.len(), 125);
        let corner = grid.cell_id_at(0, 0, 0) as usize;
        assert_eq!(grid.node_flags[corner], 0x80);
        let full = grid.node_flags.iter().filter(|&&f| f == NODE_FULL).count();
        assert_eq!(full, 27);
        // only the centre cell has a full neighbourhood
        assert_eq!(grid.interior_ids.len(), 1);
        assert_eq!(grid.cells[grid.interior_ids[0] as usize].pos, Vec3D::new(2, 2, 2));
    }

    #[test]
    fn cylinder_corner_flags_follow_the_wall() {
        let grid = CellGrid::create(&SystemConfig::default()).unwrap();
        // raster corner of the box lies outside the inscribed circle
        assert_eq!(grid.cell_id_at(0, 0, 5), NO_CELL);
        // cell touching the axis is fully inside on an inner layer
        let id = grid.cell_id_at(10, 10, 5);
        assert!(grid.is_full(id));
        // first layer loses its bottom corners
        let id = grid.cell_id_at(10, 10, 0);
        assert_eq!(grid.node_flags[id as usize], NODE_Z_HIGH);
    }

    #[test]
    fn asymmetric_cylinder_fails_without_cells() {
        let mut sys = SystemConfig::default();
        sys.geometry_size = [0.02, 0.01, 0.4];
        assert!(matches!(CellGrid::create(&sys), Err(ParfisError::AsymmetricGeometry { .. })));
        sys.geometry_size = [0.02, 0.02, 0.4];
        sys.cell_size = [1.0e-6, 1.0e-6, 1.0e-6];
        assert!(matches!(CellGrid::create(&sys), Err(ParfisError::CellCountOverCapacity { .. })));
    }

    #[test]
    fn off_grid_axis_is_rejected_when_the_wall_bulges() {
        let mut sys = SystemConfig::default();
        sys.geometry_size = [0.02101, 0.02101, 0.004];
        match CellGrid::create(&sys) {
            Err(ParfisError::UncoveredWall { count }) => assert_eq!(count, 2),
            other => panic!("expected an uncovered wall, got {:?}", other.map(|g| g.cells.len())),
        }
        // an odd count puts the axis on a cell centre, every cut cell keeps a corner inside
        sys.geometry_size = [0.021, 0.021, 0.004];
        let grid = CellGrid::create(&sys).unwrap();
        assert_eq!(grid.cell_count.x, 21);
        assert_eq!(grid.cells.len(), 373 * 4);
    }

    #[test]
    fn contains_matches_cylinder() {
        let grid = CellGrid::create(&SystemConfig::default()).unwrap();
        assert!(grid.contains(10.0, 10.0, 1.0));
        assert!(grid.contains(19.9, 10.0, 1.0));
        assert!(!grid.contains(0.5, 0.5, 1.0));
        assert!(!grid.contains(10.0, 10.0, -0.1));
    }
}
