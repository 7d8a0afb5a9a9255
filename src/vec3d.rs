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

//! Three component vector used for sizes, positions and velocities.

use serde::{Deserialize, Serialize};

#[repr(C)]
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec3D<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T: Copy> Vec3D<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Vec3D { x, y, z }
    }

    pub fn splat(v: T) -> Self {
        Vec3D { x: v, y: v, z: v }
    }

    pub fn get(&self, axis: usize) -> T {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn get_mut(&mut self, axis: usize) -> &mut T {
        match axis {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => &mut self.z,
        }
    }
}

impl Vec3D<f64> {
    pub fn dot(&self, other: &Vec3D<f64>) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn norm_sq(&self) -> f64 {
        self.dot(self)
    }

    pub fn min_component(&self) -> f64 {
        self.x.min(self.y).min(self.z)
    }
}

// config files give vectors as plain arrays
impl<T: Copy> From<[T; 3]> for Vec3D<T> {
    fn from(a: [T; 3]) -> Self {
        Vec3D { x: a[0], y: a[1], z: a[2] }
    }
}
