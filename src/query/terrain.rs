//! Terrain height grid and the tile walk used for terrain picking

use serde::{Deserialize, Serialize};

use crate::core::types::{IVec2, Vec3};
use crate::math::intersect::segment_quad;

/// Tiles checked on each side of the walked tile
const TILE_SEARCH: i32 = 2;

/// Heights sampled on an integer (x, z) lattice starting at the origin
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeightMap {
    width: u32,
    depth: u32,
    heights: Vec<f32>,
}

impl HeightMap {
    /// `heights` is row-major over z; missing samples are zero
    pub fn new(width: u32, depth: u32, mut heights: Vec<f32>) -> Self {
        heights.resize((width * depth) as usize, 0.0);
        Self { width, depth, heights }
    }

    pub fn flat(width: u32, depth: u32, height: f32) -> Self {
        Self::new(width, depth, vec![height; (width * depth) as usize])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    fn index(&self, x: i32, z: i32) -> Option<usize> {
        if x < 0 || z < 0 || x as u32 >= self.width || z as u32 >= self.depth {
            return None;
        }
        Some(z as usize * self.width as usize + x as usize)
    }

    /// Height at a lattice point, zero outside the grid
    pub fn height(&self, x: i32, z: i32) -> f32 {
        self.index(x, z).map_or(0.0, |i| self.heights[i])
    }

    pub fn set_height(&mut self, x: i32, z: i32, height: f32) {
        if let Some(i) = self.index(x, z) {
            self.heights[i] = height;
        }
    }

    /// Height interpolated over the two triangles of the tile under (x, z)
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let tx = x.floor() as i32;
        let tz = z.floor() as i32;
        let h00 = self.height(tx, tz);
        let h01 = self.height(tx, tz + 1);
        let h11 = self.height(tx + 1, tz + 1);
        let h10 = self.height(tx + 1, tz);

        let u = x - tx as f32;
        let v = z - tz as f32;
        if u + v < 1.0 {
            h00 + u * (h10 - h00) + v * (h01 - h00)
        } else {
            let (u, v) = (1.0 - u, 1.0 - v);
            h11 + u * (h01 - h11) + v * (h10 - h11)
        }
    }

    /// Corners of tile (x, z) in quad winding order
    pub fn tile_quad(&self, x: i32, z: i32) -> [Vec3; 4] {
        let (fx, fz) = (x as f32, z as f32);
        [
            Vec3::new(fx, self.height(x, z), fz),
            Vec3::new(fx, self.height(x, z + 1), fz + 1.0),
            Vec3::new(fx + 1.0, self.height(x + 1, z + 1), fz + 1.0),
            Vec3::new(fx + 1.0, self.height(x + 1, z), fz),
        ]
    }
}

/// First terrain tile the segment `start`-`end` passes through.
///
/// Walks tile columns along the dominant horizontal axis and tests the
/// quads within a small window around the interpolated tile.
pub fn collide_ray_against_terrain(terrain: &HeightMap, start: Vec3, end: Vec3) -> Option<IVec2> {
    let start_tile = IVec2::new(start.x.floor() as i32, start.z.floor() as i32);
    let end_tile = IVec2::new(end.x.floor() as i32, end.z.floor() as i32);
    let delta = end_tile - start_tile;

    // walk along x when it spans more tiles, along z otherwise
    let (major, minor) = if delta.x.abs() >= delta.y.abs() { (0, 1) } else { (1, 0) };
    let steps = delta[major].abs();
    let step = delta[major].signum();
    let slope = if steps == 0 { 0.0 } else { delta[minor] as f32 / delta[major] as f32 };

    for i in 0..=steps {
        let mut tile = start_tile;
        tile[major] = start_tile[major] + i * step;
        tile[minor] = start_tile[minor] + ((i * step) as f32 * slope).round() as i32;

        for dx in -TILE_SEARCH..=TILE_SEARCH {
            for dz in -TILE_SEARCH..=TILE_SEARCH {
                let candidate = tile + IVec2::new(dx, dz);
                let [a, b, c, d] = terrain.tile_quad(candidate.x, candidate.y);
                if segment_quad(start, end, a, b, c, d).is_some() {
                    log::trace!("Terrain ray hit tile {candidate}");
                    return Some(candidate);
                }
            }
        }
    }

    None
}
