//! Cellular-automaton cave fills.
//!
//! A seeded random fill is smoothed a configurable number of passes: cells
//! with more solid neighbors than the upper cutoff solidify, cells with fewer
//! than the lower cutoff open up. Out-of-bounds neighbors count as solid so
//! caves never leak off the map. Solid is 1.0, open is 0.0; meshers threshold
//! automaton maps at 0.5.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::grid::{Grid2, Grid3};

/// Parameters for the 2D and 3D automaton fills.
#[derive(Clone, Debug)]
pub struct AutomataParams {
  pub seed: u64,
  /// Percentage of cells that start solid, 0..=100.
  pub fill_percent: u32,
  /// Number of smoothing passes.
  pub smooth_iterations: u32,
  /// A cell opens when it has fewer solid neighbors than this.
  pub wall_cutoff_lower: u32,
  /// A cell solidifies when it has more solid neighbors than this.
  pub wall_cutoff_upper: u32,
}

impl Default for AutomataParams {
  fn default() -> Self {
    Self {
      seed: 0,
      fill_percent: 45,
      smooth_iterations: 5,
      wall_cutoff_lower: 4,
      wall_cutoff_upper: 4,
    }
  }
}

impl AutomataParams {
  pub fn new(seed: u64) -> Self {
    Self {
      seed,
      ..Default::default()
    }
  }

  pub fn with_fill_percent(mut self, fill_percent: u32) -> Self {
    self.fill_percent = fill_percent;
    self
  }

  pub fn with_smooth_iterations(mut self, smooth_iterations: u32) -> Self {
    self.smooth_iterations = smooth_iterations;
    self
  }

  pub fn with_wall_cutoffs(mut self, lower: u32, upper: u32) -> Self {
    self.wall_cutoff_lower = lower.min(upper);
    self.wall_cutoff_upper = upper;
    self
  }
}

/// Generate a smoothed 2D cave map. Map edges are always solid.
pub fn generate_map_2d(width: usize, height: usize, params: &AutomataParams) -> Grid2 {
  let mut rng = StdRng::seed_from_u64(params.seed);
  let mut map = Grid2::new(width, height);

  for y in 0..height {
    for x in 0..width {
      let solid = if x == 0 || x == width - 1 || y == 0 || y == height - 1 {
        true
      } else {
        rng.gen_range(0..100u32) < params.fill_percent
      };
      map.set(x, y, if solid { 1.0 } else { 0.0 });
    }
  }

  for _ in 0..params.smooth_iterations {
    smooth_2d(&mut map, params);
  }

  map
}

fn smooth_2d(map: &mut Grid2, params: &AutomataParams) {
  let (width, height) = (map.width(), map.height());
  for y in 0..height {
    for x in 0..width {
      let walls = surrounding_wall_count_2d(map, x as isize, y as isize);
      if walls > params.wall_cutoff_upper {
        map.set(x, y, 1.0);
      } else if walls < params.wall_cutoff_lower {
        map.set(x, y, 0.0);
      }
    }
  }
}

fn surrounding_wall_count_2d(map: &Grid2, gx: isize, gy: isize) -> u32 {
  let (width, height) = (map.width() as isize, map.height() as isize);
  let mut count = 0;
  for ny in (gy - 1)..=(gy + 1) {
    for nx in (gx - 1)..=(gx + 1) {
      if nx == gx && ny == gy {
        continue;
      }
      if nx < 0 || nx >= width || ny < 0 || ny >= height {
        count += 1;
      } else if map.get(nx as usize, ny as usize) >= 0.5 {
        count += 1;
      }
    }
  }
  count
}

/// Paste a solid border ring of `border_size` cells around a map.
pub fn with_border(map: &Grid2, border_size: usize) -> Grid2 {
  let width = map.width();
  let height = map.height();
  let mut bordered = Grid2::new(width + border_size * 2, height + border_size * 2);

  for y in 0..bordered.height() {
    for x in 0..bordered.width() {
      let inside = x >= border_size
        && x < width + border_size
        && y >= border_size
        && y < height + border_size;
      let value = if inside {
        map.get(x - border_size, y - border_size)
      } else {
        1.0
      };
      bordered.set(x, y, value);
    }
  }

  bordered
}

/// Generate a smoothed cubic 3D cave volume. Volume faces are always solid.
///
/// Neighbor counts run over the full 26-cell neighborhood, so cutoffs live in
/// `0..=26` rather than the 2D `0..=8`.
pub fn generate_map_3d(size: usize, params: &AutomataParams) -> Grid3 {
  let mut rng = StdRng::seed_from_u64(params.seed);
  let mut map = Grid3::cube(size);

  for x in 0..size {
    for y in 0..size {
      for z in 0..size {
        let edge = x == 0
          || x == size - 1
          || y == 0
          || y == size - 1
          || z == 0
          || z == size - 1;
        let solid = edge || rng.gen_range(0..100u32) < params.fill_percent;
        map.set(x, y, z, if solid { 1.0 } else { 0.0 });
      }
    }
  }

  for _ in 0..params.smooth_iterations {
    smooth_3d(&mut map, params);
  }

  map
}

fn smooth_3d(map: &mut Grid3, params: &AutomataParams) {
  let size = map.width();
  for x in 0..size {
    for y in 0..size {
      for z in 0..size {
        let walls = surrounding_wall_count_3d(map, x as isize, y as isize, z as isize);
        if walls > params.wall_cutoff_upper {
          map.set(x, y, z, 1.0);
        } else if walls < params.wall_cutoff_lower {
          map.set(x, y, z, 0.0);
        }
      }
    }
  }
}

fn surrounding_wall_count_3d(map: &Grid3, gx: isize, gy: isize, gz: isize) -> u32 {
  let size = map.width() as isize;
  let mut count = 0;
  for nx in (gx - 1)..=(gx + 1) {
    for ny in (gy - 1)..=(gy + 1) {
      for nz in (gz - 1)..=(gz + 1) {
        if nx == gx && ny == gy && nz == gz {
          continue;
        }
        let out = nx < 0 || nx >= size || ny < 0 || ny >= size || nz < 0 || nz >= size;
        if out || map.get(nx as usize, ny as usize, nz as usize) >= 0.5 {
          count += 1;
        }
      }
    }
  }
  count
}
