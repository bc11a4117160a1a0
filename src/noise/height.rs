//! 2D fractal heightmap generation.
//!
//! For each octave a seeded RNG draws a large integer offset; samples
//! accumulate `amplitude * perlin(coord)` with `amplitude *= persistence` and
//! frequency `*= lacunarity` per octave. Sampling is centered on the grid so
//! a chunk's parameter offset can slide the window across an unbounded world,
//! and global normalization keeps independently generated chunks continuous
//! at shared edges.

use glam::Vec2;
use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::curve::HeightCurve;
use crate::error::{Result, TerrainError};
use crate::grid::Grid2;

/// Empirical tightening factor for the theoretical amplitude sum. Fractal
/// sums almost never reach the full sum of amplitudes, so the raw bound
/// would compress usable heights into a narrow band.
const GLOBAL_AMPLITUDE_TIGHTEN: f32 = 2.4;

/// How a generated grid is rescaled into `[0, 1]` before the curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NormalizeMode {
  /// Rescale by this grid's own min/max. Visually consistent for a single
  /// map, but amplitude-dependent: adjoining chunks will not line up.
  Local,
  /// Rescale by the fixed theoretical maximum amplitude, so chunks produced
  /// independently agree exactly on shared border samples.
  Global,
}

/// Parameters for fractal height generation.
#[derive(Clone, Debug)]
pub struct NoiseParams {
  /// Feature size divisor; values at or below zero are treated as 1.
  pub scale: f32,
  /// Octave count. Zero yields a grid of zeros.
  pub octaves: u32,
  /// Per-octave amplitude falloff, typically in `(0, 1]`.
  pub persistence: f32,
  /// Per-octave frequency growth, typically `>= 1`.
  pub lacunarity: f32,
  /// Seed for octave offsets and the gradient table.
  pub seed: u64,
  /// World-space sampling offset (a chunk's center goes here).
  pub offset: Vec2,
  /// Remap applied to the normalized value before `max_height`.
  pub curve: HeightCurve,
  /// Final height scale.
  pub max_height: f32,
}

impl Default for NoiseParams {
  fn default() -> Self {
    Self {
      scale: 50.0,
      octaves: 4,
      persistence: 0.5,
      lacunarity: 2.0,
      seed: 0,
      offset: Vec2::ZERO,
      curve: HeightCurve::linear(),
      max_height: 1.0,
    }
  }
}

impl NoiseParams {
  pub fn new(seed: u64) -> Self {
    Self {
      seed,
      ..Default::default()
    }
  }

  pub fn with_scale(mut self, scale: f32) -> Self {
    self.scale = scale;
    self
  }

  pub fn with_octaves(mut self, octaves: u32) -> Self {
    self.octaves = octaves;
    self
  }

  pub fn with_persistence(mut self, persistence: f32) -> Self {
    self.persistence = persistence;
    self
  }

  pub fn with_lacunarity(mut self, lacunarity: f32) -> Self {
    self.lacunarity = lacunarity;
    self
  }

  pub fn with_offset(mut self, offset: Vec2) -> Self {
    self.offset = offset;
    self
  }

  pub fn with_curve(mut self, curve: HeightCurve) -> Self {
    self.curve = curve;
    self
  }

  pub fn with_max_height(mut self, max_height: f32) -> Self {
    self.max_height = max_height;
    self
  }

  fn effective_scale(&self) -> f32 {
    if self.scale <= 0.0 {
      1.0
    } else {
      self.scale
    }
  }
}

/// A bordered height grid plus the lowest post-curve value it contains,
/// which downstream code compares against a water level.
#[derive(Clone, Debug)]
pub struct HeightGrid {
  pub grid: Grid2,
  pub lowest_point: f32,
}

/// Seed-derived octave state shared by [`sample`] and grid generation.
struct OctaveTable {
  offsets: Vec<Vec2>,
  max_possible_height: f32,
  perlin: Perlin,
}

impl OctaveTable {
  fn build(params: &NoiseParams) -> Self {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut offsets = Vec::with_capacity(params.octaves as usize);
    let mut max_possible_height = 0.0;
    let mut amplitude = 1.0f32;

    for _ in 0..params.octaves {
      let ox = rng.gen_range(-100_000..100_000) as f32 + params.offset.x;
      let oz = rng.gen_range(-100_000..100_000) as f32 - params.offset.y;
      offsets.push(Vec2::new(ox, oz));

      max_possible_height += amplitude;
      amplitude *= params.persistence;
    }

    Self {
      offsets,
      max_possible_height,
      perlin: Perlin::new(params.seed as u32),
    }
  }

  /// Raw (un-normalized) fractal value at a grid-centered coordinate.
  fn accumulate(&self, params: &NoiseParams, x: f32, z: f32, half_w: f32, half_h: f32) -> f32 {
    let scale = params.effective_scale();
    let mut amplitude = 1.0f32;
    let mut frequency = 1.0f32;
    let mut value = 0.0f32;

    for offset in &self.offsets {
      let sx = (x - half_w + offset.x) / scale * frequency;
      let sz = (z - half_h + offset.y) / scale * frequency;

      value += self.perlin.get([sx as f64, sz as f64]) as f32 * amplitude;

      amplitude *= params.persistence;
      frequency *= params.lacunarity;
    }

    value
  }
}

/// Raw fractal value at `coord`, in an amplitude-dependent range around
/// `[-max_possible, +max_possible]`. No normalization, curve, or height scale.
pub fn sample(coord: Vec2, params: &NoiseParams) -> f32 {
  let table = OctaveTable::build(params);
  table.accumulate(params, coord.x, coord.y, 0.0, 0.0)
}

/// Generate the raw (pre-normalization, pre-curve) fractal grid.
///
/// Border-agreement guarantees hold on these samples: two grids whose offsets
/// differ by exactly the overlap distance produce bit-identical values at the
/// shared columns/rows.
pub fn generate_raw_grid(width: usize, height: usize, params: &NoiseParams) -> Grid2 {
  let table = OctaveTable::build(params);
  let half_w = width as f32 / 2.0;
  let half_h = height as f32 / 2.0;

  let mut grid = Grid2::new(width, height);
  for z in 0..height {
    for x in 0..width {
      let v = table.accumulate(params, x as f32, z as f32, half_w, half_h);
      grid.set(x, z, v);
    }
  }
  grid
}

/// Generate a normalized, curved, height-scaled grid.
///
/// Returns the grid and its lowest post-curve value. With `octaves == 0` the
/// result is a grid of zeros (the normalization pass is skipped entirely).
pub fn generate_height_grid(
  width: usize,
  height: usize,
  params: &NoiseParams,
  mode: NormalizeMode,
) -> Result<HeightGrid> {
  if params.octaves == 0 {
    return Ok(HeightGrid {
      grid: Grid2::new(width, height),
      lowest_point: 0.0,
    });
  }

  let table = OctaveTable::build(params);
  let half_w = width as f32 / 2.0;
  let half_h = height as f32 / 2.0;

  let mut grid = Grid2::new(width, height);
  for z in 0..height {
    for x in 0..width {
      let v = table.accumulate(params, x as f32, z as f32, half_w, half_h);
      grid.set(x, z, v);
    }
  }

  let (local_min, local_max) = grid
    .min_max()
    .ok_or_else(|| TerrainError::config("height grid dimensions must be non-zero"))?;

  let mut lowest_point = f32::MAX;
  for z in 0..height {
    for x in 0..width {
      let raw = grid.get(x, z);
      let normalized = match mode {
        NormalizeMode::Local => inverse_lerp(local_min, local_max, raw),
        NormalizeMode::Global => {
          let n = (raw + 1.0) / (2.0 * table.max_possible_height / GLOBAL_AMPLITUDE_TIGHTEN);
          n.max(0.0)
        }
      };
      let value = params.curve.evaluate(normalized) * params.max_height;
      if value < lowest_point {
        lowest_point = value;
      }
      grid.set(x, z, value);
    }
  }

  Ok(HeightGrid { grid, lowest_point })
}

#[inline]
fn inverse_lerp(a: f32, b: f32, v: f32) -> f32 {
  if (b - a).abs() <= f32::EPSILON {
    0.0
  } else {
    (v - a) / (b - a)
  }
}
