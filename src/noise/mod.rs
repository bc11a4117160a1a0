//! Seeded fractal noise fields.
//!
//! Two producers live here:
//! - [`height`]: 2D multi-octave heightmaps with local/global normalization
//!   and a curve/max-height remap, the input to heightfield meshing.
//! - [`volume`]: 3D noise volumes (six-way 2D perlin average), the input to
//!   marching-cubes cave extraction.
//!
//! Both are deterministic: a seed fully fixes the per-octave offsets and the
//! underlying gradient tables, so repeated calls with identical parameters
//! produce bit-identical grids.

mod height;
mod volume;

#[cfg(test)]
#[path = "height_test.rs"]
mod height_test;

pub use height::{generate_height_grid, generate_raw_grid, sample, HeightGrid, NoiseParams, NormalizeMode};
pub use volume::{generate_binary_volume, generate_volume};
