//! 3D noise volumes for cave density fields.
//!
//! True 3D gradient noise is approximated by averaging 2D perlin over the six
//! ordered coordinate pairs. The result lands in `[0, 1]`, so cave cutoffs
//! keep the same meaning as the automaton fill fraction.

use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::grid::Grid3;

/// Six-way 2D perlin average remapped to `[0, 1]`.
fn perlin3(perlin: &Perlin, x: f64, y: f64, z: f64) -> f32 {
  let xy = perlin.get([x, y]);
  let xz = perlin.get([x, z]);
  let yz = perlin.get([y, z]);
  let yx = perlin.get([y, x]);
  let zx = perlin.get([z, x]);
  let zy = perlin.get([z, y]);

  let avg = (xy + xz + yz + yx + zx + zy) / 6.0;
  (avg as f32) * 0.5 + 0.5
}

/// Generate a cubic volume of noise densities in `[0, 1]`.
///
/// `scale` is a frequency multiplier: smaller values give larger features.
pub fn generate_volume(size: usize, scale: f32, seed: u64) -> Grid3 {
  let mut rng = StdRng::seed_from_u64(seed);
  let ox = rng.gen_range(0..100_000) as f64;
  let oy = rng.gen_range(0..100_000) as f64;
  let oz = rng.gen_range(0..100_000) as f64;
  let perlin = Perlin::new(seed as u32);
  let scale = scale as f64;

  let mut volume = Grid3::cube(size);
  for z in 0..size {
    for y in 0..size {
      for x in 0..size {
        let v = perlin3(
          &perlin,
          (x as f64 + ox) * scale,
          (y as f64 + oy) * scale,
          (z as f64 + oz) * scale,
        );
        volume.set(x, y, z, v);
      }
    }
  }
  volume
}

/// Generate a thresholded volume: samples at or above `cutoff` become solid
/// (1.0), the rest open (0.0).
pub fn generate_binary_volume(size: usize, scale: f32, cutoff: f32, seed: u64) -> Grid3 {
  let mut volume = generate_volume(size, scale, seed);
  for z in 0..size {
    for y in 0..size {
      for x in 0..size {
        let solid = volume.get(x, y, z) >= cutoff;
        volume.set(x, y, z, if solid { 1.0 } else { 0.0 });
      }
    }
  }
  volume
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn volume_is_deterministic() {
    let a = generate_volume(8, 0.1, 99);
    let b = generate_volume(8, 0.1, 99);
    assert_eq!(a, b);
  }

  #[test]
  fn volume_values_in_unit_range() {
    let v = generate_volume(8, 0.07, 3);
    for &s in v.samples() {
      assert!((0.0..=1.0).contains(&s), "sample {} out of range", s);
    }
  }

  #[test]
  fn binary_volume_is_two_valued() {
    let v = generate_binary_volume(6, 0.2, 0.5, 7);
    for &s in v.samples() {
      assert!(s == 0.0 || s == 1.0);
    }
  }
}
