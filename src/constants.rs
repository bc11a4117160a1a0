//! Grid-layout and streaming constants.
//!
//! Chunk sizes are restricted to a supported set so that every LOD
//! simplification increment divides the interior grid evenly. All entries are
//! multiples of 24, which makes them divisible by each supported increment
//! (1, 2, 4, 6, 8).
//!
//! A height grid for a chunk is `chunk_size + 1` samples per side, the outer
//! ring of which feeds normal calculation but is never emitted as mesh
//! vertices.

/// Number of supported LOD simplification levels (0..=4).
pub const NUM_SUPPORTED_LODS: usize = 5;

/// Highest valid LOD index.
pub const MAX_LOD: u32 = NUM_SUPPORTED_LODS as u32 - 1;

/// Bordered grid sizes usable for smooth-shaded terrain chunks.
pub const SUPPORTED_CHUNK_SIZES: [usize; 9] = [48, 72, 96, 120, 144, 168, 192, 216, 240];

/// Bordered grid sizes usable for flat-shaded terrain chunks.
///
/// Flat shading duplicates one vertex per triangle corner, so larger sizes
/// would exceed a 16-bit index budget on downstream renderers.
pub const SUPPORTED_FLAT_SHADED_CHUNK_SIZES: [usize; 3] = [48, 72, 96];

/// Viewer displacement (world units) that triggers a scheduling tick.
pub const VIEWER_MOVE_THRESHOLD: f32 = 25.0;

/// Squared form of [`VIEWER_MOVE_THRESHOLD`], compared against squared
/// displacement so ticks never pay for a square root.
pub const SQR_VIEWER_MOVE_THRESHOLD: f32 = VIEWER_MOVE_THRESHOLD * VIEWER_MOVE_THRESHOLD;

/// Distance (world units) inside which a chunk's collision mesh is bound.
pub const COLLIDER_GENERATION_DISTANCE: f32 = 25.0;

/// Iso-value forced onto boundary samples of a marching-cubes grid so the
/// extracted surface always closes inside the padded volume.
pub const BOUNDARY_ISO: f32 = 100.0;

/// Stride between samples for a given LOD simplification level.
///
/// LOD 0 keeps full resolution; level N skips `2N` samples per step.
#[inline(always)]
pub const fn simplification_increment(lod: u32) -> usize {
  if lod == 0 {
    1
  } else {
    lod as usize * 2
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn increments_divide_all_supported_sizes() {
    for &size in &SUPPORTED_CHUNK_SIZES {
      for lod in 0..NUM_SUPPORTED_LODS as u32 {
        let incr = simplification_increment(lod);
        // Interior mesh size for a bordered grid of `size + 1` samples.
        let bordered = size + 1;
        let mesh_size = bordered - 2 * incr;
        assert_eq!(
          (mesh_size - 1) % incr,
          0,
          "size {} must support lod {}",
          size,
          lod
        );
      }
    }
  }

  #[test]
  fn flat_shaded_sizes_fit_a_16_bit_index_budget() {
    // Flat shading at full detail emits six vertices per interior quad.
    let flat_vertices = |size: usize| {
      let vertices_per_line = (size + 1) - 2;
      6 * (vertices_per_line - 1) * (vertices_per_line - 1)
    };
    for &size in &SUPPORTED_FLAT_SHADED_CHUNK_SIZES {
      assert!(SUPPORTED_CHUNK_SIZES.contains(&size), "size {}", size);
      assert!(flat_vertices(size) <= u16::MAX as usize + 1, "size {}", size);
    }
    // The next supported size up is why the flat list stops at 96.
    assert!(flat_vertices(120) > u16::MAX as usize + 1);
  }

  #[test]
  fn increment_progression() {
    assert_eq!(simplification_increment(0), 1);
    assert_eq!(simplification_increment(1), 2);
    assert_eq!(simplification_increment(4), 8);
  }
}
