//! Mesh output types and the three meshers.
//!
//! - [`heightfield`]: bordered 2D height grid → LOD-simplified terrain sheet.
//! - [`marching_squares`]: thresholded 2D grid → cave floor plus extruded
//!   wall skirts traced from mesh outlines.
//! - [`marching_cubes`]: thresholded 3D grid → closed isosurface.
//!
//! All meshers emit [`MeshBuffers`]; consumers upload them or wrap them in
//! collision bodies, neither of which is this crate's concern.

pub mod heightfield;
pub mod marching_cubes;
pub mod marching_squares;
pub mod tri_table;

#[cfg(test)]
#[path = "marching_squares_test.rs"]
mod marching_squares_test;

use glam::{Vec2, Vec3};

/// Indexed triangle mesh produced by the meshers.
///
/// Invariants: `indices.len() % 3 == 0`, every index is `< positions.len()`,
/// and `uvs`/`normals` are either empty/absent or parallel to `positions`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
  pub positions: Vec<Vec3>,
  pub uvs: Vec<Vec2>,
  pub indices: Vec<u32>,
  /// Per-vertex normals. `None` when the consumer is expected to recompute
  /// them (flat-shaded terrain).
  pub normals: Option<Vec<Vec3>>,
}

impl MeshBuffers {
  pub fn is_empty(&self) -> bool {
    self.positions.is_empty()
  }

  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  /// Flip the winding of every triangle in place.
  pub fn invert_winding(&mut self) {
    for tri in self.indices.chunks_exact_mut(3) {
      tri.swap(0, 1);
    }
  }

  /// Recompute smooth per-vertex normals from the current topology.
  pub fn recalculate_normals(&mut self) {
    let mut normals = vec![Vec3::ZERO; self.positions.len()];
    for tri in self.indices.chunks_exact(3) {
      let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
      let n = face_normal(self.positions[a], self.positions[b], self.positions[c]);
      normals[a] += n;
      normals[b] += n;
      normals[c] += n;
    }
    for n in &mut normals {
      *n = n.normalize_or_zero();
    }
    self.normals = Some(normals);
  }
}

/// Unit normal of the triangle `(a, b, c)`.
pub(crate) fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
  let side_ab = b - a;
  let side_ac = c - a;
  side_ab.cross(side_ac).normalize_or_zero()
}

/// A vertex slot in the bordered heightfield walk.
///
/// Border vertices feed normal smoothing but never reach the output buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexId {
  /// Index into the emitted vertex buffers.
  Interior(u32),
  /// Index into the mesher's private border buffer.
  Border(u32),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn winding_inversion_swaps_first_pair() {
    let mut mesh = MeshBuffers {
      positions: vec![Vec3::ZERO; 3],
      indices: vec![0, 1, 2],
      ..Default::default()
    };
    mesh.invert_winding();
    assert_eq!(mesh.indices, vec![1, 0, 2]);
    mesh.invert_winding();
    assert_eq!(mesh.indices, vec![0, 1, 2]);
  }

  #[test]
  fn recalculated_normals_are_unit_length() {
    let mut mesh = MeshBuffers {
      positions: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
      indices: vec![0, 1, 2],
      ..Default::default()
    };
    mesh.recalculate_normals();
    let normals = mesh.normals.unwrap();
    for n in normals {
      assert!((n.length() - 1.0).abs() < 1e-5);
    }
  }

  #[test]
  fn face_normal_follows_the_winding() {
    // Counter-clockwise seen from above must face up.
    let up = face_normal(Vec3::ZERO, Vec3::Z, Vec3::X);
    assert_eq!(up, Vec3::Y);
    let down = face_normal(Vec3::ZERO, Vec3::X, Vec3::Z);
    assert_eq!(down, -Vec3::Y);
  }
}
