//! Heightfield triangulation with seam-safe borders and LOD simplification.
//!
//! The input grid carries a one-cell border ring. Border cells get triangles
//! like everyone else, but those triangles land in a private side buffer:
//! they contribute face normals to adjacent interior vertices (so normals
//! stay continuous across independently meshed chunks) and are then thrown
//! away. The emitted mesh contains interior vertices only.
//!
//! LOD level N walks the grid with stride `2N` (stride 1 at level 0). The
//! stride must divide the interior grid evenly; chunk sizes are chosen from
//! [`crate::constants::SUPPORTED_CHUNK_SIZES`] to guarantee that for every
//! supported level.

use glam::{Vec2, Vec3};

use crate::constants::{simplification_increment, MAX_LOD};
use crate::error::{Result, TerrainError};
use crate::grid::Grid2;
use crate::mesh::{face_normal, MeshBuffers, VertexId};

/// Triangulate a bordered height grid at the given LOD level.
///
/// With `flat_shading` the shared-vertex buffers are discarded in favor of
/// one vertex per triangle corner, and no normals are baked (consumers
/// recompute uniform face normals).
pub fn generate_terrain_mesh(
  height_map: &Grid2,
  lod: u32,
  flat_shading: bool,
) -> Result<MeshBuffers> {
  let bordered_size = height_map.width();
  if height_map.height() != bordered_size {
    return Err(TerrainError::config("height grid must be square"));
  }
  if lod > MAX_LOD {
    return Err(TerrainError::config(format!(
      "lod {} exceeds the maximum of {}",
      lod, MAX_LOD
    )));
  }

  let increment = simplification_increment(lod);
  if bordered_size < 2 * increment + 2 {
    return Err(TerrainError::config(format!(
      "grid of {} samples is too small for lod {}",
      bordered_size, lod
    )));
  }

  let mesh_size = bordered_size - 2 * increment;
  let mesh_size_unsimplified = bordered_size - 2;
  if (mesh_size - 1) % increment != 0 {
    return Err(TerrainError::config(format!(
      "simplification increment {} does not divide grid of {} samples",
      increment, bordered_size
    )));
  }

  let vertices_per_line = (mesh_size - 1) / increment + 1;

  // Spawn the sheet centered on the origin.
  let top_left_x = (mesh_size_unsimplified as f32 - 1.0) / -2.0;
  let top_left_z = (mesh_size_unsimplified as f32 - 1.0) / 2.0;

  let mut data = HeightfieldMeshData::with_capacity(vertices_per_line);

  // Pass 1: assign every visited cell an interior or border slot.
  let mut index_map = vec![VertexId::Interior(u32::MAX); bordered_size * bordered_size];
  let mut interior_count = 0u32;
  let mut border_count = 0u32;
  for z in (0..bordered_size).step_by(increment) {
    for x in (0..bordered_size).step_by(increment) {
      let on_border = z == 0 || z == bordered_size - 1 || x == 0 || x == bordered_size - 1;
      index_map[z * bordered_size + x] = if on_border {
        let id = VertexId::Border(border_count);
        border_count += 1;
        id
      } else {
        let id = VertexId::Interior(interior_count);
        interior_count += 1;
        id
      };
    }
  }

  // Pass 2: emit vertices and quads.
  for z in (0..bordered_size).step_by(increment) {
    for x in (0..bordered_size).step_by(increment) {
      let vertex_id = index_map[z * bordered_size + x];

      let percent = Vec2::new(
        (x as f32 - increment as f32) / mesh_size as f32,
        (z as f32 - increment as f32) / mesh_size as f32,
      );
      let position = Vec3::new(
        top_left_x + percent.x * mesh_size_unsimplified as f32,
        height_map.get(x, z),
        top_left_z - percent.y * mesh_size_unsimplified as f32,
      );
      data.add_vertex(position, percent, vertex_id);

      // The last row and column close no quad of their own.
      if x < bordered_size - 1 && z < bordered_size - 1 {
        let a = index_map[z * bordered_size + x];
        let b = index_map[z * bordered_size + (x + increment)];
        let c = index_map[(z + increment) * bordered_size + x];
        let d = index_map[(z + increment) * bordered_size + (x + increment)];

        data.add_triangle(a, d, c);
        data.add_triangle(d, a, b);
      }
    }
  }

  Ok(if flat_shading {
    data.into_flat_shaded()
  } else {
    data.into_smooth_shaded()
  })
}

/// Accumulates interior and border geometry during the grid walk.
struct HeightfieldMeshData {
  positions: Vec<Vec3>,
  uvs: Vec<Vec2>,
  indices: Vec<u32>,
  border_positions: Vec<Vec3>,
  border_triangles: Vec<[VertexId; 3]>,
}

impl HeightfieldMeshData {
  fn with_capacity(vertices_per_line: usize) -> Self {
    Self {
      positions: Vec::with_capacity(vertices_per_line * vertices_per_line),
      uvs: Vec::with_capacity(vertices_per_line * vertices_per_line),
      indices: Vec::with_capacity((vertices_per_line - 1) * (vertices_per_line - 1) * 6),
      border_positions: Vec::with_capacity(vertices_per_line * 4 + 4),
      border_triangles: Vec::with_capacity(vertices_per_line * 8),
    }
  }

  fn add_vertex(&mut self, position: Vec3, uv: Vec2, id: VertexId) {
    match id {
      VertexId::Interior(index) => {
        debug_assert_eq!(index as usize, self.positions.len());
        self.positions.push(position);
        self.uvs.push(uv);
      }
      VertexId::Border(index) => {
        debug_assert_eq!(index as usize, self.border_positions.len());
        self.border_positions.push(position);
      }
    }
  }

  fn add_triangle(&mut self, a: VertexId, b: VertexId, c: VertexId) {
    match (a, b, c) {
      (VertexId::Interior(a), VertexId::Interior(b), VertexId::Interior(c)) => {
        self.indices.extend_from_slice(&[a, b, c]);
      }
      _ => self.border_triangles.push([a, b, c]),
    }
  }

  fn position_of(&self, id: VertexId) -> Vec3 {
    match id {
      VertexId::Interior(index) => self.positions[index as usize],
      VertexId::Border(index) => self.border_positions[index as usize],
    }
  }

  /// Bake smooth normals: every triangle, border-only ones included, adds its
  /// face normal to the interior vertices it touches.
  fn bake_normals(&self) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; self.positions.len()];

    for tri in self.indices.chunks_exact(3) {
      let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
      let n = face_normal(self.positions[a], self.positions[b], self.positions[c]);
      normals[a] += n;
      normals[b] += n;
      normals[c] += n;
    }

    for tri in &self.border_triangles {
      let n = face_normal(
        self.position_of(tri[0]),
        self.position_of(tri[1]),
        self.position_of(tri[2]),
      );
      for id in tri {
        if let VertexId::Interior(index) = id {
          normals[*index as usize] += n;
        }
      }
    }

    for n in &mut normals {
      *n = n.normalize_or_zero();
    }
    normals
  }

  fn into_smooth_shaded(self) -> MeshBuffers {
    let normals = self.bake_normals();
    MeshBuffers {
      positions: self.positions,
      uvs: self.uvs,
      indices: self.indices,
      normals: Some(normals),
    }
  }

  /// One vertex per triangle corner; the shared buffers are discarded and
  /// consumers recompute uniform per-face normals.
  fn into_flat_shaded(self) -> MeshBuffers {
    let mut positions = Vec::with_capacity(self.indices.len());
    let mut uvs = Vec::with_capacity(self.indices.len());
    let mut indices = Vec::with_capacity(self.indices.len());

    for (i, &index) in self.indices.iter().enumerate() {
      positions.push(self.positions[index as usize]);
      uvs.push(self.uvs[index as usize]);
      indices.push(i as u32);
    }

    MeshBuffers {
      positions,
      uvs,
      indices,
      normals: None,
    }
  }
}
