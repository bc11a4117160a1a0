//! Marching cubes over a 3D scalar volume.
//!
//! Corner configurations index [`tri_table::TRI_TABLE`]; each listed edge
//! yields one vertex, interpolated along the edge to the iso crossing and
//! deduplicated so neighboring cubes share seam vertices. Samples on the
//! volume boundary are clamped to a far-outside value, which closes the
//! surface at the edges of the grid.

use std::collections::HashMap;

use glam::Vec3;

use crate::constants::BOUNDARY_ISO;
use crate::grid::Grid3;
use crate::mesh::tri_table::{
  CORNER_A_FROM_EDGE, CORNER_B_FROM_EDGE, CORNER_OFFSETS, TRI_TABLE, TRI_TABLE_SENTINEL,
};
use crate::mesh::MeshBuffers;

/// Snap tolerance for iso crossings that land on a cube corner.
const CORNER_EPSILON: f32 = 1e-5;

/// Polygonize the region of `map` below `surface_level`.
///
/// A volume with fewer than 2 samples on any axis has no cubes and produces
/// an empty mesh.
pub fn generate_isosurface_mesh(map: &Grid3, cube_size: f32, surface_level: f32) -> MeshBuffers {
  if map.width() < 2 || map.height() < 2 || map.depth() < 2 {
    return MeshBuffers::default();
  }

  let mut mesher = CubesMesher {
    map,
    cube_size,
    surface_level,
    mesh: MeshBuffers::default(),
    edge_vertices: HashMap::new(),
  };

  for z in 0..map.depth() - 1 {
    for y in 0..map.height() - 1 {
      for x in 0..map.width() - 1 {
        mesher.polygonize_cube(x, y, z);
      }
    }
  }

  let mut mesh = mesher.mesh;
  // The table winds for inside-is-high volumes; ours are inside-is-low.
  mesh.invert_winding();
  mesh.recalculate_normals();
  mesh
}

struct CubesMesher<'a> {
  map: &'a Grid3,
  cube_size: f32,
  surface_level: f32,
  mesh: MeshBuffers,
  /// Shared iso vertex per edge, keyed by the ordered linear sample indices
  /// of the edge endpoints.
  edge_vertices: HashMap<(usize, usize), u32>,
}

impl<'a> CubesMesher<'a> {
  /// Sample value with the boundary clamped far outside the surface.
  fn value(&self, x: usize, y: usize, z: usize) -> f32 {
    let on_boundary = x == 0
      || y == 0
      || z == 0
      || x == self.map.width() - 1
      || y == self.map.height() - 1
      || z == self.map.depth() - 1;
    if on_boundary {
      BOUNDARY_ISO
    } else {
      self.map.get(x, y, z)
    }
  }

  fn linear_index(&self, x: usize, y: usize, z: usize) -> usize {
    (z * self.map.height() + y) * self.map.width() + x
  }

  fn sample_position(&self, x: usize, y: usize, z: usize) -> Vec3 {
    let sq = self.cube_size;
    Vec3::new(
      -(self.map.width() as f32) * sq / 2.0 + x as f32 * sq + sq / 2.0,
      -(self.map.height() as f32) * sq / 2.0 + y as f32 * sq + sq / 2.0,
      -(self.map.depth() as f32) * sq / 2.0 + z as f32 * sq + sq / 2.0,
    )
  }

  fn polygonize_cube(&mut self, x: usize, y: usize, z: usize) {
    let mut corners = [(0usize, 0usize, 0usize); 8];
    let mut values = [0.0f32; 8];
    let mut configuration = 0usize;
    for (i, offset) in CORNER_OFFSETS.iter().enumerate() {
      let corner = (x + offset[0], y + offset[1], z + offset[2]);
      corners[i] = corner;
      values[i] = self.value(corner.0, corner.1, corner.2);
      if values[i] < self.surface_level {
        configuration |= 1 << i;
      }
    }

    let row = &TRI_TABLE[configuration];
    for tri in row.chunks_exact(3) {
      if tri[0] == TRI_TABLE_SENTINEL {
        break;
      }
      let a = self.edge_vertex(tri[0] as usize, &corners, &values);
      let b = self.edge_vertex(tri[1] as usize, &corners, &values);
      let c = self.edge_vertex(tri[2] as usize, &corners, &values);
      self.mesh.indices.extend_from_slice(&[a, b, c]);
    }
  }

  fn edge_vertex(
    &mut self,
    edge: usize,
    corners: &[(usize, usize, usize); 8],
    values: &[f32; 8],
  ) -> u32 {
    let ca = CORNER_A_FROM_EDGE[edge];
    let cb = CORNER_B_FROM_EDGE[edge];
    let (ax, ay, az) = corners[ca];
    let (bx, by, bz) = corners[cb];

    let ia = self.linear_index(ax, ay, az);
    let ib = self.linear_index(bx, by, bz);
    let key = (ia.min(ib), ia.max(ib));
    if let Some(&index) = self.edge_vertices.get(&key) {
      return index;
    }

    let pa = self.sample_position(ax, ay, az);
    let pb = self.sample_position(bx, by, bz);
    let position = self.interpolate(pa, pb, values[ca], values[cb]);

    let index = self.mesh.positions.len() as u32;
    self.mesh.positions.push(position);
    self.edge_vertices.insert(key, index);
    index
  }

  /// Iso crossing along the edge, snapped to a corner when the crossing is
  /// degenerate.
  fn interpolate(&self, pa: Vec3, pb: Vec3, va: f32, vb: f32) -> Vec3 {
    if (self.surface_level - va).abs() < CORNER_EPSILON {
      return pa;
    }
    if (self.surface_level - vb).abs() < CORNER_EPSILON {
      return pb;
    }
    if (va - vb).abs() < CORNER_EPSILON {
      return pa;
    }
    let t = (self.surface_level - va) / (vb - va);
    pa + (pb - pa) * t
  }
}
