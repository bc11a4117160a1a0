//! Marching squares with outline tracing and wall skirts.
//!
//! Each unit cell has four corner control nodes and four midpoint nodes; a
//! 4-bit corner configuration selects a fixed fan of 0-6 points (no
//! interpolation, corners are strictly in or out). Shared points are
//! deduplicated through lazily assigned vertex indices.
//!
//! After triangulation, mesh outlines are traced: an edge belongs to the
//! outline iff exactly one triangle contains both endpoints. Each closed
//! outline is extruded downward into a wall skirt. Fully solid cells mark
//! their corners checked up front so interior vertices never seed a trace.

use std::collections::{HashMap, HashSet};

use glam::Vec3;
use smallvec::SmallVec;

use crate::grid::Grid2;
use crate::mesh::MeshBuffers;

/// Threshold above which an automaton/noise sample counts as solid.
pub const SOLID_THRESHOLD: f32 = 0.5;

/// Cave geometry: a flat surface mesh, the extruded wall mesh, and the traced
/// outlines (vertex-index loops into the surface mesh, first == last).
#[derive(Clone, Debug, Default)]
pub struct CaveMesh {
  pub surface: MeshBuffers,
  pub walls: MeshBuffers,
  pub outlines: Vec<Vec<u32>>,
}

/// The eight points a cell configuration can draw from.
#[derive(Clone, Copy, Debug)]
enum SquarePoint {
  TopLeft,
  CentreTop,
  TopRight,
  CentreRight,
  BottomRight,
  CentreBottom,
  BottomLeft,
  CentreLeft,
}

use SquarePoint::*;

/// Point fan per 4-bit configuration (TL=8, TR=4, BR=2, BL=1).
fn points_for(configuration: u8) -> &'static [SquarePoint] {
  match configuration {
    0 => &[],

    // 1 corner:
    1 => &[CentreLeft, CentreBottom, BottomLeft],
    2 => &[BottomRight, CentreBottom, CentreRight],
    4 => &[TopRight, CentreRight, CentreTop],
    8 => &[TopLeft, CentreTop, CentreLeft],

    // 2 corners:
    3 => &[CentreRight, BottomRight, BottomLeft, CentreLeft],
    6 => &[CentreTop, TopRight, BottomRight, CentreBottom],
    9 => &[TopLeft, CentreTop, CentreBottom, BottomLeft],
    12 => &[TopLeft, TopRight, CentreRight, CentreLeft],
    5 => &[CentreTop, TopRight, CentreRight, CentreBottom, BottomLeft, CentreLeft],
    10 => &[TopLeft, CentreTop, CentreRight, BottomRight, CentreBottom, CentreLeft],

    // 3 corners:
    7 => &[CentreTop, TopRight, BottomRight, BottomLeft, CentreLeft],
    11 => &[TopLeft, CentreTop, CentreRight, BottomRight, BottomLeft],
    13 => &[TopLeft, TopRight, CentreRight, CentreBottom, BottomLeft],
    14 => &[TopLeft, TopRight, BottomRight, CentreBottom, CentreLeft],

    // 4 corners (handled specially: corners are marked checked):
    15 => &[TopLeft, TopRight, BottomRight, BottomLeft],

    // A 4-bit mask cannot exceed 15.
    _ => unreachable!("corrupt marching-squares configuration {}", configuration),
  }
}

/// Which shared node a [`SquarePoint`] resolves to for the cell at `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum NodeRef {
  /// Corner control node at grid position.
  Control(usize, usize),
  /// Midpoint above a control node (+z half step).
  Above(usize, usize),
  /// Midpoint right of a control node (+x half step).
  Right(usize, usize),
}

#[derive(Clone, Copy)]
struct Triangle {
  a: u32,
  b: u32,
  c: u32,
}

impl Triangle {
  fn contains(&self, v: u32) -> bool {
    v == self.a || v == self.b || v == self.c
  }

  fn vertices(&self) -> [u32; 3] {
    [self.a, self.b, self.c]
  }
}

struct SquaresMesher<'a> {
  map: &'a Grid2,
  square_size: f32,
  positions: Vec<Vec3>,
  indices: Vec<u32>,
  /// Lazily assigned vertex index per shared node.
  node_indices: HashMap<NodeRef, u32>,
  /// All triangles touching each vertex, for outline detection.
  triangle_lookup: HashMap<u32, SmallVec<[Triangle; 8]>>,
  /// Vertices excluded from (or already consumed by) outline tracing.
  checked: HashSet<u32>,
}

/// Generate cave geometry from a thresholded 2D map.
///
/// An empty or degenerate map (fewer than 2 samples per axis) produces empty
/// meshes, not an error.
pub fn generate_cave_mesh(map: &Grid2, square_size: f32, wall_height: f32) -> CaveMesh {
  if map.width() < 2 || map.height() < 2 {
    return CaveMesh::default();
  }

  let mut mesher = SquaresMesher {
    map,
    square_size,
    positions: Vec::new(),
    indices: Vec::new(),
    node_indices: HashMap::new(),
    triangle_lookup: HashMap::new(),
    checked: HashSet::new(),
  };

  for y in 0..map.height() - 1 {
    for x in 0..map.width() - 1 {
      mesher.triangulate_square(x, y);
    }
  }

  let outlines = mesher.trace_outlines();
  let walls = mesher.build_walls(&outlines, wall_height);

  let mut surface = MeshBuffers {
    positions: mesher.positions,
    indices: mesher.indices,
    ..Default::default()
  };
  surface.recalculate_normals();

  CaveMesh {
    surface,
    walls,
    outlines,
  }
}

impl<'a> SquaresMesher<'a> {
  fn is_solid(&self, x: usize, y: usize) -> bool {
    self.map.get(x, y) >= SOLID_THRESHOLD
  }

  fn node_position(&self, node: NodeRef) -> Vec3 {
    let sq = self.square_size;
    let map_w = self.map.width() as f32 * sq;
    let map_h = self.map.height() as f32 * sq;
    let control = |x: usize, y: usize| {
      Vec3::new(
        -map_w / 2.0 + x as f32 * sq + sq / 2.0,
        0.0,
        -map_h / 2.0 + y as f32 * sq + sq / 2.0,
      )
    };
    match node {
      NodeRef::Control(x, y) => control(x, y),
      NodeRef::Above(x, y) => control(x, y) + Vec3::new(0.0, 0.0, sq / 2.0),
      NodeRef::Right(x, y) => control(x, y) + Vec3::new(sq / 2.0, 0.0, 0.0),
    }
  }

  fn resolve(&self, point: SquarePoint, x: usize, y: usize) -> NodeRef {
    match point {
      TopLeft => NodeRef::Control(x, y + 1),
      TopRight => NodeRef::Control(x + 1, y + 1),
      BottomRight => NodeRef::Control(x + 1, y),
      BottomLeft => NodeRef::Control(x, y),
      CentreTop => NodeRef::Right(x, y + 1),
      CentreRight => NodeRef::Above(x + 1, y),
      CentreBottom => NodeRef::Right(x, y),
      CentreLeft => NodeRef::Above(x, y),
    }
  }

  fn vertex_index(&mut self, node: NodeRef) -> u32 {
    if let Some(&index) = self.node_indices.get(&node) {
      return index;
    }
    let index = self.positions.len() as u32;
    let position = self.node_position(node);
    self.positions.push(position);
    self.node_indices.insert(node, index);
    index
  }

  fn triangulate_square(&mut self, x: usize, y: usize) {
    let mut configuration = 0u8;
    if self.is_solid(x, y + 1) {
      configuration += 8; // top left
    }
    if self.is_solid(x + 1, y + 1) {
      configuration += 4; // top right
    }
    if self.is_solid(x + 1, y) {
      configuration += 2; // bottom right
    }
    if self.is_solid(x, y) {
      configuration += 1; // bottom left
    }

    let points = points_for(configuration);
    let vertex_ids: SmallVec<[u32; 6]> = points
      .iter()
      .map(|&p| {
        let node = self.resolve(p, x, y);
        self.vertex_index(node)
      })
      .collect();

    // Fan triangulation from the first point.
    for i in 1..vertex_ids.len().saturating_sub(1) {
      self.create_triangle(vertex_ids[0], vertex_ids[i], vertex_ids[i + 1]);
    }

    // A fully enclosed cell can never touch an outline.
    if configuration == 15 {
      for &id in &vertex_ids {
        self.checked.insert(id);
      }
    }
  }

  fn create_triangle(&mut self, a: u32, b: u32, c: u32) {
    self.indices.extend_from_slice(&[a, b, c]);
    let triangle = Triangle { a, b, c };
    for v in triangle.vertices() {
      self.triangle_lookup.entry(v).or_default().push(triangle);
    }
  }

  /// An edge lies on the outline iff exactly one triangle contains both ends.
  fn is_outline_edge(&self, a: u32, b: u32) -> bool {
    let Some(triangles) = self.triangle_lookup.get(&a) else {
      return false;
    };
    let mut shared = 0;
    for tri in triangles {
      if tri.contains(b) {
        shared += 1;
        if shared > 1 {
          return false;
        }
      }
    }
    shared == 1
  }

  fn connected_outline_vertex(&self, vertex: u32) -> Option<u32> {
    let triangles = self.triangle_lookup.get(&vertex)?;
    for tri in triangles {
      for other in tri.vertices() {
        if other != vertex
          && !self.checked.contains(&other)
          && self.is_outline_edge(vertex, other)
        {
          return Some(other);
        }
      }
    }
    None
  }

  /// Trace every closed outline loop; loops repeat their start vertex last.
  fn trace_outlines(&mut self) -> Vec<Vec<u32>> {
    let mut outlines = Vec::new();

    for vertex in 0..self.positions.len() as u32 {
      if self.checked.contains(&vertex) {
        continue;
      }
      let Some(start) = self.connected_outline_vertex(vertex) else {
        continue;
      };
      self.checked.insert(vertex);

      let mut outline = vec![vertex];
      let mut current = start;
      loop {
        outline.push(current);
        self.checked.insert(current);
        match self.connected_outline_vertex(current) {
          Some(next) => current = next,
          None => break,
        }
      }
      outline.push(vertex);
      outlines.push(outline);
    }

    outlines
  }

  /// Four vertices and two triangles per outline segment, dropped by
  /// `wall_height`.
  fn build_walls(&self, outlines: &[Vec<u32>], wall_height: f32) -> MeshBuffers {
    let mut walls = MeshBuffers::default();
    let drop = Vec3::Y * wall_height;

    for outline in outlines {
      for pair in outline.windows(2) {
        let left = self.positions[pair[0] as usize];
        let right = self.positions[pair[1] as usize];

        let start = walls.positions.len() as u32;
        walls.positions.push(left);
        walls.positions.push(right);
        walls.positions.push(left - drop);
        walls.positions.push(right - drop);

        walls
          .indices
          .extend_from_slice(&[start, start + 2, start + 3]);
        walls
          .indices
          .extend_from_slice(&[start + 3, start + 1, start]);
      }
    }

    walls
  }
}
