//! Marching squares: configurations, outline tracing, and wall skirts.

use super::marching_squares::generate_cave_mesh;
use crate::automata::{generate_map_2d, with_border, AutomataParams};
use crate::grid::Grid2;

fn solid_map(width: usize, height: usize) -> Grid2 {
  Grid2::from_data(width, height, vec![1.0; width * height])
}

#[test]
fn empty_map_produces_empty_mesh() {
  let mesh = generate_cave_mesh(&Grid2::new(4, 4), 1.0, 5.0);
  assert!(mesh.surface.is_empty());
  assert!(mesh.walls.is_empty());
  assert!(mesh.outlines.is_empty());
}

#[test]
fn degenerate_map_produces_empty_mesh() {
  let mesh = generate_cave_mesh(&Grid2::new(1, 1), 1.0, 5.0);
  assert!(mesh.surface.is_empty());
}

#[test]
fn fully_solid_cell_has_no_outline() {
  // One cell, all four corners on: configuration 15. Its corners are marked
  // checked, so outline tracing must find nothing.
  let mesh = generate_cave_mesh(&solid_map(2, 2), 1.0, 5.0);
  assert_eq!(mesh.surface.triangle_count(), 2);
  assert_eq!(mesh.surface.positions.len(), 4);
  assert!(mesh.outlines.is_empty());
  assert!(mesh.walls.is_empty());
}

#[test]
fn fully_solid_map_shares_corner_vertices() {
  let mesh = generate_cave_mesh(&solid_map(4, 4), 1.0, 5.0);
  // Only control nodes are referenced, and each is emitted exactly once.
  assert_eq!(mesh.surface.positions.len(), 16);
  assert_eq!(mesh.surface.triangle_count(), 18);
  assert!(mesh.outlines.is_empty());
}

#[test]
fn single_active_corner_traces_one_closed_outline() {
  let mut map = Grid2::new(2, 2);
  map.set(0, 0, 1.0);

  let mesh = generate_cave_mesh(&map, 1.0, 5.0);
  assert_eq!(mesh.surface.triangle_count(), 1);

  // Exactly one outline, closed back onto its start, covering the three
  // corner-triangle vertices.
  assert_eq!(mesh.outlines.len(), 1);
  let outline = &mesh.outlines[0];
  assert_eq!(outline.first(), outline.last());
  assert_eq!(outline.len(), 4);
}

#[test]
fn walls_extrude_one_quad_per_segment() {
  let wall_height = 5.0;
  let mut map = Grid2::new(2, 2);
  map.set(0, 0, 1.0);

  let mesh = generate_cave_mesh(&map, 1.0, wall_height);
  // Outline of 3 segments: 4 vertices and 2 triangles each.
  assert_eq!(mesh.walls.positions.len(), 12);
  assert_eq!(mesh.walls.triangle_count(), 6);

  // Extruded vertices sit exactly wall_height below their outline twins.
  for quad in mesh.walls.positions.chunks_exact(4) {
    assert_eq!(quad[0].y - quad[2].y, wall_height);
    assert_eq!(quad[1].y - quad[3].y, wall_height);
  }
}

#[test]
fn automaton_map_meshes_cleanly() {
  let params = AutomataParams::new(2024)
    .with_fill_percent(45)
    .with_smooth_iterations(4);
  let map = with_border(&generate_map_2d(24, 24, &params), 3);

  let mesh = generate_cave_mesh(&map, 1.0, 5.0);
  assert!(!mesh.surface.is_empty());
  for &i in &mesh.surface.indices {
    assert!((i as usize) < mesh.surface.positions.len());
  }
  for &i in &mesh.walls.indices {
    assert!((i as usize) < mesh.walls.positions.len());
  }
  assert_eq!(mesh.surface.indices.len() % 3, 0);

  let normals = mesh.surface.normals.as_ref().unwrap();
  assert_eq!(normals.len(), mesh.surface.positions.len());
}

#[test]
fn outlines_reference_surface_vertices() {
  let params = AutomataParams::new(7);
  let map = with_border(&generate_map_2d(16, 16, &params), 2);
  let mesh = generate_cave_mesh(&map, 1.0, 3.0);

  for outline in &mesh.outlines {
    assert!(outline.len() >= 3);
    assert_eq!(outline.first(), outline.last());
    for &v in outline {
      assert!((v as usize) < mesh.surface.positions.len());
    }
  }
}
