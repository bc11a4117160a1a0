//! Chunk records and the cache they live in.
//!
//! A [`ChunkRecord`] tracks one streamed terrain chunk: its height data, one
//! write-once mesh slot per detail level, an optional collider mesh, and
//! visibility bookkeeping. Records are created by the scheduler the first
//! time a chunk enters the view window and are only removed by explicit
//! eviction. All cache writes are idempotent: results arriving late (for a
//! chunk that has since been hidden) are stored exactly like timely ones.

pub mod streaming;

#[cfg(test)]
#[path = "streaming_test.rs"]
mod streaming_test;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use glam::{IVec2, Vec2};
use tracing::trace;

use crate::mesh::MeshBuffers;
use crate::noise::HeightGrid;

/// Integer chunk coordinate (world position divided by chunk extent).
pub type ChunkCoord = IVec2;

/// One entry of the LOD table: the simplification level to mesh at and the
/// viewer distance out to which it applies.
#[derive(Clone, Copy, Debug)]
pub struct LodSetting {
  pub lod: u32,
  pub visible_distance_threshold: f32,
}

impl LodSetting {
  pub fn new(lod: u32, visible_distance_threshold: f32) -> Self {
    Self {
      lod,
      visible_distance_threshold,
    }
  }
}

/// A write-once mesh slot for one detail level.
#[derive(Debug, Default)]
struct MeshSlot {
  requested: bool,
  mesh: Option<MeshBuffers>,
}

/// Everything the scheduler knows about one chunk.
#[derive(Debug)]
pub struct ChunkRecord {
  pub coord: ChunkCoord,
  /// World-space center of the chunk (in viewer-normalized units).
  center: Vec2,
  /// World extent of the chunk per side.
  extent: f32,
  height: Option<Arc<HeightGrid>>,
  height_requested: bool,
  lod_meshes: Vec<MeshSlot>,
  /// Index into the LOD table of the mesh currently on display.
  active_lod: Option<usize>,
  collider: MeshSlot,
  collider_bound: bool,
  visible: bool,
}

impl ChunkRecord {
  fn new(coord: ChunkCoord, extent: f32, lod_count: usize) -> Self {
    let center = coord.as_vec2() * extent;
    let mut lod_meshes = Vec::with_capacity(lod_count);
    lod_meshes.resize_with(lod_count, MeshSlot::default);
    Self {
      coord,
      center,
      extent,
      height: None,
      height_requested: false,
      lod_meshes,
      active_lod: None,
      collider: MeshSlot::default(),
      collider_bound: false,
      visible: false,
    }
  }

  /// Squared distance from `point` to the chunk's bounding square.
  pub fn sqr_distance_to(&self, point: Vec2) -> f32 {
    let delta = (point - self.center).abs() - Vec2::splat(self.extent / 2.0);
    delta.max(Vec2::ZERO).length_squared()
  }

  pub fn is_visible(&self) -> bool {
    self.visible
  }

  pub fn has_height(&self) -> bool {
    self.height.is_some()
  }

  pub fn height(&self) -> Option<&Arc<HeightGrid>> {
    self.height.as_ref()
  }

  /// Index into the LOD table of the mesh currently displayed.
  pub fn active_lod(&self) -> Option<usize> {
    self.active_lod
  }

  /// Cached mesh for a LOD table index, whether or not it is active.
  pub fn mesh_at(&self, lod_index: usize) -> Option<&MeshBuffers> {
    self.lod_meshes.get(lod_index)?.mesh.as_ref()
  }

  /// The mesh currently on display.
  pub fn active_mesh(&self) -> Option<&MeshBuffers> {
    self.mesh_at(self.active_lod?)
  }

  /// Collider mesh, once generated and bound.
  pub fn collider_mesh(&self) -> Option<&MeshBuffers> {
    if self.collider_bound {
      self.collider.mesh.as_ref()
    } else {
      None
    }
  }

  /// Whether the chunk's lowest point sits under `level`. `None` until
  /// height data is ready.
  pub fn dips_below(&self, level: f32) -> Option<bool> {
    Some(self.height.as_ref()?.lowest_point < level)
  }
}

/// Owns every chunk record plus the set of currently visible coordinates.
#[derive(Debug, Default)]
pub struct ChunkStore {
  records: HashMap<ChunkCoord, ChunkRecord>,
  visible: HashSet<ChunkCoord>,
}

impl ChunkStore {
  pub fn get(&self, coord: ChunkCoord) -> Option<&ChunkRecord> {
    self.records.get(&coord)
  }

  pub(crate) fn get_mut(&mut self, coord: ChunkCoord) -> Option<&mut ChunkRecord> {
    self.records.get_mut(&coord)
  }

  pub fn contains(&self, coord: ChunkCoord) -> bool {
    self.records.contains_key(&coord)
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn visible_coords(&self) -> &HashSet<ChunkCoord> {
    &self.visible
  }

  pub(crate) fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
    self.records.keys().copied()
  }

  pub(crate) fn ensure_record(
    &mut self,
    coord: ChunkCoord,
    extent: f32,
    lod_count: usize,
  ) -> &mut ChunkRecord {
    self
      .records
      .entry(coord)
      .or_insert_with(|| ChunkRecord::new(coord, extent, lod_count))
  }

  pub(crate) fn set_visible(&mut self, coord: ChunkCoord, visible: bool) {
    if let Some(record) = self.records.get_mut(&coord) {
      record.visible = visible;
    }
    if visible {
      self.visible.insert(coord);
    } else {
      self.visible.remove(&coord);
    }
  }

  /// Store height data for a chunk. The write is idempotent: data for an
  /// already populated or unknown chunk is silently dropped.
  pub(crate) fn apply_height(&mut self, coord: ChunkCoord, height: Arc<HeightGrid>) -> bool {
    let Some(record) = self.records.get_mut(&coord) else {
      trace!(?coord, "height data for untracked chunk dropped");
      return false;
    };
    if record.height.is_some() {
      return false;
    }
    record.height = Some(height);
    true
  }

  /// Store a mesh for a LOD table index, write-once.
  pub(crate) fn apply_mesh(&mut self, coord: ChunkCoord, lod_index: usize, mesh: MeshBuffers) -> bool {
    let Some(record) = self.records.get_mut(&coord) else {
      trace!(?coord, lod_index, "mesh for untracked chunk dropped");
      return false;
    };
    let Some(slot) = record.lod_meshes.get_mut(lod_index) else {
      return false;
    };
    if slot.mesh.is_some() {
      return false;
    }
    slot.mesh = Some(mesh);
    true
  }

  /// Store the collider mesh, write-once.
  pub(crate) fn apply_collider(&mut self, coord: ChunkCoord, mesh: MeshBuffers) -> bool {
    let Some(record) = self.records.get_mut(&coord) else {
      trace!(?coord, "collider mesh for untracked chunk dropped");
      return false;
    };
    if record.collider.mesh.is_some() {
      return false;
    }
    record.collider.mesh = Some(mesh);
    true
  }

  pub(crate) fn remove(&mut self, coord: ChunkCoord) -> Option<ChunkRecord> {
    self.visible.remove(&coord);
    self.records.remove(&coord)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grid::Grid2;

  fn height(lowest: f32) -> Arc<HeightGrid> {
    Arc::new(HeightGrid {
      grid: Grid2::new(4, 4),
      lowest_point: lowest,
    })
  }

  #[test]
  fn height_writes_are_write_once() {
    let mut store = ChunkStore::default();
    store.ensure_record(ChunkCoord::new(1, -2), 16.0, 3);

    assert!(store.apply_height(ChunkCoord::new(1, -2), height(2.0)));
    assert!(!store.apply_height(ChunkCoord::new(1, -2), height(9.0)));
    let record = store.get(ChunkCoord::new(1, -2)).unwrap();
    assert_eq!(record.height().unwrap().lowest_point, 2.0);
  }

  #[test]
  fn results_for_unknown_chunks_are_dropped() {
    let mut store = ChunkStore::default();
    assert!(!store.apply_height(ChunkCoord::new(0, 0), height(0.0)));
    assert!(!store.apply_mesh(ChunkCoord::new(0, 0), 0, MeshBuffers::default()));
    assert!(store.is_empty());
  }

  #[test]
  fn bounds_distance_is_zero_inside_the_chunk() {
    let record = ChunkRecord::new(ChunkCoord::new(0, 0), 16.0, 1);
    assert_eq!(record.sqr_distance_to(Vec2::new(3.0, -5.0)), 0.0);
    // One chunk over: 8 units from the edge.
    assert_eq!(record.sqr_distance_to(Vec2::new(16.0, 0.0)), 64.0);
  }

  #[test]
  fn dips_below_needs_height_data() {
    let mut store = ChunkStore::default();
    store.ensure_record(ChunkCoord::ZERO, 16.0, 1);
    assert_eq!(store.get(ChunkCoord::ZERO).unwrap().dips_below(1.0), None);

    store.apply_height(ChunkCoord::ZERO, height(-3.0));
    let record = store.get(ChunkCoord::ZERO).unwrap();
    assert_eq!(record.dips_below(0.0), Some(true));
    assert_eq!(record.dips_below(-10.0), Some(false));
  }
}
