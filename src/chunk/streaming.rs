//! Viewer-driven chunk streaming.
//!
//! The scheduler owns all of its state: the chunk store, the viewer position
//! of the last full scan, and the channel completed generation results arrive
//! on. Ticks are driven by [`StreamingScheduler::set_viewer_position`]; a
//! full visibility scan only runs once the viewer has moved far enough
//! (squared-displacement hysteresis), but completed results are applied on
//! every call.
//!
//! Results are applied in completion order, not request order. A result for
//! a chunk that has since been hidden is still cached; since every cache
//! slot is write-once and generation is deterministic, a stale result is
//! indistinguishable from a fresh one.

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use glam::Vec2;
use tracing::{debug, trace, warn};

use crate::chunk::{ChunkCoord, ChunkStore, LodSetting};
use crate::constants::{COLLIDER_GENERATION_DISTANCE, MAX_LOD, SQR_VIEWER_MOVE_THRESHOLD};
use crate::error::{Result, TerrainError};
use crate::generator::{JobExecutor, TerrainGenerator};
use crate::mesh::MeshBuffers;
use crate::noise::{HeightGrid, NoiseParams};

/// Streaming parameters.
#[derive(Clone, Debug)]
pub struct StreamingConfig {
  /// Chunk extent in world units; also the height-grid resolution per side.
  pub chunk_size: usize,
  /// LOD table, ordered by strictly increasing distance threshold. The last
  /// threshold doubles as the maximum view distance.
  pub detail_levels: Vec<LodSetting>,
  /// Index into `detail_levels` of the mesh used for collision.
  pub collider_lod_index: usize,
  /// World scale applied by the consumer; viewer positions are divided by
  /// this before chunk math.
  pub uniform_scale: f32,
  /// Evict records farther than this many chunks (Chebyshev) from the
  /// viewer. `None` keeps every record forever.
  pub unload_radius_chunks: Option<i32>,
  pub flat_shading: bool,
}

impl Default for StreamingConfig {
  fn default() -> Self {
    Self {
      chunk_size: 240,
      detail_levels: vec![
        LodSetting::new(0, 400.0),
        LodSetting::new(2, 800.0),
        LodSetting::new(4, 1200.0),
      ],
      collider_lod_index: 0,
      uniform_scale: 1.0,
      unload_radius_chunks: None,
      flat_shading: false,
    }
  }
}

impl StreamingConfig {
  pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
    self.chunk_size = chunk_size;
    self
  }

  pub fn with_detail_levels(mut self, detail_levels: Vec<LodSetting>) -> Self {
    self.detail_levels = detail_levels;
    self
  }

  pub fn with_collider_lod_index(mut self, index: usize) -> Self {
    self.collider_lod_index = index;
    self
  }

  pub fn with_uniform_scale(mut self, uniform_scale: f32) -> Self {
    self.uniform_scale = uniform_scale;
    self
  }

  pub fn with_unload_radius_chunks(mut self, radius: Option<i32>) -> Self {
    self.unload_radius_chunks = radius;
    self
  }

  pub fn with_flat_shading(mut self, flat_shading: bool) -> Self {
    self.flat_shading = flat_shading;
    self
  }

  fn max_view_distance(&self) -> f32 {
    self
      .detail_levels
      .last()
      .map(|l| l.visible_distance_threshold)
      .unwrap_or(0.0)
  }

  fn validate(&self) -> Result<()> {
    if self.detail_levels.is_empty() {
      return Err(TerrainError::config("detail level table must not be empty"));
    }
    let increasing = self
      .detail_levels
      .windows(2)
      .all(|w| w[0].visible_distance_threshold < w[1].visible_distance_threshold);
    if !increasing {
      return Err(TerrainError::config(
        "detail level thresholds must strictly increase",
      ));
    }
    if let Some(level) = self.detail_levels.iter().find(|l| l.lod > MAX_LOD) {
      return Err(TerrainError::config(format!(
        "detail level lod {} exceeds the maximum of {}",
        level.lod, MAX_LOD
      )));
    }
    if self.collider_lod_index >= self.detail_levels.len() {
      return Err(TerrainError::config(format!(
        "collider lod index {} out of range for {} detail levels",
        self.collider_lod_index,
        self.detail_levels.len()
      )));
    }
    if self.chunk_size == 0 {
      return Err(TerrainError::config("chunk size must be non-zero"));
    }
    if self.uniform_scale <= 0.0 {
      return Err(TerrainError::config("uniform scale must be positive"));
    }
    Ok(())
  }
}

/// A completed generation result, tagged with its destination.
enum ChunkResult {
  Height {
    coord: ChunkCoord,
    result: Result<Arc<HeightGrid>>,
  },
  Mesh {
    coord: ChunkCoord,
    lod_index: usize,
    result: Result<MeshBuffers>,
  },
  Collider {
    coord: ChunkCoord,
    result: Result<MeshBuffers>,
  },
}

/// Drives chunk creation, LOD selection, and visibility from the viewer
/// position.
pub struct StreamingScheduler {
  config: StreamingConfig,
  generator: TerrainGenerator,
  store: ChunkStore,
  results_tx: Sender<ChunkResult>,
  results_rx: Receiver<ChunkResult>,
  /// Viewer position (already divided by the uniform scale) at the last
  /// full visibility scan.
  last_scan_position: Option<Vec2>,
  chunks_in_view_radius: i32,
}

impl StreamingScheduler {
  pub fn new(
    config: StreamingConfig,
    noise: NoiseParams,
    executor: Arc<dyn JobExecutor>,
  ) -> Result<Self> {
    config.validate()?;
    let generator = TerrainGenerator::new(noise, config.chunk_size, executor);
    let chunks_in_view_radius =
      (config.max_view_distance() / config.chunk_size as f32).ceil() as i32;
    let (results_tx, results_rx) = unbounded();
    Ok(Self {
      config,
      generator,
      store: ChunkStore::default(),
      results_tx,
      results_rx,
      last_scan_position: None,
      chunks_in_view_radius,
    })
  }

  pub fn store(&self) -> &ChunkStore {
    &self.store
  }

  /// The mesh currently on display for a chunk, if any.
  pub fn get_active_mesh(&self, coord: ChunkCoord) -> Option<&MeshBuffers> {
    self.store.get(coord)?.active_mesh()
  }

  /// Apply completed generation results without moving the viewer.
  pub fn tick(&mut self) {
    self.generator.process_completions();
    while let Ok(result) = self.results_rx.try_recv() {
      self.apply_result(result);
    }
  }

  /// Report the viewer's world position, running a visibility scan when the
  /// viewer has moved beyond the hysteresis threshold (and always on the
  /// first call).
  pub fn set_viewer_position(&mut self, world_position: Vec2) {
    self.tick();

    let position = world_position / self.config.uniform_scale;
    let moved_enough = match self.last_scan_position {
      None => true,
      Some(last) => (position - last).length_squared() > SQR_VIEWER_MOVE_THRESHOLD,
    };
    if moved_enough {
      self.last_scan_position = Some(position);
      self.scan_visible_chunks(position);
    }
  }

  /// Re-evaluate every chunk in the view window plus every previously
  /// visible chunk that fell out of it.
  fn scan_visible_chunks(&mut self, viewer: Vec2) {
    let extent = self.config.chunk_size as f32;
    let viewer_chunk = ChunkCoord::new(
      (viewer.x / extent).round() as i32,
      (viewer.y / extent).round() as i32,
    );
    debug!(?viewer_chunk, "visibility scan");

    let mut stale: Vec<ChunkCoord> = self.store.visible_coords().iter().copied().collect();

    let radius = self.chunks_in_view_radius;
    for dz in -radius..=radius {
      for dx in -radius..=radius {
        let coord = viewer_chunk + ChunkCoord::new(dx, dz);
        stale.retain(|&c| c != coord);
        self
          .store
          .ensure_record(coord, extent, self.config.detail_levels.len());
        self.update_chunk(coord, viewer);
      }
    }

    // Previously visible chunks outside the window can only go invisible.
    for coord in stale {
      self.update_chunk(coord, viewer);
    }

    if let Some(unload_radius) = self.config.unload_radius_chunks {
      self.evict_beyond(viewer_chunk, unload_radius);
    }
  }

  /// Recompute one chunk's visibility, LOD, and outstanding requests.
  fn update_chunk(&mut self, coord: ChunkCoord, viewer: Vec2) {
    let Some(record) = self.store.get(coord) else {
      return;
    };
    let distance = record.sqr_distance_to(viewer).sqrt();
    let visible = distance <= self.config.max_view_distance();
    self.store.set_visible(coord, visible);
    if !visible {
      return;
    }

    let lod_index = self.select_lod_index(distance);
    self.request_missing_data(coord, lod_index);
    self.bind_collider(coord, distance);
  }

  /// Smallest LOD table index whose threshold the distance does not exceed;
  /// the last index when all are exceeded.
  fn select_lod_index(&self, distance: f32) -> usize {
    let levels = &self.config.detail_levels;
    levels
      .iter()
      .position(|l| distance <= l.visible_distance_threshold)
      .unwrap_or(levels.len() - 1)
  }

  /// Issue the height request, then the mesh request for the wanted LOD, and
  /// swap the active mesh once that LOD is cached.
  fn request_missing_data(&mut self, coord: ChunkCoord, lod_index: usize) {
    let Some(record) = self.store.get_mut(coord) else {
      return;
    };

    if !record.height_requested {
      record.height_requested = true;
      let tx = self.results_tx.clone();
      self
        .generator
        .request_height_data(record.center, move |result| {
          let _ = tx.send(ChunkResult::Height { coord, result });
        });
      return;
    }

    let Some(height) = record.height().cloned() else {
      return;
    };

    if record.mesh_at(lod_index).is_some() {
      record.active_lod = Some(lod_index);
      return;
    }

    let slot = &mut record.lod_meshes[lod_index];
    if !slot.requested {
      slot.requested = true;
      let lod = self.config.detail_levels[lod_index].lod;
      let flat_shading = self.config.flat_shading;
      let tx = self.results_tx.clone();
      self
        .generator
        .request_mesh_data(height, lod, flat_shading, move |result| {
          let _ = tx.send(ChunkResult::Mesh {
            coord,
            lod_index,
            result,
          });
        });
    }
  }

  /// Request and bind the collision mesh once the viewer is close enough.
  fn bind_collider(&mut self, coord: ChunkCoord, distance: f32) {
    let collider_threshold =
      self.config.detail_levels[self.config.collider_lod_index].visible_distance_threshold;
    let Some(record) = self.store.get_mut(coord) else {
      return;
    };
    if record.collider_bound {
      return;
    }

    let Some(height) = record.height().cloned() else {
      return;
    };

    if distance <= collider_threshold && !record.collider.requested {
      record.collider.requested = true;
      let lod = self.config.detail_levels[self.config.collider_lod_index].lod;
      let flat_shading = self.config.flat_shading;
      let tx = self.results_tx.clone();
      self
        .generator
        .request_mesh_data(height, lod, flat_shading, move |result| {
          let _ = tx.send(ChunkResult::Collider { coord, result });
        });
    }

    if distance <= COLLIDER_GENERATION_DISTANCE && record.collider.mesh.is_some() {
      record.collider_bound = true;
      trace!(?coord, "collider bound");
    }
  }

  fn apply_result(&mut self, result: ChunkResult) {
    match result {
      ChunkResult::Height { coord, result } => match result {
        Ok(height) => {
          self.store.apply_height(coord, height);
          self.refresh_if_visible(coord);
        }
        Err(err) => warn!(?coord, %err, "height generation failed"),
      },
      ChunkResult::Mesh {
        coord,
        lod_index,
        result,
      } => match result {
        Ok(mesh) => {
          self.store.apply_mesh(coord, lod_index, mesh);
          self.refresh_if_visible(coord);
        }
        Err(err) => warn!(?coord, lod_index, %err, "mesh generation failed"),
      },
      ChunkResult::Collider { coord, result } => match result {
        Ok(mesh) => {
          self.store.apply_collider(coord, mesh);
          self.refresh_if_visible(coord);
        }
        Err(err) => warn!(?coord, %err, "collider generation failed"),
      },
    }
  }

  /// A freshly applied result may unblock the next step for a chunk that is
  /// still on screen. Hidden chunks are left untouched until revisited.
  fn refresh_if_visible(&mut self, coord: ChunkCoord) {
    let Some(viewer) = self.last_scan_position else {
      return;
    };
    if self.store.get(coord).is_some_and(|r| r.is_visible()) {
      self.update_chunk(coord, viewer);
    }
  }

  fn evict_beyond(&mut self, viewer_chunk: ChunkCoord, radius: i32) {
    let doomed: Vec<ChunkCoord> = self
      .store
      .coords()
      .filter(|c| {
        let d = (*c - viewer_chunk).abs();
        d.x.max(d.y) > radius
      })
      .collect();
    for coord in doomed {
      trace!(?coord, "chunk evicted");
      self.store.remove(coord);
    }
  }
}
