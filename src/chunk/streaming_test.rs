//! Streaming scheduler: visibility window, LOD swaps, staleness, eviction.
//!
//! All tests run on [`InlineExecutor`], so each generation request completes
//! before the call returns and is delivered on the next tick. That makes the
//! request → completion → apply pipeline fully deterministic.

use std::sync::Arc;

use glam::Vec2;

use super::streaming::{StreamingConfig, StreamingScheduler};
use super::{ChunkCoord, LodSetting};
use crate::generator::InlineExecutor;
use crate::noise::NoiseParams;

fn test_config() -> StreamingConfig {
  StreamingConfig::default()
    .with_chunk_size(16)
    .with_detail_levels(vec![
      LodSetting::new(0, 50.0),
      LodSetting::new(1, 100.0),
      LodSetting::new(2, 200.0),
    ])
}

fn scheduler_with(config: StreamingConfig) -> StreamingScheduler {
  let noise = NoiseParams::new(42).with_max_height(10.0);
  StreamingScheduler::new(config, noise, Arc::new(InlineExecutor)).unwrap()
}

fn scheduler() -> StreamingScheduler {
  scheduler_with(test_config())
}

/// Scan, then run enough ticks for heights, meshes, and colliders to land.
fn settle(scheduler: &mut StreamingScheduler, viewer: Vec2) {
  scheduler.set_viewer_position(viewer);
  for _ in 0..3 {
    scheduler.tick();
  }
}

#[test]
fn first_scan_tracks_the_view_window() {
  let mut scheduler = scheduler();
  scheduler.set_viewer_position(Vec2::ZERO);

  let store = scheduler.store();
  assert!(!store.visible_coords().is_empty());
  // Chunk (13, 0) touches the 200-unit view distance exactly; (14, 0) is
  // outside the window entirely.
  assert!(store.get(ChunkCoord::new(13, 0)).unwrap().is_visible());
  assert!(!store.contains(ChunkCoord::new(14, 0)));

  for &coord in store.visible_coords() {
    let record = store.get(coord).unwrap();
    assert!(record.sqr_distance_to(Vec2::ZERO) <= 200.0 * 200.0);
  }
}

#[test]
fn meshes_become_active_after_completion_ticks() {
  let mut scheduler = scheduler();
  settle(&mut scheduler, Vec2::ZERO);

  let mesh = scheduler.get_active_mesh(ChunkCoord::ZERO).unwrap();
  assert!(!mesh.is_empty());

  // The viewer sits inside chunk (0, 0): full detail.
  let record = scheduler.store().get(ChunkCoord::ZERO).unwrap();
  assert_eq!(record.active_lod(), Some(0));

  // A chunk beyond the second threshold runs at the coarsest level.
  let far = scheduler.store().get(ChunkCoord::new(8, 0)).unwrap();
  assert_eq!(far.active_lod(), Some(2));
}

#[test]
fn collider_binds_only_within_generation_distance() {
  let mut scheduler = scheduler();
  settle(&mut scheduler, Vec2::ZERO);

  let store = scheduler.store();
  assert!(store.get(ChunkCoord::ZERO).unwrap().collider_mesh().is_some());
  // (3, 0) is inside the collider LOD threshold (40 <= 50) so its mesh is
  // generated, but at 40 units it is never bound.
  assert!(store.get(ChunkCoord::new(3, 0)).unwrap().collider_mesh().is_none());
}

#[test]
fn teleport_hides_the_old_neighborhood() {
  let mut scheduler = scheduler();
  settle(&mut scheduler, Vec2::ZERO);

  let near_origin: Vec<ChunkCoord> = scheduler.store().visible_coords().iter().copied().collect();
  assert!(!near_origin.is_empty());

  scheduler.set_viewer_position(Vec2::new(5000.0, 0.0));

  for coord in &near_origin {
    let record = scheduler.store().get(*coord).unwrap();
    assert!(!record.is_visible(), "chunk {:?} still visible", coord);
  }

  // Hidden chunks stay frozen through further ticks.
  let snapshot: Vec<Option<usize>> = near_origin
    .iter()
    .map(|c| scheduler.store().get(*c).unwrap().active_lod())
    .collect();
  for _ in 0..3 {
    scheduler.tick();
  }
  for (coord, before) in near_origin.iter().zip(snapshot) {
    let record = scheduler.store().get(*coord).unwrap();
    assert!(!record.is_visible());
    assert_eq!(record.active_lod(), before, "chunk {:?} mutated", coord);
  }
}

#[test]
fn late_mesh_result_for_hidden_chunk_is_still_cached() {
  let mut scheduler = scheduler();
  // First scan queues height jobs. The teleporting second call applies them,
  // which fires mesh requests for still-visible chunks, and then its scan
  // hides the old neighborhood before those meshes are delivered.
  scheduler.set_viewer_position(Vec2::ZERO);
  scheduler.set_viewer_position(Vec2::new(5000.0, 0.0));

  // (8, 0) sat in the 100..200 band, so its outstanding request was for the
  // coarsest detail slot.
  let record = scheduler.store().get(ChunkCoord::new(8, 0)).unwrap();
  assert!(!record.is_visible());
  assert!(record.mesh_at(2).is_none());

  scheduler.tick();

  let record = scheduler.store().get(ChunkCoord::new(8, 0)).unwrap();
  assert!(!record.is_visible());
  assert!(record.mesh_at(2).is_some(), "late mesh result not cached");
  assert_eq!(record.active_lod(), None);
}

#[test]
fn small_viewer_moves_skip_the_scan() {
  let mut scheduler = scheduler();
  scheduler.set_viewer_position(Vec2::ZERO);
  assert!(scheduler.store().get(ChunkCoord::new(-13, 0)).unwrap().is_visible());

  // 24 units is under the 25-unit hysteresis threshold: no rescan, the
  // borderline chunk keeps its stale visibility.
  scheduler.set_viewer_position(Vec2::new(24.0, 0.0));
  assert!(scheduler.store().get(ChunkCoord::new(-13, 0)).unwrap().is_visible());

  scheduler.set_viewer_position(Vec2::new(26.0, 0.0));
  assert!(!scheduler.store().get(ChunkCoord::new(-13, 0)).unwrap().is_visible());
}

#[test]
fn viewer_position_is_divided_by_uniform_scale() {
  let config = StreamingConfig::default()
    .with_chunk_size(16)
    .with_detail_levels(vec![LodSetting::new(0, 50.0)])
    .with_uniform_scale(2.0);
  let mut scheduler = scheduler_with(config);

  // World (32, 0) is chunk-space (16, 0): the window centers on chunk (1, 0).
  scheduler.set_viewer_position(Vec2::new(32.0, 0.0));
  assert!(scheduler.store().contains(ChunkCoord::new(5, 0)));
  assert!(!scheduler.store().contains(ChunkCoord::new(-4, 0)));
}

#[test]
fn eviction_drops_records_beyond_the_unload_radius() {
  let config = test_config().with_unload_radius_chunks(Some(13));
  let mut scheduler = scheduler_with(config);

  settle(&mut scheduler, Vec2::ZERO);
  assert!(scheduler.store().contains(ChunkCoord::ZERO));

  scheduler.set_viewer_position(Vec2::new(5000.0, 0.0));
  assert!(!scheduler.store().contains(ChunkCoord::ZERO));

  // Late results for evicted chunks are dropped without panicking.
  for _ in 0..3 {
    scheduler.tick();
  }
  assert!(!scheduler.store().contains(ChunkCoord::ZERO));
}

#[test]
fn streaming_is_deterministic_across_schedulers() {
  let mut a = scheduler();
  let mut b = scheduler();
  settle(&mut a, Vec2::ZERO);
  settle(&mut b, Vec2::ZERO);

  let mesh_a = a.get_active_mesh(ChunkCoord::new(2, -1)).unwrap();
  let mesh_b = b.get_active_mesh(ChunkCoord::new(2, -1)).unwrap();
  assert_eq!(mesh_a, mesh_b);
}

#[test]
fn invalid_configs_are_rejected() {
  let noise = NoiseParams::new(0);
  let executor: Arc<InlineExecutor> = Arc::new(InlineExecutor);

  let empty = StreamingConfig::default().with_detail_levels(Vec::new());
  assert!(StreamingScheduler::new(empty, noise.clone(), executor.clone()).is_err());

  let unsorted = StreamingConfig::default().with_detail_levels(vec![
    LodSetting::new(0, 100.0),
    LodSetting::new(1, 100.0),
  ]);
  assert!(StreamingScheduler::new(unsorted, noise.clone(), executor.clone()).is_err());

  let bad_collider = test_config().with_collider_lod_index(7);
  assert!(StreamingScheduler::new(bad_collider, noise.clone(), executor.clone()).is_err());

  let over_lod = StreamingConfig::default().with_detail_levels(vec![
    LodSetting::new(0, 100.0),
    LodSetting::new(crate::constants::MAX_LOD + 1, 200.0),
  ]);
  assert!(StreamingScheduler::new(over_lod, noise, executor).is_err());
}
