//! Asynchronous generation hub.
//!
//! Height grids and terrain meshes are produced on worker threads and handed
//! back through a completion channel. Callers attach a callback to each
//! request; finished jobs enqueue the callback invocation, and
//! [`TerrainGenerator::process_completions`] drains the queue on the calling
//! thread in arrival order. There is no cancellation and no retry: a result
//! that is no longer wanted is still delivered, and the receiver decides what
//! to do with it.

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use glam::Vec2;
use tracing::{debug, trace};

use crate::error::Result;
use crate::mesh::heightfield::generate_terrain_mesh;
use crate::mesh::MeshBuffers;
use crate::noise::{generate_height_grid, HeightGrid, NoiseParams, NormalizeMode};

/// A unit of background work.
pub type Job = Box<dyn FnOnce() + Send>;

/// Where generation jobs run.
///
/// Production uses [`RayonExecutor`]; tests swap in [`InlineExecutor`] so a
/// request followed by [`TerrainGenerator::process_completions`] is fully
/// deterministic.
pub trait JobExecutor: Send + Sync {
  fn execute(&self, job: Job);
}

/// Fire-and-forget execution on the global rayon pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct RayonExecutor;

impl JobExecutor for RayonExecutor {
  fn execute(&self, job: Job) {
    rayon::spawn(job);
  }
}

/// Runs each job on the calling thread before `execute` returns.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl JobExecutor for InlineExecutor {
  fn execute(&self, job: Job) {
    job();
  }
}

/// Produces height grids and terrain meshes off the calling thread.
///
/// The generator is configured once with the world's noise parameters and the
/// chunk sample count; every height request derives its grid from the same
/// parameters, offset to the requested chunk center, so chunks agree at
/// shared borders.
pub struct TerrainGenerator {
  noise: NoiseParams,
  /// Grid samples per side, including the normal-smoothing border ring.
  bordered_size: usize,
  executor: Arc<dyn JobExecutor>,
  completion_tx: Sender<Job>,
  completion_rx: Receiver<Job>,
}

impl TerrainGenerator {
  /// `chunk_size` picks the grid resolution; grids come out `chunk_size + 1`
  /// samples per side so every supported LOD stride divides them.
  pub fn new(noise: NoiseParams, chunk_size: usize, executor: Arc<dyn JobExecutor>) -> Self {
    let (completion_tx, completion_rx) = unbounded();
    Self {
      noise,
      bordered_size: chunk_size + 1,
      executor,
      completion_tx,
      completion_rx,
    }
  }

  /// Generate the bordered, globally normalized height grid centered on
  /// `center`, delivering the result through `process_completions`.
  pub fn request_height_data<F>(&self, center: Vec2, on_complete: F)
  where
    F: FnOnce(Result<Arc<HeightGrid>>) + Send + 'static,
  {
    debug!(?center, "height data requested");
    let params = self.noise.clone().with_offset(center);
    let size = self.bordered_size;
    let tx = self.completion_tx.clone();

    self.executor.execute(Box::new(move || {
      let result = generate_height_grid(size, size, &params, NormalizeMode::Global).map(Arc::new);
      let _ = tx.send(Box::new(move || on_complete(result)));
    }));
  }

  /// Mesh an already generated height grid at `lod`, delivering the result
  /// through `process_completions`.
  pub fn request_mesh_data<F>(
    &self,
    height: Arc<HeightGrid>,
    lod: u32,
    flat_shading: bool,
    on_complete: F,
  ) where
    F: FnOnce(Result<MeshBuffers>) + Send + 'static,
  {
    debug!(lod, "mesh data requested");
    let tx = self.completion_tx.clone();

    self.executor.execute(Box::new(move || {
      let result = generate_terrain_mesh(&height.grid, lod, flat_shading);
      let _ = tx.send(Box::new(move || on_complete(result)));
    }));
  }

  /// Drain every finished job, invoking its callback on this thread in FIFO
  /// arrival order. Returns the number of callbacks invoked.
  pub fn process_completions(&self) -> usize {
    let mut drained = 0;
    while let Ok(callback) = self.completion_rx.try_recv() {
      callback();
      drained += 1;
    }
    if drained > 0 {
      trace!(drained, "processed completions");
    }
    drained
  }
}
