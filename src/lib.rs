//! terramesh - Engine-independent procedural terrain and cave meshing
//!
//! This crate is the computational core of a streamed terrain system: seeded
//! fractal noise fields, heightfield triangulation with LOD simplification
//! and seam-safe borders, marching squares/cubes cave extraction, and a
//! viewer-driven chunk streaming scheduler. It produces plain mesh buffers;
//! rendering, physics bodies, and scene management belong to the consumer.
//!
//! # Features
//!
//! - **Fractal heightmaps**: multi-octave perlin accumulation with local or
//!   global normalization, so independently generated chunks line up exactly
//!   at shared borders
//! - **Heightfield meshing**: LOD-simplified terrain sheets whose border
//!   samples shape edge normals without ever being emitted
//! - **Cave extraction**: cellular-automaton fills meshed by marching squares
//!   (with outline tracing and wall skirts) or marching cubes
//! - **Chunk streaming**: hysteresis-driven visibility scans, per-LOD mesh
//!   caching, deferred collider binding, optional distance eviction
//!
//! # Example
//!
//! ```ignore
//! use terramesh::{generate_height_grid, generate_terrain_mesh, NoiseParams, NormalizeMode};
//!
//! let params = NoiseParams::new(42).with_max_height(30.0);
//! let height = generate_height_grid(49, 49, &params, NormalizeMode::Global)?;
//! let mesh = generate_terrain_mesh(&height.grid, 0, false)?;
//!
//! println!("{} vertices, {} triangles", mesh.positions.len(), mesh.triangle_count());
//! ```

pub mod constants;
pub mod error;

pub use constants::{
  simplification_increment, COLLIDER_GENERATION_DISTANCE, MAX_LOD, NUM_SUPPORTED_LODS,
  SUPPORTED_CHUNK_SIZES, SUPPORTED_FLAT_SHADED_CHUNK_SIZES, VIEWER_MOVE_THRESHOLD,
};
pub use error::{Result, TerrainError};

// Scalar sample grids and the height remapping curve
pub mod curve;
pub mod grid;
pub use curve::HeightCurve;
pub use grid::{Grid2, Grid3};

// Seeded noise fields
pub mod noise;
pub use noise::{
  generate_binary_volume, generate_height_grid, generate_raw_grid, generate_volume, HeightGrid,
  NoiseParams, NormalizeMode,
};

// Cellular-automaton cave fills
pub mod automata;
pub use automata::{generate_map_2d, generate_map_3d, with_border, AutomataParams};

// Meshers
pub mod mesh;
pub use mesh::heightfield::generate_terrain_mesh;
pub use mesh::marching_cubes::generate_isosurface_mesh;
pub use mesh::marching_squares::{generate_cave_mesh, CaveMesh};
pub use mesh::{MeshBuffers, VertexId};

// Background generation
pub mod generator;
pub use generator::{InlineExecutor, JobExecutor, RayonExecutor, TerrainGenerator};

// Chunk cache and streaming
pub mod chunk;
pub use chunk::streaming::{StreamingConfig, StreamingScheduler};
pub use chunk::{ChunkCoord, ChunkRecord, ChunkStore, LodSetting};
