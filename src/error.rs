//! Error taxonomy for generation and meshing.
//!
//! Configuration problems surface immediately and are never retried.
//! Invariant violations indicate a logic bug; generation of the offending
//! unit aborts rather than corrupting shared state. A completed-but-stale
//! generation result is *not* an error: it is accepted and cached.

use thiserror::Error;

/// Errors produced by the terrain core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TerrainError {
  /// Invalid noise, curve, or LOD parameters supplied by the caller.
  #[error("invalid configuration: {0}")]
  Configuration(String),

  /// Internal consistency failure (corrupt configuration index, mismatched
  /// buffer sizes). Unreachable with correct inputs.
  #[error("invariant violation: {0}")]
  InvariantViolation(String),
}

impl TerrainError {
  pub(crate) fn config(msg: impl Into<String>) -> Self {
    TerrainError::Configuration(msg.into())
  }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TerrainError>;
