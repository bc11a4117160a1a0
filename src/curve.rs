//! Piecewise-linear remapping curve for noise heights.
//!
//! Collaborators hand the core a curve that reshapes normalized noise values
//! before the max-height scale is applied (flattening valleys, sharpening
//! peaks). Keys are `(t, value)` pairs sorted by `t`; evaluation clamps
//! outside the key range.

use crate::error::{Result, TerrainError};

/// A monotone-in-`t` sequence of keyframes evaluated by linear interpolation.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightCurve {
  keys: Vec<(f32, f32)>,
}

impl HeightCurve {
  /// Build a curve from keyframes. An empty key set is invalid input.
  pub fn new(mut keys: Vec<(f32, f32)>) -> Result<Self> {
    if keys.is_empty() {
      return Err(TerrainError::config("height curve requires at least one key"));
    }
    keys.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(Self { keys })
  }

  /// The identity curve: output equals input over `[0, 1]`.
  pub fn linear() -> Self {
    Self {
      keys: vec![(0.0, 0.0), (1.0, 1.0)],
    }
  }

  /// A curve that always returns `value`.
  pub fn constant(value: f32) -> Self {
    Self {
      keys: vec![(0.0, value)],
    }
  }

  /// Evaluate at `t`, clamped to the outermost keys.
  pub fn evaluate(&self, t: f32) -> f32 {
    let keys = &self.keys;
    if t <= keys[0].0 {
      return keys[0].1;
    }
    let last = keys[keys.len() - 1];
    if t >= last.0 {
      return last.1;
    }
    // Find the bracketing segment.
    let hi = keys.partition_point(|k| k.0 <= t);
    let (t0, v0) = keys[hi - 1];
    let (t1, v1) = keys[hi];
    let span = t1 - t0;
    if span <= f32::EPSILON {
      return v0;
    }
    let alpha = (t - t0) / span;
    v0 + (v1 - v0) * alpha
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_curve_is_rejected() {
    assert!(matches!(
      HeightCurve::new(vec![]),
      Err(TerrainError::Configuration(_))
    ));
  }

  #[test]
  fn linear_is_identity() {
    let c = HeightCurve::linear();
    assert_eq!(c.evaluate(0.0), 0.0);
    assert_eq!(c.evaluate(1.0), 1.0);
    assert!((c.evaluate(0.25) - 0.25).abs() < 1e-6);
  }

  #[test]
  fn evaluation_clamps_outside_keys() {
    let c = HeightCurve::new(vec![(0.2, 1.0), (0.8, 3.0)]).unwrap();
    assert_eq!(c.evaluate(0.0), 1.0);
    assert_eq!(c.evaluate(1.0), 3.0);
    assert!((c.evaluate(0.5) - 2.0).abs() < 1e-6);
  }

  #[test]
  fn keys_are_sorted_on_construction() {
    let c = HeightCurve::new(vec![(1.0, 10.0), (0.0, 0.0)]).unwrap();
    assert!((c.evaluate(0.5) - 5.0).abs() < 1e-6);
  }
}
