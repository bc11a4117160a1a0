//! Scalar sample grids.
//!
//! A grid is created per generation request, consumed once by a mesher, and
//! then discardable; nothing retains it after mesh emission. Storage is
//! row-major `Vec<f32>`: X fastest, then Z (2D) or Y then Z (3D).

/// A rectangular 2D array of scalar samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid2 {
  width: usize,
  height: usize,
  data: Vec<f32>,
}

impl Grid2 {
  /// Create a zero-filled grid.
  pub fn new(width: usize, height: usize) -> Self {
    Self {
      width,
      height,
      data: vec![0.0; width * height],
    }
  }

  /// Wrap existing samples. Panics if `data` does not match the dimensions.
  pub fn from_data(width: usize, height: usize, data: Vec<f32>) -> Self {
    assert_eq!(data.len(), width * height, "sample count mismatch");
    Self {
      width,
      height,
      data,
    }
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  #[inline(always)]
  fn idx(&self, x: usize, y: usize) -> usize {
    debug_assert!(x < self.width && y < self.height);
    y * self.width + x
  }

  #[inline(always)]
  pub fn get(&self, x: usize, y: usize) -> f32 {
    self.data[self.idx(x, y)]
  }

  #[inline(always)]
  pub fn set(&mut self, x: usize, y: usize, value: f32) {
    let i = self.idx(x, y);
    self.data[i] = value;
  }

  /// Raw sample slice, row-major.
  pub fn samples(&self) -> &[f32] {
    &self.data
  }

  /// Minimum and maximum sample values. `None` for an empty grid.
  pub fn min_max(&self) -> Option<(f32, f32)> {
    let mut iter = self.data.iter();
    let first = *iter.next()?;
    let mut min = first;
    let mut max = first;
    for &v in iter {
      if v < min {
        min = v;
      } else if v > max {
        max = v;
      }
    }
    Some((min, max))
  }

  /// Position of the greatest sample, scanning row-major (stable for ties).
  pub fn argmax(&self) -> Option<(usize, usize)> {
    if self.data.is_empty() {
      return None;
    }
    let mut best = 0;
    for (i, &v) in self.data.iter().enumerate() {
      if v > self.data[best] {
        best = i;
      }
    }
    Some((best % self.width, best / self.width))
  }
}

/// A cuboid 3D array of scalar samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid3 {
  width: usize,
  height: usize,
  depth: usize,
  data: Vec<f32>,
}

impl Grid3 {
  pub fn new(width: usize, height: usize, depth: usize) -> Self {
    Self {
      width,
      height,
      depth,
      data: vec![0.0; width * height * depth],
    }
  }

  /// Cube-shaped grid, the common case for cave volumes.
  pub fn cube(size: usize) -> Self {
    Self::new(size, size, size)
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn depth(&self) -> usize {
    self.depth
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  #[inline(always)]
  fn idx(&self, x: usize, y: usize, z: usize) -> usize {
    debug_assert!(x < self.width && y < self.height && z < self.depth);
    (z * self.height + y) * self.width + x
  }

  #[inline(always)]
  pub fn get(&self, x: usize, y: usize, z: usize) -> f32 {
    self.data[self.idx(x, y, z)]
  }

  #[inline(always)]
  pub fn set(&mut self, x: usize, y: usize, z: usize, value: f32) {
    let i = self.idx(x, y, z);
    self.data[i] = value;
  }

  pub fn samples(&self) -> &[f32] {
    &self.data
  }
}
