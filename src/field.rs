//! Displacement field simulation.
//!
//! A coarse grid of 2D offset vectors sampled by the distortion shader. Every
//! tick the whole grid decays geometrically, then the pointer's velocity is
//! stamped into the cells around the pointer with an inverse-distance falloff.
//!
//! Cells are stored row-major with row 0 at the bottom of the plane (y-up,
//! matching the plane's UVs).

use bevy::math::Vec2;
use rand::Rng;

/// Default grid edge length in cells.
pub const DEFAULT_GRID_SIZE: u32 = 32;

/// Default per-tick decay applied to cells and pointer velocity.
pub const DEFAULT_DECAY: f32 = 0.91;

/// Upper bound for the falloff power at the pointer's own cell.
pub const DEFAULT_POWER_CAP: f32 = 10.0;

/// Injection radius is `grid size / divisor`.
pub const DEFAULT_RADIUS_DIVISOR: f32 = 6.0;

/// Default seeding ranges for the two channels, `[0, x)` and `[0, y)`.
pub const DEFAULT_SEED_RANGE: Vec2 = Vec2::new(50.0, 255.0);

/// Inverse-distance falloff, saturating at `cap`.
///
/// `distance_sq == 0` gives `radius / 0 = inf`, which the clamp turns into
/// exactly `cap`.
#[inline]
pub fn falloff_power(radius: f32, distance_sq: f32, cap: f32) -> f32 {
  (radius / distance_sq.sqrt()).clamp(0.0, cap)
}

/// Grid of decaying displacement vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementField {
  width: u32,
  height: u32,
  cells: Vec<Vec2>,
}

impl DisplacementField {
  /// Creates a zeroed field.
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      width,
      height,
      cells: vec![Vec2::ZERO; (width * height) as usize],
    }
  }

  /// Creates a field whose channels are drawn uniformly from
  /// `[0, seed_range.x)` and `[0, seed_range.y)`.
  ///
  /// The initial noise decays away over the first second or so, which gives
  /// the image a short "settling" reveal. A non-positive range leaves that
  /// channel at zero.
  pub fn seeded(width: u32, height: u32, seed_range: Vec2, rng: &mut impl Rng) -> Self {
    let mut field = Self::new(width, height);
    for cell in &mut field.cells {
      cell.x = sample_channel(rng, seed_range.x);
      cell.y = sample_channel(rng, seed_range.y);
    }
    log::debug!(
      "Seeded {}x{} displacement field (ranges {:?})",
      width,
      height,
      seed_range
    );
    field
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  /// Current cell buffer, row-major.
  pub fn cells(&self) -> &[Vec2] {
    &self.cells
  }

  /// Cell at (column, row).
  pub fn cell(&self, col: u32, row: u32) -> Vec2 {
    self.cells[self.index(col, row)]
  }

  #[inline]
  fn index(&self, col: u32, row: u32) -> usize {
    (col + self.width * row) as usize
  }

  /// Multiplies every cell by `factor`. Asymptotic: nothing is snapped to
  /// zero.
  pub fn decay(&mut self, factor: f32) {
    for cell in &mut self.cells {
      *cell *= factor;
    }
  }

  /// Adds `velocity` to every cell strictly within `radius` grid units of
  /// `grid`.
  ///
  /// `grid.x` is compared against the cell column and `grid.y` against the
  /// row. The x channel gains `velocity.x * power`, the y channel loses
  /// `velocity.y * power`: pointer velocity is y-down, the field is y-up.
  pub fn inject(&mut self, grid: Vec2, velocity: Vec2, radius: f32, power_cap: f32) {
    let radius_sq = radius * radius;
    for col in 0..self.width {
      for row in 0..self.height {
        let distance_sq = (grid.x - col as f32).powi(2) + (grid.y - row as f32).powi(2);
        if distance_sq < radius_sq {
          let power = falloff_power(radius, distance_sq, power_cap);
          let index = self.index(col, row);
          let cell = &mut self.cells[index];
          cell.x += velocity.x * power;
          cell.y -= velocity.y * power;
        }
      }
    }
  }

  /// Maps a normalized pointer position (y-down, element space) onto the grid
  /// and injects there.
  pub fn inject_at(&mut self, pointer: Vec2, velocity: Vec2, radius: f32, power_cap: f32) {
    let grid = self.grid_position(pointer);
    self.inject(grid, velocity, radius, power_cap);
  }

  /// Grid coordinates of a normalized pointer position.
  pub fn grid_position(&self, pointer: Vec2) -> Vec2 {
    Vec2::new(
      self.width as f32 * pointer.x,
      self.height as f32 * (1.0 - pointer.y),
    )
  }

  /// Radius used for a grid of this size.
  pub fn radius_for(&self, divisor: f32) -> f32 {
    self.width.max(self.height) as f32 / divisor
  }

  /// Largest cell magnitude.
  pub fn max_magnitude(&self) -> f32 {
    self
      .cells
      .iter()
      .map(|c| c.length())
      .fold(0.0, f32::max)
  }

  /// Byte length of the `Rg32Float` texel representation.
  pub fn texel_len(&self) -> usize {
    self.cells.len() * 2 * std::mem::size_of::<f32>()
  }

  /// Packs the cells as `Rg32Float` texels into `out`.
  ///
  /// `out` must be exactly [`Self::texel_len`] bytes.
  pub fn write_texels(&self, out: &mut [u8]) {
    debug_assert_eq!(out.len(), self.texel_len());
    for (cell, texel) in self.cells.iter().zip(out.chunks_exact_mut(8)) {
      texel[0..4].copy_from_slice(&cell.x.to_ne_bytes());
      texel[4..8].copy_from_slice(&cell.y.to_ne_bytes());
    }
  }
}

fn sample_channel(rng: &mut impl Rng, range: f32) -> f32 {
  if range > 0.0 {
    rng.random_range(0.0..range)
  } else {
    0.0
  }
}

#[cfg(test)]
mod tests {
  use rand::SeedableRng;
  use rand::rngs::StdRng;

  use super::*;

  fn seeded(size: u32) -> DisplacementField {
    let mut rng = StdRng::seed_from_u64(7);
    DisplacementField::seeded(size, size, DEFAULT_SEED_RANGE, &mut rng)
  }

  #[test]
  fn seeding_stays_within_channel_ranges() {
    let field = seeded(32);
    assert_eq!(field.cells().len(), 32 * 32);
    for cell in field.cells() {
      assert!((0.0..50.0).contains(&cell.x), "x out of range: {}", cell.x);
      assert!((0.0..255.0).contains(&cell.y), "y out of range: {}", cell.y);
    }
    // Non-degenerate: not every cell is identical.
    let first = field.cells()[0];
    assert!(field.cells().iter().any(|c| *c != first));
  }

  #[test]
  fn zero_seed_range_gives_zero_field() {
    let mut rng = StdRng::seed_from_u64(1);
    let field = DisplacementField::seeded(8, 8, Vec2::ZERO, &mut rng);
    assert_eq!(field, DisplacementField::new(8, 8));
  }

  #[test]
  fn decay_follows_geometric_law() {
    let mut field = seeded(8);
    let initial = field.clone();
    let factor = 0.91_f32;

    let mut previous = initial.clone();
    for n in 1..=200 {
      field.decay(factor);
      for (i, cell) in field.cells().iter().enumerate() {
        assert!(cell.length() <= previous.cells()[i].length());
      }
      if n == 50 {
        for (i, cell) in field.cells().iter().enumerate() {
          let expected = initial.cells()[i] * factor.powi(50);
          assert!((cell.x - expected.x).abs() <= expected.x.abs() * 1e-4 + 1e-6);
          assert!((cell.y - expected.y).abs() <= expected.y.abs() * 1e-4 + 1e-6);
        }
      }
      previous = field.clone();
    }
    assert!(field.max_magnitude() < 1e-5);
    assert!(field.cells().iter().all(|c| c.is_finite()));
  }

  #[test]
  fn decay_before_inject_differs_from_inject_before_decay() {
    let grid = Vec2::new(4.0, 4.0);
    let velocity = Vec2::new(0.2, 0.1);
    let radius = 2.0;

    let mut decay_first = seeded(8);
    let mut inject_first = decay_first.clone();
    let prior = decay_first.cell(4, 4);

    decay_first.decay(0.91);
    decay_first.inject(grid, velocity, radius, DEFAULT_POWER_CAP);

    inject_first.inject(grid, velocity, radius, DEFAULT_POWER_CAP);
    inject_first.decay(0.91);

    // At the pointer's own cell the power is the cap.
    let expected = Vec2::new(
      prior.x * 0.91 + velocity.x * DEFAULT_POWER_CAP,
      prior.y * 0.91 - velocity.y * DEFAULT_POWER_CAP,
    );
    let got = decay_first.cell(4, 4);
    assert!((got - expected).length() < 1e-4, "got {got:?}, expected {expected:?}");
    assert_ne!(decay_first, inject_first);
  }

  #[test]
  fn injection_is_spatially_local() {
    let mut field = DisplacementField::new(16, 16);
    let grid = Vec2::new(8.3, 5.6);
    let radius = 16.0 / 6.0;
    field.inject(grid, Vec2::new(1.0, -1.0), radius, DEFAULT_POWER_CAP);

    for col in 0..16 {
      for row in 0..16 {
        let distance = Vec2::new(col as f32, row as f32).distance(grid);
        let cell = field.cell(col, row);
        if distance >= radius {
          assert_eq!(cell, Vec2::ZERO, "cell ({col},{row}) at {distance} changed");
        } else {
          assert_ne!(cell, Vec2::ZERO, "cell ({col},{row}) at {distance} untouched");
        }
      }
    }
  }

  #[test]
  fn falloff_saturates_at_cap() {
    assert_eq!(falloff_power(5.0, 0.0, DEFAULT_POWER_CAP), DEFAULT_POWER_CAP);
    assert_eq!(falloff_power(5.0, 1e-12, DEFAULT_POWER_CAP), DEFAULT_POWER_CAP);
    assert!((falloff_power(5.0, 4.0, DEFAULT_POWER_CAP) - 2.5).abs() < 1e-6);

    let mut field = DisplacementField::new(4, 4);
    field.inject(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0), 1.0, DEFAULT_POWER_CAP);
    let cell = field.cell(1, 1);
    assert!(cell.is_finite());
    assert_eq!(cell, Vec2::new(10.0, -10.0));
  }

  #[test]
  fn four_by_four_scenario_only_touches_nearby_cells() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut field = DisplacementField::seeded(4, 4, Vec2::new(1.0, 1.0), &mut rng);
    field.decay(DEFAULT_DECAY);
    let before = field.clone();

    field.inject(Vec2::new(2.0, 2.0), Vec2::new(1.0, 0.0), 1.5, DEFAULT_POWER_CAP);

    for col in 0..4 {
      for row in 0..4 {
        let distance = Vec2::new(col as f32, row as f32).distance(Vec2::new(2.0, 2.0));
        let delta = field.cell(col, row) - before.cell(col, row);
        if distance < 1.5 {
          let power = falloff_power(1.5, distance * distance, DEFAULT_POWER_CAP);
          assert!((delta.x - power).abs() < 1e-5);
          assert_eq!(delta.y, 0.0);
        } else {
          assert_eq!(field.cell(col, row), before.cell(col, row));
        }
      }
    }
    assert_eq!(field.cell(0, 0), before.cell(0, 0));
  }

  #[test]
  fn pointer_maps_to_flipped_rows() {
    let field = DisplacementField::new(32, 32);
    assert_eq!(field.grid_position(Vec2::new(0.25, 0.0)), Vec2::new(8.0, 32.0));
    assert_eq!(field.grid_position(Vec2::new(0.5, 0.75)), Vec2::new(16.0, 8.0));

    // Pointer near the top-left of the element lands in the top rows.
    let mut field = DisplacementField::new(32, 32);
    field.inject_at(Vec2::new(0.1, 0.1), Vec2::new(0.05, 0.0), 32.0 / 6.0, 10.0);
    assert_ne!(field.cell(3, 28), Vec2::ZERO);
    assert_eq!(field.cell(3, 3), Vec2::ZERO);
  }

  #[test]
  fn texels_pack_both_channels() {
    let mut field = DisplacementField::new(2, 1);
    field.inject(Vec2::new(1.0, 0.0), Vec2::new(0.5, 0.25), 0.5, 10.0);
    let mut bytes = vec![0u8; field.texel_len()];
    field.write_texels(&mut bytes);

    assert_eq!(bytes.len(), 16);
    let read = |i: usize| f32::from_ne_bytes(bytes[i..i + 4].try_into().unwrap());
    assert_eq!(read(0), 0.0);
    assert_eq!(read(4), 0.0);
    assert_eq!(read(8), 5.0);
    assert_eq!(read(12), -2.5);
  }
}
