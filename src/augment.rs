//! Random training-time augmentation applied after normalization.

use crate::error::{PreprocError, Result};

use ndarray::{Array3, Axis};
use rand::{Rng};
use rand::rngs::{StdRng};

/// A randomized transform of one (height, width, channels) image.
///
/// The RNG is passed in per image so that loading images on several threads
/// gives the same result as loading them in order.
pub trait RandomTransform: Send + Sync {
  fn random_transform(&self, image: Array3<f32>, rng: &mut StdRng) -> Array3<f32>;

  /// Checks the transform's parameters before any image is processed.
  fn validate(&self) -> Result<()> {
    Ok(())
  }
}

#[derive(Clone, Debug, Default)]
pub struct ImageAugmenter {
  pub horizontal_flip:      bool,
  pub vertical_flip:        bool,
  /// Maximum horizontal shift, as a fraction of the width.
  pub width_shift_range:    f32,
  /// Maximum vertical shift, as a fraction of the height.
  pub height_shift_range:   f32,
}

impl ImageAugmenter {
  /// Shift ranges must be finite and within [0, 1].
  pub fn validate(&self) -> Result<()> {
    let ranges = [
      ("width_shift_range", self.width_shift_range),
      ("height_shift_range", self.height_shift_range),
    ];
    for &(name, range) in ranges.iter() {
      if !range.is_finite() || range < 0.0 || range > 1.0 {
        return Err(PreprocError::config(format!("{} must be within [0, 1], got {}", name, range)));
      }
    }
    Ok(())
  }

  fn sample_shift(range: f32, extent: usize, rng: &mut StdRng) -> isize {
    // NaN and nonpositive ranges disable the shift; anything past a full
    // extent behaves like 1.0.
    if !(range > 0.0) {
      return 0;
    }
    let range = range.min(1.0);
    (rng.gen_range(-range ..= range) * extent as f32).round() as isize
  }
}

impl RandomTransform for ImageAugmenter {
  fn validate(&self) -> Result<()> {
    ImageAugmenter::validate(self)
  }

  fn random_transform(&self, mut image: Array3<f32>, rng: &mut StdRng) -> Array3<f32> {
    let (height, width, _) = image.dim();
    let ty = ImageAugmenter::sample_shift(self.height_shift_range, height, rng);
    let tx = ImageAugmenter::sample_shift(self.width_shift_range, width, rng);
    if ty != 0 || tx != 0 {
      // Pixels shifted in from outside take the nearest edge value.
      let clamp = |v: isize, extent: usize| v.max(0).min(extent as isize - 1) as usize;
      let src = image;
      image = Array3::from_shape_fn(src.dim(), |(y, x, c)| {
        src[[clamp(y as isize - ty, height), clamp(x as isize - tx, width), c]]
      });
    }
    if self.horizontal_flip && rng.gen_bool(0.5) {
      image.invert_axis(Axis(1));
    }
    if self.vertical_flip && rng.gen_bool(0.5) {
      image.invert_axis(Axis(0));
    }
    image
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use rand::{SeedableRng};

  fn ramp() -> Array3<f32> {
    Array3::from_shape_fn((4, 5, 3), |(y, x, c)| (y * 100 + x * 10 + c) as f32)
  }

  #[test]
  fn default_augmenter_is_identity() {
    let mut rng = StdRng::seed_from_u64(0);
    let out = ImageAugmenter::default().random_transform(ramp(), &mut rng);
    assert_eq!(out, ramp());
  }

  #[test]
  fn same_seed_same_output() {
    let augmenter = ImageAugmenter{
      horizontal_flip:      true,
      vertical_flip:        true,
      width_shift_range:    0.4,
      height_shift_range:   0.4,
    };
    let a = augmenter.random_transform(ramp(), &mut StdRng::seed_from_u64(42));
    let b = augmenter.random_transform(ramp(), &mut StdRng::seed_from_u64(42));
    assert_eq!(a, b);
    assert_eq!(a.dim(), (4, 5, 3));
  }

  #[test]
  fn flip_reverses_columns() {
    let augmenter = ImageAugmenter{horizontal_flip: true, .. ImageAugmenter::default()};
    let mut rng = StdRng::seed_from_u64(0);
    // Every output is either the original or its mirror.
    let mut saw_flip = false;
    for _ in 0 .. 16 {
      let out = augmenter.random_transform(ramp(), &mut rng);
      if out != ramp() {
        assert_eq!(out[[0, 0, 0]], ramp()[[0, 4, 0]]);
        saw_flip = true;
      }
    }
    assert!(saw_flip);
  }

  #[test]
  fn out_of_range_shifts_do_not_panic() {
    for &range in [f32::NAN, f32::INFINITY, 1e30, -3.0].iter() {
      let augmenter = ImageAugmenter{
        width_shift_range:    range,
        height_shift_range:   range,
        .. ImageAugmenter::default()
      };
      let out = augmenter.random_transform(Array3::zeros((4, 5, 3)), &mut StdRng::seed_from_u64(5));
      assert_eq!(out.dim(), (4, 5, 3));
    }
  }

  #[test]
  fn validate_rejects_bad_shift_ranges() {
    for &range in [f32::NAN, f32::INFINITY, 1e30, -0.5, 1.5].iter() {
      let wide = ImageAugmenter{width_shift_range: range, .. ImageAugmenter::default()};
      assert!(matches!(wide.validate(), Err(PreprocError::Config{..})), "width {}", range);
      let tall = ImageAugmenter{height_shift_range: range, .. ImageAugmenter::default()};
      assert!(matches!(tall.validate(), Err(PreprocError::Config{..})), "height {}", range);
    }
    let ok = ImageAugmenter{width_shift_range: 1.0, height_shift_range: 0.0, .. ImageAugmenter::default()};
    assert!(ok.validate().is_ok());
  }

  #[test]
  fn shift_fills_with_edge_pixels() {
    let augmenter = ImageAugmenter{width_shift_range: 1.0, .. ImageAugmenter::default()};
    let mut rng = StdRng::seed_from_u64(3);
    let src = ramp();
    let out = augmenter.random_transform(src.clone(), &mut rng);
    // Each row is a shifted copy of the source row clamped at the edges.
    for y in 0 .. 4 {
      for x in 0 .. 5 {
        let v = out[[y, x, 0]];
        assert!(src.index_axis(Axis(0), y).column(0).iter().any(|&s| s == v));
      }
    }
  }
}
