//! Reference image comparison
//!
//! Decides whether an actual image is "close enough" to its reference. Each
//! sample whose absolute difference exceeds `value_threshold` counts as
//! failed, and the comparison passes while the number of failed samples stays
//! within `percentage_threshold` percent of all samples.
//!
//! The accepted count is truncated (`floor`) while the failed count is
//! compared with a strict `>`; this asymmetry moves the pass/fail boundary by
//! up to one sample and is kept exactly as is.

use crate::error::{Error, Result, Shape};
use crate::pixel::PixelImage;
use serde::{Deserialize, Serialize};

/// Sensitivity knobs of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPolicy {
    /// Per-sample absolute difference above which a sample is failed
    pub value_threshold: f64,
    /// Maximum allowed percentage of failed samples
    pub percentage_threshold: f64,
}

impl ComparisonPolicy {
    /// Tight policy for generic (non-pixel) reference data
    pub const GENERIC: ComparisonPolicy = ComparisonPolicy {
        value_threshold: 1e-6,
        percentage_threshold: 0.0,
    };

    /// Policy for decoded pictures: one 8-bit step, 1% of samples
    pub const IMAGE: ComparisonPolicy = ComparisonPolicy {
        value_threshold: 1.0 / 255.0,
        percentage_threshold: 1.0,
    };

    pub fn new(value_threshold: f64, percentage_threshold: f64) -> Self {
        Self {
            value_threshold,
            percentage_threshold,
        }
    }

    /// Number of failed samples tolerated out of `num_samples`.
    pub fn num_accepted_failed(&self, num_samples: usize) -> usize {
        (num_samples as f64 * self.percentage_threshold / 100.0).floor() as usize
    }
}

impl Default for ComparisonPolicy {
    fn default() -> Self {
        Self::GENERIC
    }
}

/// Outcome of comparing two equally shaped images.
#[derive(Debug, Clone)]
pub struct ImageComparison {
    /// Total number of compared samples
    pub num_samples: usize,
    /// Samples whose difference exceeded the value threshold
    pub num_failed: usize,
    /// Failed samples tolerated by the percentage threshold
    pub num_accepted_failed: usize,
    /// Largest absolute per-sample difference
    pub max_difference: f32,
    /// Absolute difference rescaled so that `max_difference` maps to 1.0
    pub difference: PixelImage,
}

impl ImageComparison {
    /// Pass iff `num_failed <= num_accepted_failed`.
    pub fn passed(&self) -> bool {
        self.num_failed <= self.num_accepted_failed
    }

    /// Convert a failing comparison into the matching test failure.
    pub fn into_result(self) -> Result<Self> {
        if self.passed() {
            Ok(self)
        } else {
            Err(Error::TooManyFailedSamples {
                num_failed: self.num_failed,
                num_accepted: self.num_accepted_failed,
            })
        }
    }
}

/// Compare `actual` against `reference`.
///
/// Differing shapes are reported as [`Error::ShapeMismatch`] before any
/// sample is looked at.
pub fn compare_images(
    actual: &PixelImage,
    reference: &PixelImage,
    policy: &ComparisonPolicy,
) -> Result<ImageComparison> {
    if actual.shape() != reference.shape() {
        return Err(Error::ShapeMismatch {
            actual: actual.shape(),
            reference: reference.shape(),
        });
    }

    let mut difference: Vec<f32> = actual
        .samples()
        .iter()
        .zip(reference.samples())
        .map(|(a, r)| (a - r).abs())
        .collect();

    // Thresholds apply at sample (f32) precision.
    let value_threshold = policy.value_threshold as f32;
    let num_samples = difference.len();
    let num_failed = difference.iter().filter(|&&d| d > value_threshold).count();
    let max_difference = difference.iter().copied().fold(0.0f32, f32::max);

    if max_difference != 0.0 {
        for d in &mut difference {
            *d /= max_difference;
        }
    }

    Ok(ImageComparison {
        num_samples,
        num_failed,
        num_accepted_failed: policy.num_accepted_failed(num_samples),
        max_difference,
        difference: PixelImage::from_samples(actual.shape(), difference)?,
    })
}

/// Difference image used when a reference is rebaselined.
pub fn blank_difference(shape: Shape) -> PixelImage {
    PixelImage::zeros(shape)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_channel(values: &[f32], width: usize) -> PixelImage {
        PixelImage::from_samples(
            Shape::new(values.len() / width, width, 1),
            values.to_vec(),
        )
        .unwrap()
    }

    #[test]
    fn test_single_hot_pixel_fails_at_one_percent() {
        let zeros = PixelImage::zeros(Shape::new(4, 4, 1));
        let mut values = vec![0.0; 16];
        values[5] = 3.0 / 255.0;
        let actual = single_channel(&values, 4);

        let policy = ComparisonPolicy::new(1.0 / 255.0, 1.0);
        let cmp = compare_images(&actual, &zeros, &policy).unwrap();
        assert_eq!(cmp.num_accepted_failed, 0);
        assert_eq!(cmp.num_failed, 1);
        assert!(!cmp.passed());

        let policy = ComparisonPolicy::new(1.0 / 255.0, 10.0);
        let cmp = compare_images(&actual, &zeros, &policy).unwrap();
        assert_eq!(cmp.num_accepted_failed, 1);
        assert!(cmp.passed());
    }

    #[test]
    fn test_difference_is_normalized() {
        let reference = single_channel(&[0.0, 0.0, 0.0, 0.0], 2);
        let actual = single_channel(&[0.1, 0.2, 0.0, 0.4], 2);
        let cmp = compare_images(&actual, &reference, &ComparisonPolicy::IMAGE).unwrap();
        let diff = cmp.difference.samples();
        assert!((diff[3] - 1.0).abs() < 1e-6);
        assert!((diff[1] - 0.5).abs() < 1e-6);
        assert_eq!(diff[2], 0.0);
        assert!((cmp.max_difference - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_identical_images_have_zero_difference() {
        let img = single_channel(&[0.25, 0.5, 0.75, 1.0], 2);
        let cmp = compare_images(&img, &img, &ComparisonPolicy::GENERIC).unwrap();
        assert!(cmp.passed());
        assert_eq!(cmp.num_failed, 0);
        assert_eq!(cmp.max_difference, 0.0);
        assert!(cmp.difference.samples().iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_shape_mismatch() {
        let a = PixelImage::zeros(Shape::new(4, 4, 1));
        let b = PixelImage::zeros(Shape::new(4, 4, 3));
        let err = compare_images(&a, &b, &ComparisonPolicy::IMAGE).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_value_threshold_is_strict() {
        let reference = single_channel(&[0.0, 0.0], 2);
        let actual = single_channel(&[0.5, 0.25], 2);
        let policy = ComparisonPolicy::new(0.5, 0.0);
        let cmp = compare_images(&actual, &reference, &policy).unwrap();
        assert_eq!(cmp.num_failed, 0);
    }

    #[test]
    fn test_one_8_bit_step_is_within_image_threshold() {
        let reference = single_channel(&[0.0, 127.0 / 255.0], 2);
        let actual = single_channel(&[1.0 / 255.0, 127.0 / 255.0], 2);
        let policy = ComparisonPolicy::new(1.0 / 255.0, 0.0);
        let cmp = compare_images(&actual, &reference, &policy).unwrap();
        assert_eq!(cmp.num_failed, 0);
    }

    #[test]
    fn test_accepted_count_truncates() {
        let policy = ComparisonPolicy::new(0.0, 1.0);
        assert_eq!(policy.num_accepted_failed(99), 0);
        assert_eq!(policy.num_accepted_failed(100), 1);
        assert_eq!(policy.num_accepted_failed(199), 1);
        assert_eq!(ComparisonPolicy::GENERIC.num_accepted_failed(1_000_000), 0);
    }

    #[test]
    fn test_into_result() {
        let reference = single_channel(&[0.0, 0.0], 2);
        let actual = single_channel(&[1.0, 1.0], 2);
        let err = compare_images(&actual, &reference, &ComparisonPolicy::GENERIC)
            .unwrap()
            .into_result()
            .unwrap_err();
        assert_eq!(err.to_string(), "Too many failed pixel values: 2 at threshold 0");
    }

    #[test]
    fn test_blank_difference() {
        let diff = blank_difference(Shape::new(2, 2, 3));
        assert_eq!(diff.samples().len(), 12);
        assert!(diff.samples().iter().all(|&d| d == 0.0));
    }
}
