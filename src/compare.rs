//! Pixel-by-pixel comparison of two images of equal size.
//!
//! Used to check streamed output against the resident filter, and to
//! compare files produced by different runs.

use crate::error::{AppResult, KuwaharaError};
use crate::image::GrayImage;
use serde::Serialize;
use std::fmt;

/// Upper bounds of the absolute-difference histogram buckets.
///
/// The final bucket collects everything above the last bound.
pub const DIFF_BUCKETS: [u32; 5] = [0, 1, 3, 5, 10];

/// Difference metrics between two images.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageDiff {
    /// Common width
    pub width: usize,
    /// Common height
    pub height: usize,
    /// Samples compared
    pub total_pixels: usize,
    /// Samples that differ at all
    pub differing_pixels: usize,
    /// Largest absolute difference
    pub max_abs_diff: u32,
    /// `(row, col)` of the first sample reaching `max_abs_diff`
    pub max_diff_position: Option<(usize, usize)>,
    /// Mean absolute error
    pub mean_abs_diff: f64,
    /// Root mean square error
    pub rmse: f64,
    /// Mean of `a - b`; positive when `a` is brighter on average
    pub mean_bias: f64,
    /// Pixels whose difference falls in each of [`DIFF_BUCKETS`], plus overflow
    pub histogram: [usize; 6],
}

impl ImageDiff {
    /// True when every sample matches
    pub fn identical(&self) -> bool {
        self.differing_pixels == 0
    }

    /// Share of pixels whose absolute difference is at most `tolerance`, in percent
    pub fn percent_within(&self, tolerance: u32) -> f64 {
        if self.total_pixels == 0 {
            return 100.0;
        }
        let within = DIFF_BUCKETS
            .iter()
            .zip(self.histogram.iter())
            .take_while(|(&bound, _)| bound <= tolerance)
            .map(|(_, &count)| count)
            .sum::<usize>();
        within as f64 * 100.0 / self.total_pixels as f64
    }
}

/// Compare `a` against `b`.
///
/// # Errors
/// `DimensionMismatch` when the images differ in size.
pub fn compare(a: &GrayImage, b: &GrayImage) -> AppResult<ImageDiff> {
    if (a.width(), a.height()) != (b.width(), b.height()) {
        return Err(KuwaharaError::DimensionMismatch {
            expected_width: a.width(),
            expected_height: a.height(),
            width: b.width(),
            height: b.height(),
        });
    }

    let total = a.as_slice().len();
    let mut diff = ImageDiff {
        width: a.width(),
        height: a.height(),
        total_pixels: total,
        differing_pixels: 0,
        max_abs_diff: 0,
        max_diff_position: None,
        mean_abs_diff: 0.0,
        rmse: 0.0,
        mean_bias: 0.0,
        histogram: [0; 6],
    };

    let mut abs_sum = 0u64;
    let mut sq_sum = 0u64;
    let mut signed_sum = 0i64;

    for (i, (&pa, &pb)) in a.as_slice().iter().zip(b.as_slice()).enumerate() {
        let signed = i64::from(pa) - i64::from(pb);
        let abs = signed.unsigned_abs() as u32;

        abs_sum += u64::from(abs);
        sq_sum += u64::from(abs) * u64::from(abs);
        signed_sum += signed;

        if abs > 0 {
            diff.differing_pixels += 1;
        }
        if abs > diff.max_abs_diff {
            diff.max_abs_diff = abs;
            diff.max_diff_position = Some((i / a.width(), i % a.width()));
        }

        let bucket = DIFF_BUCKETS
            .iter()
            .position(|&bound| abs <= bound)
            .unwrap_or(DIFF_BUCKETS.len());
        diff.histogram[bucket] += 1;
    }

    if total > 0 {
        let n = total as f64;
        diff.mean_abs_diff = abs_sum as f64 / n;
        diff.rmse = (sq_sum as f64 / n).sqrt();
        diff.mean_bias = signed_sum as f64 / n;
    }

    Ok(diff)
}

impl fmt::Display for ImageDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dimensions:        {}x{}", self.width, self.height)?;
        if self.identical() {
            return writeln!(f, "Images are identical ({} pixels)", self.total_pixels);
        }

        let percent = self.differing_pixels as f64 * 100.0 / self.total_pixels as f64;
        writeln!(
            f,
            "Differing pixels:  {} of {} ({:.2}%)",
            self.differing_pixels, self.total_pixels, percent
        )?;
        if let Some((row, col)) = self.max_diff_position {
            writeln!(
                f,
                "Max difference:    {} at row {}, col {}",
                self.max_abs_diff, row, col
            )?;
        }
        writeln!(f, "Mean abs error:    {:.4}", self.mean_abs_diff)?;
        writeln!(f, "RMSE:              {:.4}", self.rmse)?;
        writeln!(f, "Mean bias (a-b):   {:+.4}", self.mean_bias)?;
        writeln!(f, "Within 1:          {:.2}%", self.percent_within(1))?;
        writeln!(f, "Within 5:          {:.2}%", self.percent_within(5))?;
        write!(
            f,
            "Histogram:         0:{} 1:{} 2-3:{} 4-5:{} 6-10:{} >10:{}",
            self.histogram[0],
            self.histogram[1],
            self.histogram[2],
            self.histogram[3],
            self.histogram[4],
            self.histogram[5]
        )?;
        writeln!(f)
    }
}
