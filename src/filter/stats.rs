//! Running statistics for one quadrant.

use crate::image::Pixel;
use serde::{Deserialize, Serialize};

/// Dispersion estimator used to rank quadrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarianceMode {
    /// Divide by `count - 1`
    #[default]
    Sample,
    /// Divide by `count`
    Population,
}

impl std::str::FromStr for VarianceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sample" => Ok(VarianceMode::Sample),
            "population" => Ok(VarianceMode::Population),
            other => Err(format!(
                "unknown variance mode '{}', expected 'sample' or 'population'",
                other
            )),
        }
    }
}

/// Sum, sum of squares and count over a quadrant's samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuadrantStats {
    /// Sum of samples
    pub sum: u64,
    /// Sum of squared samples
    pub sum_sq: u64,
    /// Number of samples
    pub count: usize,
}

impl QuadrantStats {
    /// Accumulate one sample
    pub fn push(&mut self, value: Pixel) {
        let v = u64::from(value);
        self.sum += v;
        self.sum_sq += v * v;
        self.count += 1;
    }

    /// Arithmetic mean (untruncated)
    pub fn mean(&self) -> f64 {
        self.sum as f64 / self.count as f64
    }

    /// Variance under `mode`, or `None` for quadrants of one sample or fewer.
    pub fn dispersion(&self, mode: VarianceMode) -> Option<f64> {
        if self.count <= 1 {
            return None;
        }

        let n = self.count as f64;
        let sum = self.sum as f64;
        let spread = self.sum_sq as f64 - sum * sum / n;

        Some(match mode {
            VarianceMode::Sample => spread / (n - 1.0),
            VarianceMode::Population => spread / n,
        })
    }

    /// Standard deviation under `mode`
    pub fn std_dev(&self, mode: VarianceMode) -> Option<f64> {
        self.dispersion(mode).map(f64::sqrt)
    }
}
