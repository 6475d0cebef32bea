//! Grayscale image model and the pixel-source abstraction the filter reads through.
//!
//! - [`GrayImage`]: an owned width x height grid of intensity samples
//! - [`ImageSource`]: the capability surface the filter engine consumes
//! - [`border`]: reflect-then-clamp coordinate resolution
//! - [`rolling`]: the bounded row buffer and its phase mapping

pub mod border;
pub mod rolling;
pub mod source;

pub use border::reflect_101;
pub use rolling::{Phase, RollingView, RowBuffer};
pub use source::ImageSource;

use crate::error::{AppResult, KuwaharaError};

/// One intensity sample. Wide enough for any plain-text graymap (max 65535).
pub type Pixel = u16;

/// Owned grayscale raster, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    width: usize,
    height: usize,
    max_value: Pixel,
    data: Vec<Pixel>,
}

impl GrayImage {
    /// Create a zero-filled image
    pub fn new(width: usize, height: usize, max_value: Pixel) -> Self {
        Self::filled(width, height, max_value, 0)
    }

    /// Create an image where every sample equals `value`
    pub fn filled(width: usize, height: usize, max_value: Pixel, value: Pixel) -> Self {
        Self {
            width,
            height,
            max_value,
            data: vec![value; width * height],
        }
    }

    /// Wrap row-major sample data
    ///
    /// # Errors
    /// `Format` if `data` does not hold exactly `width * height` samples.
    pub fn from_vec(
        width: usize,
        height: usize,
        max_value: Pixel,
        data: Vec<Pixel>,
    ) -> AppResult<Self> {
        let expected = width.checked_mul(height).ok_or_else(|| {
            KuwaharaError::Format(format!("dimensions {}x{} overflow", width, height))
        })?;
        if data.len() != expected {
            return Err(KuwaharaError::Format(format!(
                "expected {} samples for {}x{}, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            max_value,
            data,
        })
    }

    /// Build an image from equally long rows
    pub fn from_rows(rows: Vec<Vec<Pixel>>, max_value: Pixel) -> AppResult<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);

        let mut data = Vec::with_capacity(width * height);
        for (y, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(KuwaharaError::Format(format!(
                    "row {} has {} values, expected {}",
                    y,
                    row.len(),
                    width
                )));
            }
            data.extend(row);
        }

        Self::from_vec(width, height, max_value, data)
    }

    /// Image width in samples
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in rows
    pub fn height(&self) -> usize {
        self.height
    }

    /// Largest legal sample value (written into the file header)
    pub fn max_value(&self) -> Pixel {
        self.max_value
    }

    /// Sample at `(y, x)`. Panics when out of range, like slice indexing.
    pub fn get(&self, y: usize, x: usize) -> Pixel {
        self.data[y * self.width + x]
    }

    /// Overwrite the sample at `(y, x)`
    pub fn set(&mut self, y: usize, x: usize, value: Pixel) {
        self.data[y * self.width + x] = value;
    }

    /// Borrow row `y`
    pub fn row(&self, y: usize) -> &[Pixel] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Mutably borrow row `y`
    pub fn row_mut(&mut self, y: usize) -> &mut [Pixel] {
        &mut self.data[y * self.width..(y + 1) * self.width]
    }

    /// Iterate over rows top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Pixel]> {
        // chunks_exact(0) panics; a zero-width image simply has no rows to show
        self.data.chunks_exact(self.width.max(1))
    }

    /// All samples, row-major
    pub fn as_slice(&self) -> &[Pixel] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_preserves_layout() {
        let image = GrayImage::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]], 255).unwrap();
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 2);
        assert_eq!(image.get(1, 0), 4);
        assert_eq!(image.row(0), &[1, 2, 3]);
        assert_eq!(image.rows().count(), 2);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let result = GrayImage::from_rows(vec![vec![1, 2, 3], vec![4, 5]], 255);
        assert!(matches!(result, Err(KuwaharaError::Format(_))));
    }

    #[test]
    fn overflowing_dimensions_are_rejected() {
        let result = GrayImage::from_vec(usize::MAX, 2, 255, vec![0]);
        assert!(matches!(result, Err(KuwaharaError::Format(_))));
    }

    #[test]
    fn set_and_row_mut_write_through() {
        let mut image = GrayImage::new(4, 2, 255);
        image.set(1, 3, 9);
        image.row_mut(0)[1] = 7;
        assert_eq!(image.as_slice(), &[0, 7, 0, 0, 0, 0, 0, 9]);
    }
}
