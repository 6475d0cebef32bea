//! Pixel sources consumed by the filter engine.
//!
//! The engine never knows whether it is reading a whole resident image or a
//! slice of rows held in the rolling buffer; both implement [`ImageSource`].

use super::border::reflect_101;
use super::{GrayImage, Pixel};

/// Capability surface the filter engine reads through.
///
/// Implementors describe the logical image size and answer for in-range
/// coordinates; border resolution is shared by every source via
/// [`ImageSource::sample`].
pub trait ImageSource {
    /// Logical `(height, width)` of the whole image, used for reflection.
    fn dimensions(&self) -> (usize, usize);

    /// Sample at an in-range coordinate, or `None` if it is not resident.
    fn resident(&self, row: usize, col: usize) -> Option<Pixel>;

    /// Sample at a possibly out-of-range coordinate.
    ///
    /// The coordinate is resolved against the logical dimensions first, then
    /// looked up through [`ImageSource::resident`].
    fn sample(&self, row: isize, col: isize) -> Option<Pixel> {
        let (height, width) = self.dimensions();
        self.resident(reflect_101(row, height), reflect_101(col, width))
    }
}

/// The full-grid source: every in-range sample is resident.
impl ImageSource for GrayImage {
    fn dimensions(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    fn resident(&self, row: usize, col: usize) -> Option<Pixel> {
        Some(self.get(row, col))
    }
}

impl<S: ImageSource + ?Sized> ImageSource for &S {
    fn dimensions(&self) -> (usize, usize) {
        (**self).dimensions()
    }

    fn resident(&self, row: usize, col: usize) -> Option<Pixel> {
        (**self).resident(row, col)
    }
}
