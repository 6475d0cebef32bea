//! Bounded rolling row buffer for images taller than available memory.
//!
//! The buffer holds `B` rows of the full image at a time. A [`Phase`] says which
//! global rows are being produced and how global rows map onto buffer rows:
//!
//! ```text
//! buffer_row = global_row - global_start + buffer_offset      (valid in [0, B))
//! ```
//!
//! With the reference geometry (N = 90, B = 46):
//!
//! ```text
//! phase 1: buffer <- rows  0..=45, emits  0..=44, offset 0
//! phase 2: buffer <- rows 44..=89, emits 45..=89, offset 1 (row 44 is context only)
//! ```

use super::source::ImageSource;
use super::Pixel;
use crate::config::FilterConfig;
use std::ops::RangeInclusive;

/// Global-to-buffer row mapping for one pass over the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase {
    /// First global row emitted by this phase
    pub global_start: usize,
    /// Last global row emitted by this phase (inclusive)
    pub global_end: usize,
    /// Buffer row that holds `global_start`
    pub buffer_offset: usize,
}

impl Phase {
    /// Phase 1: rows `0..=phase_boundary`, buffer aligned with the image top.
    pub fn first(config: &FilterConfig) -> Self {
        Self {
            global_start: 0,
            global_end: config.phase_boundary(),
            buffer_offset: 0,
        }
    }

    /// Phase 2: rows after the boundary to the image bottom.
    ///
    /// Buffer row 0 carries the boundary row as context and is never emitted.
    pub fn second(config: &FilterConfig) -> Self {
        Self {
            global_start: config.phase_boundary() + 1,
            global_end: config.image_size.saturating_sub(1),
            buffer_offset: 1,
        }
    }

    /// Global rows this phase emits
    pub fn rows(&self) -> RangeInclusive<usize> {
        self.global_start..=self.global_end
    }

    /// First global row the phase expects to find in buffer row 0
    pub fn first_loaded_row(&self) -> usize {
        self.global_start.saturating_sub(self.buffer_offset)
    }

    /// Map a global row into the buffer, if it is resident.
    pub fn buffer_row(&self, global_row: usize, capacity: usize) -> Option<usize> {
        (global_row + self.buffer_offset)
            .checked_sub(self.global_start)
            .filter(|&row| row < capacity)
    }
}

/// Fixed-capacity `B x N` row store, exclusively owned by the stream controller.
#[derive(Debug, Clone)]
pub struct RowBuffer {
    capacity: usize,
    width: usize,
    data: Vec<Pixel>,
}

impl RowBuffer {
    /// Allocate a zeroed buffer of `capacity` rows
    pub fn new(capacity: usize, width: usize) -> Self {
        Self {
            capacity,
            width,
            data: vec![0; capacity * width],
        }
    }

    /// Capacity in rows
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Row width in samples
    pub fn width(&self) -> usize {
        self.width
    }

    /// Borrow buffer row `row`
    pub fn row(&self, row: usize) -> &[Pixel] {
        &self.data[row * self.width..(row + 1) * self.width]
    }

    /// Mutably borrow buffer row `row`
    pub fn row_mut(&mut self, row: usize) -> &mut [Pixel] {
        &mut self.data[row * self.width..(row + 1) * self.width]
    }
}

/// Read-only view of the buffer under one phase mapping.
///
/// Border reflection runs against the full image height, so a reflected row
/// can still land outside the buffer; such samples report `None`.
#[derive(Debug, Clone, Copy)]
pub struct RollingView<'a> {
    buffer: &'a RowBuffer,
    phase: Phase,
    image_height: usize,
}

impl<'a> RollingView<'a> {
    /// View `buffer` as rows of an image `image_height` rows tall
    pub fn new(buffer: &'a RowBuffer, phase: Phase, image_height: usize) -> Self {
        Self {
            buffer,
            phase,
            image_height,
        }
    }

    /// Phase mapping in effect
    pub fn phase(&self) -> Phase {
        self.phase
    }
}

impl ImageSource for RollingView<'_> {
    fn dimensions(&self) -> (usize, usize) {
        (self.image_height, self.buffer.width())
    }

    fn resident(&self, row: usize, col: usize) -> Option<Pixel> {
        self.phase
            .buffer_row(row, self.buffer.capacity())
            .map(|local| self.buffer.row(local)[col])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_geometry_phases() {
        let config = FilterConfig::default();
        let first = Phase::first(&config);
        let second = Phase::second(&config);

        assert_eq!(first.rows(), 0..=44);
        assert_eq!(second.rows(), 45..=89);
        assert_eq!(second.first_loaded_row(), 44);

        assert_eq!(first.buffer_row(45, 46), Some(45));
        assert_eq!(first.buffer_row(46, 46), None);
        assert_eq!(second.buffer_row(44, 46), Some(0));
        assert_eq!(second.buffer_row(45, 46), Some(1));
        assert_eq!(second.buffer_row(89, 46), Some(45));
        assert_eq!(second.buffer_row(43, 46), None);
    }

    #[test]
    fn view_reports_non_resident_rows() {
        let config = FilterConfig {
            image_size: 6,
            buffer_capacity: 4,
            ..FilterConfig::default()
        };
        let mut buffer = RowBuffer::new(4, 6);
        for row in 0..4 {
            buffer.row_mut(row).fill(row as Pixel * 10);
        }

        let view = RollingView::new(&buffer, Phase::first(&config), 6);
        assert_eq!(view.sample(3, 0), Some(30));
        assert_eq!(view.sample(-1, 0), Some(10));
        assert_eq!(view.sample(4, 0), None);

        // Phase 2 loads global rows 2..=5 into buffer rows 0..=3.
        let view = RollingView::new(&buffer, Phase::second(&config), 6);
        assert_eq!(view.sample(2, 0), Some(0));
        assert_eq!(view.sample(6, 0), Some(20));
        assert_eq!(view.sample(1, 0), None);
    }
}
