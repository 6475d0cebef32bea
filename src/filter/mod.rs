//! Kuwahara quadrant filter.
//!
//! For every target pixel the `W x W` window centred on it is split into four
//! overlapping `q x q` quadrants (`q = (W + 1) / 2`), which share the centre
//! row and column. The quadrant with the lowest standard deviation wins and
//! the pixel becomes that quadrant's mean, truncated toward zero.
//!
//! Quadrants are visited in the fixed order of [`QUADRANT_ORDER`] and only a
//! strictly lower deviation replaces the current best, so ties go to the
//! quadrant seen first. A quadrant with a sample the source cannot provide is
//! skipped; if no quadrant qualifies the pixel keeps its own value.
//!
//! # Example
//! ```
//! use kuwahara_stream::filter::{KuwaharaFilter, VarianceMode, Window};
//! use kuwahara_stream::image::GrayImage;
//!
//! let image = GrayImage::filled(3, 3, 255, 100);
//! let filter = KuwaharaFilter::new(Window::new(3)?, VarianceMode::Population);
//! assert_eq!(filter.filter(&image), image);
//! # Ok::<(), kuwahara_stream::error::KuwaharaError>(())
//! ```

mod stats;

pub use stats::{QuadrantStats, VarianceMode};

use crate::config::FilterConfig;
use crate::error::{AppResult, KuwaharaError};
use crate::image::{GrayImage, ImageSource, Pixel};

/// Quadrant visiting order as `(row_anchor, col_anchor)`.
///
/// Anchor 1 puts the quadrant flush with the window's high edge, anchor 0
/// flush with its low edge.
pub const QUADRANT_ORDER: [(usize, usize); 4] = [(1, 1), (0, 1), (1, 0), (0, 0)];

/// Odd filter window side, at least 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window(usize);

impl Window {
    /// Validate a window size
    pub fn new(size: usize) -> AppResult<Self> {
        if size < 3 || size % 2 == 0 {
            return Err(KuwaharaError::Configuration(format!(
                "window size must be odd and at least 3, got {}",
                size
            )));
        }
        Ok(Self(size))
    }

    /// Window side `W`
    pub fn size(self) -> usize {
        self.0
    }

    /// Distance from the centre to the window edge, `W / 2`
    pub fn half(self) -> usize {
        self.0 / 2
    }

    /// Quadrant side `(W + 1) / 2`
    pub fn quadrant_size(self) -> usize {
        (self.0 + 1) / 2
    }
}

/// Accumulate one quadrant of the window whose top-left corner is `(top, left)`.
///
/// Returns `None` when any of its samples is not resident in `source`.
pub fn quadrant_stats<S: ImageSource + ?Sized>(
    source: &S,
    top: isize,
    left: isize,
    window: Window,
    anchor: (usize, usize),
) -> Option<QuadrantStats> {
    let q = window.quadrant_size();
    let row0 = top + (anchor.0 * (q - 1)) as isize;
    let col0 = left + (anchor.1 * (q - 1)) as isize;

    let mut stats = QuadrantStats::default();
    for dy in 0..q as isize {
        for dx in 0..q as isize {
            stats.push(source.sample(row0 + dy, col0 + dx)?);
        }
    }
    Some(stats)
}

/// Filtered intensity of the pixel at `(y, x)`.
pub fn filter_pixel<S: ImageSource + ?Sized>(
    source: &S,
    y: usize,
    x: usize,
    window: Window,
    mode: VarianceMode,
) -> Pixel {
    let half = window.half() as isize;
    let top = y as isize - half;
    let left = x as isize - half;

    let mut best_std_dev = f64::INFINITY;
    let mut best_mean = source
        .sample(y as isize, x as isize)
        .map_or(0.0, f64::from);

    for anchor in QUADRANT_ORDER {
        let Some(stats) = quadrant_stats(source, top, left, window, anchor) else {
            continue;
        };
        let Some(std_dev) = stats.std_dev(mode) else {
            continue;
        };
        if std_dev < best_std_dev {
            best_std_dev = std_dev;
            best_mean = stats.mean();
        }
    }

    // `as` truncates toward zero
    best_mean as Pixel
}

/// Window and dispersion mode bundled for whole-row and whole-image passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KuwaharaFilter {
    window: Window,
    mode: VarianceMode,
}

impl KuwaharaFilter {
    /// Create a filter
    pub fn new(window: Window, mode: VarianceMode) -> Self {
        Self { window, mode }
    }

    /// Create a filter from validated configuration
    pub fn from_config(config: &FilterConfig) -> AppResult<Self> {
        Ok(Self::new(config.window()?, config.variance_mode))
    }

    /// Window in use
    pub fn window(&self) -> Window {
        self.window
    }

    /// Dispersion mode in use
    pub fn mode(&self) -> VarianceMode {
        self.mode
    }

    /// Filtered value of one pixel
    pub fn pixel<S: ImageSource + ?Sized>(&self, source: &S, y: usize, x: usize) -> Pixel {
        filter_pixel(source, y, x, self.window, self.mode)
    }

    /// Filter global row `y` of `source` into `out`, replacing its contents.
    pub fn filter_row<S: ImageSource + ?Sized>(&self, source: &S, y: usize, out: &mut Vec<Pixel>) {
        let (_, width) = source.dimensions();
        out.clear();
        out.extend((0..width).map(|x| self.pixel(source, y, x)));
    }

    /// Full-grid pass into a fresh image; `image` is only read.
    pub fn filter(&self, image: &GrayImage) -> GrayImage {
        let mut result = GrayImage::new(image.width(), image.height(), image.max_value());
        for y in 0..image.height() {
            for x in 0..image.width() {
                result.set(y, x, self.pixel(image, y, x));
            }
        }
        result
    }

    /// Full-grid pass whose result replaces `image` once the scan is complete.
    pub fn apply(&self, image: &mut GrayImage) {
        *image = self.filter(image);
    }
}
