//! Behavioural properties of the Kuwahara filter, resident and streamed.

mod common;

use common::{stream_through_device, textured_image};
use kuwahara_stream::config::FilterConfig;
use kuwahara_stream::filter::{KuwaharaFilter, VarianceMode, Window};
use kuwahara_stream::image::{reflect_101, GrayImage, ImageSource, Pixel};
use std::ops::Range;

const MODES: [VarianceMode; 2] = [VarianceMode::Sample, VarianceMode::Population];

fn filter(window: usize, mode: VarianceMode) -> KuwaharaFilter {
    KuwaharaFilter::new(Window::new(window).unwrap(), mode)
}

#[test]
fn test_uniform_image_is_unchanged() {
    let image = GrayImage::filled(12, 9, 255, 173);
    for window in [3, 5, 7, 9] {
        for mode in MODES {
            assert_eq!(filter(window, mode).filter(&image), image, "W={} {:?}", window, mode);
        }
    }
}

#[test]
fn test_three_by_three_all_100() {
    let image = GrayImage::filled(3, 3, 255, 100);
    for mode in MODES {
        let out = filter(3, mode).filter(&image);
        assert!(out.as_slice().iter().all(|&v| v == 100));
    }
}

#[test]
fn test_checkerboard_population_variance() {
    let rows = (0..4)
        .map(|y| (0..4).map(|x| if (x + y) % 2 == 0 { 0 } else { 200 }).collect())
        .collect();
    let image = GrayImage::from_rows(rows, 255).unwrap();
    let out = filter(3, VarianceMode::Population).filter(&image);

    // Every quadrant, reflected or not, holds two 0s and two 200s: equal
    // spread everywhere, so the first quadrant's mean of 100 wins.
    assert_eq!(out.get(0, 0), 100, "corner");
    assert_eq!(out.get(0, 2), 100, "top edge");
    assert_eq!(out.get(2, 0), 100, "left edge");
    assert_eq!(out.get(1, 2), 100, "interior");
    assert!(out.as_slice().iter().all(|&v| v == 100));
}

#[test]
fn test_step_edge_is_preserved() {
    let rows = (0..6)
        .map(|_| vec![20, 20, 20, 20, 220, 220, 220, 220])
        .collect();
    let image = GrayImage::from_rows(rows, 255).unwrap();
    for mode in MODES {
        assert_eq!(filter(5, mode).filter(&image), image);
    }
}

#[test]
fn test_mean_is_truncated() {
    // Lower-right quadrant {1, 1, 2, 2}: mean 1.5, spread lower than the rest.
    let image = GrayImage::from_rows(
        vec![vec![90, 0, 50], vec![30, 1, 1], vec![70, 2, 2]],
        255,
    )
    .unwrap();
    assert_eq!(filter(3, VarianceMode::Sample).pixel(&image, 1, 1), 1);
}

#[test]
fn test_reflection_is_idempotent_in_range() {
    for len in 1..12 {
        for i in 0..len {
            assert_eq!(reflect_101(i as isize, len), i);
        }
        for i in -(len as isize)..(2 * len as isize) {
            let once = reflect_101(i, len);
            assert_eq!(reflect_101(once as isize, len), once);
        }
    }
}

#[test]
fn test_streamed_phases_match_resident_filter() {
    let image = textured_image(90);
    for mode in MODES {
        let config = FilterConfig {
            variance_mode: mode,
            ..FilterConfig::default()
        };
        let resident = KuwaharaFilter::from_config(&config).unwrap().filter(&image);
        assert_eq!(stream_through_device(config, &image), resident, "{:?}", mode);
    }
}

/// Exposes only the rows a phase holds in its buffer.
struct ResidentRows<'a> {
    image: &'a GrayImage,
    rows: Range<usize>,
}

impl ImageSource for ResidentRows<'_> {
    fn dimensions(&self) -> (usize, usize) {
        (self.image.height(), self.image.width())
    }

    fn resident(&self, row: usize, col: usize) -> Option<Pixel> {
        self.rows.contains(&row).then(|| self.image.get(row, col))
    }
}

#[test]
fn test_wide_window_differs_only_at_the_seam() {
    let image = textured_image(90);
    let config = FilterConfig {
        window_size: 5,
        ..FilterConfig::default()
    };
    let filter = KuwaharaFilter::from_config(&config).unwrap();
    let resident = filter.filter(&image);
    let streamed = stream_through_device(config, &image);

    let boundary = config.phase_boundary();
    let phase1 = ResidentRows {
        image: &image,
        rows: 0..config.buffer_capacity,
    };
    let phase2 = ResidentRows {
        image: &image,
        rows: boundary..boundary + config.phase2_rows(),
    };

    let mut seam_differences = 0;
    for y in 0..90 {
        if y != boundary && y != boundary + 1 {
            assert_eq!(streamed.row(y), resident.row(y), "row {}", y);
            continue;
        }
        // Seam rows lose only the quadrants reaching outside the buffer.
        let source = if y <= boundary { &phase1 } else { &phase2 };
        for x in 0..90 {
            assert_eq!(streamed.get(y, x), filter.pixel(source, y, x), "({}, {})", y, x);
            if streamed.get(y, x) != resident.get(y, x) {
                seam_differences += 1;
            }
        }
    }
    assert!(seam_differences > 0, "seam rows never exercised exclusion");
}
