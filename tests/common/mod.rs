//! Shared helpers for integration tests.

#![allow(dead_code)]

use kuwahara_stream::codec::{encode_row_into, parse_pgm};
use kuwahara_stream::config::FilterConfig;
use kuwahara_stream::controller::{StreamController, StreamTimeouts};
use kuwahara_stream::image::{GrayImage, Pixel};
use kuwahara_stream::protocol::{GO_TOKEN, READY_TOKEN};
use kuwahara_stream::transport::MockTransport;
use std::time::Duration;

/// Deterministic textured image with sharp edges and smooth ramps.
pub fn textured_image(size: usize) -> GrayImage {
    let mut image = GrayImage::new(size, size, 255);
    for y in 0..size {
        for x in 0..size {
            let value = if (x / 7 + y / 5) % 3 == 0 {
                (x * 3 + y) % 256
            } else {
                (x * 31 + y * 17 + x * y) % 256
            };
            image.set(y, x, value as Pixel);
        }
    }
    image
}

/// Short bounds so timeouts in tests resolve quickly.
pub fn fast_timeouts() -> StreamTimeouts {
    StreamTimeouts {
        row: Duration::from_millis(20),
        go: Duration::from_millis(50),
    }
}

/// Rows `range` of `image`, encoded the way a host sends them.
pub fn encoded_rows(image: &GrayImage, range: std::ops::Range<usize>) -> String {
    let mut out = String::new();
    for y in range {
        encode_row_into(image.row(y), &mut out);
    }
    out
}

/// Everything a well-behaved host sends for one cycle.
pub fn host_script(config: &FilterConfig, image: &GrayImage) -> Vec<u8> {
    let boundary = config.phase_boundary();
    let mut script = encoded_rows(image, 0..config.buffer_capacity).into_bytes();
    script.extend_from_slice(GO_TOKEN);
    script.extend(encoded_rows(image, boundary..boundary + config.phase2_rows()).into_bytes());
    script
}

/// Stream `image` through a device controller and reassemble its output.
pub fn stream_through_device(config: FilterConfig, image: &GrayImage) -> GrayImage {
    let link = MockTransport::with_input(&host_script(&config, image));
    let mut device = StreamController::new(config, fast_timeouts(), link).unwrap();
    device.run_cycle().unwrap();

    let ready = std::str::from_utf8(READY_TOKEN).unwrap();
    let text = device.transport().sent_text().replacen(ready, "", 1);
    parse_pgm(&text).unwrap()
}
