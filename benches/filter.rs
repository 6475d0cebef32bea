//! Criterion benchmarks for the filter hot paths.
//!
//! Key metrics:
//! - Full-grid filtering throughput for both variance modes and several windows
//! - One streaming cycle (decode, filter, encode) over a scripted link
//!
//! Run with: cargo bench --bench filter

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kuwahara_stream::codec::encode_row_into;
use kuwahara_stream::config::FilterConfig;
use kuwahara_stream::controller::{StreamController, StreamTimeouts};
use kuwahara_stream::filter::{KuwaharaFilter, VarianceMode, Window};
use kuwahara_stream::image::{GrayImage, Pixel};
use kuwahara_stream::protocol::GO_TOKEN;
use kuwahara_stream::transport::MockTransport;
use std::time::Duration;

fn test_image(size: usize) -> GrayImage {
    let data = (0..size * size)
        .map(|i| ((i * 37 + i / size * 11) % 256) as Pixel)
        .collect();
    GrayImage::from_vec(size, size, 255, data).unwrap()
}

/// Resident filtering of a 90x90 image.
fn full_grid_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_grid");
    let image = test_image(90);
    group.throughput(Throughput::Elements(image.as_slice().len() as u64));

    for window in [3, 5, 9] {
        for mode in [VarianceMode::Sample, VarianceMode::Population] {
            let filter = KuwaharaFilter::new(Window::new(window).unwrap(), mode);
            let id = BenchmarkId::new(format!("{:?}", mode), window);
            group.bench_with_input(id, &image, |b, image| {
                b.iter(|| black_box(filter.filter(black_box(image))));
            });
        }
    }

    group.finish();
}

/// One complete two-phase cycle against a scripted peer.
fn streaming_cycle(c: &mut Criterion) {
    let config = FilterConfig::default();
    let image = test_image(config.image_size);
    let boundary = config.phase_boundary();

    let mut script = String::new();
    for y in 0..config.buffer_capacity {
        encode_row_into(image.row(y), &mut script);
    }
    script.push_str(std::str::from_utf8(GO_TOKEN).unwrap());
    for y in boundary..config.image_size {
        encode_row_into(image.row(y), &mut script);
    }

    let timeouts = StreamTimeouts {
        row: Duration::from_millis(10),
        go: Duration::from_millis(10),
    };

    c.bench_function("streaming_cycle_90x90", |b| {
        b.iter(|| {
            let link = MockTransport::with_input(script.as_bytes());
            let mut device = StreamController::new(config, timeouts, link).unwrap();
            black_box(device.run_cycle().unwrap())
        });
    });
}

criterion_group!(benches, full_grid_filter, streaming_cycle);
criterion_main!(benches);
