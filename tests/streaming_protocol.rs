//! End-to-end tests of the two-phase streaming protocol.

mod common;

use common::{encoded_rows, fast_timeouts, host_script, textured_image};
use kuwahara_stream::config::FilterConfig;
use kuwahara_stream::controller::{CycleState, Phase2Outcome, StreamController, StreamTimeouts};
use kuwahara_stream::filter::KuwaharaFilter;
use kuwahara_stream::host::HostSession;
use kuwahara_stream::transport::{ChannelTransport, MockTransport};
use kuwahara_stream::KuwaharaError;
use std::thread;
use std::time::Duration;

#[test]
fn test_device_and_host_over_channel() {
    let config = FilterConfig::default();
    let image = textured_image(config.image_size);
    let (device_link, host_link) = ChannelTransport::pair();

    let device = thread::spawn(move || {
        let timeouts = StreamTimeouts {
            row: Duration::from_secs(2),
            go: Duration::from_secs(5),
        };
        let mut device = StreamController::new(config, timeouts, device_link)?;
        device.run_cycle()
    });

    let mut host = HostSession::new(config, Duration::from_secs(5), host_link).unwrap();
    let streamed = host.process(&image).unwrap();
    let report = device.join().unwrap().unwrap();

    assert_eq!(report.phase2, Phase2Outcome::Completed);
    assert_eq!(report.rows_emitted, 90);
    assert_eq!(report.phase1_timeout, None);

    let resident = KuwaharaFilter::from_config(&config).unwrap().filter(&image);
    assert_eq!(streamed, resident);
}

#[test]
fn test_go_token_after_false_start() {
    let config = FilterConfig::default();
    let image = textured_image(config.image_size);
    let boundary = config.phase_boundary();

    let mut link = MockTransport::new();
    link.push_str(&encoded_rows(&image, 0..46));
    link.push_bytes(b"#G#GO2#");
    link.push_str(&encoded_rows(&image, boundary..90));

    let mut device = StreamController::new(config, fast_timeouts(), link).unwrap();
    let report = device.run_cycle().unwrap();
    assert_eq!(report.phase2, Phase2Outcome::Completed);
    assert_eq!(device.transport().pending(), 0);
}

#[test]
fn test_go_timeout_then_next_cycle_succeeds() {
    let config = FilterConfig {
        image_size: 10,
        buffer_capacity: 6,
        ..FilterConfig::default()
    };
    let image = textured_image(10);

    let mut link = MockTransport::new();
    link.push_str(&encoded_rows(&image, 0..6));
    link.push_silence();
    link.push_bytes(&host_script(&config, &image));

    let mut device = StreamController::new(config, fast_timeouts(), link).unwrap();

    let first = device.run_cycle().unwrap();
    assert_eq!(first.cycle, 1);
    assert_eq!(first.phase2, Phase2Outcome::GoTimeout);
    assert_eq!(first.rows_emitted, 5);
    assert_eq!(device.state(), CycleState::AwaitPhase1Rows);

    let second = device.run_cycle().unwrap();
    assert_eq!(second.cycle, 2);
    assert_eq!(second.phase2, Phase2Outcome::Completed);
    assert_eq!(second.rows_emitted, 10);
}

#[test]
fn test_phase_two_row_timeout_emits_no_phase_two_rows() {
    let config = FilterConfig {
        image_size: 10,
        buffer_capacity: 6,
        ..FilterConfig::default()
    };
    let image = textured_image(10);

    let mut link = MockTransport::new();
    link.push_str(&encoded_rows(&image, 0..6));
    link.push_bytes(b"#GO2#");
    link.push_str(&encoded_rows(&image, 4..7));
    link.push_bytes(b"1 2 3");

    let mut device = StreamController::new(config, fast_timeouts(), link).unwrap();
    let report = device.run_cycle().unwrap();
    assert_eq!(report.phase2, Phase2Outcome::RowTimeout { row: 7 });

    let sent = device.transport().sent_text();
    let after_ready = sent.split("#READY2#\n").nth(1).unwrap();
    assert_eq!(after_ready, "ERROR: Row 7 timed out after 2 of 10 values\n");
}

#[test]
fn test_host_reports_dead_device() {
    let config = FilterConfig::default();
    let image = textured_image(config.image_size);
    let (_device_link, host_link) = ChannelTransport::pair();

    let mut host = HostSession::new(config, Duration::from_millis(50), host_link).unwrap();
    assert!(matches!(
        host.process(&image),
        Err(KuwaharaError::RowTimeout { .. })
    ));
}
