//! Loading settings from TOML files and the environment.

use kuwahara_stream::config::{DeploymentProfile, Settings};
use kuwahara_stream::filter::VarianceMode;
use kuwahara_stream::tracing_setup::OutputFormat;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_missing_file_yields_reference_deployment() {
    let settings = Settings::load_from("/nonexistent/kuwahara.toml").unwrap();
    assert_eq!(settings.profile, DeploymentProfile::Streaming);
    assert_eq!(settings.filter.image_size, 90);
    assert_eq!(settings.filter.buffer_capacity, 46);
    assert_eq!(settings.filter.phase_boundary(), 44);
}

#[test]
fn test_toml_overrides() {
    let file = write_config(
        r#"
profile = "resident"

[filter]
window_size = 5
variance_mode = "population"

[transport]
row_timeout = "500ms"
go_timeout = "1m"

[logging]
level = "debug"
format = "json"
"#,
    );

    let settings = Settings::load_from(file.path()).unwrap();
    assert_eq!(settings.profile, DeploymentProfile::Resident);
    assert_eq!(settings.filter.window_size, 5);
    assert_eq!(settings.filter.variance_mode, VarianceMode::Population);
    assert_eq!(settings.filter.image_size, 90);
    assert_eq!(settings.transport.row_timeout, Duration::from_millis(500));
    assert_eq!(settings.transport.go_timeout, Duration::from_secs(60));
    assert_eq!(settings.logging.format, OutputFormat::Json);
}

#[test]
fn test_invalid_geometry_rejected_at_load() {
    let file = write_config("[filter]\nimage_size = 90\nbuffer_capacity = 40\n");
    let err = Settings::load_from(file.path()).unwrap_err();
    assert!(err.to_string().contains("two phases"));
}

#[test]
fn test_unknown_variance_mode_rejected() {
    let file = write_config("[filter]\nvariance_mode = \"median\"\n");
    assert!(Settings::load_from(file.path()).is_err());
}

#[test]
fn test_rendered_config_loads_back() {
    let settings = Settings::default();
    let file = write_config(&settings.to_toml_string().unwrap());
    assert_eq!(Settings::load_from(file.path()).unwrap(), settings);
}
