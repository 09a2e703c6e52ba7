//! Tests for bootstrap configuration loading and graceful degradation
//!
//! Covers:
//! - TOML schema (audio + logging tables)
//! - Resolution priority: CLI > TAILFEED_CONFIG > per-user default
//! - Missing default file falls back to built-in defaults
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate TAILFEED_CONFIG are marked with #[serial].

use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tailfeed_common::config::{resolve_config_path, ConfigSource, CONFIG_ENV_VAR};
use tailfeed_common::{Error, TomlConfig};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_full_document() {
    let config = TomlConfig::parse(
        r#"
        [audio]
        buffer_size = 4096
        sample_rate = 44100
        channels = 1

        [logging]
        level = "debug"
        file = "/tmp/tailfeed.log"
        "#,
    )
    .unwrap();

    assert_eq!(config.audio.buffer_size, Some(4096));
    assert_eq!(config.audio.sample_rate, Some(44100));
    assert_eq!(config.audio.channels, Some(1));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/tailfeed.log")));
}

#[test]
fn test_partial_audio_table() {
    let config = TomlConfig::parse("[audio]\nchannels = 2\n").unwrap();

    assert_eq!(config.audio.buffer_size, None);
    assert_eq!(config.audio.sample_rate, None);
    assert_eq!(config.audio.channels, Some(2));
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_wrong_value_type_is_parse_error() {
    let result = TomlConfig::parse("[audio]\nbuffer_size = \"big\"\n");
    assert!(matches!(result, Err(Error::Toml(_))));
}

#[test]
fn test_load_from_file() {
    let file = write_config("[audio]\nbuffer_size = 256\n");
    let config = TomlConfig::load(file.path()).unwrap();
    assert_eq!(config.audio.buffer_size, Some(256));
}

#[test]
fn test_load_missing_file_is_config_error() {
    let result = TomlConfig::load(std::path::Path::new("/nonexistent/tailfeed/config.toml"));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_env_var_used_without_cli_arg() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/tailfeed-env.toml");

    let source = resolve_config_path(None);
    assert_eq!(source, ConfigSource::Explicit(PathBuf::from("/tmp/tailfeed-env.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_arg_takes_precedence_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/tailfeed-env.toml");

    let cli = PathBuf::from("/tmp/tailfeed-cli.toml");
    let source = resolve_config_path(Some(&cli));
    assert_eq!(source, ConfigSource::Explicit(cli));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_load_resolved_reads_env_file() {
    let file = write_config("[logging]\nlevel = \"warn\"\n");
    env::set_var(CONFIG_ENV_VAR, file.path());

    let config = TomlConfig::load_resolved(None).unwrap();
    assert_eq!(config.logging.level, "warn");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_explicit_missing_file_fails() {
    env::remove_var(CONFIG_ENV_VAR);

    let missing = PathBuf::from("/nonexistent/tailfeed-cli.toml");
    assert!(TomlConfig::load_resolved(Some(&missing)).is_err());
}
