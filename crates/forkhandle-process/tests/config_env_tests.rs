//! Configuration loading from files and the environment

use std::fs;

use forkhandle_process::{
    fork, ForkConfig, ProcessError, Signal, SignalSpec, CLOSE_SIGNAL_ENV,
};
use serial_test::serial;
use tempfile::TempDir;

#[test]
#[serial]
fn test_env_overrides_close_signal() {
    std::env::set_var(CLOSE_SIGNAL_ENV, "SIGUSR2");
    let mut config = ForkConfig::default();
    config.load_from_env();
    std::env::remove_var(CLOSE_SIGNAL_ENV);

    assert_eq!(config.close_signal, Some(SignalSpec::Name("SIGUSR2".to_string())));
    assert_eq!(config.resolve_close_signal().unwrap(), Signal::SIGUSR2 as i32);
}

#[test]
#[serial]
fn test_env_numeric_value() {
    std::env::set_var(CLOSE_SIGNAL_ENV, " 9 ");
    let mut config = ForkConfig::default();
    config.load_from_env();
    std::env::remove_var(CLOSE_SIGNAL_ENV);

    assert_eq!(config.resolve_close_signal().unwrap(), Signal::SIGKILL as i32);
}

#[test]
#[serial]
fn test_empty_env_is_ignored() {
    std::env::set_var(CLOSE_SIGNAL_ENV, "");
    let mut config = ForkConfig::new().with_close_signal(Signal::SIGINT);
    config.load_from_env();
    std::env::remove_var(CLOSE_SIGNAL_ENV);

    assert_eq!(config.resolve_close_signal().unwrap(), Signal::SIGINT as i32);
}

#[test]
#[serial]
fn test_invalid_env_value_fails_fork() {
    std::env::set_var(CLOSE_SIGNAL_ENV, "-1");
    let mut config = ForkConfig::default();
    config.load_from_env();
    std::env::remove_var(CLOSE_SIGNAL_ENV);

    let result = unsafe { fork(&config) };
    assert!(matches!(result, Err(ProcessError::ConfigurationError(_))));
}

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("forkhandle.toml");
    fs::write(&path, "[process]\nclose_signal = \"int\"\n").unwrap();

    let config = ForkConfig::load(&path).unwrap();
    assert_eq!(config.resolve_close_signal().unwrap(), Signal::SIGINT as i32);
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = ForkConfig::load(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ProcessError::ConfigurationError(_)));
}

#[test]
fn test_invalid_signal_in_file_is_caught_at_resolve() {
    let config = ForkConfig::from_toml_str("[process]\nclose_signal = 0\n").unwrap();
    assert!(matches!(
        config.resolve_close_signal(),
        Err(ProcessError::ConfigurationError(_))
    ));
}

#[cfg(any(target_os = "linux", target_os = "android"))]
#[test]
#[serial]
fn test_env_realtime_close_signal() {
    std::env::set_var(CLOSE_SIGNAL_ENV, "SIGRTMIN+1");
    let mut config = ForkConfig::default();
    config.load_from_env();
    std::env::remove_var(CLOSE_SIGNAL_ENV);

    assert_eq!(config.resolve_close_signal().unwrap(), libc::SIGRTMIN() + 1);
}
