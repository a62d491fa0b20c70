//! Tests for the server start/liveness state machine.
//!
//! Servers bind to loopback on ports picked at test time so tests can run
//! in parallel.

use model_server::settings::{ModelRepositorySettings, ServerSettings};
use model_server::{ServerHandle, ServerState, StatusCode};
use std::fs;
use std::net::TcpListener;
use tempfile::TempDir;

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("Failed to find a free port")
}

fn loopback_settings() -> ServerSettings {
    ServerSettings::new()
        .with_grpc_bind_address("127.0.0.1")
        .with_grpc_port(free_port())
}

fn repository() -> (TempDir, ModelRepositorySettings) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::create_dir(dir.path().join("resnet")).unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{"model_config_list": [{"config": {"name": "resnet", "base_path": "resnet"}}]}"#,
    )
    .unwrap();
    let settings = ModelRepositorySettings::new().with_config_path(path);
    (dir, settings)
}

// =============================================================================
// Before start
// =============================================================================

#[test]
fn new_handle_should_not_be_live() {
    let server = ServerHandle::new();
    assert!(!server.is_live());
    assert_eq!(server.state(), ServerState::NotStarted);
    assert!(server.bound_addresses().is_none());
}

#[test]
fn shutdown_without_start_should_report_not_started() {
    let server = ServerHandle::new();
    assert_eq!(server.shutdown().code(), StatusCode::NotStarted);
}

// =============================================================================
// Failed starts
// =============================================================================

#[test]
fn start_with_unloadable_repository_should_fail() {
    let dir = TempDir::new().unwrap();
    let models = ModelRepositorySettings::new().with_config_path(dir.path().join("config.yml"));
    let server = ServerHandle::new();

    let status = server.start(&ServerSettings::new(), &models);

    assert_eq!(status.code(), StatusCode::ConfigFileMissing);
    assert!(status.message().is_some());
    assert!(!server.is_live());
    assert_eq!(server.state(), ServerState::Failed);
}

#[test]
fn start_with_grpc_port_zero_should_fail() {
    let (_dir, models) = repository();
    let mut settings = ServerSettings::new();
    settings.set_grpc_port(0);
    let server = ServerHandle::new();

    let status = server.start(&settings, &models);

    assert_eq!(status.code(), StatusCode::InvalidGrpcPort);
    assert!(!server.is_live());
}

#[test]
fn start_with_malformed_log_level_should_fail() {
    let (_dir, models) = repository();
    let server = ServerHandle::new();

    let status = server.start(&loopback_settings().with_log_level("CHATTY"), &models);

    assert_eq!(status.code(), StatusCode::InvalidLogLevel);
    assert!(!server.is_live());
}

#[test]
fn start_on_taken_port_should_report_port_in_use() {
    let (_dir, models) = repository();
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();
    let server = ServerHandle::new();

    let status = server.start(&loopback_settings().with_grpc_port(port), &models);

    assert_eq!(status.code(), StatusCode::PortInUse);
    assert!(!server.is_live());
    assert_eq!(server.state(), ServerState::Failed);
}

#[test]
fn start_with_metrics_but_no_rest_should_fail() {
    let (_dir, models) = repository();
    let server = ServerHandle::new();

    let status = server.start(&loopback_settings().with_metrics(true), &models);

    assert_eq!(status.code(), StatusCode::MetricsRequireRest);
    assert!(!server.is_live());
}

// =============================================================================
// Successful starts
// =============================================================================

#[test]
fn start_with_valid_settings_should_become_live() {
    let (_dir, models) = repository();
    let settings = loopback_settings();
    let server = ServerHandle::new();

    let status = server.start(&settings, &models);

    assert_eq!(status.code(), StatusCode::Ok, "{status}");
    assert!(server.is_live());
    assert_eq!(server.state(), ServerState::Live);

    let addresses = server.bound_addresses().expect("live server has addresses");
    assert_eq!(addresses.grpc.port(), settings.grpc_port());
    assert!(addresses.rest.is_none());

    assert_eq!(server.shutdown().code(), StatusCode::Ok);
    assert!(!server.is_live());
    assert_eq!(server.state(), ServerState::NotStarted);
    assert_eq!(server.shutdown().code(), StatusCode::NotStarted);
}

#[test]
fn second_start_on_live_handle_should_be_rejected() {
    let (_dir, models) = repository();
    let settings = loopback_settings();
    let server = ServerHandle::new();
    assert!(server.start(&settings, &models).is_ok());

    let status = server.start(&settings, &models);

    assert_eq!(status.code(), StatusCode::AlreadyLive);
    assert!(server.is_live());
    assert_eq!(
        server.bound_addresses().map(|a| a.grpc.port()),
        Some(settings.grpc_port())
    );
}

#[test]
fn failed_handle_should_accept_a_new_start() {
    let (_dir, models) = repository();
    let server = ServerHandle::new();
    let missing = ModelRepositorySettings::new().with_config_path("/nonexistent/config.yml");

    assert!(!server.start(&loopback_settings(), &missing).is_ok());
    assert_eq!(server.state(), ServerState::Failed);

    let status = server.start(&loopback_settings(), &models);
    assert!(status.is_ok(), "{status}");
    assert!(server.is_live());
}

#[test]
fn stopped_handle_should_start_again_on_same_port() {
    let (_dir, models) = repository();
    let settings = loopback_settings();
    let server = ServerHandle::new();

    assert!(server.start(&settings, &models).is_ok());
    assert!(server.shutdown().is_ok());

    let status = server.start(&settings, &models);
    assert!(status.is_ok(), "{status}");
    assert!(server.is_live());
}

#[test]
fn settings_may_be_dropped_after_start() {
    let (dir, models) = repository();
    let server = ServerHandle::new();
    {
        let settings = loopback_settings()
            .with_rest_bind_address("127.0.0.1")
            .with_rest_port(free_port());
        assert!(server.start(&settings, &models).is_ok());
    }
    drop(models);
    drop(dir);

    assert!(server.is_live());
    assert!(server.bound_addresses().and_then(|a| a.rest).is_some());
}

#[test]
fn concurrent_starts_should_have_exactly_one_winner() {
    let (_dir, models) = repository();
    let settings = loopback_settings();
    let server = ServerHandle::new();

    let codes: Vec<StatusCode> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| server.start(&settings, &models).code()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners = codes.iter().filter(|code| **code == StatusCode::Ok).count();
    assert_eq!(winners, 1, "codes: {codes:?}");
    assert!(codes.iter().all(|code| matches!(
        code,
        StatusCode::Ok | StatusCode::AlreadyLive | StatusCode::StartInProgress
    )));
    assert!(server.is_live());
}
