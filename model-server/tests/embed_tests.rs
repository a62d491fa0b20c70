//! Tests for the embedding surface and its process-wide handle.
//!
//! This binary is the only one touching `embed::instance()`, and a single
//! test drives its lifecycle so ordering is deterministic.

use model_server::embed;
use model_server::settings::{DEFAULT_CONFIG_PATH, DEFAULT_GRPC_PORT};
use model_server::{ServerHandle, ServerState, StatusCode};
use std::fs;
use std::net::TcpListener;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn constructors_should_return_documented_defaults() {
    let settings = embed::new_server_settings();
    assert_eq!(settings.grpc_port(), DEFAULT_GRPC_PORT);
    assert_eq!(settings.grpc_port(), 9178);
    assert_eq!(settings.rest_port(), 0);
    assert_eq!(settings.grpc_bind_address(), "0.0.0.0");
    assert_eq!(settings.rest_bind_address(), "0.0.0.0");
    assert_eq!(settings.grpc_workers(), 1);
    assert!(!settings.metrics_enabled());
    assert_eq!(settings.log_level(), "INFO");

    let models = embed::new_model_repository_settings();
    assert_eq!(models.config_path(), Path::new(DEFAULT_CONFIG_PATH));
    assert_eq!(models.config_path(), Path::new("/tmp/config.yml"));
}

#[test]
fn instance_should_be_identical_across_threads() {
    let addresses: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                scope.spawn(|| std::ptr::from_ref::<ServerHandle>(embed::instance()) as usize)
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let first = addresses[0];
    assert!(addresses.iter().all(|addr| *addr == first));
    assert!(std::ptr::eq(embed::instance(), embed::instance()));
}

#[test]
fn instance_lifecycle_should_follow_start_outcomes() {
    let server = embed::instance();
    assert!(!server.is_live());

    let dir = TempDir::new().unwrap();
    let mut models = embed::new_model_repository_settings();
    models.set_config_path(dir.path().join("missing.yml"));
    let mut settings = embed::new_server_settings().with_grpc_bind_address("127.0.0.1");
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    settings.set_grpc_port(port);

    let status = server.start(&settings, &models);
    assert_ne!(status.code(), StatusCode::Ok);
    assert!(!server.is_live());

    let config = dir.path().join("config.yml");
    fs::write(&config, "model_config_list: []\n").unwrap();
    models.set_config_path(&config);

    let status = server.start(&settings, &models);
    assert_eq!(status.code(), StatusCode::Ok, "{status}");
    assert!(server.is_live());

    assert_eq!(server.start(&settings, &models).code(), StatusCode::AlreadyLive);

    assert!(server.shutdown().is_ok());
    assert_eq!(server.state(), ServerState::NotStarted);
}
