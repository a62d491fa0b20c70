//! Integration tests driving a start from loaded settings files.

use anyhow::Result;
use model_server::settings::{EnvMap, Settings};
use model_server::{ServerHandle, StatusCode};
use std::fs;
use tempfile::TempDir;

mod common;

#[test]
fn test_start_from_settings_file() -> Result<()> {
    let dir = TempDir::new()?;
    let repository = common::write_repository(&dir)?;
    let grpc_port = common::free_port()?;

    let settings_path = dir.path().join("model-server.toml");
    fs::write(
        &settings_path,
        format!(
            "[server]\ngrpc_bind_address = \"127.0.0.1\"\ngrpc_port = {grpc_port}\nlog_level = \"debug\"\n\n[models]\nconfig_path = \"{}\"\n",
            repository.display()
        ),
    )?;

    let settings = Settings::from_sources(Some(&settings_path), Some(EnvMap::new()))?;
    let server = ServerHandle::new();
    let status = server.start(&settings.server, &settings.models);

    assert_eq!(status.code(), StatusCode::Ok, "{status}");
    assert_eq!(
        server.bound_addresses().map(|a| a.grpc.port()),
        Some(grpc_port)
    );
    Ok(())
}

#[test]
fn test_environment_can_break_a_valid_file() -> Result<()> {
    let dir = TempDir::new()?;
    let repository = common::write_repository(&dir)?;

    let mut env = EnvMap::new();
    env.insert(
        "MODEL_SERVER__MODELS__CONFIG_PATH".to_string(),
        repository.display().to_string(),
    );
    env.insert(
        "MODEL_SERVER__SERVER__GRPC_WORKERS".to_string(),
        "0".to_string(),
    );

    let settings = Settings::from_sources(None, Some(env))?;
    let server = ServerHandle::new();
    let status = server.start(&settings.server, &settings.models);

    assert_eq!(status.code(), StatusCode::InvalidWorkerCount);
    assert!(!server.is_live());
    Ok(())
}
