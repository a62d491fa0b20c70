//! Shared test utilities for integration tests.
//!
//! Provides a started server on loopback ports with a temporary model
//! repository holding one available and one unavailable model.

#![allow(dead_code)]

use anyhow::{Result, bail};
use model_server::ServerHandle;
use model_server::settings::{ModelRepositorySettings, ServerSettings};
use model_server::transport::BoundAddresses;
use std::fs;
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use tempfile::TempDir;

/// Model whose base path exists.
pub const AVAILABLE_MODEL: &str = "resnet";
/// Model whose base path is missing.
pub const UNAVAILABLE_MODEL: &str = "bert";

/// A live server plus the files backing it.
pub struct TestServer {
    /// Temporary directory holding the repository.
    pub temp_dir: TempDir,
    /// Handle owning the server.
    pub server: ServerHandle,
    /// Addresses the transports bound.
    pub addresses: BoundAddresses,
}

impl TestServer {
    /// Starts a server with REST enabled and metrics off.
    pub fn start() -> Result<Self> {
        Self::start_with(|settings| settings)
    }

    /// Starts a server after letting the caller adjust loopback settings.
    pub fn start_with(configure: impl FnOnce(ServerSettings) -> ServerSettings) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let config_path = write_repository(&temp_dir)?;

        let settings = configure(
            ServerSettings::new()
                .with_grpc_bind_address("127.0.0.1")
                .with_grpc_port(free_port()?)
                .with_rest_bind_address("127.0.0.1")
                .with_rest_port(free_port()?),
        );
        let models = ModelRepositorySettings::new().with_config_path(config_path);

        let server = ServerHandle::new();
        let status = server.start(&settings, &models);
        if !status.is_ok() {
            bail!("server failed to start: {status}");
        }
        let Some(addresses) = server.bound_addresses() else {
            bail!("live server reported no addresses");
        };

        Ok(Self {
            temp_dir,
            server,
            addresses,
        })
    }

    /// Base URL of the REST transport.
    pub fn rest_url(&self, path: &str) -> String {
        let addr: SocketAddr = self.addresses.rest.expect("REST is enabled");
        format!("http://{addr}{path}")
    }

    /// Endpoint of the gRPC transport.
    pub fn grpc_endpoint(&self) -> String {
        format!("http://{}", self.addresses.grpc)
    }
}

/// Writes a descriptor with one available and one unavailable model.
pub fn write_repository(dir: &TempDir) -> Result<PathBuf> {
    fs::create_dir_all(dir.path().join("models").join(AVAILABLE_MODEL).join("1"))?;
    let path = dir.path().join("config.yml");
    fs::write(
        &path,
        format!(
            "model_config_list:\n  - config:\n      name: {AVAILABLE_MODEL}\n      base_path: models/{AVAILABLE_MODEL}\n  - config:\n      name: {UNAVAILABLE_MODEL}\n      base_path: models/{UNAVAILABLE_MODEL}\n"
        ),
    )?;
    Ok(path)
}

/// Returns a loopback port that was free a moment ago.
pub fn free_port() -> Result<u16> {
    Ok(TcpListener::bind("127.0.0.1:0")?.local_addr()?.port())
}
