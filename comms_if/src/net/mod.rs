//! # Network Module
//!
//! This module provides the network parameters shared by the simulator server and its clients.
//! Commands are carried as JSON bodies over HTTP.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default port the simulator listens on.
pub const DEFAULT_SIM_PORT: u16 = 8523;

/// Default largest command body the simulator will buffer, in bytes.
pub const DEFAULT_MAX_COMMAND_BYTES: usize = 2 * 1024 * 1024;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network parameters, loaded from `net.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetParams {
    /// Address the simulator's HTTP server binds to, for instance `"127.0.0.1:8523"`
    pub sim_endpoint: String,

    /// Path that command documents are posted to
    pub command_path: String,

    /// Path that render snapshots are read from
    pub snapshot_path: String,

    /// Largest command body accepted, larger bodies are rejected but still answered with
    /// telemetry
    #[serde(default = "default_max_command_bytes")]
    pub max_command_bytes: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NetParamsError {
    #[error("Endpoint {0:?} is not a valid socket address: {1}")]
    InvalidEndpoint(String, std::net::AddrParseError),

    #[error("HTTP path {0:?} must start with '/'")]
    InvalidPath(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NetParams {
    /// Parse the simulator endpoint into a socket address, checking the paths on the way.
    pub fn sim_addr(&self) -> Result<SocketAddr, NetParamsError> {
        for path in [&self.command_path, &self.snapshot_path].iter() {
            if !path.starts_with('/') {
                return Err(NetParamsError::InvalidPath((*path).clone()));
            }
        }

        self.sim_endpoint
            .parse()
            .map_err(|e| NetParamsError::InvalidEndpoint(self.sim_endpoint.clone(), e))
    }
}

impl Default for NetParams {
    fn default() -> Self {
        Self {
            sim_endpoint: format!("127.0.0.1:{}", DEFAULT_SIM_PORT),
            command_path: String::from("/"),
            snapshot_path: String::from("/snapshot"),
            max_command_bytes: DEFAULT_MAX_COMMAND_BYTES,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_max_command_bytes() -> usize {
    DEFAULT_MAX_COMMAND_BYTES
}
