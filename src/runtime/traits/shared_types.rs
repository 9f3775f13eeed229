// ABOUTME: Shared types used across gateway trait definitions.
// ABOUTME: ContainerConfig, ContainerInfo, ExecConfig, EngineMetadata, etc.

use crate::types::{ContainerId, ImageRef};
use serde::Serialize;
use std::collections::HashMap;

/// Configuration for creating a container.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Name for the container (doubles as its DNS name on the stack network).
    pub name: String,
    /// Image to run.
    pub image: ImageRef,
    /// Environment variables, in catalog order.
    pub env: Vec<(String, String)>,
    /// Labels to apply.
    pub labels: HashMap<String, String>,
    /// Port publications (empty unless host ports are exposed).
    pub ports: Vec<PortMapping>,
    /// Memory limit in bytes.
    pub memory_bytes: Option<u64>,
    /// Command to run (overrides image CMD).
    pub command: Option<Vec<String>>,
    /// Network to attach to.
    pub network: Option<String>,
}

/// A host-to-container port publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub host_port: u16,
    pub container_port: u16,
}

/// Engine-reported container state.
///
/// These are the states the engine itself can report; the orchestrator layers
/// its own synthetic states (no container, probe-ready) on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

/// Information about an inspected container.
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    /// Container ID.
    pub id: ContainerId,
    /// Container name (leading slash stripped).
    pub name: String,
    /// Image the container was created from.
    pub image: String,
    /// Current engine state.
    pub state: ContainerState,
    /// Human status line, e.g. "Up 2 minutes".
    pub status: String,
    /// Bound host ports, keyed by container port.
    pub host_ports: HashMap<u16, u16>,
}

/// Filters for listing containers.
#[derive(Debug, Clone, Default)]
pub struct ContainerFilters {
    /// Filter by label (key=value).
    pub labels: HashMap<String, String>,
    /// Filter by name (partial match).
    pub name: Option<String>,
    /// Include stopped containers.
    pub all: bool,
}

/// Summary information about a listed container.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub state: String,
    pub status: String,
}

/// Summary information about a local image.
#[derive(Debug, Clone)]
pub struct ImageSummary {
    /// Repo tags the image is known under.
    pub repo_tags: Vec<String>,
}

/// Configuration for creating a network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub name: String,
    /// Network driver (bridge unless stated otherwise).
    pub driver: Option<String>,
}

/// Engine metadata used by the CLI preflight.
#[derive(Debug, Clone)]
pub struct EngineMetadata {
    /// Engine name, e.g. "Docker".
    pub name: String,
    /// Engine version.
    pub version: String,
    /// Total memory available to the engine, in bytes.
    pub mem_total: u64,
    /// CPU architecture the engine runs on, e.g. "x86_64".
    pub architecture: String,
}

/// Exec configuration for running probe commands in containers.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    /// Command and arguments to run.
    pub cmd: Vec<String>,
    /// Attach stdout.
    pub attach_stdout: bool,
    /// Attach stderr.
    pub attach_stderr: bool,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            cmd: Vec::new(),
            attach_stdout: true,
            attach_stderr: true,
        }
    }
}

/// Result of an exec operation.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Exit code.
    pub exit_code: i64,
    /// Standard output.
    pub stdout: Vec<u8>,
    /// Standard error.
    pub stderr: Vec<u8>,
}

impl ExecResult {
    /// Stdout as trimmed UTF-8 text, lossy on invalid bytes.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }
}
