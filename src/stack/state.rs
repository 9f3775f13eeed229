// ABOUTME: Stack state model: phase machine position, per-service observations.
// ABOUTME: Pure data plus the phase predicates the command layer queries.

use crate::catalog::{Catalog, ServiceKind};
use crate::types::ContainerId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The orchestrator's aggregate state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    NotActive,
    Installing,
    Installed,
    Starting,
    UpAndRunning,
    Stopping,
    Error,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::NotActive => "NOT_ACTIVE",
            Phase::Installing => "INSTALLING",
            Phase::Installed => "INSTALLED",
            Phase::Starting => "STARTING",
            Phase::UpAndRunning => "UP_AND_RUNNING",
            Phase::Stopping => "STOPPING",
            Phase::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Phase predicates for the command layer. Commands are rejected up front when
// their predicate is false; the orchestrator never attempts an illegal one.

/// `setup` is legal: nothing installed or running yet.
pub fn need_setup(phase: Phase) -> bool {
    phase == Phase::NotActive
}

/// `run` is legal: images are local, no containers yet.
pub fn can_run(phase: Phase) -> bool {
    phase == Phase::Installed
}

/// `stop` is legal: there is something to tear down and no teardown underway.
pub fn can_stop(phase: Phase) -> bool {
    phase != Phase::NotActive && phase != Phase::Stopping
}

pub fn is_running(phase: Phase) -> bool {
    phase == Phase::Starting || phase == Phase::UpAndRunning
}

pub fn is_ready(phase: Phase) -> bool {
    phase == Phase::UpAndRunning
}

pub fn is_stopping(phase: Phase) -> bool {
    phase == Phase::Stopping
}

pub fn is_error(phase: Phase) -> bool {
    phase == Phase::Error
}

/// The expose-ports toggle may only change while the stack is fully idle.
pub fn can_toggle_ports(phase: Phase) -> bool {
    matches!(phase, Phase::NotActive | Phase::Installed)
}

/// Per-service container state as the orchestrator sees it.
///
/// Engine states plus two synthetic values: `NoContainer` (nothing with the
/// service's name exists) and `Ready` (running and the readiness probe
/// passed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceState {
    NoContainer,
    Created,
    Running,
    Ready,
    Restarting,
    Removing,
    Paused,
    Exited,
    Dead,
}

impl From<crate::runtime::ContainerState> for ServiceState {
    fn from(state: crate::runtime::ContainerState) -> Self {
        use crate::runtime::ContainerState as Engine;
        match state {
            Engine::Created => ServiceState::Created,
            Engine::Running => ServiceState::Running,
            Engine::Paused => ServiceState::Paused,
            Engine::Restarting => ServiceState::Restarting,
            Engine::Removing => ServiceState::Removing,
            Engine::Exited => ServiceState::Exited,
            Engine::Dead => ServiceState::Dead,
        }
    }
}

/// Local availability of a service's image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageAvailability {
    NotAvailable,
    Downloading,
    Downloaded,
    Error,
}

/// What one poll tick learned about a service.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceObservation {
    pub kind: ServiceKind,
    pub container_id: Option<ContainerId>,
    pub state: ServiceState,
    /// Human status line from the engine, e.g. "Up 2 minutes".
    pub status: String,
    /// Bound host port, when the service publishes one and ports are exposed.
    pub host_port: Option<u16>,
    pub image: ImageAvailability,
}

impl ServiceObservation {
    /// The initial observation: no container, image availability unknown.
    pub fn absent(kind: ServiceKind) -> Self {
        Self {
            kind,
            container_id: None,
            state: ServiceState::NoContainer,
            status: String::new(),
            host_port: None,
            image: ImageAvailability::NotAvailable,
        }
    }
}

/// The orchestrator's owned aggregate state.
///
/// `services` always holds exactly one entry per catalog service, in catalog
/// order; entries are mutated in place, never added or removed. `errors` is a
/// snapshot of problems noticed this tick, cleared at the start of every
/// reduction pass.
#[derive(Debug, Clone, Serialize)]
pub struct StackState {
    pub phase: Phase,
    pub services: Vec<ServiceObservation>,
    pub errors: Vec<String>,
    pub expose_ports: bool,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl StackState {
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            phase: Phase::NotActive,
            services: catalog
                .services()
                .iter()
                .map(|s| ServiceObservation::absent(s.kind))
                .collect(),
            errors: Vec::new(),
            expose_ports: false,
            refreshed_at: None,
        }
    }

    pub fn service(&self, kind: ServiceKind) -> &ServiceObservation {
        self.services
            .iter()
            .find(|s| s.kind == kind)
            .expect("state holds one observation per catalog service")
    }

    pub(crate) fn service_mut(&mut self, kind: ServiceKind) -> &mut ServiceObservation {
        self.services
            .iter_mut()
            .find(|s| s.kind == kind)
            .expect("state holds one observation per catalog service")
    }
}
