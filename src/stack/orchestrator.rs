// ABOUTME: The lifecycle orchestrator: owns the stack state, dispatches commands.
// ABOUTME: Commands set phase optimistically and fan out; polls reconcile.

use super::deploy;
use super::error::StackError;
use super::observe::{self, PullStatus};
use super::reducer::{Event, reduce};
use super::state::{self, Phase, StackState};
use crate::catalog::{Catalog, ServiceKind};
use crate::runtime::Gateway;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Default poll interval for the reconciliation loop.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// The service lifecycle orchestrator.
///
/// Owns a catalog and a gateway, and holds the one mutable `StackState`
/// behind a mutex; every transition goes through the reducer under that lock,
/// which makes the reducer the sole synchronization point. Commands mutate
/// the phase optimistically, spawn their engine fan-out, and return without
/// waiting on it - the poll loop observes the outcome.
pub struct Orchestrator<G> {
    gateway: Arc<G>,
    catalog: Arc<Catalog>,
    state: Mutex<StackState>,
    pulls: Arc<Mutex<HashMap<ServiceKind, PullStatus>>>,
}

impl<G> Orchestrator<G>
where
    G: Gateway + Send + Sync + 'static,
{
    pub fn new(gateway: Arc<G>, catalog: Catalog) -> Self {
        let state = StackState::new(&catalog);
        Self {
            gateway,
            catalog: Arc::new(catalog),
            state: Mutex::new(state),
            pulls: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// A copy of the current stack state.
    pub fn snapshot(&self) -> StackState {
        self.state.lock().clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    fn dispatch(&self, event: Event) {
        reduce(&mut self.state.lock(), event);
    }

    /// Toggle host-port exposure for the next `run`.
    ///
    /// Locked except while the stack is fully idle, so a half-stopped stack
    /// cannot end up with mixed port configurations.
    pub fn set_expose_ports(&self, expose: bool) -> Result<(), StackError> {
        let mut state = self.state.lock();
        if !state::can_toggle_ports(state.phase) {
            return Err(StackError::PortsLocked { phase: state.phase });
        }
        state.expose_ports = expose;
        Ok(())
    }

    /// Pull every service image. Legal only from NOT_ACTIVE.
    ///
    /// Completion is observed through image polling, not a callback: the
    /// pulls record their progress and the INSTALLING phase resolves when a
    /// poll finds every image local.
    pub fn setup(&self) -> Result<(), StackError> {
        {
            let state = self.state.lock();
            if !state::need_setup(state.phase) {
                return Err(StackError::IllegalCommand {
                    command: "setup",
                    phase: state.phase,
                });
            }
        }

        self.dispatch(Event::InstallRequested);

        for def in self.catalog.services() {
            let gateway = Arc::clone(&self.gateway);
            let pulls = Arc::clone(&self.pulls);
            let kind = def.kind;
            let image = def.image.clone();

            pulls.lock().insert(kind, PullStatus::InFlight);
            tokio::spawn(async move {
                tracing::info!("pulling {}", image);
                let status = match gateway.pull_image(&image).await {
                    Ok(()) => PullStatus::Done,
                    Err(e) => {
                        tracing::warn!("pull failed for {}: {}", image, e);
                        PullStatus::Failed(e.to_string())
                    }
                };
                pulls.lock().insert(kind, status);
            });
        }

        Ok(())
    }

    /// Deploy the stack in stage order. Legal only from INSTALLED.
    pub fn run(&self) -> Result<(), StackError> {
        let expose_ports = {
            let state = self.state.lock();
            if !state::can_run(state.phase) {
                return Err(StackError::IllegalCommand {
                    command: "run",
                    phase: state.phase,
                });
            }
            state.expose_ports
        };

        self.dispatch(Event::StartRequested);

        let gateway = Arc::clone(&self.gateway);
        let catalog = Arc::clone(&self.catalog);
        tokio::spawn(async move {
            deploy::deploy_stack(gateway.as_ref(), &catalog, expose_ports, None).await;
        });

        Ok(())
    }

    /// Stop and remove every container. Legal unless NOT_ACTIVE or already
    /// STOPPING.
    pub fn stop(&self) -> Result<(), StackError> {
        {
            let state = self.state.lock();
            if !state::can_stop(state.phase) {
                return Err(StackError::IllegalCommand {
                    command: "stop",
                    phase: state.phase,
                });
            }
        }

        self.dispatch(Event::StopRequested);

        let gateway = Arc::clone(&self.gateway);
        let catalog = Arc::clone(&self.catalog);
        tokio::spawn(async move {
            deploy::teardown_stack(gateway.as_ref(), &catalog).await;
        });

        Ok(())
    }

    /// One poll tick: sample image availability while INSTALLING, container
    /// state otherwise, and fold the result into the state.
    pub async fn refresh(&self) -> StackState {
        if self.phase() == Phase::Installing {
            self.refresh_images().await
        } else {
            self.refresh_containers().await
        }
    }

    /// Sample image availability and reduce.
    pub async fn refresh_images(&self) -> StackState {
        let pulls = self.pulls.lock().clone();
        let availability =
            observe::observe_images(self.gateway.as_ref(), &self.catalog, &pulls).await;
        self.dispatch(Event::ImagesRefreshed(availability));
        self.snapshot()
    }

    /// Sample container state (with readiness probes) and reduce.
    pub async fn refresh_containers(&self) -> StackState {
        let observations = observe::observe_services(self.gateway.as_ref(), &self.catalog).await;
        self.dispatch(Event::Refresh(observations));
        self.snapshot()
    }
}
