// ABOUTME: Observation sampling: live engine state folded into poll events.
// ABOUTME: Inspects containers, runs readiness probes, checks image presence.

use super::state::{ImageAvailability, ServiceObservation, ServiceState};
use crate::catalog::{Catalog, ServiceKind};
use crate::probe;
use crate::runtime::{ContainerOps, ContainerState, ExecOps, ImageOps};
use futures::future::join_all;
use std::collections::HashMap;

/// Status of a pull task the orchestrator started.
///
/// "Downloading" cannot be read back from the engine, so the pull fan-out
/// records its progress here and the image poll merges it with an engine-side
/// presence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullStatus {
    InFlight,
    Failed(String),
    Done,
}

/// Sample the container side of every service: inspect by name, probe the
/// running ones to derive READY.
///
/// Engine-call failures are normal negative observations (the container
/// simply is not there), never errors.
pub async fn observe_services<G>(gateway: &G, catalog: &Catalog) -> Vec<ServiceObservation>
where
    G: ContainerOps + ExecOps,
{
    let observations = catalog
        .services()
        .iter()
        .map(|def| async move {
            let name = def.kind.as_str();

            let info = match gateway.inspect_container(name).await {
                Ok(info) => info,
                Err(e) => {
                    tracing::debug!("inspect failed for {}: {}", name, e);
                    None
                }
            };

            let Some(info) = info else {
                return ServiceObservation::absent(def.kind);
            };

            let mut state = ServiceState::from(info.state);
            if info.state == ContainerState::Running
                && probe::is_ready(gateway, name, &def.probe).await
            {
                state = ServiceState::Ready;
            }

            let host_port = def
                .run
                .port
                .and_then(|p| info.host_ports.get(&p.container_port).copied());

            ServiceObservation {
                kind: def.kind,
                container_id: Some(info.id),
                state,
                status: info.status,
                host_port,
                image: ImageAvailability::NotAvailable, // owned by the image poll
            }
        })
        .collect::<Vec<_>>();

    join_all(observations).await
}

/// Sample image availability for every service.
///
/// A locally present image is DOWNLOADED no matter what the pull bookkeeping
/// says; otherwise the bookkeeping decides between DOWNLOADING, ERROR, and
/// NOT_AVAILABLE.
pub async fn observe_images<G>(
    gateway: &G,
    catalog: &Catalog,
    pulls: &HashMap<ServiceKind, PullStatus>,
) -> Vec<(ServiceKind, ImageAvailability)>
where
    G: ImageOps,
{
    let references = catalog.images();

    let local_tags: Vec<String> = match gateway.list_images(&references).await {
        Ok(images) => images.into_iter().flat_map(|i| i.repo_tags).collect(),
        Err(e) => {
            tracing::debug!("image list failed: {}", e);
            Vec::new()
        }
    };

    catalog
        .services()
        .iter()
        .map(|def| {
            let reference = def.image.to_string();
            let availability = if local_tags.iter().any(|t| t == &reference) {
                ImageAvailability::Downloaded
            } else {
                match pulls.get(&def.kind) {
                    Some(PullStatus::InFlight) => ImageAvailability::Downloading,
                    Some(PullStatus::Failed(_)) => ImageAvailability::Error,
                    // Done but not listed: the engine knows it under another
                    // tag spelling; trust the completed pull
                    Some(PullStatus::Done) => ImageAvailability::Downloaded,
                    None => ImageAvailability::NotAvailable,
                }
            };
            (def.kind, availability)
        })
        .collect()
}
