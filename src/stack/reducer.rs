// ABOUTME: The pure reducer: commands and poll results folded into StackState.
// ABOUTME: Phase guards are an ordered list; the first matching guard wins.

use super::state::{ImageAvailability, Phase, ServiceObservation, ServiceState, StackState};
use crate::catalog::ServiceKind;
use chrono::Utc;

/// Everything that can change the stack state.
///
/// Commands mutate the phase optimistically before their side effects land;
/// `Refresh` and `ImagesRefreshed` carry what a poll tick observed. The
/// reducer performs no I/O.
#[derive(Debug, Clone)]
pub enum Event {
    /// A container-state poll completed.
    Refresh(Vec<ServiceObservation>),
    /// An image-availability poll completed.
    ImagesRefreshed(Vec<(ServiceKind, ImageAvailability)>),
    /// The operator requested `setup`.
    InstallRequested,
    /// The operator requested `run`.
    StartRequested,
    /// The operator requested `stop`.
    StopRequested,
}

/// Apply an event to the state.
///
/// This is the single synchronization point: callers serialize access through
/// one lock, and every transition goes through here.
pub fn reduce(state: &mut StackState, event: Event) {
    // Errors are a snapshot of problems noticed this pass, not a log
    state.errors.clear();

    match event {
        Event::Refresh(observations) => {
            for observed in observations {
                let entry = state.service_mut(observed.kind);
                entry.container_id = observed.container_id;
                entry.state = observed.state;
                entry.status = observed.status;
                entry.host_port = observed.host_port;
                // Image availability is owned by the image poll; a container
                // poll says nothing about it
            }
            state.refreshed_at = Some(Utc::now());
            state.phase = next_phase(state.phase, &state.services, &mut state.errors);
        }
        Event::ImagesRefreshed(availability) => {
            for (kind, image) in availability {
                state.service_mut(kind).image = image;
            }
            state.refreshed_at = Some(Utc::now());
            state.phase = next_phase(state.phase, &state.services, &mut state.errors);
        }
        Event::InstallRequested => {
            state.phase = Phase::Installing;
        }
        Event::StartRequested => {
            state.phase = Phase::Starting;
        }
        Event::StopRequested => {
            state.phase = Phase::Stopping;
        }
    }
}

/// Compute the next phase from the observation snapshot and the previous
/// phase. Guards are evaluated in order; the first match wins, so the
/// ordering here is behavior, not style.
fn next_phase(prev: Phase, services: &[ServiceObservation], errors: &mut Vec<String>) -> Phase {
    use ServiceState::*;

    // 1. Every service satisfied its health contract
    if services.iter().all(|s| s.state == Ready) {
        return Phase::UpAndRunning;
    }

    // 2./3. A teardown in progress holds until every container is gone, then
    // lands on Installed (images remain local), never back on NotActive
    if prev == Phase::Stopping {
        if services.iter().all(|s| s.state == NoContainer) {
            return Phase::Installed;
        }
        return Phase::Stopping;
    }

    // 4. Anything running but not everything ready: still starting
    if services.iter().any(|s| s.state == Running) {
        return Phase::Starting;
    }

    // 5. Everything exited: leftover containers from a previous run
    if services.iter().all(|s| s.state == Exited) {
        errors.push(
            "containers were not properly removed - stop to remove them".to_string(),
        );
        return Phase::Error;
    }

    // 6. Any dead or exited service while nothing runs
    if services.iter().any(|s| matches!(s.state, Dead | Exited)) {
        for s in services.iter().filter(|s| matches!(s.state, Dead | Exited)) {
            errors.push(format!(
                "service {} is {} - stop to clean up",
                s.kind,
                if s.state == Dead { "dead" } else { "exited" }
            ));
        }
        return Phase::Error;
    }

    // 7./8. No containers at all: installed or idle, depending on images
    if services.iter().all(|s| s.state == NoContainer) {
        if services
            .iter()
            .all(|s| s.image == ImageAvailability::Downloaded)
        {
            return Phase::Installed;
        }
        if prev == Phase::Installing {
            // A failed pull sends setup back to idle so it can be retried;
            // otherwise downloads are still in flight
            if services
                .iter()
                .any(|s| s.image == ImageAvailability::Error)
            {
                errors.push("image download failed - run setup again to retry".to_string());
                return Phase::NotActive;
            }
            return Phase::Installing;
        }
        return Phase::NotActive;
    }

    // 9. Transitional states only (created, restarting, removing): hold
    prev
}
