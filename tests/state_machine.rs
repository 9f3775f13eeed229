// ABOUTME: Scenario tests for the stack state machine through the public API.
// ABOUTME: Exercises the reducer the way the poll loop drives it.

use proptest::prelude::*;
use stackdock::catalog::{Catalog, Profile, ServiceKind};
use stackdock::stack::{
    Event, ImageAvailability, Phase, ServiceObservation, ServiceState, StackState, reduce,
};

fn new_state() -> StackState {
    StackState::new(&Catalog::for_profile(Profile::Community72))
}

fn kinds(state: &StackState) -> Vec<ServiceKind> {
    state.services.iter().map(|s| s.kind).collect()
}

fn observation(kind: ServiceKind, state: ServiceState) -> ServiceObservation {
    ServiceObservation {
        kind,
        container_id: None,
        state,
        status: String::new(),
        host_port: None,
        image: ImageAvailability::NotAvailable,
    }
}

fn refresh(state: &mut StackState, f: impl Fn(ServiceKind) -> ServiceState) {
    let observations = kinds(state).into_iter().map(|k| observation(k, f(k))).collect();
    reduce(state, Event::Refresh(observations));
}

fn all_images_downloaded(state: &mut StackState) {
    let availability = kinds(state)
        .into_iter()
        .map(|k| (k, ImageAvailability::Downloaded))
        .collect();
    reduce(state, Event::ImagesRefreshed(availability));
}

// =============================================================================
// Lifecycle Scenarios
// =============================================================================

/// Test: the full happy path, from idle through installed and starting to up.
#[test]
fn startup_scenario_reaches_up_and_running() {
    let mut state = new_state();

    // All NO_CONTAINER, images DOWNLOADED: the stack is installed
    all_images_downloaded(&mut state);
    assert_eq!(state.phase, Phase::Installed);

    reduce(&mut state, Event::StartRequested);
    assert_eq!(state.phase, Phase::Starting);

    // The engine reports only the database so far
    refresh(&mut state, |k| {
        if k == ServiceKind::Db {
            ServiceState::Running
        } else {
            ServiceState::NoContainer
        }
    });
    assert_eq!(state.phase, Phase::Starting);

    // Everything running, every probe green
    refresh(&mut state, |_| ServiceState::Ready);
    assert_eq!(state.phase, Phase::UpAndRunning);
}

/// Test: a service that exits during startup flips the stack to ERROR with a
/// diagnostic, while the rest is still NO_CONTAINER.
#[test]
fn exited_service_during_startup_is_error() {
    let mut state = new_state();
    all_images_downloaded(&mut state);
    reduce(&mut state, Event::StartRequested);

    refresh(&mut state, |k| {
        if k == ServiceKind::Db {
            ServiceState::Exited
        } else {
            ServiceState::NoContainer
        }
    });

    assert_eq!(state.phase, Phase::Error);
    assert!(!state.errors.is_empty());
}

/// Test: setup resolves to INSTALLED through image polling alone, without
/// ever touching run.
#[test]
fn setup_scenario_installs_without_run() {
    let mut state = new_state();

    reduce(&mut state, Event::InstallRequested);
    assert_eq!(state.phase, Phase::Installing);

    // First poll: nothing local yet
    let availability = kinds(&state)
        .into_iter()
        .map(|k| (k, ImageAvailability::Downloading))
        .collect();
    reduce(&mut state, Event::ImagesRefreshed(availability));
    assert_eq!(state.phase, Phase::Installing);

    all_images_downloaded(&mut state);
    assert_eq!(state.phase, Phase::Installed);
}

/// Test: after a stop, the stack lands on INSTALLED, never back on
/// NOT_ACTIVE - the images are still local.
#[test]
fn stop_lands_on_installed() {
    let mut state = new_state();
    all_images_downloaded(&mut state);
    reduce(&mut state, Event::StartRequested);
    refresh(&mut state, |_| ServiceState::Ready);
    assert_eq!(state.phase, Phase::UpAndRunning);

    reduce(&mut state, Event::StopRequested);

    // Containers drain one by one; the phase holds
    refresh(&mut state, |k| {
        if k == ServiceKind::Proxy {
            ServiceState::NoContainer
        } else {
            ServiceState::Exited
        }
    });
    assert_eq!(state.phase, Phase::Stopping);

    refresh(&mut state, |_| ServiceState::NoContainer);
    assert_eq!(state.phase, Phase::Installed);
}

/// Test: leftover exited containers (a previous run that was never stopped)
/// produce the removal hint.
#[test]
fn leftover_containers_produce_removal_hint() {
    let mut state = new_state();

    refresh(&mut state, |_| ServiceState::Exited);

    assert_eq!(state.phase, Phase::Error);
    assert!(state.errors.iter().any(|e| e.contains("stop")));
}

// =============================================================================
// Reducer Invariants
// =============================================================================

fn service_state_strategy() -> impl Strategy<Value = ServiceState> {
    prop_oneof![
        Just(ServiceState::NoContainer),
        Just(ServiceState::Created),
        Just(ServiceState::Running),
        Just(ServiceState::Ready),
        Just(ServiceState::Restarting),
        Just(ServiceState::Removing),
        Just(ServiceState::Paused),
        Just(ServiceState::Exited),
        Just(ServiceState::Dead),
    ]
}

proptest! {
    /// From STARTING, the stack is UP_AND_RUNNING iff every service is READY.
    #[test]
    fn up_and_running_iff_all_ready(states in proptest::collection::vec(service_state_strategy(), 7)) {
        let mut state = new_state();
        all_images_downloaded(&mut state);
        reduce(&mut state, Event::StartRequested);

        let observations = kinds(&state)
            .into_iter()
            .zip(states.iter())
            .map(|(k, s)| observation(k, *s))
            .collect();
        reduce(&mut state, Event::Refresh(observations));

        let all_ready = states.iter().all(|s| *s == ServiceState::Ready);
        prop_assert_eq!(state.phase == Phase::UpAndRunning, all_ready);
    }

    /// From STOPPING, an all-gone snapshot always lands on INSTALLED.
    #[test]
    fn stopping_with_everything_gone_is_installed(states in proptest::collection::vec(service_state_strategy(), 7)) {
        let mut state = new_state();
        reduce(&mut state, Event::StopRequested);

        // Whatever the intermediate snapshot was...
        let observations = kinds(&state)
            .into_iter()
            .zip(states.iter())
            .map(|(k, s)| observation(k, *s))
            .collect();
        reduce(&mut state, Event::Refresh(observations));

        // ...once everything is gone, the stack is installed
        if state.phase == Phase::Stopping {
            let gone = kinds(&state)
                .into_iter()
                .map(|k| observation(k, ServiceState::NoContainer))
                .collect();
            reduce(&mut state, Event::Refresh(gone));
            prop_assert_eq!(state.phase, Phase::Installed);
        }
    }

    /// The reducer never adds or removes service entries.
    #[test]
    fn service_set_is_fixed(states in proptest::collection::vec(service_state_strategy(), 7)) {
        let mut state = new_state();
        let before = kinds(&state);

        let observations = before
            .iter()
            .zip(states.iter())
            .map(|(k, s)| observation(*k, *s))
            .collect();
        reduce(&mut state, Event::Refresh(observations));

        prop_assert_eq!(kinds(&state), before);
    }
}
