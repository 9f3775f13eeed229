// ABOUTME: The lifecycle orchestrator: state machine, reducer, observation, fan-out.
// ABOUTME: Exports StackState, Phase, Event, Orchestrator, and the predicates.

mod deploy;
mod error;
mod observe;
mod orchestrator;
mod reducer;
mod state;
#[cfg(test)]
pub(crate) mod testing;

pub use deploy::{STOP_TIMEOUT, deploy_stack, teardown_stack};
pub use error::StackError;
pub use observe::{PullStatus, observe_images, observe_services};
pub use orchestrator::{Orchestrator, POLL_INTERVAL};
pub use reducer::{Event, reduce};
pub use state::{
    ImageAvailability, Phase, ServiceObservation, ServiceState, StackState, can_run, can_stop,
    can_toggle_ports, is_error, is_ready, is_running, is_stopping, need_setup,
};
