// ABOUTME: Error types for orchestrator commands.
// ABOUTME: Illegal-command rejections; fan-out failures never surface here.

use super::state::Phase;

/// Errors the orchestrator's command surface can return.
///
/// These cover operator misuse only. Engine failures during a command's
/// fan-out are logged and observed through the next poll tick, never returned
/// from the command itself.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    #[error("{command} is not allowed while the stack is {phase}")]
    IllegalCommand {
        command: &'static str,
        phase: Phase,
    },

    #[error("port exposure can only be changed while the stack is idle (currently {phase})")]
    PortsLocked { phase: Phase },
}
