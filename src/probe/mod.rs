// ABOUTME: Readiness probing policies and in-container probe execution.
// ABOUTME: Distinguishes "process running" from "service actually serving".

use crate::runtime::{ExecConfig, ExecOps};
use std::time::Duration;

/// How long a single probe may take before it counts as not ready.
///
/// Probes run inside the poll tick, so they must stay cheap; the curl probes
/// also carry their own --max-time 1.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(1500);

/// Readiness policy for one service.
///
/// Probes execute inside the service's own container, so they work whether or
/// not host ports are exposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbePolicy {
    /// Run the command and compare its stdout against "200".
    HttpStatus { command: Vec<String> },
    /// Run the command; ready iff it exits successfully. Used for the
    /// database, where connect/auth success is the signal and the query's
    /// result is irrelevant.
    QuerySuccess { command: Vec<String> },
    /// No probe: the service counts as ready as soon as it is running.
    AlwaysReady,
}

impl ProbePolicy {
    /// HTTP status probe from a shell command line.
    pub fn http(shell: &str, command_line: &str) -> Self {
        ProbePolicy::HttpStatus {
            command: shell_command(shell, command_line),
        }
    }

    /// Query probe from an argv-style command.
    pub fn query(argv: &[&str]) -> Self {
        ProbePolicy::QuerySuccess {
            command: argv.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn shell_command(shell: &str, command_line: &str) -> Vec<String> {
    vec![
        shell.to_string(),
        "-c".to_string(),
        command_line.to_string(),
    ]
}

/// Run the readiness probe for a service container.
///
/// Every failure mode - exec error, non-zero exit, timeout - reads as "not
/// ready"; probing never produces a system error.
pub async fn is_ready<G: ExecOps>(gateway: &G, container: &str, policy: &ProbePolicy) -> bool {
    let command = match policy {
        ProbePolicy::AlwaysReady => return true,
        ProbePolicy::HttpStatus { command } | ProbePolicy::QuerySuccess { command } => command,
    };

    let config = ExecConfig {
        cmd: command.clone(),
        ..Default::default()
    };

    let result = match tokio::time::timeout(PROBE_TIMEOUT, gateway.exec(container, &config)).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            tracing::debug!("probe exec failed for {}: {}", container, e);
            return false;
        }
        Err(_elapsed) => {
            tracing::debug!("probe timed out for {}", container);
            return false;
        }
    };

    interpret(policy, &result.stdout_text(), result.exit_code)
}

/// Interpret probe output according to the policy.
fn interpret(policy: &ProbePolicy, stdout: &str, exit_code: i64) -> bool {
    match policy {
        ProbePolicy::HttpStatus { .. } => stdout == "200",
        ProbePolicy::QuerySuccess { .. } => exit_code == 0,
        ProbePolicy::AlwaysReady => true,
    }
}
