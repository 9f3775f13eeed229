// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Renders stack snapshots as a table or JSON for scripting.

use crate::stack::{ServiceState, StackState};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// JSON snapshots for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    /// Print a progress message (suppressed in JSON mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    pub fn warning(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            eprintln!("Warning: {message}");
        }
    }

    /// Print a full stack snapshot.
    pub fn snapshot(&self, state: &StackState) {
        match self.mode {
            OutputMode::Normal => println!("{}", render_table(state)),
            OutputMode::Json => match serde_json::to_string_pretty(state) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("Error: failed to serialize state: {e}"),
            },
        }
    }
}

/// Render the snapshot as an aligned service table with a phase header.
pub fn render_table(state: &StackState) -> String {
    let mut out = format!("Stack: {}\n", state.phase);

    let rows: Vec<[String; 4]> = state
        .services
        .iter()
        .map(|s| {
            [
                s.kind.to_string(),
                state_label(s.state).to_string(),
                s.status.clone(),
                s.host_port
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();

    let headers = ["NAME", "STATE", "STATUS", "PORT"];
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let format_row = |cells: &[String]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    out.push_str(&format_row(
        &headers.iter().map(|h| h.to_string()).collect::<Vec<_>>(),
    ));
    for row in &rows {
        out.push('\n');
        out.push_str(&format_row(row));
    }

    for error in &state.errors {
        out.push_str("\nerror: ");
        out.push_str(error);
    }

    out
}

fn state_label(state: ServiceState) -> &'static str {
    match state {
        ServiceState::NoContainer => "NO_CONTAINER",
        ServiceState::Created => "CREATED",
        ServiceState::Running => "RUNNING",
        ServiceState::Ready => "READY",
        ServiceState::Restarting => "RESTARTING",
        ServiceState::Removing => "REMOVING",
        ServiceState::Paused => "PAUSED",
        ServiceState::Exited => "EXITED",
        ServiceState::Dead => "DEAD",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Profile};

    #[test]
    fn table_lists_every_service_and_the_phase() {
        let catalog = Catalog::for_profile(Profile::Community72);
        let state = StackState::new(&catalog);

        let table = render_table(&state);
        assert!(table.contains("NOT_ACTIVE"));
        for def in catalog.services() {
            assert!(table.contains(def.kind.as_str()));
        }
        assert!(table.contains("NO_CONTAINER"));
    }

    #[test]
    fn table_appends_errors() {
        let catalog = Catalog::for_profile(Profile::Community72);
        let mut state = StackState::new(&catalog);
        state.errors.push("something fell over".to_string());

        assert!(render_table(&state).contains("something fell over"));
    }
}
