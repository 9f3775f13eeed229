// ABOUTME: Entry point for the stackdock CLI application.
// ABOUTME: Parses arguments, runs preflight, and drives the orchestrator.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use stackdock::catalog::{Catalog, Profile};
use stackdock::config::Config;
use stackdock::error::{Error, Result};
use stackdock::output::{Output, OutputMode};
use stackdock::runtime::{BollardGateway, RuntimeError, RuntimeInfo, detect_local};
use stackdock::stack::{Orchestrator, Phase, StackState, is_stopping};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// The stack is unhappy below this much engine memory (advisory, not fatal).
const RAM_ADVISORY_BYTES: u64 = 10 * 1024 * 1024 * 1024;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = env::current_dir()?;
    let config = Config::discover(&cwd)?;

    let profile = match &cli.profile {
        Some(name) => name
            .parse::<Profile>()
            .map_err(|e| Error::UnknownProfile(e.0))?,
        None => config.profile,
    };

    let mode = match &cli.command {
        Commands::Status { json: true } => OutputMode::Json,
        _ => OutputMode::Normal,
    };
    let output = Output::new(mode);

    let detected = detect_local(Some(&config.runtime)).map_err(RuntimeError::from)?;
    tracing::debug!(
        "using {} at {}",
        detected.runtime_type,
        detected.socket_path
    );
    let gateway = BollardGateway::connect(&detected).map_err(RuntimeError::from)?;

    preflight(&gateway, profile, &output).await?;

    let catalog = Catalog::for_profile(profile);
    let orchestrator = Orchestrator::new(Arc::new(gateway), catalog);

    // The state is memory-resident only: rebuild it from live engine
    // inspection before deciding whether a command is legal
    orchestrator.refresh_images().await;
    orchestrator.refresh_containers().await;

    match cli.command {
        Commands::Setup => setup(&orchestrator, &config, &output).await,
        Commands::Run { expose_ports } => {
            let expose = expose_ports || config.expose_ports;
            run_stack(&orchestrator, &config, expose, &output).await
        }
        Commands::Stop => stop(&orchestrator, &config, &output).await,
        Commands::Status { .. } => {
            output.snapshot(&orchestrator.snapshot());
            Ok(())
        }
        Commands::Watch => watch(&orchestrator, &config, &output).await,
    }
}

/// Check the engine is reachable and suitable before any lifecycle command.
async fn preflight(gateway: &BollardGateway, profile: Profile, output: &Output) -> Result<()> {
    gateway.ping().await.map_err(RuntimeError::from)?;
    let info = gateway.info().await.map_err(RuntimeError::from)?;

    if !profile
        .supported_architectures()
        .contains(&info.architecture.as_str())
    {
        return Err(Error::UnsupportedArchitecture {
            arch: info.architecture,
            profile: profile.to_string(),
            supported: profile.supported_architectures().join(", "),
        });
    }

    if info.mem_total < RAM_ADVISORY_BYTES {
        output.warning(&format!(
            "the engine has {:.1} GB of memory; the stack is happier with at least 10 GB",
            info.mem_total as f64 / (1024.0 * 1024.0 * 1024.0)
        ));
    }

    Ok(())
}

async fn setup(
    orchestrator: &Orchestrator<BollardGateway>,
    config: &Config,
    output: &Output,
) -> Result<()> {
    if orchestrator.phase() == Phase::Installed {
        output.progress("Images are already downloaded.");
        return Ok(());
    }

    orchestrator.setup()?;
    output.progress("Downloading images...");

    let state = poll_until(orchestrator, config.poll_interval, |s| {
        s.phase != Phase::Installing
    })
    .await;

    report_outcome(&state, Phase::Installed, "Images ready.", output);
    Ok(())
}

async fn run_stack(
    orchestrator: &Orchestrator<BollardGateway>,
    config: &Config,
    expose_ports: bool,
    output: &Output,
) -> Result<()> {
    orchestrator.set_expose_ports(expose_ports)?;
    orchestrator.run()?;
    output.progress("Starting the stack (this can take a few minutes)...");

    let state = poll_until(orchestrator, config.poll_interval, |s| {
        s.phase == Phase::UpAndRunning || s.phase == Phase::Error
    })
    .await;

    output.snapshot(&state);
    report_outcome(&state, Phase::UpAndRunning, "Stack is up.", output);
    Ok(())
}

async fn stop(
    orchestrator: &Orchestrator<BollardGateway>,
    config: &Config,
    output: &Output,
) -> Result<()> {
    orchestrator.stop()?;
    output.progress("Stopping the stack...");

    let state = poll_until(orchestrator, config.poll_interval, |s| !is_stopping(s.phase)).await;

    report_outcome(&state, Phase::Installed, "Stack stopped.", output);
    Ok(())
}

async fn watch(
    orchestrator: &Orchestrator<BollardGateway>,
    config: &Config,
    output: &Output,
) -> Result<()> {
    output.snapshot(&orchestrator.snapshot());

    // Nothing to observe once the stack is fully idle
    let state = poll_until(orchestrator, config.poll_interval, |s| {
        s.phase == Phase::NotActive
    })
    .await;

    output.snapshot(&state);
    Ok(())
}

/// Poll the orchestrator until `done` matches or the operator interrupts.
///
/// Each tick samples either images or containers depending on the phase; the
/// loop owns the cadence, the orchestrator owns the state.
async fn poll_until(
    orchestrator: &Orchestrator<BollardGateway>,
    interval: Duration,
    done: impl Fn(&StackState) -> bool,
) -> StackState {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_phase = orchestrator.phase();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted, leaving the stack as is");
                return orchestrator.snapshot();
            }
            _ = ticker.tick() => {
                let state = orchestrator.refresh().await;
                if state.phase != last_phase {
                    tracing::info!("phase: {} -> {}", last_phase, state.phase);
                    last_phase = state.phase;
                }
                if done(&state) {
                    return state;
                }
            }
        }
    }
}

fn report_outcome(state: &StackState, wanted: Phase, message: &str, output: &Output) {
    if state.phase == wanted {
        output.progress(message);
    } else {
        output.warning(&format!("stack ended up {}", state.phase));
        for error in &state.errors {
            output.warning(error);
        }
    }
}
