// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stackdock")]
#[command(about = "Deploy and manage the content-management container stack")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Deployment profile (overrides the config file)
    #[arg(long, global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download every service image
    Setup,

    /// Deploy the stack in start order
    Run {
        /// Publish host ports for database, broker, search, and proxy
        #[arg(long)]
        expose_ports: bool,
    },

    /// Stop and remove every stack container
    Stop,

    /// Show the current stack state
    Status {
        /// Emit the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Poll and print the stack state until interrupted
    Watch,
}
