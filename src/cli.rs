use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default age below which `sweep` leaves an unreferenced upload alone.
pub const DEFAULT_SWEEP_GRACE_SECS: u64 = 300;

#[derive(Parser)]
#[command(name = "vitrine")]
#[command(author, version, about = "Image catalog with upload optimization and brand filtering")]
pub struct Cli {
    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults to `serve` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Host to bind to (overrides HOST and the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides PORT and the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Delete stored uploads that no catalog record references
    ///
    /// Files written within the grace window are left alone, since a running
    /// server may be about to save a record that points at them.
    Sweep {
        /// List orphaned files without deleting them
        #[arg(long)]
        dry_run: bool,

        /// Skip files modified less than this many seconds ago
        #[arg(long, value_name = "SECS", default_value_t = DEFAULT_SWEEP_GRACE_SECS)]
        grace_secs: u64,
    },

    /// Print the effective configuration and any warnings
    CheckConfig,

    /// Display version information
    Version,
}
