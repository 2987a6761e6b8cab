//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "ergo", version, about = "Rowing ergometer monitor CLI")]
pub struct Cli {
    /// Path to a settings TOML file. Missing file falls back to defaults.
    #[arg(long, value_name = "FILE", default_value = "etc/ergo_settings.toml")]
    pub settings: PathBuf,

    /// Emit JSONL instead of human-readable text on stdout (logs stay on stderr).
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace).
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute.
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a simulated rowing session through the pipeline and print metrics.
    Simulate {
        /// Number of impulses accepted per drive phase.
        #[arg(long, default_value_t = 10)]
        drive_edges: u32,
        /// Number of impulses accepted per recovery phase.
        #[arg(long, default_value_t = 10)]
        recovery_edges: u32,
        /// Number of drive+recovery cycles to run (0 = until Ctrl-C).
        #[arg(long, default_value_t = 20)]
        cycles: u32,
        /// Emit one JSONL snapshot line per stroke instead of a final summary.
        #[arg(long, action = ArgAction::SetTrue)]
        per_stroke: bool,
    },
    /// Validate settings and run a short simulated burst to confirm the
    /// pipeline builds and produces sane output.
    SelfCheck,
}
