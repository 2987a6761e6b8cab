#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! CLI entrypoint for the rowing-ergometer monitor.
//!
//! Responsibilities:
//! - Load and validate settings TOML (falling back to defaults when absent)
//! - Initialize tracing and manage log sinks
//! - Run a simulated rowing session through [`ergo_core::pipeline::Pipeline`]
//! - Offer `--json` mode emitting stable JSONL lines to stdout (logs to stderr)
//! - Map configuration errors to stable exit codes

mod cli;
mod error_fmt;
mod tracing_setup;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use serde_json::json;

use cli::{Cli, Commands, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use ergo_core::pipeline::Pipeline;
use ergo_host::{LoggingBleNotifier, SimulatedSensor};
use ergo_traits::{BleNotifier, EdgeSource};
use tracing_setup::init_tracing;

fn main() -> eyre::Result<()> {
    let _ = color_eyre::install();

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nreceived shutdown signal, stopping gracefully...");
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        eprintln!("warning: failed to install signal handler: {e}");
    }

    if let Err(e) = real_main(shutdown) {
        let json_mode = *JSON_MODE.get().unwrap_or(&false);
        let code = exit_code_for_error(&e);
        if json_mode {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(code);
    }
    Ok(())
}

fn load_config(path: &std::path::Path) -> eyre::Result<ergo_core::config::Config> {
    match std::fs::read_to_string(path) {
        Ok(text) => ergo_config::load_toml(&text).wrap_err_with(|| format!("load {path:?}")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(ergo_core::config::Config::default())
        }
        Err(e) => Err(e).wrap_err_with(|| format!("read {path:?}")),
    }
}

fn real_main(shutdown: Arc<AtomicBool>) -> eyre::Result<()> {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let config = load_config(&cli.settings)?;
    init_tracing(cli.json, &cli.log_level, None, None);

    match cli.cmd {
        Commands::SelfCheck => {
            tracing::info!("self-check starting");
            let mut pipeline = Pipeline::new(config)?;
            let mut sensor = SimulatedSensor::new(10, 10, 2);
            while let Some(t) = sensor.next_edge() {
                pipeline.on_edge(t);
                pipeline.tick(t);
            }
            let ok = pipeline.rev_count() > 0;
            if cli.json {
                println!(
                    "{}",
                    json!({ "ok": ok, "rev_count": pipeline.rev_count(), "stroke_count": pipeline.stroke_count() })
                );
            } else if ok {
                println!(
                    "self-check OK: {} revolutions, {} strokes over a short simulated burst",
                    pipeline.rev_count(),
                    pipeline.stroke_count()
                );
            } else {
                eyre::bail!("self-check failed: no revolutions registered");
            }
            Ok(())
        }
        Commands::Simulate {
            drive_edges,
            recovery_edges,
            cycles,
            per_stroke,
        } => {
            tracing::info!(drive_edges, recovery_edges, cycles, "simulate starting");
            let mut pipeline = Pipeline::new(config)?;
            let mut sensor = SimulatedSensor::new(drive_edges, recovery_edges, cycles);
            let mut notifier = LoggingBleNotifier::new();
            let mut printed_stroke_count = 0u16;

            while let Some(t) = sensor.next_edge() {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                pipeline.on_edge(t);
                pipeline.tick(t);
                let snapshot = pipeline.snapshot();
                notifier.notify(&snapshot);

                if per_stroke && pipeline.stroke_count() != printed_stroke_count {
                    printed_stroke_count = pipeline.stroke_count();
                    if let Some(event) = pipeline.last_event() {
                        if cli.json {
                            println!(
                                "{}",
                                json!({
                                    "drive_duration_s": event.drive_duration_s,
                                    "recovery_duration_s": event.recovery_duration_s,
                                    "avg_power_w": event.avg_power_w,
                                    "drag_factor": event.drag_factor,
                                    "forced": event.forced,
                                })
                            );
                        } else {
                            println!(
                                "stroke: drive={:.2}s recovery={:.2}s power={:.1}W drag={:.1}{}",
                                event.drive_duration_s,
                                event.recovery_duration_s,
                                event.avg_power_w,
                                event.drag_factor,
                                if event.forced { " (forced)" } else { "" }
                            );
                        }
                    }
                }
            }

            if !per_stroke {
                let snapshot = pipeline.snapshot();
                if cli.json {
                    println!(
                        "{}",
                        json!({
                            "distance_m": snapshot.distance_m,
                            "rev_count": snapshot.rev_count,
                            "stroke_count": snapshot.stroke_count,
                            "avg_stroke_power_w": snapshot.avg_stroke_power_w,
                            "drag_coefficient": snapshot.drag_coefficient,
                        })
                    );
                } else {
                    println!(
                        "distance: {:.1}m  revolutions: {}  strokes: {}  avg power: {:.0}W",
                        snapshot.distance_m,
                        snapshot.rev_count,
                        snapshot.stroke_count,
                        snapshot.avg_stroke_power_w
                    );
                }
            }
            Ok(())
        }
    }
}
