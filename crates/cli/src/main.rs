//! depsync command-line entry point.
//!
//! Parses arguments, installs tracing with the event layer, spawns the
//! renderer for the chosen output mode, runs the command and maps the
//! outcome to a process exit code.

mod cli;
mod commands;
mod tracing;

use crate::cli::{CliError, Commands, EXIT_FAILURE, EXIT_OK};
use crate::tracing::{TracingConfig, TracingFormat, init_tracing};
use depsync_events::{CliRenderer, EventBus, JsonRenderer, emit_shutdown};
use depsync_sync::SyncReport;
use std::time::Duration;

/// How long the renderer may take to drain after the shutdown marker.
const RENDERER_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() {
    // Tracing may be unusable while panicking.
    #[allow(clippy::print_stderr)]
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();
    let exit_code = run(cli).await;
    std::process::exit(exit_code);
}

async fn run(cli: cli::Cli) -> i32 {
    let args = match cli.command {
        Commands::Version => {
            commands::version::execute();
            return EXIT_OK;
        }
        Commands::Sync(args) => args,
    };

    let bus = EventBus::new();
    let config = TracingConfig {
        format: if cli.json {
            TracingFormat::Json
        } else {
            cli.format
        },
        level: cli.level.into(),
        filter: None,
    };
    let receiver = match init_tracing(&config, &bus) {
        Ok(receiver) => receiver,
        Err(e) => {
            report_error(CliError::config(e.to_string()));
            return EXIT_FAILURE;
        }
    };

    let renderer_handle = if cli.json {
        let renderer = JsonRenderer::new();
        tokio::spawn(async move {
            renderer.run(receiver).await;
        })
    } else {
        let renderer = CliRenderer::new();
        tokio::spawn(async move {
            renderer.run(receiver).await;
        })
    };

    let result = commands::sync::execute(args).await;

    emit_shutdown!();
    bus.shutdown();
    // A renderer that is stuck must not hold the exit code hostage.
    let _ = tokio::time::timeout(RENDERER_DRAIN_TIMEOUT, renderer_handle).await;

    match result {
        Ok(report) => {
            if cli.json {
                print_report(&report);
            }
            EXIT_OK
        }
        Err(err) => {
            let code = err.exit_code();
            report_error(err);
            code
        }
    }
}

#[allow(clippy::print_stdout)]
fn print_report(report: &SyncReport) {
    match serde_json::to_string(report) {
        Ok(json) => println!("{json}"),
        Err(e) => report_error(CliError::other(format!("cannot serialize report: {e}"))),
    }
}

#[allow(clippy::print_stderr)]
fn report_error(err: CliError) {
    eprintln!("{:?}", miette::Report::new(err));
}
