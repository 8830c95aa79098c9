//! Fabric CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};
use miette::GraphicalReportHandler;

use fabric::FabricError;
use fabric_cli::{Args, error_adapter::to_reportables};

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();
    init_logging(&args.log_level);

    info!(document = args.document, inputs = args.inputs.len(); "Starting Fabric");
    debug!(args:?; "Parsed arguments");

    match fabric_cli::run(&args) {
        Ok(()) => info!(document = args.document; "Completed successfully"),
        Err(err) => {
            report(&err);
            process::exit(1);
        }
    }
}

/// Unknown levels fall back to `warn`, so diagnostics are still shown.
fn init_logging(level: &str) {
    let log_level = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {level}. Using 'warn' instead.");
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();
}

/// Log one miette report per diagnostic, then a summary of a failed render.
fn report(err: &FabricError) {
    let reporter = GraphicalReportHandler::new();

    for reportable in to_reportables(err) {
        let mut rendered = String::new();
        match reporter.render_report(&mut rendered, &reportable) {
            Ok(()) => error!("{rendered}"),
            Err(_) => error!("{reportable}"),
        }
    }

    if let FabricError::Diagnostics {
        diagnostics,
        sources,
    } = err
    {
        error!(
            errors = diagnostics.len(),
            units = sources.len();
            "Render reported errors; lines from unaffected blocks were still written",
        );
    }
}
