use std::{io, process::ExitCode};

use anyhow::{Context, Error};
use clap::Parser;
use log::{debug, error, LevelFilter};

use artisan::{
    apply::Apply,
    cli::{Cli, Commands},
    convert::Convert,
    parse::Parse,
    ExitKind, ARTISAN_VERSION,
};
use artisan_api::{
    constants::ARTISAN_DEBUG_ENV,
    error::{ArtisanError, ArtisanResultExt},
};

fn run_artisan(args: &Cli) -> Result<ExitKind, ArtisanError> {
    debug!("swift-ring-artisan version: {ARTISAN_VERSION}");

    let res = match &args.command {
        Commands::Apply {
            rule,
            input,
            builder,
            check,
            execute,
            yes,
            output,
            no_rebalance,
        } => Apply {
            rule: rule.clone(),
            input: input.clone(),
            builder: builder.clone(),
            check: *check,
            execute: *execute,
            assume_yes: *yes,
            output: output.clone(),
            rebalance: !no_rebalance,
        }
        .run(&mut io::stdin().lock(), &mut io::stderr()),

        Commands::Convert {
            input,
            builder,
            base_port,
            base_size,
            output,
        } => Convert {
            input: input.clone(),
            builder: builder.clone(),
            base_port: *base_port,
            base_size_tb: *base_size,
            output: output.clone(),
        }
        .run()
        .map(|()| ExitKind::Done),

        Commands::Parse {
            file,
            builder,
            format,
            output,
        } => Parse {
            file: file.clone(),
            builder: builder.clone(),
            format: *format,
            output: output.clone(),
        }
        .run(&mut io::stdin().lock())
        .map(|()| ExitKind::Done),
    };

    res.message(format!("Failed to execute '{}' command", args.command))
}

/// Checks whether debug logging was requested through the environment.
fn debug_requested(value: Option<&str>) -> bool {
    matches!(
        value.map(|value| value.trim().to_lowercase()).as_deref(),
        Some("1" | "true" | "yes")
    )
}

fn setup_logging(verbosity: LevelFilter, debug: bool) -> Result<(), Error> {
    let level = if debug {
        verbosity.max(LevelFilter::Debug)
    } else {
        verbosity
    };

    env_logger::builder()
        .format_timestamp(None)
        .filter_level(level)
        .try_init()
        .context("Logger already registered")
}

fn main() -> ExitCode {
    // Parse args
    let args = Cli::parse();

    // Initialize the logger
    let debug = debug_requested(std::env::var(ARTISAN_DEBUG_ENV).ok().as_deref());
    if let Err(e) = setup_logging(args.verbosity, debug) {
        eprintln!("Failed to initialize logging: {e:?}");
        return ExitCode::from(2);
    }

    match run_artisan(&args) {
        Ok(ExitKind::Done) => ExitCode::SUCCESS,
        Ok(ExitKind::ChangesPending) => ExitCode::from(1),
        Err(e) => {
            error!("swift-ring-artisan failed: {e:?}");
            ExitCode::from(2)
        }
    }
}
