/*!

This is the command line interface for validating EKS configuration files and upgrading them to
the current schema.

!*/

mod migrate;
mod output;
mod template;
mod validate;
mod versions;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use model::ConfigDocument;
use std::path::Path;

/// Validate and migrate EKS cluster configuration.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Args {
    /// Set logging verbosity [trace|debug|info|warn|error]. If the environment variable `RUST_LOG`
    /// is present, it overrides the default logging behavior. See https://docs.rs/env_logger/latest
    #[clap(long = "log-level", default_value = "info")]
    log_level: LevelFilter,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
enum Command {
    /// Check that a configuration file is valid.
    Validate(validate::Validate),
    /// Print a configuration file in the current schema.
    Migrate(migrate::Migrate),
    /// Print a starting configuration in the current schema.
    Template(template::Template),
    /// List the supported schema versions.
    Versions(versions::Versions),
}

fn main() {
    let args = Args::parse();
    init_logger(args.log_level);
    if let Err(e) = run(args) {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Validate(validate) => validate.run(),
        Command::Migrate(migrate) => migrate.run(),
        Command::Template(template) => template.run(),
        Command::Versions(versions) => versions.run(),
    }
}

/// Read and parse the configuration document at `path`.
pub(crate) fn read_document(path: &Path) -> Result<ConfigDocument> {
    let contents = std::fs::read_to_string(path)
        .context(format!("Unable to read configuration file '{}'", path.display()))?;
    ConfigDocument::from_yaml_str(&contents)
        .context(format!("Unable to parse configuration file '{}'", path.display()))
}

/// Initialize the logger with the value passed by `--log-level` (or its default) when the
/// `RUST_LOG` environment variable is not present. If present, the `RUST_LOG` environment variable
/// overrides `--log-level`/`level`.
fn init_logger(level: LevelFilter) {
    match std::env::var(env_logger::DEFAULT_FILTER_ENV).ok() {
        Some(_) => {
            // RUST_LOG exists; env_logger will use it.
            Builder::from_default_env().init();
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate and the model crate.
            Builder::new()
                .filter(Some(env!("CARGO_CRATE_NAME")), level)
                .filter(Some("eks_config_model"), level)
                .init();
        }
    }
}
