use crate::output::{print, OutputFormat};
use crate::read_document;
use anyhow::{Context, Result};
use clap::{value_parser, Parser};
use log::info;
use model::constants::CURRENT_SCHEMA_VERSION;
use model::ConfigDocument;
use std::path::PathBuf;

/// Load and validate a configuration file, then print its eks section in the current schema.
#[derive(Debug, Parser)]
pub(crate) struct Migrate {
    /// Path to the configuration YAML file.
    #[clap(value_parser = value_parser!(PathBuf))]
    path: PathBuf,

    /// Read the eks section as this schema version instead of the document's `schema` key.
    #[clap(long = "schema")]
    schema: Option<String>,

    /// The output format [yaml|json].
    #[clap(long = "output", short = 'o', default_value = "yaml")]
    output: OutputFormat,
}

impl Migrate {
    pub(crate) fn run(self) -> Result<()> {
        let document = read_document(&self.path)?;
        let schema = self.schema.as_deref().unwrap_or_else(|| document.schema());
        let eks = document
            .eks_as(schema)
            .context(format!("'{}' is not valid", self.path.display()))?;
        info!(
            "Migrating '{}' from schema {} to {}",
            self.path.display(),
            schema,
            CURRENT_SCHEMA_VERSION
        );
        let current =
            ConfigDocument::current(&eks).context("Unable to build migrated document")?;
        print(&current, self.output)
    }
}
