use crate::output::{print, OutputFormat};
use anyhow::{Context, Result};
use clap::Parser;
use model::{ConfigDocument, Eks};

/// Print a valid configuration document in the current schema to start from.
#[derive(Debug, Parser)]
pub(crate) struct Template {
    /// The output format [yaml|json].
    #[clap(long = "output", short = 'o', default_value = "yaml")]
    output: OutputFormat,
}

impl Template {
    pub(crate) fn run(self) -> Result<()> {
        let document =
            ConfigDocument::current(&Eks::template()).context("Unable to build template")?;
        print(&document, self.output)
    }
}
