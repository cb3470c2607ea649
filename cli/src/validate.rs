use crate::read_document;
use anyhow::{Context, Result};
use clap::{value_parser, Parser};
use log::info;
use std::path::PathBuf;

/// Load a configuration file, migrate it to the current model and validate it.
#[derive(Debug, Parser)]
pub(crate) struct Validate {
    /// Path to the configuration YAML file.
    #[clap(value_parser = value_parser!(PathBuf))]
    path: PathBuf,

    /// Read the eks section as this schema version instead of the document's `schema` key.
    #[clap(long = "schema")]
    schema: Option<String>,
}

impl Validate {
    pub(crate) fn run(self) -> Result<()> {
        let document = read_document(&self.path)?;
        let schema = self.schema.as_deref().unwrap_or_else(|| document.schema());
        info!("Validating '{}' as schema {}", self.path.display(), schema);
        let eks = document
            .eks_as(schema)
            .context(format!("'{}' is not valid", self.path.display()))?;
        let settings = eks.settings();
        println!(
            "'{}' is valid: EKS {} with {} managed and {} unmanaged nodegroup(s)",
            self.path.display(),
            settings.version,
            settings.managed_nodegroups.len(),
            settings.unmanaged_nodegroups.len()
        );
        Ok(())
    }
}
