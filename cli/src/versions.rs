use anyhow::Result;
use clap::Parser;
use model::constants::CURRENT_SCHEMA_VERSION;
use model::known_versions;

/// List the schema versions that can be loaded, oldest first.
#[derive(Debug, Parser)]
pub(crate) struct Versions {}

impl Versions {
    pub(crate) fn run(self) -> Result<()> {
        for version in known_versions() {
            if version == CURRENT_SCHEMA_VERSION {
                println!("{} (current)", version);
            } else {
                println!("{}", version);
            }
        }
        Ok(())
    }
}
