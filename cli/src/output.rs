use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_plain::{derive_display_from_serialize, derive_fromstr_from_deserialize};

/// The format used to print configuration documents.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OutputFormat {
    Yaml,
    Json,
}

derive_display_from_serialize!(OutputFormat);
derive_fromstr_from_deserialize!(OutputFormat);

/// Print `document` to stdout in `format`.
pub(crate) fn print(document: &Value, format: OutputFormat) -> Result<()> {
    let s = match format {
        OutputFormat::Yaml => {
            serde_yaml::to_string(document).context("Unable to serialize document as YAML")?
        }
        OutputFormat::Json => serde_json::to_string_pretty(document)
            .context("Unable to serialize document as JSON")?,
    };
    println!("{}", s);
    Ok(())
}
