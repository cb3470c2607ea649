use crate::eks::ValidationIssue;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{}: '{}' is not a valid CIDR: {}", context, cidr, source))]
    InvalidCidr {
        context: String,
        cidr: String,
        source: ipnetwork::IpNetworkError,
    },

    #[snafu(display("Unused/unsupported {}(s) in {}: {}", item, context, keys.join(", ")))]
    Leftover {
        item: String,
        context: String,
        keys: Vec<String>,
    },

    #[snafu(display("{}: missing required key '{}'", context, key))]
    MissingKey { context: String, key: String },

    #[snafu(display("The configuration document has no '{}' section", what))]
    MissingSection { what: String },

    #[snafu(display("{}: expected {} to be a mapping", context, what))]
    NotAMapping { context: String, what: String },

    #[snafu(display("Unable to parse configuration document: {}", source))]
    ParseYaml { source: serde_yaml::Error },

    #[snafu(display("Unable to serialize configuration: {}", source))]
    Serialize { source: serde_json::Error },

    #[snafu(display(
        "No migration exists for schema version '{}', known versions are: {}",
        version,
        known.join(", ")
    ))]
    UnknownSchemaVersion { version: String, known: Vec<String> },

    #[snafu(display(
        "Invalid configuration, {} problem(s) found:\n{}",
        issues.len(),
        issues.iter().map(|issue| format!("  - {}", issue)).collect::<Vec<_>>().join("\n")
    ))]
    Validation { issues: Vec<ValidationIssue> },

    #[snafu(display("{}: '{}' has the wrong type: {}", context, key, source))]
    WrongType {
        context: String,
        key: String,
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
