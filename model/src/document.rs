use crate::constants::{CURRENT_SCHEMA_VERSION, EKS_KEY, SCHEMA_KEY};
use crate::eks::Eks;
use crate::error::{self, Result};
use crate::migration::load_eks;
use log::debug;
use serde_json::{Map, Value};
use snafu::{OptionExt, ResultExt};

/// A whole configuration file: a `schema` version key, the `eks` section and any number of other
/// sections that are not interpreted here.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    schema: String,
    sections: Map<String, Value>,
}

impl ConfigDocument {
    /// Parse a YAML (or JSON) document.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(s).context(error::ParseYamlSnafu)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let mut sections = match value {
            Value::Object(map) => map,
            _ => {
                return error::NotAMappingSnafu {
                    context: "config",
                    what: "the document",
                }
                .fail()
            }
        };
        let schema = sections
            .remove(SCHEMA_KEY)
            .context(error::MissingKeySnafu {
                context: "config",
                key: SCHEMA_KEY,
            })?;
        let schema = serde_json::from_value(schema).context(error::WrongTypeSnafu {
            context: "config",
            key: SCHEMA_KEY,
        })?;
        Ok(Self { schema, sections })
    }

    /// The schema version the document was written in.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Load and validate the `eks` section using the document's schema version.
    pub fn eks(&self) -> Result<Eks> {
        self.eks_as(&self.schema)
    }

    /// Load and validate the `eks` section as if it were written in schema `version`.
    pub fn eks_as(&self, version: &str) -> Result<Eks> {
        for name in self.sections.keys().filter(|name| *name != EKS_KEY) {
            debug!("Ignoring configuration section '{}'", name);
        }
        let eks = self
            .sections
            .get(EKS_KEY)
            .context(error::MissingSectionSnafu { what: EKS_KEY })?;
        load_eks(version, eks)
    }

    /// A document in the current schema holding only `eks`.
    pub fn current(eks: &Eks) -> Result<Value> {
        let mut document = Map::new();
        document.insert(
            SCHEMA_KEY.to_string(),
            Value::String(CURRENT_SCHEMA_VERSION.to_string()),
        );
        document.insert(EKS_KEY.to_string(), eks.to_value()?);
        Ok(Value::Object(document))
    }
}
