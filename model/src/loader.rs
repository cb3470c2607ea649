/*!

Helpers for turning an untyped mapping into typed configuration while making sure that every key
in the mapping was recognized.

Every extraction through a [`RawConfig`] marks the key as consumed. Once a loader has pulled out
everything it understands, [`check_leavins`] or [`from_loader`] fail if any key was never touched,
so a typo or an unsupported option is reported instead of being silently dropped. Adding a newly
recognized key therefore means adding an extraction to the loader.

!*/

use crate::error::{self, Result};
use ipnetwork::IpNetwork;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use snafu::{ensure, OptionExt, ResultExt};
use std::collections::BTreeSet;

/// An untyped configuration mapping plus the set of keys that have been consumed from it. The
/// underlying mapping is never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct RawConfig {
    context: String,
    map: Map<String, Value>,
    consumed: BTreeSet<String>,
}

impl RawConfig {
    /// Wrap `map`. `context` is the dotted location of the mapping (e.g. `config.eks`) and is used
    /// in error messages.
    pub fn new<S>(context: S, map: Map<String, Value>) -> Self
    where
        S: Into<String>,
    {
        Self {
            context: context.into(),
            map,
            consumed: BTreeSet::new(),
        }
    }

    /// Wrap `value`, which must be a mapping. `what` describes the value for the error message.
    pub fn from_value<S>(context: S, what: &str, value: &Value) -> Result<Self>
    where
        S: Into<String>,
    {
        let context = context.into();
        match value {
            Value::Object(map) => Ok(Self::new(context, map.clone())),
            _ => error::NotAMappingSnafu { context, what }.fail(),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Consume a key that must be present and convert it to `T`.
    pub fn required<T>(&mut self, key: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let value = self.required_value(key)?;
        self.convert(key, value)
    }

    /// Consume a key that may be absent. An explicit `null` is treated the same as an absent key.
    pub fn optional<T>(&mut self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.take(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => self.convert(key, value).map(Some),
        }
    }

    /// Consume a key that may be absent, falling back to `T::default()`.
    pub fn optional_or_default<T>(&mut self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        Ok(self.optional(key)?.unwrap_or_default())
    }

    /// Consume a key that must be present and return it without conversion.
    pub fn required_value(&mut self, key: &str) -> Result<Value> {
        self.take(key).context(error::MissingKeySnafu {
            context: &self.context,
            key,
        })
    }

    /// Consume a key holding a mapping of names to sub-mappings, e.g. a set of nodegroups. An
    /// absent or `null` key yields an empty mapping.
    pub fn optional_mapping(&mut self, key: &str) -> Result<Map<String, Value>> {
        match self.take(key) {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map),
            Some(_) => error::NotAMappingSnafu {
                context: &self.context,
                what: key,
            }
            .fail(),
        }
    }

    /// Mark a key as consumed without reading it.
    pub fn ignore(&mut self, key: &str) {
        self.consumed.insert(key.to_string());
    }

    /// The keys that have not been consumed, sorted.
    pub fn leftovers(&self) -> Vec<String> {
        self.map
            .keys()
            .filter(|key| !self.consumed.contains(*key))
            .cloned()
            .collect()
    }

    fn take(&mut self, key: &str) -> Option<Value> {
        self.consumed.insert(key.to_string());
        self.map.get(key).cloned()
    }

    fn convert<T>(&self, key: &str, value: Value) -> Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(value).context(error::WrongTypeSnafu {
            context: &self.context,
            key,
        })
    }
}

/// Return `built` if every key of `remaining` was consumed, otherwise fail naming `context_name`
/// and the unconsumed keys.
pub fn from_loader<T>(context_name: &str, built: T, remaining: &RawConfig) -> Result<T> {
    check_leavins("config entry", context_name, remaining)?;
    Ok(built)
}

/// Fail if any key of `remaining` was not consumed. `item_label` names what the keys are (e.g.
/// `managed nodegroup attribute`) for the error message.
pub fn check_leavins(item_label: &str, context_name: &str, remaining: &RawConfig) -> Result<()> {
    let keys = remaining.leftovers();
    ensure!(
        keys.is_empty(),
        error::LeftoverSnafu {
            item: item_label,
            context: context_name,
            keys,
        }
    );
    Ok(())
}

/// Make sure each entry of `cidrs` parses as an IPv4 or IPv6 network.
pub(crate) fn check_cidrs(context: &str, cidrs: &[String]) -> Result<()> {
    for cidr in cidrs {
        cidr.parse::<IpNetwork>()
            .context(error::InvalidCidrSnafu { context, cidr })?;
    }
    Ok(())
}
