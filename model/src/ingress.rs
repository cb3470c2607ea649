use crate::constants::INGRESS_RULE_ITEM;
use crate::error::{self, Result};
use crate::loader::{check_cidrs, check_leavins, RawConfig};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_plain::{derive_display_from_serialize, derive_fromstr_from_deserialize};
use snafu::ResultExt;

/// The IP protocol an ingress rule applies to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    Icmpv6,
    /// All protocols and ports.
    All,
}

derive_display_from_serialize!(Protocol);
derive_fromstr_from_deserialize!(Protocol);

/// Network access into the instances of an unmanaged nodegroup, e.g.
///
/// ```yaml
/// - name: API
///   from_port: 22
///   to_port: 22
///   protocol: TCP
///   ip_cidrs:
///   - 0.0.0.0/0
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct IngressRule {
    pub name: String,
    pub from_port: i32,
    pub to_port: i32,
    pub protocol: Protocol,
    pub ip_cidrs: Vec<String>,
}

impl IngressRule {
    /// Load one rule, consuming every key it recognizes from `raw`.
    pub fn load(raw: &mut RawConfig) -> Result<Self> {
        let rule = Self {
            name: raw.required("name")?,
            from_port: raw.required("from_port")?,
            to_port: raw.required("to_port")?,
            protocol: raw.required("protocol")?,
            ip_cidrs: raw.required("ip_cidrs")?,
        };
        check_cidrs(raw.context(), &rule.ip_cidrs)?;
        check_leavins(INGRESS_RULE_ITEM, raw.context(), raw)?;
        Ok(rule)
    }

    /// Load a sequence of rules. `context` is the location of the owning nodegroup. A `null`
    /// value is an empty list of rules.
    pub fn load_rules(context: &str, rules: &Value) -> Result<Vec<Self>> {
        let entries: Vec<Value> = match rules {
            Value::Null => return Ok(Vec::new()),
            _ => serde_json::from_value(rules.clone()).context(error::WrongTypeSnafu {
                context,
                key: "ingress_ports",
            })?,
        };
        debug!("Loading {} ingress rule(s) for {}", entries.len(), context);
        entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let rule_context = format!("{}.ingress_ports[{}]", context, i);
                let mut raw = RawConfig::from_value(rule_context, "ingress rule", entry)?;
                Self::load(&mut raw)
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::{IngressRule, Protocol};
    use crate::Error;
    use serde_json::json;
    use std::str::FromStr;

    const CONTEXT: &str = "config.eks.unmanaged_nodegroups.compute";

    #[test]
    fn load_rules() {
        let rules = IngressRule::load_rules(
            CONTEXT,
            &json!([
                {"name": "ssh", "from_port": 22, "to_port": 22, "protocol": "TCP", "ip_cidrs": ["10.0.0.0/8"]},
                {"name": "dns", "from_port": 53, "to_port": 53, "protocol": "UDP", "ip_cidrs": []},
            ]),
        )
        .unwrap();
        assert_eq!(
            rules,
            vec![
                IngressRule {
                    name: "ssh".to_string(),
                    from_port: 22,
                    to_port: 22,
                    protocol: Protocol::Tcp,
                    ip_cidrs: vec!["10.0.0.0/8".to_string()],
                },
                IngressRule {
                    name: "dns".to_string(),
                    from_port: 53,
                    to_port: 53,
                    protocol: Protocol::Udp,
                    ip_cidrs: vec![],
                },
            ]
        );
    }

    #[test]
    fn null_is_empty() {
        assert!(IngressRule::load_rules(CONTEXT, &json!(null))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn leftover_names_rule() {
        let err = IngressRule::load_rules(
            CONTEXT,
            &json!([{"name": "ssh", "from_port": 22, "to_port": 22, "protocol": "TCP", "ip_cidrs": [], "port": 22}]),
        )
        .unwrap_err();
        match err {
            Error::Leftover { context, keys, .. } => {
                assert_eq!(context, format!("{}.ingress_ports[0]", CONTEXT));
                assert_eq!(keys, vec!["port".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn unknown_protocol() {
        let err = IngressRule::load_rules(
            CONTEXT,
            &json!([{"name": "x", "from_port": 1, "to_port": 2, "protocol": "SCTP", "ip_cidrs": []}]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::WrongType { ref key, .. } if key == "protocol"));
    }

    #[test]
    fn not_a_list() {
        assert!(IngressRule::load_rules(CONTEXT, &json!("22")).is_err());
    }

    #[test]
    fn protocol_strings() {
        assert_eq!(Protocol::from_str("ICMPV6").unwrap(), Protocol::Icmpv6);
        assert_eq!(Protocol::All.to_string(), "ALL");
    }
}
