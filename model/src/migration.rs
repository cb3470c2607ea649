/*!

Loaders for each historical shape of the `eks` configuration section.

Each function maps one schema version to the current [`Eks`] model so that validation only exists
once. A new schema version gets a new function and a new entry in [`MIGRATIONS`]; released entries
are never changed so that archived configuration files keep loading exactly as they did.

!*/

use crate::constants::{EKS_CONTEXT, SCHEMA_0_0_0, SCHEMA_0_0_1};
use crate::eks::{Eks, EksSettings};
use crate::error::{self, Result};
use crate::loader::{check_cidrs, from_loader, RawConfig};
use crate::nodegroup::{ManagedNodegroup, NodegroupKind, UnmanagedNodegroup};
use log::debug;
use serde_json::{Map, Value};
use snafu::OptionExt;
use std::collections::BTreeMap;

/// Loads an `eks` section of one schema version into the current model.
pub type Migration = fn(&Map<String, Value>) -> Result<Eks>;

/// Every supported schema version, oldest first.
pub const MIGRATIONS: &[(&str, Migration)] =
    &[(SCHEMA_0_0_0, from_0_0_0), (SCHEMA_0_0_1, from_0_0_1)];

pub fn known_versions() -> Vec<&'static str> {
    MIGRATIONS.iter().map(|(version, _)| *version).collect()
}

pub fn migration_for(version: &str) -> Option<Migration> {
    MIGRATIONS
        .iter()
        .find(|(known, _)| *known == version)
        .map(|(_, migration)| *migration)
}

/// Load and validate an `eks` section written in schema `version`.
pub fn load_eks(version: &str, eks: &Value) -> Result<Eks> {
    let migration = migration_for(version).context(error::UnknownSchemaVersionSnafu {
        version,
        known: known_versions()
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>(),
    })?;
    let raw = match eks {
        Value::Object(map) => map,
        _ => {
            return error::NotAMappingSnafu {
                context: EKS_CONTEXT,
                what: "the eks section",
            }
            .fail()
        }
    };
    debug!("Loading eks section with schema version {}", version);
    migration(raw)
}

/// The original schema. Unmanaged nodegroups lived under `nodegroups`, AMI settings were nested
/// in a `machine_image` mapping, and there were no control plane CIDRs, secrets key, IMDSv2 or
/// ingress settings.
pub fn from_0_0_0(c: &Map<String, Value>) -> Result<Eks> {
    let mut raw = RawConfig::new(EKS_CONTEXT, c.clone());
    let settings = EksSettings {
        version: raw.required("version")?,
        control_plane_access_cidrs: Vec::new(),
        private_api: raw.required("private_api")?,
        max_nodegroup_azs: raw.required("max_nodegroup_azs")?,
        global_node_labels: raw.required("global_node_labels")?,
        global_node_tags: raw.required("global_node_tags")?,
        secrets_encryption_key_arn: None,
        managed_nodegroups: load_nodegroups(
            NodegroupKind::Managed,
            raw.optional_mapping("managed_nodegroups")?,
            flatten_machine_image,
            ManagedNodegroup::load,
        )?,
        unmanaged_nodegroups: load_nodegroups(
            NodegroupKind::Unmanaged,
            raw.optional_mapping("nodegroups")?,
            |context, nodegroup| {
                let mut nodegroup = flatten_machine_image(context, nodegroup)?;
                // These settings did not exist yet and are forced regardless of the input.
                nodegroup.insert("imdsv2_required".to_string(), Value::Bool(false));
                nodegroup.insert("ingress_ports".to_string(), Value::Array(Vec::new()));
                Ok(nodegroup)
            },
            UnmanagedNodegroup::load,
        )?,
    };
    from_loader(EKS_CONTEXT, Eks::new(settings)?, &raw)
}

/// The current schema.
pub fn from_0_0_1(c: &Map<String, Value>) -> Result<Eks> {
    let mut raw = RawConfig::new(EKS_CONTEXT, c.clone());
    let version = raw.required("version")?;
    let control_plane_access_cidrs: Vec<String> = raw.required("control_plane_access_cidrs")?;
    check_cidrs(EKS_CONTEXT, &control_plane_access_cidrs)?;
    let settings = EksSettings {
        version,
        control_plane_access_cidrs,
        private_api: raw.required("private_api")?,
        secrets_encryption_key_arn: raw.optional("secrets_encryption_key_arn")?,
        max_nodegroup_azs: raw.required("max_nodegroup_azs")?,
        global_node_labels: raw.required("global_node_labels")?,
        global_node_tags: raw.required("global_node_tags")?,
        managed_nodegroups: load_nodegroups(
            NodegroupKind::Managed,
            raw.optional_mapping("managed_nodegroups")?,
            |_, nodegroup| Ok(nodegroup),
            ManagedNodegroup::load,
        )?,
        unmanaged_nodegroups: load_nodegroups(
            NodegroupKind::Unmanaged,
            raw.optional_mapping("unmanaged_nodegroups")?,
            |_, nodegroup| Ok(nodegroup),
            UnmanagedNodegroup::load,
        )?,
    };
    from_loader(EKS_CONTEXT, Eks::new(settings)?, &raw)
}

/// Load each named nodegroup, after passing its mapping through `prepare`.
fn load_nodegroups<T, P>(
    kind: NodegroupKind,
    nodegroups: Map<String, Value>,
    prepare: P,
    load: fn(&mut RawConfig) -> Result<T>,
) -> Result<BTreeMap<String, T>>
where
    P: Fn(&str, Map<String, Value>) -> Result<Map<String, Value>>,
{
    let mut loaded = BTreeMap::new();
    for (name, nodegroup) in nodegroups {
        let context = kind.context(&name);
        let nodegroup = match nodegroup {
            Value::Object(map) => map,
            _ => {
                return error::NotAMappingSnafu {
                    context,
                    what: "the nodegroup",
                }
                .fail()
            }
        };
        let nodegroup = prepare(&context, nodegroup)?;
        let mut raw = RawConfig::new(context, nodegroup);
        loaded.insert(name, load(&mut raw)?);
    }
    Ok(loaded)
}

/// Merge the keys of a nested `machine_image` mapping into the nodegroup. Keys set directly on the
/// nodegroup win over the nested ones.
fn flatten_machine_image(
    context: &str,
    mut nodegroup: Map<String, Value>,
) -> Result<Map<String, Value>> {
    let mut flattened = match nodegroup.remove("machine_image") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(machine_image)) => machine_image,
        Some(_) => {
            return error::NotAMappingSnafu {
                context,
                what: "machine_image",
            }
            .fail()
        }
    };
    flattened.extend(nodegroup);
    Ok(flattened)
}

#[cfg(test)]
mod test {
    use super::{from_0_0_0, from_0_0_1, known_versions, load_eks};
    use crate::eks::ValidationIssue;
    use crate::ingress::Protocol;
    use crate::Error;
    use maplit::btreemap;
    use serde_json::{json, Map, Value};

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not a mapping"),
        }
    }

    fn current() -> Value {
        json!({
            "version": "1.20",
            "control_plane_access_cidrs": ["10.0.0.0/8"],
            "private_api": false,
            "secrets_encryption_key_arn": "arn:aws:kms:us-west-2:123456789012:key/abc",
            "max_nodegroup_azs": 3,
            "global_node_labels": {"dominodatalab.com/domino-node": "true"},
            "global_node_tags": {"owner": "platform"},
            "managed_nodegroups": {
                "platform": {
                    "ssm_agent": true,
                    "disk_size": 1000,
                    "key_name": "ops",
                    "min_size": 1,
                    "max_size": 10,
                    "ami_id": null,
                    "user_data": null,
                    "instance_types": ["m5.2xlarge", "m5.4xlarge"],
                    "labels": {"dominodatalab.com/node-pool": "platform"},
                    "tags": {},
                    "spot": false,
                    "desired_size": 1,
                }
            },
            "unmanaged_nodegroups": {
                "gpu": {
                    "ssm_agent": false,
                    "disk_size": 500,
                    "min_size": 0,
                    "max_size": 4,
                    "ami_id": "ami-0abc",
                    "user_data": "#!/bin/bash\n/etc/eks/bootstrap.sh cluster",
                    "instance_types": ["p3.2xlarge"],
                    "labels": {},
                    "tags": {"gpu": "true"},
                    "gpu": true,
                    "imdsv2_required": true,
                    "ingress_ports": [
                        {"name": "ssh", "from_port": 22, "to_port": 22, "protocol": "TCP", "ip_cidrs": ["10.0.0.0/16"]}
                    ],
                }
            },
        })
    }

    fn legacy() -> Value {
        json!({
            "version": "1.19",
            "private_api": true,
            "max_nodegroup_azs": 2,
            "global_node_labels": {},
            "global_node_tags": {},
            "managed_nodegroups": {
                "platform": {
                    "ssm_agent": true,
                    "disk_size": 100,
                    "min_size": 1,
                    "max_size": 3,
                    "machine_image": null,
                    "instance_types": ["m5.xlarge"],
                    "labels": {},
                    "tags": {},
                    "spot": true,
                    "desired_size": 2,
                }
            },
            "nodegroups": {
                "compute": {
                    "ssm_agent": false,
                    "disk_size": 200,
                    "min_size": 0,
                    "max_size": 5,
                    "machine_image": {
                        "ami_id": "ami-0legacy",
                        "user_data": "#!/bin/bash",
                    },
                    "instance_types": ["m5.4xlarge"],
                    "labels": {},
                    "tags": {},
                    "gpu": false,
                    "imdsv2_required": true,
                }
            },
        })
    }

    #[test]
    fn current_schema_fields() {
        let eks = from_0_0_1(&map(current())).unwrap();
        let s = eks.settings();
        assert_eq!(s.version, "1.20");
        assert_eq!(s.control_plane_access_cidrs, vec!["10.0.0.0/8".to_string()]);
        assert!(!s.private_api);
        assert_eq!(
            s.secrets_encryption_key_arn.as_deref(),
            Some("arn:aws:kms:us-west-2:123456789012:key/abc")
        );
        assert_eq!(s.max_nodegroup_azs, 3);
        assert_eq!(
            s.global_node_tags,
            btreemap! {"owner".to_string() => "platform".to_string()}
        );

        let platform = &s.managed_nodegroups["platform"];
        assert_eq!(platform.base.key_name.as_deref(), Some("ops"));
        assert_eq!(platform.base.instance_types.len(), 2);
        assert_eq!(platform.desired_size, 1);

        let gpu = &s.unmanaged_nodegroups["gpu"];
        assert_eq!(gpu.base.ami_id.as_deref(), Some("ami-0abc"));
        assert!(gpu.imdsv2_required);
        assert_eq!(gpu.ingress_ports.len(), 1);
        assert_eq!(gpu.ingress_ports[0].protocol, Protocol::Tcp);
    }

    #[test]
    fn current_schema_round_trip() {
        let eks = from_0_0_1(&map(current())).unwrap();
        let reloaded = from_0_0_1(&map(eks.to_value().unwrap())).unwrap();
        assert_eq!(eks, reloaded);
    }

    #[test]
    fn version_must_be_a_string() {
        let mut value = current();
        value["version"] = json!(1.2);
        let err = from_0_0_1(&map(value)).unwrap_err();
        assert!(matches!(err, Error::WrongType { ref key, .. } if key == "version"));
    }

    #[test]
    fn legacy_machine_image_is_flattened() {
        let eks = from_0_0_0(&map(legacy())).unwrap();
        let s = eks.settings();
        assert!(s.control_plane_access_cidrs.is_empty());
        assert_eq!(s.secrets_encryption_key_arn, None);

        let compute = &s.unmanaged_nodegroups["compute"];
        assert_eq!(compute.base.ami_id.as_deref(), Some("ami-0legacy"));
        assert_eq!(compute.base.user_data.as_deref(), Some("#!/bin/bash"));
        assert!(!compute.imdsv2_required);
        assert!(compute.ingress_ports.is_empty());

        let platform = &s.managed_nodegroups["platform"];
        assert_eq!(platform.base.ami_id, None);
        assert!(platform.spot);
    }

    #[test]
    fn legacy_managed_machine_image_is_flattened() {
        let mut value = legacy();
        value["managed_nodegroups"]["platform"]["ssm_agent"] = json!(false);
        value["managed_nodegroups"]["platform"]["machine_image"] = json!({
            "ami_id": "ami-0managed",
            "user_data": "#!/bin/bash\n/etc/eks/bootstrap.sh cluster",
        });
        let eks = from_0_0_0(&map(value)).unwrap();
        let platform = &eks.settings().managed_nodegroups["platform"];
        assert_eq!(platform.base.ami_id.as_deref(), Some("ami-0managed"));
        assert_eq!(
            platform.base.user_data.as_deref(),
            Some("#!/bin/bash\n/etc/eks/bootstrap.sh cluster")
        );
        assert_eq!(platform.desired_size, 2);
    }

    #[test]
    fn legacy_machine_image_typo_is_leftover() {
        let mut value = legacy();
        value["nodegroups"]["compute"]["machine_image"]["ami_idd"] = json!("ami-typo");
        match from_0_0_0(&map(value)).unwrap_err() {
            Error::Leftover { context, keys, .. } => {
                assert_eq!(context, "config.eks.unmanaged_nodegroups.compute");
                assert_eq!(keys, vec!["ami_idd".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn legacy_nodegroup_keys_win_over_machine_image() {
        let mut value = legacy();
        value["nodegroups"]["compute"]["user_data"] = json!("#!/bin/sh\necho direct");
        let eks = from_0_0_0(&map(value)).unwrap();
        assert_eq!(
            eks.settings().unmanaged_nodegroups["compute"]
                .base
                .user_data
                .as_deref(),
            Some("#!/bin/sh\necho direct")
        );
    }

    #[test]
    fn legacy_rejects_newer_keys() {
        let mut value = legacy();
        value["control_plane_access_cidrs"] = json!([]);
        let err = from_0_0_0(&map(value)).unwrap_err();
        match err {
            Error::Leftover { context, keys, .. } => {
                assert_eq!(context, "config.eks");
                assert_eq!(keys, vec!["control_plane_access_cidrs".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }

        let mut value = legacy();
        value["unmanaged_nodegroups"] = json!({});
        assert!(matches!(
            from_0_0_0(&map(value)).unwrap_err(),
            Error::Leftover { .. }
        ));
    }

    #[test]
    fn nodegroup_leftover_is_named() {
        let mut value = current();
        value["unmanaged_nodegroups"]["gpu"]["instance_type"] = json!("p3.2xlarge");
        match from_0_0_1(&map(value)).unwrap_err() {
            Error::Leftover {
                item,
                context,
                keys,
            } => {
                assert_eq!(item, "unmanaged nodegroup attribute");
                assert_eq!(context, "config.eks.unmanaged_nodegroups.gpu");
                assert_eq!(keys, vec!["instance_type".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn validation_runs_before_top_level_leftovers() {
        let mut value = current();
        value["private_api"] = json!(true);
        value["typo"] = json!(1);
        match from_0_0_1(&map(value)).unwrap_err() {
            Error::Validation { issues } => {
                assert_eq!(issues, vec![ValidationIssue::ControlPlaneAccessWithPrivateApi])
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn nodegroup_sections_are_optional() {
        let mut value = current();
        let obj = value.as_object_mut().unwrap();
        obj.remove("managed_nodegroups");
        obj.remove("unmanaged_nodegroups");
        obj.remove("secrets_encryption_key_arn");
        let eks = from_0_0_1(&map(value)).unwrap();
        assert_eq!(eks.nodegroups().count(), 0);
    }

    #[test]
    fn invalid_control_plane_cidr() {
        let mut value = current();
        value["control_plane_access_cidrs"] = json!(["10.0.0.0/8", "everyone"]);
        let err = from_0_0_1(&map(value)).unwrap_err();
        assert!(matches!(err, Error::InvalidCidr { ref cidr, .. } if cidr == "everyone"));
    }

    #[test]
    fn registry() {
        assert_eq!(known_versions(), vec!["0.0.0", "0.0.1"]);
        let eks = load_eks("0.0.0", &legacy()).unwrap();
        assert_eq!(eks.settings().version, "1.19");
        let err = load_eks("9.9.9", &current()).unwrap_err();
        assert!(err.to_string().contains("0.0.0, 0.0.1"), "{}", err);
        assert!(matches!(
            load_eks("0.0.1", &json!([])).unwrap_err(),
            Error::NotAMapping { .. }
        ));
    }
}
