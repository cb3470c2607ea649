use crate::error::{self, Result};
use crate::nodegroup::{
    ManagedNodegroup, Nodegroup, NodegroupBase, NodegroupKind, UnmanagedNodegroup,
};
use log::info;
use maplit::btreemap;
use serde::Serialize;
use serde_json::Value;
use snafu::{ensure, ResultExt};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// The cluster-wide settings of the EKS cluster and its nodegroups, before validation.
///
/// ```yaml
/// version: "1.20"
/// control_plane_access_cidrs: ["0.0.0.0/0"]
/// private_api: false
/// max_nodegroup_azs: 3
/// global_node_labels: {}
/// global_node_tags: {}
/// secrets_encryption_key_arn: null
/// managed_nodegroups: {}
/// unmanaged_nodegroups: {}
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct EksSettings {
    /// Kubernetes version of the cluster (e.g. "1.20"). This must be quoted in YAML so that it is
    /// not read as a number.
    pub version: String,
    /// CIDRs with access to the control plane. Only valid when `private_api` is false.
    pub control_plane_access_cidrs: Vec<String>,
    /// Limit Kubernetes API access to the VPC. Access must then be through a bastion, a peered
    /// network or another in-VPC resource.
    pub private_api: bool,
    /// Nodegroups are provisioned in up to this many availability zones.
    pub max_nodegroup_azs: u32,
    /// Labels applied to every Kubernetes node.
    pub global_node_labels: BTreeMap<String, String>,
    /// Tags applied to every node instance.
    pub global_node_tags: BTreeMap<String, String>,
    /// KMS key used to encrypt Kubernetes secrets. A new key is created when this is unset.
    pub secrets_encryption_key_arn: Option<String>,
    pub managed_nodegroups: BTreeMap<String, ManagedNodegroup>,
    pub unmanaged_nodegroups: BTreeMap<String, UnmanagedNodegroup>,
}

impl EksSettings {
    /// Every nodegroup, managed nodegroups first.
    pub fn nodegroups(&self) -> impl Iterator<Item = (&str, Nodegroup<'_>)> {
        let managed = self
            .managed_nodegroups
            .iter()
            .map(|(name, ng)| (name.as_str(), Nodegroup::Managed(ng)));
        let unmanaged = self
            .unmanaged_nodegroups
            .iter()
            .map(|(name, ng)| (name.as_str(), Nodegroup::Unmanaged(ng)));
        managed.chain(unmanaged)
    }

    /// Check every nodegroup and then the cluster-wide settings, returning all problems found.
    pub fn issues(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for (name, nodegroup) in self.nodegroups() {
            nodegroup.check(name, &mut issues);
        }
        if !self.control_plane_access_cidrs.is_empty() && self.private_api {
            issues.push(ValidationIssue::ControlPlaneAccessWithPrivateApi);
        }
        issues
    }
}

/// A validated EKS configuration. The only way to get one is through [`Eks::new`], which fails
/// with every problem in the settings at once.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Eks {
    settings: EksSettings,
}

impl Eks {
    pub fn new(settings: EksSettings) -> Result<Self> {
        let issues = settings.issues();
        ensure!(issues.is_empty(), error::ValidationSnafu { issues });
        info!(
            "EKS {} configuration is valid with {} managed and {} unmanaged nodegroup(s)",
            settings.version,
            settings.managed_nodegroups.len(),
            settings.unmanaged_nodegroups.len()
        );
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &EksSettings {
        &self.settings
    }

    pub fn nodegroups(&self) -> impl Iterator<Item = (&str, Nodegroup<'_>)> {
        self.settings.nodegroups()
    }

    /// The configuration in the current schema.
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).context(error::SerializeSnafu)
    }

    /// A small, valid configuration to start from.
    pub fn template() -> Self {
        let platform = ManagedNodegroup {
            base: NodegroupBase {
                ssm_agent: true,
                disk_size: 1000,
                key_name: None,
                min_size: 1,
                max_size: 10,
                ami_id: None,
                user_data: None,
                instance_types: vec!["m5.2xlarge".to_string(), "m5.4xlarge".to_string()],
                labels: btreemap! {
                    "dominodatalab.com/node-pool".to_string() => "platform".to_string(),
                },
                tags: BTreeMap::new(),
            },
            spot: false,
            desired_size: 1,
        };
        Self {
            settings: EksSettings {
                version: "1.20".to_string(),
                control_plane_access_cidrs: vec!["0.0.0.0/0".to_string()],
                private_api: false,
                max_nodegroup_azs: 3,
                global_node_labels: BTreeMap::new(),
                global_node_tags: BTreeMap::new(),
                secrets_encryption_key_arn: None,
                managed_nodegroups: btreemap! { "platform".to_string() => platform },
                unmanaged_nodegroups: BTreeMap::new(),
            },
        }
    }
}

/// A cross-field problem with an EKS configuration.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum ValidationIssue {
    /// A custom AMI was given without the user data needed to join the node to the cluster.
    MissingUserData { kind: NodegroupKind, name: String },
    /// Options that depend on the default AMI bootstrap were set along with a custom AMI.
    IncompatibleAmiOptions { kind: NodegroupKind, name: String },
    /// Managed nodegroups cannot scale to zero.
    ManagedMinSizeZero { name: String },
    /// `control_plane_access_cidrs` and `private_api` were both set.
    ControlPlaneAccessWithPrivateApi,
}

fn nodegroup_label(kind: &NodegroupKind, name: &str) -> String {
    match kind {
        NodegroupKind::Managed => format!("Managed nodegroup [{}]", name),
        NodegroupKind::Unmanaged => format!("Unmanaged nodegroup [{}]", name),
    }
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingUserData { kind, name } => write!(
                f,
                "{}: User data must be provided when specifying a custom AMI",
                nodegroup_label(kind, name)
            ),
            Self::IncompatibleAmiOptions { kind, name } => write!(
                f,
                "{}: ssm_agent, labels and taints cannot be automatically configured when \
                specifying a custom AMI. You need to configure all of this using user_data.",
                nodegroup_label(kind, name)
            ),
            Self::ManagedMinSizeZero { name } => write!(
                f,
                "{} has min_size of 0. Only unmanaged nodegroups support min_size of 0.",
                nodegroup_label(&NodegroupKind::Managed, name)
            ),
            Self::ControlPlaneAccessWithPrivateApi => write!(
                f,
                "Cannot use 'control_plane_access_cidrs' with 'private_api'"
            ),
        }
    }
}
