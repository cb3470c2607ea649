use crate::constants::{
    MANAGED_NODEGROUPS_CONTEXT, MANAGED_NODEGROUP_ITEM, UNMANAGED_NODEGROUPS_CONTEXT,
    UNMANAGED_NODEGROUP_ITEM,
};
use crate::eks::ValidationIssue;
use crate::error::Result;
use crate::ingress::IngressRule;
use crate::loader::{check_leavins, RawConfig};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_plain::{derive_display_from_serialize, derive_fromstr_from_deserialize};
use std::collections::BTreeMap;

/// Whether a nodegroup's lifecycle is handled by EKS or by an autoscaling group of self-managed
/// instances.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodegroupKind {
    Managed,
    Unmanaged,
}

derive_display_from_serialize!(NodegroupKind);
derive_fromstr_from_deserialize!(NodegroupKind);

impl NodegroupKind {
    /// The location of the named nodegroup, used in error messages.
    pub fn context(&self, name: &str) -> String {
        let section = match self {
            Self::Managed => MANAGED_NODEGROUPS_CONTEXT,
            Self::Unmanaged => UNMANAGED_NODEGROUPS_CONTEXT,
        };
        format!("{}.{}", section, name)
    }

    fn item(&self) -> &'static str {
        match self {
            Self::Managed => MANAGED_NODEGROUP_ITEM,
            Self::Unmanaged => UNMANAGED_NODEGROUP_ITEM,
        }
    }
}

/// The settings shared by managed and unmanaged nodegroups.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct NodegroupBase {
    /// Install the SSM agent (e.g. for console access through the AWS web UI).
    pub ssm_agent: bool,
    /// Size in GB of the disk on each node.
    pub disk_size: u32,
    /// Pre-existing AWS key pair to configure on the instances.
    pub key_name: Option<String>,
    /// Minimum node count. Only unmanaged nodegroups may scale to zero.
    pub min_size: u32,
    pub max_size: u32,
    /// Custom AMI for the nodes. When unset the current EKS AMI is used. A custom AMI requires
    /// `user_data` that joins the node to the cluster.
    pub ami_id: Option<String>,
    /// Script run by cloud-init on node startup. With the default AMI it runs before the default
    /// bootstrap, with a custom AMI it is the only user data.
    pub user_data: Option<String>,
    pub instance_types: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
}

impl NodegroupBase {
    /// Consume the shared nodegroup keys from `raw`.
    pub fn base_load(raw: &mut RawConfig) -> Result<Self> {
        Ok(Self {
            ssm_agent: raw.required("ssm_agent")?,
            disk_size: raw.required("disk_size")?,
            key_name: raw.optional("key_name")?,
            min_size: raw.required("min_size")?,
            max_size: raw.required("max_size")?,
            ami_id: raw.optional("ami_id")?,
            user_data: raw.optional("user_data")?,
            instance_types: raw.required("instance_types")?,
            labels: raw.required("labels")?,
            tags: raw.required("tags")?,
        })
    }

    pub fn has_custom_ami(&self) -> bool {
        self.ami_id.as_deref().map_or(false, |ami| !ami.is_empty())
    }

    pub fn has_user_data(&self) -> bool {
        self.user_data
            .as_deref()
            .map_or(false, |user_data| !user_data.is_empty())
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ManagedNodegroup {
    #[serde(flatten)]
    pub base: NodegroupBase,
    /// Use spot instances. This may affect the availability of the nodegroup.
    pub spot: bool,
    pub desired_size: u32,
}

impl ManagedNodegroup {
    /// Load a managed nodegroup. Fails if `raw` holds any key that is not a managed nodegroup
    /// setting.
    pub fn load(raw: &mut RawConfig) -> Result<Self> {
        let nodegroup = Self {
            base: NodegroupBase::base_load(raw)?,
            spot: raw.required("spot")?,
            desired_size: raw.required("desired_size")?,
        };
        check_leavins(NodegroupKind::Managed.item(), raw.context(), raw)?;
        debug!("Loaded managed nodegroup at {}", raw.context());
        Ok(nodegroup)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct UnmanagedNodegroup {
    #[serde(flatten)]
    pub base: NodegroupBase,
    /// Set up GPU instance support.
    pub gpu: bool,
    pub imdsv2_required: bool,
    pub taints: BTreeMap<String, String>,
    pub ingress_ports: Vec<IngressRule>,
}

impl UnmanagedNodegroup {
    /// Load an unmanaged nodegroup. Fails if `raw` holds any key that is not an unmanaged
    /// nodegroup setting.
    pub fn load(raw: &mut RawConfig) -> Result<Self> {
        let base = NodegroupBase::base_load(raw)?;
        let gpu = raw.required("gpu")?;
        let imdsv2_required = raw.required("imdsv2_required")?;
        let taints = raw.optional_or_default("taints")?;
        let ingress_ports = raw.required_value("ingress_ports")?;
        let nodegroup = Self {
            base,
            gpu,
            imdsv2_required,
            taints,
            ingress_ports: IngressRule::load_rules(raw.context(), &ingress_ports)?,
        };
        check_leavins(NodegroupKind::Unmanaged.item(), raw.context(), raw)?;
        debug!("Loaded unmanaged nodegroup at {}", raw.context());
        Ok(nodegroup)
    }
}

/// A borrowed view of either kind of nodegroup.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Nodegroup<'a> {
    Managed(&'a ManagedNodegroup),
    Unmanaged(&'a UnmanagedNodegroup),
}

impl<'a> Nodegroup<'a> {
    pub fn kind(&self) -> NodegroupKind {
        match self {
            Self::Managed(_) => NodegroupKind::Managed,
            Self::Unmanaged(_) => NodegroupKind::Unmanaged,
        }
    }

    pub fn base(&self) -> &'a NodegroupBase {
        match self {
            Self::Managed(nodegroup) => &nodegroup.base,
            Self::Unmanaged(nodegroup) => &nodegroup.base,
        }
    }

    /// Whether any option is set that relies on the bootstrap behavior of the default EKS AMI.
    pub fn uses_default_ami_options(&self) -> bool {
        let base = self.base();
        let shared = base.ssm_agent || !base.labels.is_empty();
        match self {
            Self::Managed(_) => shared,
            Self::Unmanaged(nodegroup) => shared || !nodegroup.taints.is_empty(),
        }
    }

    /// Append every problem with this nodegroup to `issues`.
    pub(crate) fn check(&self, name: &str, issues: &mut Vec<ValidationIssue>) {
        let base = self.base();
        let kind = self.kind();
        if base.has_custom_ami() {
            if !base.has_user_data() {
                issues.push(ValidationIssue::MissingUserData {
                    kind,
                    name: name.to_string(),
                });
            }
            if self.uses_default_ami_options() {
                issues.push(ValidationIssue::IncompatibleAmiOptions {
                    kind,
                    name: name.to_string(),
                });
            }
        }
        if let Self::Managed(nodegroup) = self {
            if nodegroup.base.min_size == 0 {
                issues.push(ValidationIssue::ManagedMinSizeZero {
                    name: name.to_string(),
                });
            }
        }
    }
}
