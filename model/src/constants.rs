/// Helper macro to avoid retyping the dotted location of the eks section when creating further
/// context names from it. When given no parameters, this returns the location of the eks section.
/// When given a string literal parameter it adds `.parameter` to the end.
macro_rules! eks_context {
    () => {
        "config.eks"
    };
    ($s:literal) => {
        concat!(eks_context!(), ".", $s)
    };
}

// Schema versions
pub const SCHEMA_0_0_0: &str = "0.0.0";
pub const SCHEMA_0_0_1: &str = "0.0.1";
pub const CURRENT_SCHEMA_VERSION: &str = SCHEMA_0_0_1;

// Document keys
pub const SCHEMA_KEY: &str = "schema";
pub const EKS_KEY: &str = "eks";

// Error contexts
pub const EKS_CONTEXT: &str = eks_context!();
pub const MANAGED_NODEGROUPS_CONTEXT: &str = eks_context!("managed_nodegroups");
pub const UNMANAGED_NODEGROUPS_CONTEXT: &str = eks_context!("unmanaged_nodegroups");

// Item labels for leftover key errors
pub const MANAGED_NODEGROUP_ITEM: &str = "managed nodegroup attribute";
pub const UNMANAGED_NODEGROUP_ITEM: &str = "unmanaged nodegroup attribute";
pub const INGRESS_RULE_ITEM: &str = "ingress rule attribute";
