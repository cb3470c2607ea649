/*!

This library provides the typed EKS cluster configuration model, the loaders that migrate older
configuration schemas to it, and the validation that every loaded configuration passes through.

!*/

#![deny(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

pub use document::ConfigDocument;
pub use eks::{Eks, EksSettings, ValidationIssue};
pub use error::{Error, Result};
pub use ingress::{IngressRule, Protocol};
pub use loader::{check_leavins, from_loader, RawConfig};
pub use migration::{
    from_0_0_0, from_0_0_1, known_versions, load_eks, migration_for, Migration, MIGRATIONS,
};
pub use nodegroup::{
    ManagedNodegroup, Nodegroup, NodegroupBase, NodegroupKind, UnmanagedNodegroup,
};

pub mod constants;
mod document;
mod eks;
mod error;
mod ingress;
mod loader;
mod migration;
mod nodegroup;
