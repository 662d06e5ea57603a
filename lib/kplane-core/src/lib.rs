//! Core building blocks shared by the compiler and the admission webhook
//!
//! This library provides:
//! - The error taxonomy every kplane crate reports through
//! - Kubernetes version parsing and feature gates
//! - Read-only snapshot listers over secrets, config maps and services
//! - The datacenter catalog with email-domain access filtering
//! - Project service accounts

pub mod datacenter;
pub mod error;
pub mod service_account;
pub mod snapshot;
pub mod version;

pub use datacenter::DatacenterCatalog;
pub use error::{ConfigurationError, CoreError, Result};
pub use service_account::{ServiceAccountRole, ServiceAccountStore};
pub use snapshot::{Lister, Listers, SnapshotStore};
pub use version::KubernetesVersion;
