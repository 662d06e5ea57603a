//! kplane API types and CRDs for Kubernetes integration
//!
//! This library defines the resources the control-plane compiler and the
//! seed admission webhook work on:
//! - Cluster: a tenant's hosted control plane bound to one datacenter
//! - Seed: a region owning a set of datacenters
//! - UserSSHKey: public keys authorized for a list of clusters
//! - Machine: the worker manifest handed to the machine-controller
//!
//! Provider-specific payloads travel on the wire as objects with one optional
//! field per provider. `provider()` on each of them is the only way to obtain
//! the tagged Rust enum, and it enforces that exactly one field is set.

pub mod provider;
pub mod v1;

pub use provider::{exactly_one, ProviderKind, UnionError};
pub use v1::{Cluster, Machine, Seed, UserSshKey};
