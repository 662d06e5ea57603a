//! Control plane compiler
//!
//! This library turns a Cluster and its Datacenter into the objects hosting
//! the cluster's control plane, and turns node requests into Machine
//! manifests:
//! - `creator`: the component set, object identities and `compile_all`
//! - one module per component family rendering deployments, config maps
//!   and services
//! - `machine`: worker manifests for the machine-controller
//!
//! Creators are pure functions of their [`TemplateData`]; the same input
//! always renders byte-identical objects.

pub mod apiserver;
pub mod cloud_config;
pub mod controller_manager;
pub mod creator;
pub mod machine;
pub mod machine_controller;
pub mod merge;
pub mod names;
pub mod openvpn;
pub mod pod;
pub mod prometheus;
pub mod scheduler;
pub mod template;

/// Sample clusters and snapshots for this crate's unit and fixture tests
#[doc(hidden)]
pub mod testing;

pub use creator::{
    compile_all, create, Component, ConfigMapCreator, ControlPlaneObject, DeploymentCreator,
    ObjectIdentity, ObjectKind, ServiceCreator,
};
pub use template::{TemplateData, TemplateOptions};
