//! Admission-time validation of the seed topology
//!
//! This library provides:
//! - A generic fail-fast validation chain with a bounded admission window
//! - The seed topology checks guarding datacenter names, providers and references
//! - The single-seed constraint
//! - Prometheus metrics for admission decisions

pub mod chain;
pub mod metrics;
pub mod seed;

pub use chain::{from_fn, AdmissionContext, FnValidator, Operation, Validate, ValidationChain};
pub use metrics::AdmissionMetrics;
pub use seed::{
    AdmissionRequest, AdmissionResponse, ClusterQuery, SeedAdmission, SeedAdmissionHandler,
    SeedQuery, SeedValidator, SingleSeedValidator, StaticClusters, StaticSeeds,
    DEFAULT_SEED_NAME,
};
