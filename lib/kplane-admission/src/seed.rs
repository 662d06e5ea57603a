//! Seed topology validation
//!
//! Guards the seed -> datacenter graph the control plane compiler trusts.
//! Checks run in a fixed order and the first failure rejects the request:
//!
//! 1. every datacenter resolves to exactly one provider
//! 2. datacenters that existed before keep their provider
//! 3. datacenter names are unique across all seeds
//! 4. removed datacenters are not referenced by any cluster
//! 5. a deleted seed leaves no cluster without its datacenter
//!
//! Checks 1-4 apply to create and update, check 5 to delete only.

use async_trait::async_trait;
use kplane_api::{Cluster, Seed};
use kplane_core::{ConfigurationError, CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::chain::{AdmissionContext, Operation, Validate, ValidationChain};
use crate::metrics::AdmissionMetrics;

/// The only seed name accepted when the platform runs with a single seed
pub const DEFAULT_SEED_NAME: &str = "kplane";

/// Read access to the clusters of the platform
#[async_trait]
pub trait ClusterQuery: Send + Sync {
    async fn clusters(&self) -> Result<Vec<Cluster>>;
}

/// Read access to all seeds, keyed by name
#[async_trait]
pub trait SeedQuery: Send + Sync {
    async fn seeds(&self) -> Result<BTreeMap<String, Seed>>;
}

/// Fixed set of clusters
#[derive(Clone, Debug, Default)]
pub struct StaticClusters(pub Vec<Cluster>);

#[async_trait]
impl ClusterQuery for StaticClusters {
    async fn clusters(&self) -> Result<Vec<Cluster>> {
        Ok(self.0.clone())
    }
}

/// Fixed set of seeds
#[derive(Clone, Debug, Default)]
pub struct StaticSeeds(pub BTreeMap<String, Seed>);

#[async_trait]
impl SeedQuery for StaticSeeds {
    async fn seeds(&self) -> Result<BTreeMap<String, Seed>> {
        Ok(self.0.clone())
    }
}

/// A seed under admission together with the topology it lands in
#[derive(Clone, Debug, Default)]
pub struct SeedAdmission {
    pub seed: Seed,
    pub previous: Option<Seed>,
    pub existing_seeds: BTreeMap<String, Seed>,
}

impl SeedAdmission {
    /// The seed as it was before this request
    pub fn previous_seed(&self) -> Option<&Seed> {
        self.previous
            .as_ref()
            .or_else(|| self.existing_seeds.get(self.seed.seed_name()))
    }

    /// Seeds other than the one under admission
    pub fn other_seeds(&self) -> impl Iterator<Item = (&str, &Seed)> {
        let name = self.seed.seed_name();
        self.existing_seeds
            .iter()
            .filter(move |(key, _)| key.as_str() != name)
            .map(|(key, seed)| (key.as_str(), seed))
    }
}

pub struct DatacenterProviders;

#[async_trait]
impl Validate<SeedAdmission> for DatacenterProviders {
    fn name(&self) -> &'static str {
        "datacenter-providers"
    }

    async fn validate(&self, _ctx: &AdmissionContext, admission: &SeedAdmission, op: Operation) -> Result<()> {
        if op == Operation::Delete {
            return Ok(());
        }
        for (name, datacenter) in &admission.seed.spec.datacenters {
            datacenter
                .spec
                .provider()
                .map_err(|source| ConfigurationError::Datacenter {
                    datacenter: name.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

pub struct ImmutableProviders;

#[async_trait]
impl Validate<SeedAdmission> for ImmutableProviders {
    fn name(&self) -> &'static str {
        "immutable-providers"
    }

    async fn validate(&self, _ctx: &AdmissionContext, admission: &SeedAdmission, op: Operation) -> Result<()> {
        if op == Operation::Delete {
            return Ok(());
        }
        let Some(previous) = admission.previous_seed() else {
            return Ok(());
        };

        for (name, datacenter) in &admission.seed.spec.datacenters {
            let Some(before) = previous.spec.datacenters.get(name) else {
                continue;
            };
            // A previously broken union may be repaired to any provider
            let (Ok(before), Ok(after)) = (before.spec.provider(), datacenter.spec.provider()) else {
                continue;
            };
            if before.kind() != after.kind() {
                return Err(CoreError::Immutability(format!(
                    "cannot change datacenter {:?} provider from {} to {}",
                    name,
                    before.kind(),
                    after.kind()
                )));
            }
        }
        Ok(())
    }
}

pub struct UniqueDatacenterNames;

#[async_trait]
impl Validate<SeedAdmission> for UniqueDatacenterNames {
    fn name(&self) -> &'static str {
        "unique-datacenter-names"
    }

    async fn validate(&self, _ctx: &AdmissionContext, admission: &SeedAdmission, op: Operation) -> Result<()> {
        if op == Operation::Delete {
            return Ok(());
        }
        for name in admission.seed.datacenter_names() {
            if let Some((owner, _)) = admission.other_seeds().find(|(_, s)| s.has_datacenter(name)) {
                return Err(CoreError::Duplicate(format!(
                    "datacenter {:?} already exists in seed {:?}",
                    name, owner
                )));
            }
        }
        Ok(())
    }
}

pub struct NoOrphanedDatacenters {
    clusters: Arc<dyn ClusterQuery>,
}

#[async_trait]
impl Validate<SeedAdmission> for NoOrphanedDatacenters {
    fn name(&self) -> &'static str {
        "no-orphaned-datacenters"
    }

    async fn validate(&self, ctx: &AdmissionContext, admission: &SeedAdmission, op: Operation) -> Result<()> {
        if op == Operation::Delete {
            return Ok(());
        }
        let Some(previous) = admission.previous_seed() else {
            return Ok(());
        };
        let removed: BTreeSet<&str> = previous
            .datacenter_names()
            .filter(|name| !admission.seed.has_datacenter(name))
            .collect();
        if removed.is_empty() {
            return Ok(());
        }

        let clusters = ctx.guard("list clusters", self.clusters.clusters()).await?;
        for cluster in &clusters {
            if removed.contains(cluster.datacenter_name()) {
                return Err(CoreError::ReferentialIntegrity(format!(
                    "cannot remove datacenter {:?} from seed {:?}: still used by cluster {:?}",
                    cluster.datacenter_name(),
                    admission.seed.seed_name(),
                    cluster.cluster_name()
                )));
            }
        }
        Ok(())
    }
}

pub struct SeedDeletion {
    clusters: Arc<dyn ClusterQuery>,
}

#[async_trait]
impl Validate<SeedAdmission> for SeedDeletion {
    fn name(&self) -> &'static str {
        "seed-deletion"
    }

    async fn validate(&self, ctx: &AdmissionContext, admission: &SeedAdmission, op: Operation) -> Result<()> {
        if op != Operation::Delete {
            return Ok(());
        }
        let owned_elsewhere: BTreeSet<&str> = admission
            .other_seeds()
            .flat_map(|(_, seed)| seed.datacenter_names())
            .collect();
        let previous = admission.previous_seed();

        let clusters = ctx.guard("list clusters", self.clusters.clusters()).await?;
        for cluster in &clusters {
            let datacenter = cluster.datacenter_name();
            let owned_here = admission.seed.has_datacenter(datacenter)
                || previous.map_or(false, |p| p.has_datacenter(datacenter));
            if owned_here || !owned_elsewhere.contains(datacenter) {
                return Err(CoreError::ReferentialIntegrity(format!(
                    "cannot delete seed {:?}: cluster {:?} still uses datacenter {:?}",
                    admission.seed.seed_name(),
                    cluster.cluster_name(),
                    datacenter
                )));
            }
        }
        Ok(())
    }
}

/// The seed topology checks in their fixed order
pub struct SeedValidator {
    chain: ValidationChain<SeedAdmission>,
}

impl SeedValidator {
    pub fn new(clusters: Arc<dyn ClusterQuery>) -> Self {
        let chain = ValidationChain::new("seed")
            .add(DatacenterProviders)
            .add(ImmutableProviders)
            .add(UniqueDatacenterNames)
            .add(NoOrphanedDatacenters {
                clusters: clusters.clone(),
            })
            .add(SeedDeletion { clusters });
        Self { chain }
    }
}

#[async_trait]
impl Validate<SeedAdmission> for SeedValidator {
    fn name(&self) -> &'static str {
        "seed-topology"
    }

    async fn validate(&self, ctx: &AdmissionContext, admission: &SeedAdmission, op: Operation) -> Result<()> {
        if admission.seed.is_empty() {
            debug!(%op, "Empty seed, nothing to validate");
            return Ok(());
        }
        self.chain.validate(ctx, admission, op).await
    }
}

/// Allows exactly one seed, named [`DEFAULT_SEED_NAME`], in one namespace
pub struct SingleSeedValidator {
    namespace: String,
}

impl SingleSeedValidator {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl Validate<SeedAdmission> for SingleSeedValidator {
    fn name(&self) -> &'static str {
        "single-seed"
    }

    async fn validate(&self, _ctx: &AdmissionContext, admission: &SeedAdmission, op: Operation) -> Result<()> {
        if op == Operation::Delete {
            return Ok(());
        }
        let seed = &admission.seed;
        let namespace = seed.metadata.namespace.as_deref().unwrap_or_default();
        if seed.seed_name() != DEFAULT_SEED_NAME || namespace != self.namespace {
            return Err(CoreError::BadRequest(format!(
                "seed {:?} in namespace {:?} is not allowed: only {:?} in namespace {:?} is supported",
                seed.seed_name(),
                namespace,
                DEFAULT_SEED_NAME,
                self.namespace
            )));
        }
        Ok(())
    }
}

/// Admission request for a seed
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub operation: Operation,
    pub proposed_object: Seed,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_object: Option<Seed>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdmissionResponse {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AdmissionResponse {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            message: None,
        }
    }

    pub fn deny(message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            message: Some(message.into()),
        }
    }
}

/// Decides seed admission requests against the live topology
pub struct SeedAdmissionHandler {
    seeds: Arc<dyn SeedQuery>,
    validator: ValidationChain<SeedAdmission>,
    timeout: Duration,
    metrics: Option<AdmissionMetrics>,
}

impl SeedAdmissionHandler {
    pub fn new(seeds: Arc<dyn SeedQuery>, clusters: Arc<dyn ClusterQuery>, timeout: Duration) -> Self {
        Self {
            seeds,
            validator: ValidationChain::new("seed-admission").add(SeedValidator::new(clusters)),
            timeout,
            metrics: None,
        }
    }

    /// Additionally restrict the platform to a single seed in `namespace`
    pub fn with_single_seed(mut self, namespace: impl Into<String>) -> Self {
        self.validator = self.validator.add(SingleSeedValidator::new(namespace));
        self
    }

    pub fn with_metrics(mut self, metrics: AdmissionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn review(&self, request: AdmissionRequest) -> AdmissionResponse {
        let ctx = AdmissionContext::new(self.timeout);
        self.review_with(&ctx, request).await
    }

    /// Review within a caller supplied admission window
    pub async fn review_with(&self, ctx: &AdmissionContext, request: AdmissionRequest) -> AdmissionResponse {
        let started = Instant::now();
        let op = request.operation;
        let seed_name = request.proposed_object.seed_name().to_string();

        let result = self.decide(ctx, request).await;
        let allowed = result.is_ok();
        if let Some(metrics) = &self.metrics {
            metrics.observe(op, allowed, started.elapsed());
            if matches!(result, Err(CoreError::Validation(_))) {
                metrics.query_failures_total.inc();
            }
        }

        match result {
            Ok(()) => {
                info!(seed = %seed_name, %op, "Seed admitted");
                AdmissionResponse::allow()
            }
            Err(err) => {
                warn!(seed = %seed_name, %op, error = %err, "Seed rejected");
                AdmissionResponse::deny(err.to_string())
            }
        }
    }

    async fn decide(&self, ctx: &AdmissionContext, request: AdmissionRequest) -> Result<()> {
        let existing_seeds = ctx.guard("list seeds", self.seeds.seeds()).await?;
        let admission = SeedAdmission {
            seed: request.proposed_object,
            previous: request.previous_object,
            existing_seeds,
        };
        self.validator.validate(ctx, &admission, request.operation).await
    }
}
