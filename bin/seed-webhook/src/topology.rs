//! Live seed and cluster queries against the Kubernetes API

use async_trait::async_trait;
use kplane_admission::{ClusterQuery, SeedQuery};
use kplane_api::{Cluster, Seed};
use kplane_core::Result;
use kube::api::{Api, ListParams};
use kube::Client;
use std::collections::BTreeMap;
use tracing::debug;

/// Reads seeds from one namespace and clusters from the whole cluster
#[derive(Clone)]
pub struct KubeTopology {
    client: Client,
    seed_namespace: String,
}

impl KubeTopology {
    pub fn new(client: Client, seed_namespace: impl Into<String>) -> Self {
        Self {
            client,
            seed_namespace: seed_namespace.into(),
        }
    }
}

#[async_trait]
impl ClusterQuery for KubeTopology {
    async fn clusters(&self) -> Result<Vec<Cluster>> {
        let api: Api<Cluster> = Api::all(self.client.clone());
        let clusters = api.list(&ListParams::default()).await?.items;
        debug!(count = clusters.len(), "Listed clusters");
        Ok(clusters)
    }
}

#[async_trait]
impl SeedQuery for KubeTopology {
    async fn seeds(&self) -> Result<BTreeMap<String, Seed>> {
        let api: Api<Seed> = Api::namespaced(self.client.clone(), &self.seed_namespace);
        let seeds = api.list(&ListParams::default()).await?.items;
        debug!(namespace = %self.seed_namespace, count = seeds.len(), "Listed seeds");
        Ok(seeds
            .into_iter()
            .map(|seed| (seed.seed_name().to_string(), seed))
            .collect())
    }
}
