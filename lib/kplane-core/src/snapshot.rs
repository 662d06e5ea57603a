//! Read-only views over cluster objects the compiler depends on
//!
//! Creators never talk to the API server. They read secrets, config maps and
//! services through a [`Lister`], which is either a [`SnapshotStore`] filled
//! by the caller or the reflector cache of an external controller.

use crate::{CoreError, Result};
use dashmap::DashMap;
use k8s_openapi::api::core::v1::{ConfigMap, Secret, Service};
use kube::Resource;
use kube_runtime::reflector::{ObjectRef, Store};
use std::hash::Hash;
use std::sync::Arc;

/// Synchronous lookup of a namespaced object
pub trait Lister<K>: Send + Sync {
    fn get(&self, namespace: &str, name: &str) -> Option<Arc<K>>;
}

/// In-memory snapshot keyed by `(namespace, name)`
pub struct SnapshotStore<K> {
    objects: DashMap<(String, String), Arc<K>>,
}

impl<K: Resource> SnapshotStore<K> {
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
        }
    }

    /// Build a store from a fixed set of objects
    pub fn from_objects(objects: impl IntoIterator<Item = K>) -> Self {
        let store = Self::new();
        for object in objects {
            store.insert(object);
        }
        store
    }

    /// Insert or replace an object; objects without a name are ignored
    pub fn insert(&self, object: K) {
        let meta = object.meta();
        let Some(name) = meta.name.clone() else {
            return;
        };
        let namespace = meta.namespace.clone().unwrap_or_default();
        self.objects.insert((namespace, name), Arc::new(object));
    }

    pub fn remove(&self, namespace: &str, name: &str) {
        self.objects.remove(&(namespace.to_string(), name.to_string()));
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl<K: Resource> Default for SnapshotStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Send + Sync> Lister<K> for SnapshotStore<K> {
    fn get(&self, namespace: &str, name: &str) -> Option<Arc<K>> {
        self.objects
            .get(&(namespace.to_string(), name.to_string()))
            .map(|entry| Arc::clone(entry.value()))
    }
}

impl<K> Lister<K> for Store<K>
where
    K: Resource + Clone + Send + Sync + 'static,
    K::DynamicType: Default + Eq + Hash + Clone + Send + Sync,
{
    fn get(&self, namespace: &str, name: &str) -> Option<Arc<K>> {
        Store::get(self, &ObjectRef::new(name).within(namespace))
    }
}

/// The listers a template context reads from
#[derive(Clone)]
pub struct Listers {
    pub secrets: Arc<dyn Lister<Secret>>,
    pub config_maps: Arc<dyn Lister<ConfigMap>>,
    pub services: Arc<dyn Lister<Service>>,
}

impl Listers {
    pub fn new(
        secrets: Arc<dyn Lister<Secret>>,
        config_maps: Arc<dyn Lister<ConfigMap>>,
        services: Arc<dyn Lister<Service>>,
    ) -> Self {
        Self {
            secrets,
            config_maps,
            services,
        }
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Result<Arc<Secret>> {
        self.secrets
            .get(namespace, name)
            .ok_or_else(|| missing("Secret", namespace, name))
    }

    pub fn config_map(&self, namespace: &str, name: &str) -> Result<Arc<ConfigMap>> {
        self.config_maps
            .get(namespace, name)
            .ok_or_else(|| missing("ConfigMap", namespace, name))
    }

    pub fn service(&self, namespace: &str, name: &str) -> Result<Arc<Service>> {
        self.services
            .get(namespace, name)
            .ok_or_else(|| missing("Service", namespace, name))
    }
}

fn missing(kind: &'static str, namespace: &str, name: &str) -> CoreError {
    CoreError::MissingSnapshot {
        kind,
        namespace: namespace.to_string(),
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn secret(namespace: &str, name: &str) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                resource_version: Some("123456".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_snapshot_store_lookup() {
        let store = SnapshotStore::from_objects([secret("cluster-a", "ca-cert")]);
        let found = Lister::get(&store, "cluster-a", "ca-cert").unwrap();
        assert_eq!(found.metadata.resource_version.as_deref(), Some("123456"));
        assert!(Lister::get(&store, "cluster-b", "ca-cert").is_none());
    }

    #[test]
    fn test_missing_object_is_a_precondition_failure() {
        let listers = Listers::new(
            Arc::new(SnapshotStore::<Secret>::new()),
            Arc::new(SnapshotStore::<ConfigMap>::new()),
            Arc::new(SnapshotStore::<Service>::new()),
        );
        let err = listers.secret("cluster-a", "ca-cert").unwrap_err();
        assert!(matches!(err, CoreError::MissingSnapshot { kind: "Secret", .. }));
        assert_eq!(err.status_code(), 412);
    }

    #[test]
    fn test_reflector_store_implements_lister() {
        let (reader, mut writer) = kube_runtime::reflector::store::<Secret>();
        writer.apply_watcher_event(&kube_runtime::watcher::Event::Apply(secret(
            "cluster-a",
            "tokens",
        )));
        assert!(Lister::get(&reader, "cluster-a", "tokens").is_some());
        assert!(Lister::get(&reader, "cluster-a", "other").is_none());
    }
}
