//! Merge rendered objects into their live counterparts.
//!
//! Fields the cluster allocates or other controllers own survive a re-render:
//! resourceVersion, uid, creation timestamp, foreign owner references, labels
//! and annotations we do not set, a service's cluster IP and its node ports.

use crate::template::TemplateData;
use k8s_openapi::api::core::v1::{Service, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Resource;
use std::collections::BTreeMap;

/// Metadata for an object named `name` in the control plane namespace
pub fn object_meta(
    data: &TemplateData,
    name: &str,
    labels: BTreeMap<String, String>,
    existing: Option<&ObjectMeta>,
) -> ObjectMeta {
    let mut meta = existing.cloned().unwrap_or_default();
    meta.name = Some(name.to_string());
    meta.namespace = Some(data.namespace());
    meta.managed_fields = None;

    let mut merged = meta.labels.take().unwrap_or_default();
    merged.extend(labels);
    meta.labels = Some(merged);

    if let Some(owner) = data.cluster().controller_owner_ref(&()) {
        let mut refs = meta.owner_references.take().unwrap_or_default();
        match refs.iter_mut().find(|r| r.uid == owner.uid) {
            Some(current) => *current = owner,
            None => refs.push(owner),
        }
        meta.owner_references = Some(refs);
    }
    meta
}

/// Carry allocated addresses and node ports from the live service over
pub fn service_spec(mut desired: ServiceSpec, existing: Option<&Service>) -> ServiceSpec {
    let Some(live) = existing.and_then(|s| s.spec.as_ref()) else {
        return desired;
    };

    if desired.cluster_ip.is_none() {
        desired.cluster_ip = live.cluster_ip.clone();
        desired.cluster_ips = live.cluster_ips.clone();
    }

    if desired.type_.as_deref() != Some("ClusterIP") {
        let live_ports = live.ports.as_deref().unwrap_or_default();
        for port in desired.ports.iter_mut().flatten() {
            if port.node_port.is_some() {
                continue;
            }
            port.node_port = live_ports
                .iter()
                .find(|p| p.name == port.name)
                .and_then(|p| p.node_port);
        }
    }
    desired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use k8s_openapi::api::core::v1::ServicePort;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{OwnerReference, Time};

    #[test]
    fn test_object_meta_keeps_server_fields() {
        let data = testing::template_data(testing::aws_cloud(), "1.9.0");
        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), "apiserver".to_string());
        labels.insert("team".to_string(), "ours".to_string());

        let existing = ObjectMeta {
            resource_version: Some("42".to_string()),
            uid: Some("abc".to_string()),
            creation_timestamp: Some(Time(Default::default())),
            labels: Some(BTreeMap::from([
                ("team".to_string(), "theirs".to_string()),
                ("extra".to_string(), "kept".to_string()),
            ])),
            annotations: Some(BTreeMap::from([("note".to_string(), "kept".to_string())])),
            owner_references: Some(vec![OwnerReference {
                api_version: "v1".to_string(),
                kind: "ConfigMap".to_string(),
                name: "other".to_string(),
                uid: "other-uid".to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        };

        let meta = object_meta(&data, "apiserver", labels, Some(&existing));
        assert_eq!(meta.resource_version.as_deref(), Some("42"));
        assert_eq!(meta.uid.as_deref(), Some("abc"));
        assert!(meta.creation_timestamp.is_some());

        let labels = meta.labels.unwrap();
        assert_eq!(labels["team"], "ours");
        assert_eq!(labels["extra"], "kept");
        assert_eq!(meta.annotations.unwrap()["note"], "kept");

        let owners = meta.owner_references.unwrap();
        assert_eq!(owners.len(), 2);
        assert_eq!(owners[1].uid, "1234567890");
        assert_eq!(owners[1].kind, "Cluster");
    }

    #[test]
    fn test_service_spec_keeps_allocations() {
        let desired = ServiceSpec {
            type_: Some("NodePort".to_string()),
            ports: Some(vec![ServicePort {
                name: Some("openvpn".to_string()),
                port: 1194,
                ..Default::default()
            }]),
            ..Default::default()
        };
        let live = Service {
            spec: Some(ServiceSpec {
                cluster_ip: Some("10.10.10.77".to_string()),
                ports: Some(vec![ServicePort {
                    name: Some("openvpn".to_string()),
                    port: 1194,
                    node_port: Some(31194),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = service_spec(desired, Some(&live));
        assert_eq!(merged.cluster_ip.as_deref(), Some("10.10.10.77"));
        assert_eq!(merged.ports.unwrap()[0].node_port, Some(31194));
    }
}
