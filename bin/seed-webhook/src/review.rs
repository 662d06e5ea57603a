//! Translation between Kubernetes AdmissionReview and the seed handler

use kplane_admission::{AdmissionRequest, Operation, SeedAdmissionHandler};
use kplane_api::Seed;
use kube::api::DynamicObject;
use kube::core::admission::{
    AdmissionRequest as KubeAdmissionRequest, AdmissionResponse as KubeAdmissionResponse,
    AdmissionReview, Operation as KubeOperation,
};
use tracing::{debug, error};

fn operation(op: &KubeOperation) -> Option<Operation> {
    match op {
        KubeOperation::Create => Some(Operation::Create),
        KubeOperation::Update => Some(Operation::Update),
        KubeOperation::Delete => Some(Operation::Delete),
        KubeOperation::Connect => None,
    }
}

pub async fn review(
    handler: &SeedAdmissionHandler,
    review: AdmissionReview<Seed>,
) -> AdmissionReview<DynamicObject> {
    let request: KubeAdmissionRequest<Seed> = match review.try_into() {
        Ok(request) => request,
        Err(e) => {
            error!(error = %e, "Failed to parse admission request");
            return KubeAdmissionResponse::invalid(e.to_string()).into_review();
        }
    };
    let response = KubeAdmissionResponse::from(&request);

    let Some(op) = operation(&request.operation) else {
        debug!(uid = %request.uid, "Ignoring connect operation");
        return response.into_review();
    };

    // Deletions carry the seed only as the old object
    let proposed = match op {
        Operation::Delete => request.old_object.clone(),
        _ => request.object.clone(),
    };
    let Some(proposed_object) = proposed else {
        return response
            .deny(format!("{} request for seed {:?} carries no object", op, request.name))
            .into_review();
    };

    let decision = handler
        .review(AdmissionRequest {
            operation: op,
            proposed_object,
            previous_object: request.old_object,
        })
        .await;

    if decision.allowed {
        response.into_review()
    } else {
        response
            .deny(decision.message.unwrap_or_default())
            .into_review()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kplane_admission::{StaticClusters, StaticSeeds};
    use kplane_api::v1::{CloudSpec, ClusterSpec};
    use kplane_api::Cluster;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    fn seed_json() -> Value {
        json!({
            "apiVersion": "kplane.io/v1",
            "kind": "Seed",
            "metadata": { "name": "existing-seed", "namespace": "kplane" },
            "spec": { "datacenters": { "dc1": { "spec": { "fake": {} } } } }
        })
    }

    fn admission_review(operation: &str, object: Value, old_object: Value) -> AdmissionReview<Seed> {
        serde_json::from_value(json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
                "kind": { "group": "kplane.io", "version": "v1", "kind": "Seed" },
                "resource": { "group": "kplane.io", "version": "v1", "resource": "seeds" },
                "name": "existing-seed",
                "namespace": "kplane",
                "operation": operation,
                "userInfo": { "username": "admin" },
                "object": object,
                "oldObject": old_object,
                "dryRun": false
            }
        }))
        .expect("valid admission review")
    }

    fn handler(clusters: Vec<Cluster>) -> SeedAdmissionHandler {
        let seed: Seed = serde_json::from_value(seed_json()).unwrap();
        let mut seeds = BTreeMap::new();
        seeds.insert("existing-seed".to_string(), seed);
        SeedAdmissionHandler::new(
            Arc::new(StaticSeeds(seeds)),
            Arc::new(StaticClusters(clusters)),
            Duration::from_secs(1),
        )
    }

    fn cluster_in(datacenter: &str) -> Cluster {
        Cluster::new(
            "c1",
            ClusterSpec {
                cloud: CloudSpec {
                    datacenter_name: datacenter.to_string(),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_delete_of_used_seed_is_denied() {
        let review = review(
            &handler(vec![cluster_in("dc1")]),
            admission_review("DELETE", Value::Null, seed_json()),
        )
        .await;
        let body = serde_json::to_value(&review).unwrap();
        assert_eq!(body["response"]["allowed"], false);
        assert_eq!(body["response"]["uid"], "705ab4f5-6393-11e8-b7cc-42010a800002");
        assert!(body.to_string().contains("dc1"));
    }

    #[tokio::test]
    async fn test_update_adding_datacenter_is_allowed() {
        let mut grown = seed_json();
        grown["spec"]["datacenters"]["dc2"] = json!({ "spec": { "fake": {} } });
        let review = review(
            &handler(vec![cluster_in("dc1")]),
            admission_review("UPDATE", grown, seed_json()),
        )
        .await;
        let body = serde_json::to_value(&review).unwrap();
        assert_eq!(body["response"]["allowed"], true);
    }

    #[tokio::test]
    async fn test_review_without_request_is_invalid() {
        let empty: AdmissionReview<Seed> = serde_json::from_value(json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview"
        }))
        .unwrap();
        let review = review(&handler(vec![]), empty).await;
        let body = serde_json::to_value(&review).unwrap();
        assert_eq!(body["response"]["allowed"], false);
    }
}
