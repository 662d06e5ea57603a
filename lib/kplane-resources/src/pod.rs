//! Building blocks shared by the deployment creators

use crate::merge;
use crate::names::*;
use crate::template::TemplateData;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, PodSpec, ResourceRequirements, SecretVolumeSource, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kplane_core::{KubernetesVersion, Result};
use std::collections::BTreeMap;

const KUBECONFIG_MOUNT_PATH: &str = "/etc/kubernetes/kubeconfig";

pub fn app_labels(data: &TemplateData, app: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (APP_LABEL_KEY.to_string(), app.to_string()),
        (CLUSTER_LABEL_KEY.to_string(), data.cluster_name().to_string()),
    ])
}

pub fn secret_volume(secret: &str) -> Volume {
    Volume {
        name: secret.to_string(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(secret.to_string()),
            default_mode: Some(0o644),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn config_map_volume(config_map: &str) -> Volume {
    Volume {
        name: config_map.to_string(),
        config_map: Some(ConfigMapVolumeSource {
            name: config_map.to_string(),
            default_mode: Some(0o644),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn mount(volume: &str, path: &str) -> VolumeMount {
    VolumeMount {
        name: volume.to_string(),
        mount_path: path.to_string(),
        read_only: Some(true),
        ..Default::default()
    }
}

pub fn resources(cpu: &str, memory: &str, memory_limit: &str) -> ResourceRequirements {
    ResourceRequirements {
        requests: Some(BTreeMap::from([
            ("cpu".to_string(), Quantity(cpu.to_string())),
            ("memory".to_string(), Quantity(memory.to_string())),
        ])),
        limits: Some(BTreeMap::from([(
            "memory".to_string(),
            Quantity(memory_limit.to_string()),
        )])),
        ..Default::default()
    }
}

/// `<name>-secret-revision` and `<name>-configmap-revision` pod annotations
/// so that pods roll whenever a mounted object changes
pub fn revision_annotations(
    data: &TemplateData,
    secrets: &[&str],
    config_maps: &[&str],
) -> Result<BTreeMap<String, String>> {
    let mut annotations = BTreeMap::new();
    for secret in secrets {
        annotations.insert(secret_revision_annotation(secret), data.secret_revision(secret)?);
    }
    for config_map in config_maps {
        annotations.insert(
            config_map_revision_annotation(config_map),
            data.config_map_revision(config_map)?,
        );
    }
    Ok(annotations)
}

/// How a control plane component reaches the apiserver: the insecure port
/// while it exists, a kubeconfig secret afterwards
pub struct ApiserverAccess {
    pub flags: Vec<String>,
    pub volumes: Vec<Volume>,
    pub mounts: Vec<VolumeMount>,
}

pub fn apiserver_access(
    data: &TemplateData,
    version: KubernetesVersion,
    component: &str,
    flag_prefix: &str,
) -> ApiserverAccess {
    if version.disables_insecure_port() {
        let secret = format!("{}-kubeconfig", component);
        ApiserverAccess {
            flags: vec![format!(
                "{}kubeconfig={}/kubeconfig",
                flag_prefix, KUBECONFIG_MOUNT_PATH
            )],
            volumes: vec![secret_volume(&secret)],
            mounts: vec![mount(&secret, KUBECONFIG_MOUNT_PATH)],
        }
    } else {
        ApiserverAccess {
            flags: vec![format!(
                "{}master=http://{}.{}.svc.cluster.local:{}",
                flag_prefix,
                APISERVER_INTERNAL_SERVICE_NAME,
                data.namespace(),
                APISERVER_INSECURE_PORT
            )],
            volumes: Vec::new(),
            mounts: Vec::new(),
        }
    }
}

/// Deployment skeleton merged into `existing`.
///
/// Only replicas, the selector, our pod template labels and annotations and
/// the pod spec are owned; everything else on the live spec is kept.
pub fn deployment(
    data: &TemplateData,
    name: &str,
    replicas: i32,
    pod_annotations: BTreeMap<String, String>,
    pod_spec: PodSpec,
    existing: Option<&Deployment>,
) -> Deployment {
    let labels = app_labels(data, name);
    let mut spec = existing.and_then(|d| d.spec.clone()).unwrap_or_default();

    spec.replicas = Some(replicas);
    spec.selector = LabelSelector {
        match_labels: Some(BTreeMap::from([(
            APP_LABEL_KEY.to_string(),
            name.to_string(),
        )])),
        ..Default::default()
    };

    let mut template_meta = spec.template.metadata.take().unwrap_or_default();
    let mut template_labels = template_meta.labels.take().unwrap_or_default();
    template_labels.extend(labels.clone());
    template_meta.labels = Some(template_labels);
    if !pod_annotations.is_empty() {
        let mut annotations = template_meta.annotations.take().unwrap_or_default();
        annotations.extend(pod_annotations);
        template_meta.annotations = Some(annotations);
    }
    spec.template.metadata = Some(template_meta);
    spec.template.spec = Some(pod_spec);

    Deployment {
        metadata: merge::object_meta(data, name, labels, existing.map(|d| &d.metadata)),
        spec: Some(spec),
        status: None,
    }
}

pub fn hyperkube_image(data: &TemplateData, version: KubernetesVersion) -> String {
    data.image(
        "gcr.io",
        &format!("google_containers/hyperkube-amd64:v{}", version),
    )
}
