//! kube-apiserver deployment and its internal and external services

use crate::cloud_config;
use crate::merge;
use crate::names::*;
use crate::pod;
use crate::template::TemplateData;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, ContainerPort, PodSpec, Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kplane_core::{KubernetesVersion, Result};
use std::collections::BTreeMap;

const DEFAULT_ADMISSION_PLUGINS: [&str; 7] = [
    "NamespaceLifecycle",
    "LimitRanger",
    "ServiceAccount",
    "DefaultStorageClass",
    "DefaultTolerationSeconds",
    "NodeRestriction",
    "ResourceQuota",
];

const SECRETS: [&str; 5] = [
    APISERVER_TLS_SECRET_NAME,
    CA_CERT_SECRET_NAME,
    KUBELET_CLIENT_CERTIFICATES_SECRET_NAME,
    SERVICE_ACCOUNT_KEY_SECRET_NAME,
    TOKENS_SECRET_NAME,
];

pub fn deployment(data: &TemplateData, existing: Option<&Deployment>) -> Result<Deployment> {
    let version = data.kubernetes_version()?;
    let node_port = data.external_node_port()?;
    let cloud = cloud_config::wiring(data)?;

    let mut annotations = pod::revision_annotations(data, &SECRETS, &[])?;
    annotations.extend(cloud.annotations);

    let mut args = vec!["apiserver".to_string()];
    args.extend(flags(data, version, node_port)?);
    args.extend(cloud.flags);

    let mut volumes: Vec<_> = SECRETS.iter().map(|s| pod::secret_volume(s)).collect();
    volumes.extend(cloud.volumes);
    let mut mounts: Vec<_> = SECRETS
        .iter()
        .map(|s| pod::mount(s, &format!("/etc/kubernetes/{}", s)))
        .collect();
    mounts.extend(cloud.mounts);

    let container = Container {
        name: APISERVER_DEPLOYMENT_NAME.to_string(),
        image: Some(pod::hyperkube_image(data, version)),
        command: Some(vec!["/hyperkube".to_string()]),
        args: Some(args),
        ports: Some(vec![ContainerPort {
            name: Some("https".to_string()),
            container_port: node_port,
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]),
        resources: Some(pod::resources("250m", "256Mi", "1Gi")),
        volume_mounts: Some(mounts),
        ..Default::default()
    };

    Ok(pod::deployment(
        data,
        APISERVER_DEPLOYMENT_NAME,
        1,
        annotations,
        PodSpec {
            containers: vec![container],
            volumes: Some(volumes),
            ..Default::default()
        },
        existing,
    ))
}

fn flags(data: &TemplateData, version: KubernetesVersion, node_port: i32) -> Result<Vec<String>> {
    let namespace = data.namespace();
    let address = data.cluster().address();

    let mut plugins: Vec<&str> = DEFAULT_ADMISSION_PLUGINS.to_vec();
    if data.pod_security_policy() {
        plugins.push("PodSecurityPolicy");
    }
    let admission_flag = if version.uses_admission_plugins_flag() {
        "--enable-admission-plugins"
    } else {
        "--admission-control"
    };

    let mut flags = vec![
        format!("--advertise-address={}", address.ip),
        format!("--external-hostname={}", address.external_name),
        format!("--secure-port={}", node_port),
        format!(
            "--etcd-servers=http://{}.{}.svc.cluster.local:2379",
            ETCD_CLIENT_SERVICE_NAME, namespace
        ),
        "--storage-backend=etcd3".to_string(),
        format!("{}={}", admission_flag, plugins.join(",")),
        "--authorization-mode=Node,RBAC".to_string(),
        "--allow-privileged".to_string(),
        "--enable-bootstrap-token-auth=true".to_string(),
        format!("--token-auth-file=/etc/kubernetes/{}/tokens.csv", TOKENS_SECRET_NAME),
        format!(
            "--service-account-key-file=/etc/kubernetes/{}/sa.key",
            SERVICE_ACCOUNT_KEY_SECRET_NAME
        ),
        format!("--service-cluster-ip-range={}", data.service_network()?),
        format!("--service-node-port-range={}", data.node_port_range()),
        format!(
            "--tls-cert-file=/etc/kubernetes/{}/apiserver-tls.crt",
            APISERVER_TLS_SECRET_NAME
        ),
        format!(
            "--tls-private-key-file=/etc/kubernetes/{}/apiserver-tls.key",
            APISERVER_TLS_SECRET_NAME
        ),
        format!("--client-ca-file=/etc/kubernetes/{}/ca.crt", CA_CERT_SECRET_NAME),
        format!(
            "--kubelet-client-certificate=/etc/kubernetes/{}/kubelet-client.crt",
            KUBELET_CLIENT_CERTIFICATES_SECRET_NAME
        ),
        format!(
            "--kubelet-client-key=/etc/kubernetes/{}/kubelet-client.key",
            KUBELET_CLIENT_CERTIFICATES_SECRET_NAME
        ),
        "--kubelet-preferred-address-types=ExternalIP,InternalIP".to_string(),
    ];

    if version.disables_insecure_port() {
        flags.push("--insecure-port=0".to_string());
    } else {
        flags.push("--insecure-bind-address=0.0.0.0".to_string());
        flags.push(format!("--insecure-port={}", APISERVER_INSECURE_PORT));
    }
    if version.supports_lease_reconciler() {
        flags.push("--endpoint-reconciler-type=lease".to_string());
    }
    if data.audit_logging() {
        flags.push("--audit-log-path=-".to_string());
    }
    flags.push("--v=4".to_string());
    Ok(flags)
}

/// In-cluster service of the apiserver
pub fn service(data: &TemplateData, existing: Option<&Service>) -> Result<Service> {
    let version = data.kubernetes_version()?;
    let node_port = data.external_node_port()?;

    let mut ports = vec![ServicePort {
        name: Some("secure".to_string()),
        port: 443,
        target_port: Some(IntOrString::Int(node_port)),
        protocol: Some("TCP".to_string()),
        ..Default::default()
    }];
    if !version.disables_insecure_port() {
        ports.push(ServicePort {
            name: Some("insecure".to_string()),
            port: APISERVER_INSECURE_PORT,
            target_port: Some(IntOrString::Int(APISERVER_INSECURE_PORT)),
            protocol: Some("TCP".to_string()),
            ..Default::default()
        });
    }

    let desired = ServiceSpec {
        type_: Some("ClusterIP".to_string()),
        selector: Some(selector()),
        ports: Some(ports),
        ..Default::default()
    };
    Ok(Service {
        metadata: merge::object_meta(
            data,
            APISERVER_INTERNAL_SERVICE_NAME,
            pod::app_labels(data, APISERVER_DEPLOYMENT_NAME),
            existing.map(|s| &s.metadata),
        ),
        spec: Some(merge::service_spec(desired, existing)),
        status: None,
    })
}

/// NodePort service exposing the apiserver to worker nodes and users
pub fn external_service(data: &TemplateData, existing: Option<&Service>) -> Result<Service> {
    let node_port = data.external_node_port()?;
    let desired = ServiceSpec {
        type_: Some("NodePort".to_string()),
        selector: Some(selector()),
        ports: Some(vec![ServicePort {
            name: Some("secure".to_string()),
            port: node_port,
            target_port: Some(IntOrString::Int(node_port)),
            node_port: Some(node_port),
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]),
        ..Default::default()
    };
    Ok(Service {
        metadata: merge::object_meta(
            data,
            APISERVER_EXTERNAL_SERVICE_NAME,
            pod::app_labels(data, APISERVER_DEPLOYMENT_NAME),
            existing.map(|s| &s.metadata),
        ),
        spec: Some(merge::service_spec(desired, existing)),
        status: None,
    })
}

fn selector() -> BTreeMap<String, String> {
    BTreeMap::from([(APP_LABEL_KEY.to_string(), APISERVER_DEPLOYMENT_NAME.to_string())])
}
