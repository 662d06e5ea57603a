//! OpenVPN server giving the control plane a route into the worker network

use crate::merge;
use crate::names::*;
use crate::pod;
use crate::template::TemplateData;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    Capabilities, ConfigMap, Container, ContainerPort, PodSpec, SecurityContext, Service,
    ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kplane_core::Result;
use std::collections::BTreeMap;
use std::fmt::Write;

const OPENVPN_IMAGE: &str = "kubermatic/openvpn:v0.4";
const OPENVPN_CONFIG_KEY: &str = "server.conf";
const OPENVPN_CONFIG_MOUNT_PATH: &str = "/etc/openvpn/config";
const OPENVPN_CERTIFICATES_MOUNT_PATH: &str = "/etc/openvpn/certs";
const OPENVPN_CLIENT_NETWORK: &str = "10.20.0.0 255.255.255.0";

pub fn deployment(data: &TemplateData, existing: Option<&Deployment>) -> Result<Deployment> {
    let annotations =
        pod::revision_annotations(data, &[OPENVPN_SERVER_CERTIFICATES_SECRET_NAME], &[])?;

    let container = Container {
        name: "openvpn-server".to_string(),
        image: Some(data.image("docker.io", OPENVPN_IMAGE)),
        command: Some(vec![
            "/usr/sbin/openvpn".to_string(),
            "--config".to_string(),
            format!("{}/{}", OPENVPN_CONFIG_MOUNT_PATH, OPENVPN_CONFIG_KEY),
        ]),
        ports: Some(vec![ContainerPort {
            name: Some("openvpn".to_string()),
            container_port: OPENVPN_SERVER_PORT,
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]),
        security_context: Some(SecurityContext {
            capabilities: Some(Capabilities {
                add: Some(vec!["NET_ADMIN".to_string()]),
                ..Default::default()
            }),
            ..Default::default()
        }),
        resources: Some(pod::resources("10m", "16Mi", "64Mi")),
        volume_mounts: Some(vec![
            pod::mount(OPENVPN_SERVER_CERTIFICATES_SECRET_NAME, OPENVPN_CERTIFICATES_MOUNT_PATH),
            pod::mount(OPENVPN_CLIENT_CONFIGS_CONFIG_MAP_NAME, OPENVPN_CONFIG_MOUNT_PATH),
        ]),
        ..Default::default()
    };

    Ok(pod::deployment(
        data,
        OPENVPN_SERVER_DEPLOYMENT_NAME,
        1,
        annotations,
        PodSpec {
            containers: vec![container],
            volumes: Some(vec![
                pod::secret_volume(OPENVPN_SERVER_CERTIFICATES_SECRET_NAME),
                pod::config_map_volume(OPENVPN_CLIENT_CONFIGS_CONFIG_MAP_NAME),
            ]),
            ..Default::default()
        },
        existing,
    ))
}

/// Server configuration pushing routes to the service and pod networks
pub fn config_map(data: &TemplateData, existing: Option<&ConfigMap>) -> Result<ConfigMap> {
    let services = data.service_network()?;
    let pods = data.pod_network()?;

    let mut config = String::new();
    let _ = writeln!(config, "port {}", OPENVPN_SERVER_PORT);
    let _ = writeln!(config, "proto tcp");
    let _ = writeln!(config, "dev tun");
    let _ = writeln!(config, "server {}", OPENVPN_CLIENT_NETWORK);
    let _ = writeln!(config, "ca {}/ca.crt", OPENVPN_CERTIFICATES_MOUNT_PATH);
    let _ = writeln!(config, "cert {}/server.crt", OPENVPN_CERTIFICATES_MOUNT_PATH);
    let _ = writeln!(config, "key {}/server.key", OPENVPN_CERTIFICATES_MOUNT_PATH);
    let _ = writeln!(config, "dh none");
    let _ = writeln!(config, "keepalive 10 60");
    let _ = writeln!(config, "push \"route {} {}\"", services.network(), services.mask());
    let _ = writeln!(config, "push \"route {} {}\"", pods.network(), pods.mask());
    let _ = writeln!(config, "route {} {}", pods.network(), pods.mask());
    let _ = writeln!(config, "client-config-dir {}/ccd", OPENVPN_CONFIG_MOUNT_PATH);

    let labels = pod::app_labels(data, OPENVPN_SERVER_DEPLOYMENT_NAME);
    Ok(ConfigMap {
        metadata: merge::object_meta(
            data,
            OPENVPN_CLIENT_CONFIGS_CONFIG_MAP_NAME,
            labels,
            existing.map(|c| &c.metadata),
        ),
        data: Some(BTreeMap::from([(OPENVPN_CONFIG_KEY.to_string(), config)])),
        ..Default::default()
    })
}

pub fn service(data: &TemplateData, existing: Option<&Service>) -> Result<Service> {
    let desired = ServiceSpec {
        type_: Some("NodePort".to_string()),
        selector: Some(BTreeMap::from([(
            APP_LABEL_KEY.to_string(),
            OPENVPN_SERVER_DEPLOYMENT_NAME.to_string(),
        )])),
        ports: Some(vec![ServicePort {
            name: Some("openvpn".to_string()),
            port: OPENVPN_SERVER_PORT,
            target_port: Some(IntOrString::Int(OPENVPN_SERVER_PORT)),
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]),
        ..Default::default()
    };
    Ok(Service {
        metadata: merge::object_meta(
            data,
            OPENVPN_SERVER_SERVICE_NAME,
            pod::app_labels(data, OPENVPN_SERVER_DEPLOYMENT_NAME),
            existing.map(|s| &s.metadata),
        ),
        spec: Some(merge::service_spec(desired, existing)),
        status: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_config_routes_cluster_networks() {
        let data = testing::template_data(testing::aws_cloud(), "1.9.0");
        let cm = config_map(&data, None).unwrap();
        let config = &cm.data.unwrap()[OPENVPN_CONFIG_KEY];
        assert!(config.contains("push \"route 10.10.10.0 255.255.255.0\"\n"));
        assert!(config.contains("push \"route 172.25.0.0 255.255.0.0\"\n"));
    }

    #[test]
    fn test_deployment_annotates_certificate_revision() {
        let data = testing::template_data(testing::aws_cloud(), "1.9.0");
        let deployment = deployment(&data, None).unwrap();
        let annotations = deployment.spec.unwrap().template.metadata.unwrap().annotations.unwrap();
        assert_eq!(
            annotations["openvpn-server-certificates-secret-revision"],
            testing::SNAPSHOT_REVISION
        );
    }

    #[test]
    fn test_service_node_port_survives_rerender() {
        let data = testing::template_data(testing::aws_cloud(), "1.9.0");
        let mut live = service(&data, None).unwrap();
        if let Some(port) = live.spec.as_mut().and_then(|s| s.ports.as_mut()).and_then(|p| p.first_mut()) {
            port.node_port = Some(31194);
        }
        let merged = service(&data, Some(&live)).unwrap();
        assert_eq!(merged.spec.unwrap().ports.unwrap()[0].node_port, Some(31194));
    }
}
