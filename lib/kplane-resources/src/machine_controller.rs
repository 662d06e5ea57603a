use crate::names::*;
use crate::pod;
use crate::template::TemplateData;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, ContainerPort, PodSpec};
use kplane_core::Result;
use std::collections::BTreeMap;

const MACHINE_CONTROLLER_IMAGE: &str = "kubermatic/machine-controller:v0.7.5";

/// machine-controller deployment reconciling the cluster's Machine objects
pub fn deployment(data: &TemplateData, existing: Option<&Deployment>) -> Result<Deployment> {
    let version = data.kubernetes_version()?;
    let access = pod::apiserver_access(data, version, MACHINE_CONTROLLER_DEPLOYMENT_NAME, "-");

    let mut args = access.flags;
    args.extend([
        "-logtostderr".to_string(),
        "-v".to_string(),
        "4".to_string(),
        "-cluster-dns".to_string(),
        data.dns_cluster_ip()?.to_string(),
        "-internal-listen-address".to_string(),
        "0.0.0.0:8085".to_string(),
    ]);

    let container = Container {
        name: MACHINE_CONTROLLER_DEPLOYMENT_NAME.to_string(),
        image: Some(data.image("docker.io", MACHINE_CONTROLLER_IMAGE)),
        command: Some(vec!["/usr/local/bin/machine-controller".to_string()]),
        args: Some(args),
        ports: Some(vec![ContainerPort {
            name: Some("metrics".to_string()),
            container_port: 8085,
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]),
        resources: Some(pod::resources("25m", "32Mi", "256Mi")),
        volume_mounts: (!access.mounts.is_empty()).then_some(access.mounts),
        ..Default::default()
    };

    Ok(pod::deployment(
        data,
        MACHINE_CONTROLLER_DEPLOYMENT_NAME,
        1,
        BTreeMap::new(),
        PodSpec {
            containers: vec![container],
            volumes: (!access.volumes.is_empty()).then_some(access.volumes),
            ..Default::default()
        },
        existing,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_cluster_dns_is_tenth_service_address() {
        let data = testing::template_data(testing::hetzner_cloud(), "1.9.0");
        let args = deployment(&data, None).unwrap().spec.unwrap().template.spec.unwrap().containers[0]
            .args
            .clone()
            .unwrap();
        let dns = args.iter().position(|a| a == "-cluster-dns").unwrap();
        assert_eq!(args[dns + 1], "10.10.10.10");
        assert!(args[0].starts_with("-master=http://apiserver."));
    }
}
