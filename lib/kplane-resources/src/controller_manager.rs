use crate::cloud_config;
use crate::names::*;
use crate::pod;
use crate::template::TemplateData;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, PodSpec};
use kplane_core::Result;

const SECRETS: [&str; 3] = [
    CA_CERT_SECRET_NAME,
    CA_KEY_SECRET_NAME,
    SERVICE_ACCOUNT_KEY_SECRET_NAME,
];

/// kube-controller-manager deployment
pub fn deployment(data: &TemplateData, existing: Option<&Deployment>) -> Result<Deployment> {
    let version = data.kubernetes_version()?;
    let cloud = cloud_config::wiring(data)?;
    let access = pod::apiserver_access(data, version, CONTROLLER_MANAGER_DEPLOYMENT_NAME, "--");

    let mut annotations = pod::revision_annotations(data, &SECRETS, &[])?;
    annotations.extend(cloud.annotations);

    let mut args = vec!["controller-manager".to_string()];
    args.extend(access.flags);
    args.extend([
        format!(
            "--service-account-private-key-file=/etc/kubernetes/{}/sa.key",
            SERVICE_ACCOUNT_KEY_SECRET_NAME
        ),
        format!("--root-ca-file=/etc/kubernetes/{}/ca.crt", CA_CERT_SECRET_NAME),
        format!(
            "--cluster-signing-cert-file=/etc/kubernetes/{}/ca.crt",
            CA_CERT_SECRET_NAME
        ),
        format!(
            "--cluster-signing-key-file=/etc/kubernetes/{}/ca.key",
            CA_KEY_SECRET_NAME
        ),
        format!("--cluster-cidr={}", data.pod_network()?),
        "--allocate-node-cidrs=true".to_string(),
        "--controllers=*,bootstrapsigner,tokencleaner".to_string(),
        "--use-service-account-credentials".to_string(),
        "--leader-elect=false".to_string(),
    ]);
    args.extend(cloud.flags);
    args.push("--v=4".to_string());

    let mut volumes: Vec<_> = SECRETS.iter().map(|s| pod::secret_volume(s)).collect();
    volumes.extend(access.volumes);
    volumes.extend(cloud.volumes);
    let mut mounts: Vec<_> = SECRETS
        .iter()
        .map(|s| pod::mount(s, &format!("/etc/kubernetes/{}", s)))
        .collect();
    mounts.extend(access.mounts);
    mounts.extend(cloud.mounts);

    let container = Container {
        name: CONTROLLER_MANAGER_DEPLOYMENT_NAME.to_string(),
        image: Some(pod::hyperkube_image(data, version)),
        command: Some(vec!["/hyperkube".to_string()]),
        args: Some(args),
        resources: Some(pod::resources("100m", "100Mi", "512Mi")),
        volume_mounts: Some(mounts),
        ..Default::default()
    };

    Ok(pod::deployment(
        data,
        CONTROLLER_MANAGER_DEPLOYMENT_NAME,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_uses_insecure_port_before_1_10() {
        let data = testing::template_data(testing::openstack_cloud(), "1.9.0");
        let container = deployment(&data, None).unwrap().spec.unwrap().template.spec.unwrap().containers[0].clone();
        let args = container.args.unwrap();
        assert!(args.contains(
            &"--master=http://apiserver.cluster-de-test-01.svc.cluster.local:8080".to_string()
        ));
        assert!(args.contains(&"--use-service-account-credentials".to_string()));
        assert!(args.contains(&"--cloud-provider=openstack".to_string()));
        assert!(args.contains(&"--cluster-cidr=172.25.0.0/16".to_string()));
    }

    #[test]
    fn test_uses_kubeconfig_from_1_10() {
        let data = testing::template_data(testing::digitalocean_cloud(), "1.10.0");
        let spec = deployment(&data, None).unwrap().spec.unwrap().template.spec.unwrap();
        let args = spec.containers[0].args.clone().unwrap();
        assert!(args.contains(&"--kubeconfig=/etc/kubernetes/kubeconfig/kubeconfig".to_string()));
        assert!(spec
            .volumes
            .unwrap()
            .iter()
            .any(|v| v.name == "controller-manager-kubeconfig"));
    }
}
