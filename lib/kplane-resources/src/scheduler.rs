use crate::names::*;
use crate::pod;
use crate::template::TemplateData;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, PodSpec};
use kplane_core::Result;
use std::collections::BTreeMap;

/// kube-scheduler deployment
pub fn deployment(data: &TemplateData, existing: Option<&Deployment>) -> Result<Deployment> {
    let version = data.kubernetes_version()?;
    let access = pod::apiserver_access(data, version, SCHEDULER_DEPLOYMENT_NAME, "--");

    let listen_flag = if version.scheduler_uses_bind_address() {
        "--bind-address=0.0.0.0"
    } else {
        "--address=0.0.0.0"
    };

    let mut args = vec!["scheduler".to_string()];
    args.extend(access.flags);
    args.push(listen_flag.to_string());
    args.push("--v=4".to_string());

    let container = Container {
        name: SCHEDULER_DEPLOYMENT_NAME.to_string(),
        image: Some(pod::hyperkube_image(data, version)),
        command: Some(vec!["/hyperkube".to_string()]),
        args: Some(args),
        resources: Some(pod::resources("20m", "64Mi", "256Mi")),
        volume_mounts: (!access.mounts.is_empty()).then_some(access.mounts),
        ..Default::default()
    };

    Ok(pod::deployment(
        data,
        SCHEDULER_DEPLOYMENT_NAME,
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

    fn args(version: &str) -> Vec<String> {
        let data = testing::template_data(testing::aws_cloud(), version);
        deployment(&data, None).unwrap().spec.unwrap().template.spec.unwrap().containers[0]
            .args
            .clone()
            .unwrap()
    }

    #[test]
    fn test_listen_flag_switches_at_1_12() {
        assert!(args("1.11.3").contains(&"--address=0.0.0.0".to_string()));
        assert!(args("1.12.0").contains(&"--bind-address=0.0.0.0".to_string()));
    }

    #[test]
    fn test_rerender_keeps_restart_annotation() {
        let data = testing::template_data(testing::aws_cloud(), "1.9.0");
        let mut live = deployment(&data, None).unwrap();
        if let Some(meta) = live.spec.as_mut().and_then(|s| s.template.metadata.as_mut()) {
            meta.annotations = Some(BTreeMap::from([(
                "kubectl.kubernetes.io/restartedAt".to_string(),
                "2024-01-01T00:00:00Z".to_string(),
            )]));
        }

        let merged = deployment(&data, Some(&live)).unwrap();
        let annotations = merged.spec.unwrap().template.metadata.unwrap().annotations.unwrap();
        assert_eq!(annotations.len(), 1);
        assert!(annotations.contains_key("kubectl.kubernetes.io/restartedAt"));
    }

    #[test]
    fn test_scheduler_ignores_cloud_provider() {
        assert!(!args("1.9.0").iter().any(|a| a.starts_with("--cloud")));
    }
}
