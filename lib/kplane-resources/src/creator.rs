//! The set of objects a control plane consists of and how they are created

use crate::template::TemplateData;
use crate::{
    apiserver, cloud_config, controller_manager, machine_controller, openvpn, prometheus,
    scheduler,
};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kplane_api::ProviderKind;
use kplane_core::{ConfigurationError, KubernetesVersion, Result};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

pub type DeploymentCreator = fn(&TemplateData, Option<&Deployment>) -> Result<Deployment>;
pub type ConfigMapCreator = fn(&TemplateData, Option<&ConfigMap>) -> Result<ConfigMap>;
pub type ServiceCreator = fn(&TemplateData, Option<&Service>) -> Result<Service>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKind {
    Deployment,
    ConfigMap,
    Service,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Deployment => "deployment",
            ObjectKind::ConfigMap => "configmap",
            ObjectKind::Service => "service",
        }
    }
}

/// One object of a hosted control plane
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    ApiserverDeployment,
    ControllerManagerDeployment,
    SchedulerDeployment,
    MachineControllerDeployment,
    OpenvpnServerDeployment,
    CloudConfigConfigMap,
    OpenvpnConfigMap,
    PrometheusConfigMap,
    ApiserverService,
    ApiserverExternalService,
    OpenvpnService,
}

impl Component {
    pub const ALL: [Component; 11] = [
        Component::ApiserverDeployment,
        Component::ControllerManagerDeployment,
        Component::SchedulerDeployment,
        Component::MachineControllerDeployment,
        Component::OpenvpnServerDeployment,
        Component::CloudConfigConfigMap,
        Component::OpenvpnConfigMap,
        Component::PrometheusConfigMap,
        Component::ApiserverService,
        Component::ApiserverExternalService,
        Component::OpenvpnService,
    ];

    pub fn kind(&self) -> ObjectKind {
        match self {
            Component::ApiserverDeployment
            | Component::ControllerManagerDeployment
            | Component::SchedulerDeployment
            | Component::MachineControllerDeployment
            | Component::OpenvpnServerDeployment => ObjectKind::Deployment,
            Component::CloudConfigConfigMap
            | Component::OpenvpnConfigMap
            | Component::PrometheusConfigMap => ObjectKind::ConfigMap,
            Component::ApiserverService
            | Component::ApiserverExternalService
            | Component::OpenvpnService => ObjectKind::Service,
        }
    }

    /// Short name used in object identities; unique per kind
    pub fn name(&self) -> &'static str {
        match self {
            Component::ApiserverDeployment => "apiserver",
            Component::ControllerManagerDeployment => "controller-manager",
            Component::SchedulerDeployment => "scheduler",
            Component::MachineControllerDeployment => "machine-controller",
            Component::OpenvpnServerDeployment => "openvpn-server",
            Component::CloudConfigConfigMap => "cloud-config",
            Component::OpenvpnConfigMap => "openvpn",
            Component::PrometheusConfigMap => "prometheus",
            Component::ApiserverService => "apiserver",
            Component::ApiserverExternalService => "apiserver-external",
            Component::OpenvpnService => "openvpn",
        }
    }

    fn creator(&self) -> Creator {
        match self {
            Component::ApiserverDeployment => Creator::Deployment(apiserver::deployment),
            Component::ControllerManagerDeployment => {
                Creator::Deployment(controller_manager::deployment)
            }
            Component::SchedulerDeployment => Creator::Deployment(scheduler::deployment),
            Component::MachineControllerDeployment => {
                Creator::Deployment(machine_controller::deployment)
            }
            Component::OpenvpnServerDeployment => Creator::Deployment(openvpn::deployment),
            Component::CloudConfigConfigMap => Creator::ConfigMap(cloud_config::config_map),
            Component::OpenvpnConfigMap => Creator::ConfigMap(openvpn::config_map),
            Component::PrometheusConfigMap => Creator::ConfigMap(prometheus::config_map),
            Component::ApiserverService => Creator::Service(apiserver::service),
            Component::ApiserverExternalService => Creator::Service(apiserver::external_service),
            Component::OpenvpnService => Creator::Service(openvpn::service),
        }
    }
}

enum Creator {
    Deployment(DeploymentCreator),
    ConfigMap(ConfigMapCreator),
    Service(ServiceCreator),
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind().as_str(), self.name())
    }
}

/// A rendered control plane object
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ControlPlaneObject {
    Deployment(Deployment),
    ConfigMap(ConfigMap),
    Service(Service),
}

impl ControlPlaneObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ControlPlaneObject::Deployment(_) => ObjectKind::Deployment,
            ControlPlaneObject::ConfigMap(_) => ObjectKind::ConfigMap,
            ControlPlaneObject::Service(_) => ObjectKind::Service,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            ControlPlaneObject::Deployment(d) => &d.metadata,
            ControlPlaneObject::ConfigMap(c) => &c.metadata,
            ControlPlaneObject::Service(s) => &s.metadata,
        }
    }

    pub fn as_deployment(&self) -> Option<&Deployment> {
        match self {
            ControlPlaneObject::Deployment(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_config_map(&self) -> Option<&ConfigMap> {
        match self {
            ControlPlaneObject::ConfigMap(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_service(&self) -> Option<&Service> {
        match self {
            ControlPlaneObject::Service(s) => Some(s),
            _ => None,
        }
    }
}

/// `<kind>-<provider>-<kubernetesVersion>-<component>`, the stable name of a
/// rendered object across providers and versions
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectIdentity {
    pub kind: ObjectKind,
    pub provider: ProviderKind,
    pub version: KubernetesVersion,
    pub component: &'static str,
}

impl ObjectIdentity {
    pub fn of(component: Component, data: &TemplateData) -> Result<Self> {
        Ok(Self {
            kind: component.kind(),
            provider: data.provider_kind()?,
            version: data.kubernetes_version()?,
            component: component.name(),
        })
    }
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.kind.as_str(),
            self.provider,
            self.version,
            self.component
        )
    }
}

/// Render `component`, merging into `existing` when the object already exists
pub fn create(
    component: Component,
    data: &TemplateData,
    existing: Option<&ControlPlaneObject>,
) -> Result<ControlPlaneObject> {
    if let Some(existing) = existing {
        if existing.kind() != component.kind() {
            return Err(ConfigurationError::Invalid(format!(
                "existing object for {} is a {}",
                component,
                existing.kind().as_str()
            ))
            .into());
        }
    }

    let object = match component.creator() {
        Creator::Deployment(create) => ControlPlaneObject::Deployment(create(
            data,
            existing.and_then(ControlPlaneObject::as_deployment),
        )?),
        Creator::ConfigMap(create) => ControlPlaneObject::ConfigMap(create(
            data,
            existing.and_then(ControlPlaneObject::as_config_map),
        )?),
        Creator::Service(create) => ControlPlaneObject::Service(create(
            data,
            existing.and_then(ControlPlaneObject::as_service),
        )?),
    };

    debug!(cluster = %data.cluster_name(), component = %component, "Rendered object");
    Ok(object)
}

/// Render every component; a failing component does not affect the others
pub fn compile_all(data: &TemplateData) -> Vec<(Component, Result<ControlPlaneObject>)> {
    Component::ALL
        .into_iter()
        .map(|component| {
            let result = create(component, data, None);
            if let Err(err) = &result {
                warn!(cluster = %data.cluster_name(), component = %component, error = %err, "Failed to render object");
            }
            (component, result)
        })
        .collect()
}
