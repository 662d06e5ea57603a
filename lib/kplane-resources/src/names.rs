//! Names of the objects living in a cluster's control plane namespace

pub const APISERVER_DEPLOYMENT_NAME: &str = "apiserver";
pub const CONTROLLER_MANAGER_DEPLOYMENT_NAME: &str = "controller-manager";
pub const SCHEDULER_DEPLOYMENT_NAME: &str = "scheduler";
pub const MACHINE_CONTROLLER_DEPLOYMENT_NAME: &str = "machine-controller";
pub const OPENVPN_SERVER_DEPLOYMENT_NAME: &str = "openvpn-server";

pub const APISERVER_INTERNAL_SERVICE_NAME: &str = "apiserver";
pub const APISERVER_EXTERNAL_SERVICE_NAME: &str = "apiserver-external";
pub const OPENVPN_SERVER_SERVICE_NAME: &str = "openvpn-server";
pub const ETCD_CLIENT_SERVICE_NAME: &str = "etcd-client";

pub const CLOUD_CONFIG_CONFIG_MAP_NAME: &str = "cloud-config";
pub const OPENVPN_CLIENT_CONFIGS_CONFIG_MAP_NAME: &str = "openvpn-client-configs";
pub const PROMETHEUS_CONFIG_MAP_NAME: &str = "prometheus";

pub const TOKENS_SECRET_NAME: &str = "tokens";
pub const SERVICE_ACCOUNT_KEY_SECRET_NAME: &str = "service-account-key";
pub const CA_CERT_SECRET_NAME: &str = "ca-cert";
pub const CA_KEY_SECRET_NAME: &str = "ca-key";
pub const APISERVER_TLS_SECRET_NAME: &str = "apiserver-tls";
pub const KUBELET_CLIENT_CERTIFICATES_SECRET_NAME: &str = "kubelet-client-certificates";
pub const OPENVPN_SERVER_CERTIFICATES_SECRET_NAME: &str = "openvpn-server-certificates";

/// Key of the rendered cloud provider configuration inside its config map
pub const CLOUD_CONFIG_KEY: &str = "config";

pub const CLUSTER_LABEL_KEY: &str = "kplane.io/cluster";
pub const APP_LABEL_KEY: &str = "app";

/// Pod annotation carrying the sha256 of the rendered cloud config
pub const CLOUD_CONFIG_CHECKSUM_ANNOTATION: &str = "checksum/cloud-config";

pub const OPENVPN_SERVER_PORT: i32 = 1194;
pub const APISERVER_INSECURE_PORT: i32 = 8080;

pub fn secret_revision_annotation(secret: &str) -> String {
    format!("{}-secret-revision", secret)
}

pub fn config_map_revision_annotation(config_map: &str) -> String {
    format!("{}-configmap-revision", config_map)
}
