/// API version v1 for kplane resources

pub mod catalog;
pub mod cloud;
pub mod cluster;
pub mod datacenter;
pub mod machine;
pub mod node;
pub mod seed;
pub mod service_account;
pub mod ssh_key;
pub mod user;

pub use catalog::{CreateDatacenterRequest, DatacenterView, DatacenterViewMeta, DatacenterViewSpec};
pub use cloud::{CloudProvider, CloudSpec};
pub use cluster::{Cluster, ClusterAddress, ClusterNetworkingConfig, ClusterSpec, ClusterStatus, NetworkRanges};
pub use datacenter::{Datacenter, DatacenterProvider, DatacenterSpec, NodeSettings};
pub use machine::{Machine, MachineSpec, MachineVersionInfo, ProviderConfig};
pub use node::{Node, NodeCloudProvider, NodeCloudSpec, NodeSpec, NodeVersionInfo, OperatingSystem, OperatingSystemSpec};
pub use seed::{Seed, SeedSpec};
pub use service_account::{CreateServiceAccountRequest, ServiceAccount, ServiceAccountStatus};
pub use ssh_key::{UserSSHKey, UserSshKey, UserSshKeySpec};
pub use user::ApiUser;

/// API group for kplane resources
pub const API_GROUP: &str = "kplane.io";
/// API version for kplane resources
pub const API_VERSION: &str = "v1";
