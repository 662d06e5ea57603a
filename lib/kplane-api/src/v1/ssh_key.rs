use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// UserSSHKey is a public key a user registered for a set of clusters
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "kplane.io",
    version = "v1",
    kind = "UserSSHKey",
    plural = "usersshkeys",
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct UserSshKeySpec {
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub fingerprint: String,
    pub public_key: String,
    /// Clusters the key is deployed to
    #[serde(default)]
    pub clusters: Vec<String>,
}

/// Shorter alias following Rust naming for acronyms
pub type UserSshKey = UserSSHKey;

impl UserSSHKey {
    pub fn is_authorized_for(&self, cluster_name: &str) -> bool {
        self.spec.clusters.iter().any(|c| c == cluster_name)
    }

    pub fn public_key(&self) -> &str {
        &self.spec.public_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_authorized_for_listed_cluster_only() {
        let key = UserSSHKey::new(
            "key-1",
            UserSshKeySpec {
                owner: "john@acme.com".to_string(),
                name: "laptop".to_string(),
                public_key: "ssh-rsa AAAA".to_string(),
                clusters: vec!["c1".to_string()],
                ..Default::default()
            },
        );
        assert!(key.is_authorized_for("c1"));
        assert!(!key.is_authorized_for("c2"));
    }
}
