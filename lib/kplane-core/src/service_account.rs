//! Project service accounts

use crate::{CoreError, Result};
use kplane_api::v1::{CreateServiceAccountRequest, ServiceAccount, ServiceAccountStatus};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

const SERVICE_ACCOUNT_ID_PREFIX: &str = "serviceaccount-";
const SERVICE_ACCOUNT_ID_LEN: usize = 10;

/// Roles a service account may be bound to. Owner is reserved for humans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceAccountRole {
    Editors,
    Viewers,
}

impl ServiceAccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceAccountRole::Editors => "editors",
            ServiceAccountRole::Viewers => "viewers",
        }
    }
}

impl fmt::Display for ServiceAccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceAccountRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "editors" => Ok(ServiceAccountRole::Editors),
            "viewers" => Ok(ServiceAccountRole::Viewers),
            other => Err(CoreError::BadRequest(format!("invalid group name {}", other))),
        }
    }
}

/// Group a service account of `role` joins in `project_id`
pub fn group_name(role: ServiceAccountRole, project_id: &str) -> String {
    format!("{}-{}", role, project_id)
}

/// ServiceAccountStore keeps service accounts of all projects
pub struct ServiceAccountStore {
    // Map of service account id to account
    accounts: Arc<RwLock<HashMap<String, ServiceAccount>>>,
}

impl ServiceAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create an inactive service account in `project_id`
    pub async fn create(
        &self,
        project_id: &str,
        request: CreateServiceAccountRequest,
    ) -> Result<ServiceAccount> {
        if request.name.is_empty() || project_id.is_empty() || request.group.is_empty() {
            return Err(CoreError::BadRequest(
                "the name, project ID and group cannot be empty".to_string(),
            ));
        }
        let role: ServiceAccountRole = request.group.parse()?;

        let mut accounts = self.accounts.write().await;
        let taken = accounts
            .values()
            .any(|sa| sa.project_id == project_id && sa.name == request.name);
        if taken {
            return Err(CoreError::Duplicate(format!(
                "service account {:?} already exists",
                request.name
            )));
        }

        let account = ServiceAccount {
            id: new_id(),
            name: request.name,
            project_id: project_id.to_string(),
            group: group_name(role, project_id),
            status: ServiceAccountStatus::Inactive,
        };
        accounts.insert(account.id.clone(), account.clone());

        debug!(id = %account.id, group = %account.group, "Created service account");
        Ok(account)
    }

    /// Service accounts of a project, sorted by name
    pub async fn list(&self, project_id: &str) -> Result<Vec<ServiceAccount>> {
        let accounts = self.accounts.read().await;
        let mut list: Vec<ServiceAccount> = accounts
            .values()
            .filter(|sa| sa.project_id == project_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    pub async fn get(&self, id: &str) -> Result<ServiceAccount> {
        let accounts = self.accounts.read().await;
        accounts
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("service account {:?} not found", id)))
    }

    /// Mark a service account as active
    pub async fn activate(&self, id: &str) -> Result<ServiceAccount> {
        let mut accounts = self.accounts.write().await;
        match accounts.get_mut(id) {
            Some(account) => {
                account.status = ServiceAccountStatus::Active;
                debug!(id = %id, "Activated service account");
                Ok(account.clone())
            }
            None => Err(CoreError::NotFound(format!(
                "service account {:?} not found",
                id
            ))),
        }
    }

    pub async fn count(&self) -> usize {
        self.accounts.read().await.len()
    }
}

impl Default for ServiceAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

fn new_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SERVICE_ACCOUNT_ID_LEN)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("{}{}", SERVICE_ACCOUNT_ID_PREFIX, suffix)
}
