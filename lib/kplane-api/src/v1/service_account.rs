use serde::{Deserialize, Serialize};

/// A non-human identity bound to one project
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    pub id: String,
    pub name: String,
    #[serde(rename = "projectID")]
    pub project_id: String,
    /// Group in the form `<role>-<projectID>`
    pub group: String,
    pub status: ServiceAccountStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceAccountStatus {
    Active,
    Inactive,
}

/// Body of a service account creation call
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateServiceAccountRequest {
    #[serde(default)]
    pub name: String,
    /// Role prefix such as `editors` or `viewers`
    #[serde(default)]
    pub group: String,
}
