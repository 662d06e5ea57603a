use kplane_api::{ProviderKind, UnionError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("{0}")]
    Immutability(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    ReferentialIntegrity(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{kind} {namespace}/{name} is missing from the snapshot")]
    MissingSnapshot {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("{0}")]
    Validation(String),

    #[error("Kubernetes error: {0}")]
    Kubernetes(#[from] kube::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// HTTP status a transport layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::Configuration(_) => 400,
            CoreError::Immutability(_) => 400,
            CoreError::Duplicate(_) => 409,
            CoreError::ReferentialIntegrity(_) => 400,
            CoreError::NotFound(_) => 404,
            CoreError::Authorization(_) => 403,
            CoreError::BadRequest(_) => 400,
            CoreError::MissingSnapshot { .. } => 412,
            CoreError::Validation(_) => 500,
            CoreError::Kubernetes(_) => 500,
            CoreError::Serialization(_) => 500,
        }
    }
}

impl From<UnionError> for CoreError {
    fn from(err: UnionError) -> Self {
        CoreError::Configuration(ConfigurationError::Union(err))
    }
}

/// A cluster, datacenter or node description that cannot be compiled
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error(transparent)]
    Union(#[from] UnionError),

    #[error("datacenter {datacenter:?}: {source}")]
    Datacenter {
        datacenter: String,
        source: UnionError,
    },

    #[error("provider mismatch: {subject} uses {found} but {expected} is required")]
    ProviderMismatch {
        subject: &'static str,
        expected: ProviderKind,
        found: ProviderKind,
    },

    #[error("invalid CIDR {cidr:?}: {reason}")]
    InvalidCidr { cidr: String, reason: String },

    #[error("invalid Kubernetes version {0:?}")]
    InvalidVersion(String),

    #[error("{0}")]
    Invalid(String),
}
