//! Kubernetes release versions and the flag gates derived from them

use crate::error::ConfigurationError;
use std::fmt;
use std::str::FromStr;

/// A Kubernetes release, `major.minor.patch`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KubernetesVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl KubernetesVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// `true` when this release is `major.minor` or newer
    pub fn at_least(&self, major: u64, minor: u64) -> bool {
        (self.major, self.minor) >= (major, minor)
    }

    /// Admission plugins are passed via `--enable-admission-plugins`
    pub fn uses_admission_plugins_flag(&self) -> bool {
        self.at_least(1, 10)
    }

    /// The apiserver supports `--endpoint-reconciler-type=lease`
    pub fn supports_lease_reconciler(&self) -> bool {
        self.at_least(1, 9)
    }

    /// The insecure port is switched off with `--insecure-port=0`
    pub fn disables_insecure_port(&self) -> bool {
        self.at_least(1, 10)
    }

    /// kube-scheduler takes `--bind-address` instead of `--address`
    pub fn scheduler_uses_bind_address(&self) -> bool {
        self.at_least(1, 12)
    }
}

impl fmt::Display for KubernetesVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for KubernetesVersion {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigurationError::InvalidVersion(s.to_string());
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);

        let mut parts = trimmed.splitn(3, '.');
        let mut next = |required: bool| -> Result<u64, ConfigurationError> {
            match parts.next() {
                Some(part) => part.parse::<u64>().map_err(|_| invalid()),
                None if required => Err(invalid()),
                None => Ok(0),
            }
        };

        let major = next(true)?;
        let minor = next(true)?;
        let patch = next(false)?;
        Ok(Self::new(major, minor, patch))
    }
}
