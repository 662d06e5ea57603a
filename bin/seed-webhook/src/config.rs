//! Webhook settings read once from the environment

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const LISTEN_ENV: &str = "SEED_WEBHOOK_LISTEN";
pub const TLS_CERT_ENV: &str = "SEED_WEBHOOK_TLS_CERT";
pub const TLS_KEY_ENV: &str = "SEED_WEBHOOK_TLS_KEY";
pub const SEED_NAMESPACE_ENV: &str = "SEED_NAMESPACE";
pub const SINGLE_SEED_ENV: &str = "SEED_WEBHOOK_SINGLE_SEED";
pub const QUERY_TIMEOUT_ENV: &str = "SEED_WEBHOOK_QUERY_TIMEOUT_SECS";
pub const LOG_JSON_ENV: &str = "SEED_WEBHOOK_LOG_JSON";

#[derive(Clone, Debug, PartialEq)]
pub struct WebhookConfig {
    pub listen: SocketAddr,
    /// Serve HTTPS when both certificate and key are set
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
    /// Namespace holding the Seed objects
    pub seed_namespace: String,
    pub single_seed: bool,
    /// Admission window for cluster and seed queries
    pub query_timeout: Duration,
    pub log_json: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 9443)),
            tls_cert: None,
            tls_key: None,
            seed_namespace: "kplane".to_string(),
            single_seed: false,
            query_timeout: Duration::from_secs(10),
            log_json: false,
        }
    }
}

impl WebhookConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(listen) = lookup(LISTEN_ENV) {
            config.listen = listen
                .parse()
                .with_context(|| format!("{} is not a socket address: {}", LISTEN_ENV, listen))?;
        }
        config.tls_cert = lookup(TLS_CERT_ENV).filter(|v| !v.is_empty()).map(PathBuf::from);
        config.tls_key = lookup(TLS_KEY_ENV).filter(|v| !v.is_empty()).map(PathBuf::from);
        if let Some(namespace) = lookup(SEED_NAMESPACE_ENV).filter(|v| !v.is_empty()) {
            config.seed_namespace = namespace;
        }
        if let Some(single_seed) = lookup(SINGLE_SEED_ENV) {
            config.single_seed = parse_bool(SINGLE_SEED_ENV, &single_seed)?;
        }
        if let Some(secs) = lookup(QUERY_TIMEOUT_ENV) {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("{} must be a number of seconds: {}", QUERY_TIMEOUT_ENV, secs))?;
            config.query_timeout = Duration::from_secs(secs);
        }
        if let Some(log_json) = lookup(LOG_JSON_ENV) {
            config.log_json = parse_bool(LOG_JSON_ENV, &log_json)?;
        }

        if config.tls_cert.is_some() != config.tls_key.is_some() {
            anyhow::bail!("{} and {} must be set together", TLS_CERT_ENV, TLS_KEY_ENV);
        }
        Ok(config)
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls_cert.is_some() && self.tls_key.is_some()
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => anyhow::bail!("{} must be a boolean: {}", key, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = WebhookConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, WebhookConfig::default());
        assert!(!config.tls_enabled());
    }

    #[test]
    fn test_reads_all_settings() {
        let config = WebhookConfig::from_lookup(lookup(&[
            (LISTEN_ENV, "127.0.0.1:8443"),
            (TLS_CERT_ENV, "/etc/webhook/tls.crt"),
            (TLS_KEY_ENV, "/etc/webhook/tls.key"),
            (SEED_NAMESPACE_ENV, "kube-system"),
            (SINGLE_SEED_ENV, "true"),
            (QUERY_TIMEOUT_ENV, "3"),
            (LOG_JSON_ENV, "1"),
        ]))
        .unwrap();
        assert_eq!(config.listen.port(), 8443);
        assert!(config.tls_enabled());
        assert_eq!(config.seed_namespace, "kube-system");
        assert!(config.single_seed);
        assert_eq!(config.query_timeout, Duration::from_secs(3));
        assert!(config.log_json);
    }

    #[test]
    fn test_rejects_half_configured_tls() {
        let err = WebhookConfig::from_lookup(lookup(&[(TLS_CERT_ENV, "/tls.crt")])).unwrap_err();
        assert!(err.to_string().contains(TLS_KEY_ENV));
    }

    #[test]
    fn test_rejects_bad_timeout() {
        assert!(WebhookConfig::from_lookup(lookup(&[(QUERY_TIMEOUT_ENV, "soon")])).is_err());
    }
}
