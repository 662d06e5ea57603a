//! TLS for the webhook listener

use anyhow::{anyhow, Result};
use rustls::pki_types::PrivateKeyDer;
use rustls::ServerConfig;
use rustls_pemfile::{certs, read_all, Item};
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Build a server configuration from PEM-encoded certificate chain and key
pub fn server_config_from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Arc<ServerConfig>> {
    let mut cert_reader = BufReader::new(cert_pem);
    let chain = certs(&mut cert_reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow!("Failed to parse certificates: {}", e))?;
    if chain.is_empty() {
        return Err(anyhow!("No certificates found in PEM data"));
    }
    debug!("Loaded {} certificate(s)", chain.len());

    let mut key_reader = BufReader::new(key_pem);
    let items: Vec<Item> = read_all(&mut key_reader)
        .collect::<Result<_, _>>()
        .map_err(|e| anyhow!("Failed to parse private key: {}", e))?;
    let key = items
        .into_iter()
        .find_map(|item| match item {
            Item::Pkcs8Key(k) => Some(PrivateKeyDer::Pkcs8(k)),
            Item::Pkcs1Key(k) => Some(PrivateKeyDer::Pkcs1(k)),
            Item::Sec1Key(k) => Some(PrivateKeyDer::Sec1(k)),
            _ => None,
        })
        .ok_or_else(|| anyhow!("No private key found in PEM data"))?;

    let config = ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| anyhow!("Failed to select TLS versions: {}", e))?
    .with_no_client_auth()
    .with_single_cert(chain, key)
    .map_err(|e| anyhow!("Failed to create TLS config: {}", e))?;

    Ok(Arc::new(config))
}

pub fn load_server_config(cert_path: &Path, key_path: &Path) -> Result<Arc<ServerConfig>> {
    let cert = std::fs::read(cert_path)
        .map_err(|e| anyhow!("Failed to read {}: {}", cert_path.display(), e))?;
    let key = std::fs::read(key_path)
        .map_err(|e| anyhow!("Failed to read {}: {}", key_path.display(), e))?;
    let config = server_config_from_pem(&cert, &key)?;
    info!(
        "TLS configuration loaded from {} and {}",
        cert_path.display(),
        key_path.display()
    );
    Ok(config)
}
