//! TLS configuration loading.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use tokio_rustls::rustls;

use crate::error::ServerError;

/// Load a rustls server configuration from PEM certificate and key files.
///
/// The key file may hold a PKCS#1 (`RSA PRIVATE KEY`), PKCS#8, or SEC1
/// key; the first one found is used.
///
/// # Errors
///
/// Returns [`ServerError`] when a file cannot be read, holds no usable
/// key, or the certificate chain is rejected by rustls.
pub(crate) fn load(cert_path: &Path, key_path: &Path) -> Result<Arc<rustls::ServerConfig>, ServerError> {
    let mut cert_reader = BufReader::new(File::open(cert_path)?);
    let certs = rustls_pemfile::certs(&mut cert_reader).collect::<Result<Vec<_>, _>>()?;

    let mut key_reader = BufReader::new(File::open(key_path)?);
    let key = rustls_pemfile::private_key(&mut key_reader)?
        .ok_or_else(|| ServerError::NoPrivateKey(key_path.display().to_string()))?;

    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    Ok(Arc::new(config))
}
