//! Host directory layout and bootstrap validation.

use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Certificate filename inside a host directory.
const CERT_FILE: &str = "cert.pem";
/// Private key filename inside a host directory.
const KEY_FILE: &str = "key.rsa";
/// Configuration filename inside a host directory.
const CONFIG_FILE: &str = "config.json";
/// Content directory name inside a host directory.
const DATA_DIR: &str = "data";

/// Locations of a host's certificate, key, configuration, and content.
///
/// Construction never touches the filesystem; [`validate`](Self::validate)
/// performs the four bootstrap existence checks and reports the first
/// failure with a descriptive message.
#[derive(Debug, Clone)]
pub struct HostPaths {
    root: PathBuf,
}

impl HostPaths {
    /// Locate a host directory under `hosts_dir`.
    #[must_use]
    pub fn locate(hosts_dir: &Path, host: &str) -> Self {
        Self {
            root: hosts_dir.join(host),
        }
    }

    /// Path to the TLS certificate.
    #[must_use]
    pub fn certificate(&self) -> PathBuf {
        self.root.join(CERT_FILE)
    }

    /// Path to the TLS private key.
    #[must_use]
    pub fn key(&self) -> PathBuf {
        self.root.join(KEY_FILE)
    }

    /// Path to the configuration file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Path to the content tree root.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    /// Check that certificate, key, configuration, and data directory all
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] variant for the first missing piece;
    /// bootstrap aborts on it rather than starting partially.
    pub fn validate(&self, host: &str) -> Result<(), ConfigError> {
        let cert = self.certificate();
        if !cert.is_file() {
            return Err(ConfigError::CertificateNotFound {
                host: host.to_owned(),
                path: cert.display().to_string(),
            });
        }
        let key = self.key();
        if !key.is_file() {
            return Err(ConfigError::KeyNotFound {
                host: host.to_owned(),
                path: key.display().to_string(),
            });
        }
        let config = self.config_file();
        if !config.is_file() {
            return Err(ConfigError::NotConfigured {
                host: host.to_owned(),
                path: config.display().to_string(),
            });
        }
        let data = self.data_dir();
        if !data.is_dir() {
            return Err(ConfigError::DataDirNotFound {
                host: host.to_owned(),
                path: data.display().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn complete_host(dir: &Path) {
        std::fs::write(dir.join(CERT_FILE), "cert").unwrap();
        std::fs::write(dir.join(KEY_FILE), "key").unwrap();
        std::fs::write(dir.join(CONFIG_FILE), "{}").unwrap();
        std::fs::create_dir(dir.join(DATA_DIR)).unwrap();
    }

    #[test]
    fn test_validate_complete_host() {
        let tmp = TempDir::new().unwrap();
        let paths = HostPaths::locate(tmp.path(), "example.org");
        std::fs::create_dir(tmp.path().join("example.org")).unwrap();
        complete_host(&tmp.path().join("example.org"));

        assert!(paths.validate("example.org").is_ok());
    }

    #[test]
    fn test_validate_reports_missing_pieces_in_order() {
        let tmp = TempDir::new().unwrap();
        let host_dir = tmp.path().join("example.org");
        std::fs::create_dir(&host_dir).unwrap();
        let paths = HostPaths::locate(tmp.path(), "example.org");

        // Nothing present: certificate reported first
        let err = paths.validate("example.org").unwrap_err();
        assert!(matches!(err, ConfigError::CertificateNotFound { .. }));
        assert!(err.to_string().contains("example.org"));

        std::fs::write(host_dir.join(CERT_FILE), "cert").unwrap();
        let err = paths.validate("example.org").unwrap_err();
        assert!(matches!(err, ConfigError::KeyNotFound { .. }));

        std::fs::write(host_dir.join(KEY_FILE), "key").unwrap();
        let err = paths.validate("example.org").unwrap_err();
        assert!(matches!(err, ConfigError::NotConfigured { .. }));

        std::fs::write(host_dir.join(CONFIG_FILE), "{}").unwrap();
        let err = paths.validate("example.org").unwrap_err();
        assert!(matches!(err, ConfigError::DataDirNotFound { .. }));
    }

    #[test]
    fn test_paths_are_under_host_root() {
        let paths = HostPaths::locate(Path::new("/srv/host"), "example.org");

        assert_eq!(
            paths.certificate(),
            PathBuf::from("/srv/host/example.org/cert.pem")
        );
        assert_eq!(paths.key(), PathBuf::from("/srv/host/example.org/key.rsa"));
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/srv/host/example.org/config.json")
        );
        assert_eq!(
            paths.data_dir(),
            PathBuf::from("/srv/host/example.org/data")
        );
    }
}
