//! Per-host configuration for the gw gateway.
//!
//! Each served capsule lives in its own host directory:
//!
//! ```text
//! host/<name>/
//! +-- cert.pem      # TLS certificate
//! +-- key.rsa       # TLS private key
//! +-- config.json   # this crate's Config
//! +-- data/         # DokuWiki content tree (pages/, media/)
//! ```
//!
//! [`HostPaths`] locates and validates that layout; [`Config`] is the typed
//! view of `config.json`, deserialized and validated once at startup. Every
//! recognized field is enumerated here - nothing downstream navigates raw
//! JSON.

mod host;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

pub use host::HostPaths;

/// Default Gemini port, elided from generated base URLs.
pub const DEFAULT_PORT: u16 = 1965;

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TLS certificate missing for the host.
    #[error("certificate for host {host:?} not found: {path}")]
    CertificateNotFound {
        /// Host name given on the command line.
        host: String,
        /// Expected certificate location.
        path: String,
    },
    /// TLS key missing for the host.
    #[error("key for host {host:?} not found: {path}")]
    KeyNotFound {
        /// Host name given on the command line.
        host: String,
        /// Expected key location.
        path: String,
    },
    /// Configuration file missing for the host.
    #[error("host {host:?} not configured: {path}")]
    NotConfigured {
        /// Host name given on the command line.
        host: String,
        /// Expected configuration location.
        path: String,
    },
    /// Content directory missing for the host.
    #[error("data directory for host {host:?} not found: {path}")]
    DataDirNotFound {
        /// Host name given on the command line.
        host: String,
        /// Expected data directory location.
        path: String,
    },
    /// I/O error while reading the configuration file.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing error.
    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// A recognized field holds an invalid value.
    #[error("configuration error: {0}")]
    Validation(String),
}

/// Typed per-host configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Network endpoint.
    pub server: ServerConfig,
    /// Render cache backend selection.
    pub cache: CacheConfig,
    /// Search index endpoint.
    pub search: SearchConfig,
    /// Content tree settings.
    pub wiki: WikiConfig,
    /// Localized UI strings for menus and footers.
    pub strings: Strings,
    /// Alias map: external base URL -> display name. Ordered so footer
    /// output is deterministic.
    pub aliases: BTreeMap<String, String>,
}

impl Config {
    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or
    /// when a field fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for empty or malformed fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;
        require_non_empty(&self.search.database, "search.database")?;
        require_non_empty(&self.wiki.home, "wiki.home")?;
        require_non_empty(&self.wiki.page_extension, "wiki.page_extension")?;
        if let Some(url) = &self.wiki.source_url {
            require_url(url, "wiki.source_url")?;
        }
        for base in self.aliases.keys() {
            require_url(base, "aliases")?;
        }
        Ok(())
    }
}

/// Network endpoint configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Host name presented to clients and used in generated links.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Base URL of the capsule, omitting the default port.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.port == DEFAULT_PORT {
            format!("gemini://{}", self.host)
        } else {
            format!("gemini://{}:{}", self.host, self.port)
        }
    }
}

/// Render cache backend selection.
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Which backend to use.
    pub backend: CacheBackend,
}

/// Available render cache backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process map (the default).
    #[default]
    Memory,
    /// Caching disabled.
    None,
}

/// Search index endpoint.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// SQLite database URL for the FTS index.
    pub database: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            database: "sqlite::memory:".to_owned(),
        }
    }
}

/// Content tree settings.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WikiConfig {
    /// URI of the page served at the capsule root.
    pub home: String,
    /// Base URL of the original wiki, used for "view source" links.
    /// Omitting it drops the source entry from the Actions footer.
    pub source_url: Option<String>,
    /// Page file extension, without the leading dot.
    pub page_extension: String,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            home: "start".to_owned(),
            source_url: None,
            page_extension: "txt".to_owned(),
        }
    }
}

/// Localized UI strings used in menus and footers.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Strings {
    /// Label of the capsule home link.
    pub main: String,
    /// Label of the "view source" link.
    pub source: String,
    /// Heading of the actions footer.
    pub actions: String,
    /// Heading of the extracted-links section.
    pub links: String,
    /// Heading of the aliases footer.
    pub aliases: String,
    /// Heading of the child-sections menu.
    pub sections: String,
    /// Heading of the child-pages menu.
    pub pages: String,
    /// Search page title and link label.
    pub search: String,
    /// Input prompt shown for an empty search query.
    pub search_prompt: String,
    /// Label of the result-count line on the search page.
    pub results: String,
    /// Message shown when a query matches nothing.
    pub nothing_found: String,
    /// Message returned with the not-found status.
    pub not_found: String,
    /// Root directory title when the first segment has no page title.
    pub welcome: String,
    /// Free-form footer text; empty means no about line.
    pub about: String,
    /// Message returned when a request fails internally.
    pub error: String,
}

impl Default for Strings {
    fn default() -> Self {
        Self {
            main: "Main page".to_owned(),
            source: "Source".to_owned(),
            actions: "Actions".to_owned(),
            links: "Links".to_owned(),
            aliases: "Aliases".to_owned(),
            sections: "Sections".to_owned(),
            pages: "Pages".to_owned(),
            search: "Search".to_owned(),
            search_prompt: "Enter a search query".to_owned(),
            results: "Results".to_owned(),
            nothing_found: "Nothing found".to_owned(),
            not_found: "Resource not found".to_owned(),
            welcome: "Welcome".to_owned(),
            about: String::new(),
            error: "Internal server error".to_owned(),
        }
    }
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a field to look like an absolute URL.
fn require_url(value: &str, field: &str) -> Result<(), ConfigError> {
    if !value.contains("://") {
        return Err(ConfigError::Validation(format!(
            "{field} must be an absolute URL, got {value:?}"
        )));
    }
    Ok(())
}
