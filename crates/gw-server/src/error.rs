//! Server error types.

use gw_renderer::RenderError;
use gw_search::SearchError;
use gw_storage::StorageError;

/// Server error.
///
/// A value of this type is fatal for the request (or, during startup, for
/// the process) that produced it; it never affects other in-flight
/// requests and nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Content store failure.
    #[error("{0}")]
    Storage(#[from] StorageError),

    /// Search index failure.
    #[error("{0}")]
    Search(#[from] SearchError),

    /// Renderer failure.
    #[error("{0}")]
    Render(#[from] RenderError),

    /// Network or file I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS configuration failure.
    #[error("tls error: {0}")]
    Tls(#[from] tokio_rustls::rustls::Error),

    /// The private key file held no usable key.
    #[error("no private key found in {0}")]
    NoPrivateKey(String),

    /// The request line could not be parsed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
