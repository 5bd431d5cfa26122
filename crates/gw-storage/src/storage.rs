//! Storage trait and error types.

use std::path::{Path, PathBuf};

/// Storage error with path context.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Resource does not exist.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A URI contained a malformed or unsafe segment.
    #[error("invalid uri: {0:?}")]
    InvalidUri(String),

    /// Underlying I/O failure.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        /// Path the operation was addressing.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// Create an I/O error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Content store abstraction.
///
/// Maps logical document URIs to source paths and back, enumerates the
/// content tree, reads raw bytes, and resolves MIME types. Resolution
/// methods return `None` for URIs that do not name an existing resource -
/// a miss is routing information, not an error.
///
/// Implementations must be safe to share across request tasks; all methods
/// take `&self` and the backend holds no per-request state.
pub trait Storage: Send + Sync {
    /// Resolve a URI to the source path of a page document.
    fn page_path(&self, uri: &str) -> Option<PathBuf>;

    /// Resolve a URI to the source path of a directory (namespace).
    ///
    /// The empty URI resolves to the content root.
    fn directory_path(&self, uri: &str) -> Option<PathBuf>;

    /// Resolve a URI to the source path of a media asset.
    fn media_path(&self, uri: &str) -> Option<PathBuf>;

    /// Derive the URI for a source path.
    ///
    /// Returns `None` for paths outside the content tree and for files
    /// that map to no logical document (wrong extension, special files).
    fn uri_for_path(&self, path: &Path) -> Option<String>;

    /// Resolve the MIME type for a source path by its extension.
    fn mime_for_path(&self, path: &Path) -> Option<&'static str>;

    /// Read the raw bytes of a page or media source.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the path does not exist or cannot be read.
    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Enumerate every source path in the content tree (pages and media).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the tree cannot be walked.
    fn list_all(&self) -> Result<Vec<PathBuf>, StorageError>;

    /// Enumerate page source paths under a directory, recursively.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the directory cannot be walked.
    fn pages_under(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError>;
}
