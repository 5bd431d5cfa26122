//! Mock storage implementation for testing.
//!
//! Provides [`MockStorage`] for unit testing consumers without touching the
//! filesystem. Paths are synthetic (`/mock/pages/...`, `/mock/media/...`)
//! but round-trip through [`Storage::uri_for_path`] like a real backend.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::storage::{Storage, StorageError};
use crate::uri;

/// Synthetic root for page paths.
const PAGES_ROOT: &str = "/mock/pages";
/// Synthetic root for media paths.
const MEDIA_ROOT: &str = "/mock/media";

/// Mock storage for testing.
///
/// Holds pages and media in memory. Configure with the builder methods:
///
/// ```ignore
/// use gw_storage::{MockStorage, Storage};
///
/// let storage = MockStorage::new()
///     .with_page("guide", "====== Guide ======\ntext")
///     .with_media("logo.png", b"\x89PNG".to_vec(), "image/png");
///
/// assert!(storage.page_path("guide").is_some());
/// assert!(storage.media_path("logo.png").is_some());
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    pages: BTreeMap<String, String>,
    media: BTreeMap<String, (Vec<u8>, &'static str)>,
    strays: Vec<PathBuf>,
}

impl MockStorage {
    /// Create an empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page with the given URI and raw source content.
    #[must_use]
    pub fn with_page(mut self, uri: impl Into<String>, content: impl Into<String>) -> Self {
        self.pages.insert(uri.into(), content.into());
        self
    }

    /// Add a media asset with the given URI, bytes, and MIME type.
    #[must_use]
    pub fn with_media(mut self, uri: impl Into<String>, bytes: Vec<u8>, mime: &'static str) -> Self {
        self.media.insert(uri.into(), (bytes, mime));
        self
    }

    /// Add a stray file: enumerated by [`Storage::list_all`] but mapping
    /// to no document URI, like an unregistered file in a real page tree.
    #[must_use]
    pub fn with_stray_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.strays.push(path.into());
        self
    }

    fn page_path_for(uri: &str) -> PathBuf {
        PathBuf::from(format!("{PAGES_ROOT}/{}.txt", uri.replace(':', "/")))
    }

    fn media_path_for(uri: &str) -> PathBuf {
        PathBuf::from(format!("{MEDIA_ROOT}/{}", uri.replace(':', "/")))
    }

    fn dir_path_for(uri: &str) -> PathBuf {
        if uri.is_empty() {
            PathBuf::from(PAGES_ROOT)
        } else {
            PathBuf::from(format!("{PAGES_ROOT}/{}", uri.replace(':', "/")))
        }
    }

    /// Invert [`Self::dir_path_for`]: `/mock/pages/a/b` -> `a:b`.
    fn dir_uri_for(path: &Path) -> Option<String> {
        let rel = path.to_str()?.strip_prefix(PAGES_ROOT)?;
        Some(rel.trim_start_matches('/').replace('/', ":"))
    }
}

impl Storage for MockStorage {
    fn page_path(&self, uri: &str) -> Option<PathBuf> {
        self.pages.contains_key(uri).then(|| Self::page_path_for(uri))
    }

    fn directory_path(&self, uri: &str) -> Option<PathBuf> {
        let populated = self.pages.keys().any(|u| uri::is_within(u, uri))
            || self.media.keys().any(|u| uri::is_within(u, uri));
        populated.then(|| Self::dir_path_for(uri))
    }

    fn media_path(&self, uri: &str) -> Option<PathBuf> {
        self.media.contains_key(uri).then(|| Self::media_path_for(uri))
    }

    fn uri_for_path(&self, path: &Path) -> Option<String> {
        let s = path.to_str()?;
        if let Some(rel) = s.strip_prefix(MEDIA_ROOT) {
            let u = rel.trim_start_matches('/').replace('/', ":");
            return self.media.contains_key(&u).then_some(u);
        }
        let rel = s.strip_prefix(PAGES_ROOT)?;
        let u = rel.trim_start_matches('/').strip_suffix(".txt")?.replace('/', ":");
        self.pages.contains_key(&u).then_some(u)
    }

    fn mime_for_path(&self, path: &Path) -> Option<&'static str> {
        let u = self.uri_for_path(path)?;
        self.media.get(&u).map(|(_, mime)| *mime)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        if let Some(u) = self.uri_for_path(path) {
            if let Some(content) = self.pages.get(&u) {
                return Ok(content.clone().into_bytes());
            }
            if let Some((bytes, _)) = self.media.get(&u) {
                return Ok(bytes.clone());
            }
        }
        Err(StorageError::NotFound(path.to_path_buf()))
    }

    fn list_all(&self) -> Result<Vec<PathBuf>, StorageError> {
        let mut paths: Vec<PathBuf> = self.pages.keys().map(|u| Self::page_path_for(u)).collect();
        paths.extend(self.media.keys().map(|u| Self::media_path_for(u)));
        paths.extend(self.strays.iter().cloned());
        Ok(paths)
    }

    fn pages_under(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        let Some(base) = Self::dir_uri_for(dir) else {
            return Ok(Vec::new());
        };
        Ok(self
            .pages
            .keys()
            .filter(|u| uri::is_within(u, &base))
            .map(|u| Self::page_path_for(u))
            .collect())
    }
}
