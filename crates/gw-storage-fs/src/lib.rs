//! Filesystem storage backend for the gw gateway.
//!
//! This crate provides [`FsStorage`], a DokuWiki-layout implementation of
//! the [`Storage`](gw_storage::Storage) trait:
//!
//! - pages live under `data/pages/` as `<segment>/.../<leaf>.txt`
//! - media assets live under `data/media/` with their real extensions
//! - a URI `a:b:c` maps to `pages/a/b/c.txt`, `pages/a/b/c` (namespace),
//!   or `media/a/b/c` depending on what exists on disk
//!
//! URI segments are sanitized before touching the filesystem: empty
//! segments, dot-segments, and segments carrying path separators never
//! resolve, so a request can only address paths inside the content root.

mod mime;

use std::fs;
use std::path::{Path, PathBuf};

use gw_storage::{Storage, StorageError};

pub use mime::mime_for_extension;

/// Default page file extension.
const DEFAULT_PAGE_EXT: &str = "txt";

/// Filesystem storage rooted at a host's `data` directory.
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use gw_storage::Storage;
/// use gw_storage_fs::FsStorage;
///
/// let storage = FsStorage::new(PathBuf::from("host/example.org/data"));
/// if let Some(path) = storage.page_path("wiki:start") {
///     let bytes = storage.read(&path)?;
/// }
/// ```
pub struct FsStorage {
    /// Root of the page tree (`data/pages`).
    pages_dir: PathBuf,
    /// Root of the media tree (`data/media`).
    media_dir: PathBuf,
    /// Page file extension, without the leading dot.
    page_ext: String,
}

impl FsStorage {
    /// Create a storage over a DokuWiki `data` directory.
    #[must_use]
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            pages_dir: data_dir.join("pages"),
            media_dir: data_dir.join("media"),
            page_ext: DEFAULT_PAGE_EXT.to_owned(),
        }
    }

    /// Override the page file extension (default `txt`).
    #[must_use]
    pub fn with_page_extension(mut self, ext: impl Into<String>) -> Self {
        self.page_ext = ext.into();
        self
    }

    /// Convert a URI into a relative filesystem path.
    ///
    /// Returns `None` when any segment is empty, hidden, a dot-segment, or
    /// carries a path separator. The root URI yields `None` here; callers
    /// that accept the root handle it before converting.
    fn relative_path(uri: &str) -> Option<PathBuf> {
        if uri.is_empty() {
            return None;
        }
        let mut rel = PathBuf::new();
        for segment in uri.split(':') {
            if !safe_segment(segment) {
                return None;
            }
            rel.push(segment);
        }
        Some(rel)
    }
}

/// Whether a URI segment may be used as a single path component.
fn safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.starts_with('.')
        && !segment.contains(['/', '\\'])
}

/// Recursively collect files under `dir`, skipping hidden entries.
///
/// A missing or unreadable directory contributes nothing; the content tree
/// is allowed to lack a media directory entirely.
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(Result::ok) {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            collect_files(&path, out);
        } else {
            out.push(path);
        }
    }
}

impl Storage for FsStorage {
    fn page_path(&self, uri: &str) -> Option<PathBuf> {
        let rel = Self::relative_path(uri)?;
        let mut path = self.pages_dir.join(rel);
        let leaf = path.file_name()?.to_string_lossy().into_owned();
        path.set_file_name(format!("{leaf}.{}", self.page_ext));
        path.is_file().then_some(path)
    }

    fn directory_path(&self, uri: &str) -> Option<PathBuf> {
        let path = if uri.is_empty() {
            self.pages_dir.clone()
        } else {
            self.pages_dir.join(Self::relative_path(uri)?)
        };
        path.is_dir().then_some(path)
    }

    fn media_path(&self, uri: &str) -> Option<PathBuf> {
        let path = self.media_dir.join(Self::relative_path(uri)?);
        path.is_file().then_some(path)
    }

    fn uri_for_path(&self, path: &Path) -> Option<String> {
        if let Ok(rel) = path.strip_prefix(&self.media_dir) {
            return segments_to_uri(rel);
        }
        let rel = path.strip_prefix(&self.pages_dir).ok()?;
        if path.is_dir() {
            return segments_to_uri(rel);
        }
        // A page file must carry the page extension; anything else in the
        // page tree maps to no document.
        let stemmed = rel.with_extension("");
        if path.extension().is_some_and(|e| e == self.page_ext.as_str()) {
            segments_to_uri(&stemmed)
        } else {
            None
        }
    }

    fn mime_for_path(&self, path: &Path) -> Option<&'static str> {
        mime_for_extension(path.extension()?.to_str()?)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(path.to_path_buf()),
            _ => StorageError::io(path, e),
        })
    }

    fn list_all(&self) -> Result<Vec<PathBuf>, StorageError> {
        let mut paths = Vec::new();
        collect_files(&self.pages_dir, &mut paths);
        collect_files(&self.media_dir, &mut paths);
        Ok(paths)
    }

    fn pages_under(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        let mut files = Vec::new();
        collect_files(dir, &mut files);
        files.retain(|p| p.extension().is_some_and(|e| e == self.page_ext.as_str()));
        Ok(files)
    }
}

/// Join the components of a relative path into a colon URI.
///
/// Returns `None` when a component is not valid UTF-8.
fn segments_to_uri(rel: &Path) -> Option<String> {
    let mut segments = Vec::new();
    for component in rel.components() {
        segments.push(component.as_os_str().to_str()?);
    }
    Some(segments.join(":"))
}
