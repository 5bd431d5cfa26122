//! Route classification.
//!
//! A request path lands in exactly one route class, decided here in one
//! place. Handlers dispatch on the returned variant; there is no
//! fallthrough between branches and classification itself performs no I/O
//! beyond the content store's existence probes.

use std::path::PathBuf;

use gw_storage::Storage;

/// The five route classes plus the terminal miss.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Route {
    /// Capsule root: the configured home page.
    Home,
    /// The search endpoint.
    Search,
    /// A wiki page.
    Page {
        /// Document URI.
        uri: String,
        /// Resolved source path, also the cache key.
        path: PathBuf,
    },
    /// A namespace listing.
    Directory {
        /// Document URI.
        uri: String,
        /// Resolved source path, also the cache key.
        path: PathBuf,
    },
    /// A raw media asset.
    Media {
        /// Resolved source path.
        path: PathBuf,
    },
    /// Nothing matched.
    NotFound,
}

/// Search endpoint path.
const SEARCH_PATH: &str = "/search";

/// Classify a percent-decoded request path.
///
/// Only a single non-slash segment after the leading slash can address
/// content; URI hierarchy is encoded with colons inside that segment, so
/// deeper paths are a miss regardless of what the content store holds.
/// Within the segment, resolution order is page, then directory, then
/// media.
pub(crate) fn classify(path: &str, storage: &dyn Storage) -> Route {
    if path.is_empty() || path == "/" {
        return Route::Home;
    }
    if path == SEARCH_PATH {
        return Route::Search;
    }
    let Some(segment) = path.strip_prefix('/') else {
        return Route::NotFound;
    };
    if segment.is_empty() || segment.contains('/') {
        return Route::NotFound;
    }
    if let Some(page) = storage.page_path(segment) {
        return Route::Page {
            uri: segment.to_owned(),
            path: page,
        };
    }
    if let Some(dir) = storage.directory_path(segment) {
        return Route::Directory {
            uri: segment.to_owned(),
            path: dir,
        };
    }
    if let Some(media) = storage.media_path(segment) {
        return Route::Media { path: media };
    }
    Route::NotFound
}
