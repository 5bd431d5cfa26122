//! Shared application state.
//!
//! One [`AppState`] is built at startup and shared by every connection
//! task. All request-scoped data (response builders, renderer instances,
//! assembled menus) lives on the handler stack instead; nothing here is
//! mutated after construction except through the cache and index
//! contracts, which handle their own synchronization.

use std::sync::Arc;

use gw_cache::RenderCache;
use gw_config::Config;
use gw_search::SearchIndex;
use gw_storage::Storage;

/// State shared across all request handlers.
pub(crate) struct AppState {
    /// Frozen per-host configuration.
    pub config: Config,
    /// Content store backend.
    pub storage: Arc<dyn Storage>,
    /// Render cache backend.
    pub cache: Arc<dyn RenderCache>,
    /// Full-text search index.
    pub search: SearchIndex,
}
