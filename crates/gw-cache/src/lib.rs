//! Render cache abstraction for the gw gateway.
//!
//! This crate decouples the router from the mechanism that stores fully
//! assembled response bodies. One trait forms the API:
//!
//! - [`RenderCache`]: key-value store of rendered bodies with a
//!   whole-store flush
//!
//! # Implementations
//!
//! - [`MemoryCache`]: in-process map, the default backend
//! - [`NullCache`]: no-op implementation (always misses), used when
//!   caching is disabled
//!
//! Keys are source path strings (or the router's root sentinel); values
//! are complete bodies, content plus navigation plus footers. There is no
//! per-key invalidation: [`flush`](RenderCache::flush) is called once at
//! process startup so a new generation never serves bodies rendered
//! against a previous one, and entries then live for the process lifetime.
//!
//! # Example
//!
//! ```
//! use gw_cache::{MemoryCache, RenderCache};
//!
//! let cache = MemoryCache::new();
//! assert_eq!(cache.get("pages/start.txt"), None);
//! cache.set("pages/start.txt", "# Start\n");
//! assert_eq!(cache.get("pages/start.txt").as_deref(), Some("# Start\n"));
//! ```

mod memory;

pub use memory::MemoryCache;

/// Key-value store of fully rendered response bodies.
///
/// `get` is consulted before any rendering work; a hit short-circuits the
/// whole pipeline. `set` is called exactly once per miss, after the body
/// has been completely assembled. Implementations must provide
/// read-your-writes consistency per key; concurrent misses on one key may
/// both render and both store, last write winning.
pub trait RenderCache: Send + Sync {
    /// Retrieve a cached body.
    fn get(&self, key: &str) -> Option<String>;

    /// Store a body, overwriting any existing entry for the key.
    fn set(&self, key: &str, body: &str);

    /// Drop every entry.
    fn flush(&self);
}

/// No-op [`RenderCache`] that never stores or retrieves data.
///
/// Every `get` misses; every `set` is silently discarded. Used when the
/// cache backend is configured to `none`.
pub struct NullCache;

impl RenderCache for NullCache {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _body: &str) {}

    fn flush(&self) {}
}
