//! Content store abstraction for the gw gateway.
//!
//! Provides the core [`Storage`] trait for resolving logical document URIs
//! to source paths and back, along with [`StorageError`] for unified error
//! handling across backends.
//!
//! # URI Convention
//!
//! All URI parameters in Storage methods are **colon-delimited document
//! identifiers**, not network URLs and not file paths:
//!
//! - `""` - root of the content tree
//! - `"guide"` - top-level page or namespace
//! - `"guide:setup"` - nested page
//!
//! Segments never contain path separators; the mapping between URIs and
//! source paths is owned entirely by the storage backend.

#[cfg(feature = "mock")]
mod mock;
mod storage;
pub mod uri;

#[cfg(feature = "mock")]
pub use mock::MockStorage;
pub use storage::{Storage, StorageError};
