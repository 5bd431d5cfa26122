//! Full-text search index for the gw gateway.
//!
//! One document per wiki page, held in a SQLite FTS5 table reached through
//! sqlx. The index is rebuilt wholesale at process startup and never
//! updated incrementally afterwards; re-submitting a URI overwrites the
//! previous document because the rowid is derived deterministically from
//! the URI.
//!
//! The contract with the router is narrow: [`rebuild`](SearchIndex::rebuild),
//! [`submit`](SearchIndex::submit), [`query`](SearchIndex::query). Ranking
//! and tokenization belong to the engine; the caller hands `query` an
//! already escaped MATCH string (see [`escape_match`]).

use std::str::FromStr;

use md5::{Digest, Md5};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// Search error.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The index backend failed or is unreachable.
    #[error("search backend error: {0}")]
    Backend(#[from] sqlx::Error),
}

/// A page submitted for indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDocument {
    /// Document URI.
    pub uri: String,
    /// Display name, the page's first heading.
    pub name: String,
    /// Rendered page body.
    pub data: String,
}

/// A single ranked query hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Document URI.
    pub uri: String,
    /// Display name.
    pub name: String,
}

/// Ranked query results with the total hit count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    /// Total number of matching documents.
    pub total: usize,
    /// Hits ordered best first.
    pub hits: Vec<SearchHit>,
}

/// Full-text index over a SQLite FTS5 table.
///
/// The pool is capped at a single connection so an in-memory database
/// (`sqlite::memory:`, the default endpoint) behaves like one store
/// rather than one store per pooled connection.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    pool: SqlitePool,
}

impl SearchIndex {
    /// Connect to the index database.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] when the URL is invalid or the database
    /// cannot be opened.
    pub async fn connect(url: &str) -> Result<Self, SearchError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Drop and recreate the document table.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on backend failure.
    pub async fn rebuild(&self) -> Result<(), SearchError> {
        sqlx::query("DROP TABLE IF EXISTS pages")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE VIRTUAL TABLE pages USING fts5(uri UNINDEXED, name, data)")
            .execute(&self.pool)
            .await?;
        tracing::debug!("search index rebuilt");
        Ok(())
    }

    /// Submit a document under its stable id.
    ///
    /// Submitting the same URI again replaces the stored document.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on backend failure.
    pub async fn submit(&self, document: &SearchDocument) -> Result<(), SearchError> {
        sqlx::query("INSERT OR REPLACE INTO pages (rowid, uri, name, data) VALUES (?1, ?2, ?3, ?4)")
            .bind(stable_id(&document.uri))
            .bind(&document.uri)
            .bind(&document.name)
            .bind(&document.data)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Run a full-text query.
    ///
    /// `escaped` must be a non-empty MATCH expression, normally produced
    /// by [`escape_match`]; blank input is the router's problem and never
    /// reaches this method.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on backend failure.
    pub async fn query(&self, escaped: &str) -> Result<SearchResults, SearchError> {
        let rows = sqlx::query("SELECT uri, name FROM pages WHERE pages MATCH ?1 ORDER BY rank")
            .bind(escaped)
            .fetch_all(&self.pool)
            .await?;
        let hits: Vec<SearchHit> = rows
            .iter()
            .map(|row| SearchHit {
                uri: row.get("uri"),
                name: row.get("name"),
            })
            .collect();
        Ok(SearchResults {
            total: hits.len(),
            hits,
        })
    }
}

/// Derive the stable numeric id for a URI.
///
/// First eight bytes of the MD5 digest, so the same URI always lands on
/// the same rowid across re-index runs.
#[must_use]
pub fn stable_id(uri: &str) -> i64 {
    let digest = Md5::digest(uri.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(bytes)
}

/// Escape free text into an FTS5 MATCH expression.
///
/// Each whitespace-separated token becomes a quoted string, which keeps
/// user input from being parsed as MATCH syntax (`AND`, `*`, column
/// filters). Embedded double quotes are dropped.
#[must_use]
pub fn escape_match(query: &str) -> String {
    query
        .split_whitespace()
        .map(|token| format!("\"{}\"", token.replace('"', "")))
        .collect::<Vec<_>>()
        .join(" ")
}
