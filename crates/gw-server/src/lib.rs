//! Gemini protocol server for the gw gateway.
//!
//! This crate owns the request pipeline: TLS accept loop, request
//! parsing, route classification, response assembly, the render cache
//! write-through, and the startup indexing pass.
//!
//! # Architecture
//!
//! ```text
//! Client ──TLS──► accept loop (lib.rs)
//!                     │
//!                     └─► Request::parse ──► handlers::handle
//!                              │                  │
//!                              │                  ├─► route::classify
//!                              │                  ├─► RenderCache get/set
//!                              │                  ├─► navigation + GemtextRenderer
//!                              │                  └─► SearchIndex (── /search only)
//!                              │
//!                              └─► Response::to_bytes ──► client
//! ```
//!
//! # Startup Order
//!
//! [`run_server`] flushes the render cache, rebuilds and populates the
//! search index, and only then binds the listener. The indexing pass is a
//! strict barrier: no request is accepted against a half-built index.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::Path;
//! use gw_config::{Config, HostPaths};
//! use gw_server::run_server;
//!
//! #[tokio::main]
//! async fn main() {
//!     let paths = HostPaths::locate(Path::new("host"), "example.org");
//!     let config = Config::load(&paths.config_file()).unwrap();
//!     run_server(config, &paths).await.unwrap();
//! }
//! ```

mod error;
mod handlers;
mod indexer;
mod navigation;
mod request;
mod response;
mod route;
mod state;
mod tls;

use std::sync::Arc;

use gw_cache::{MemoryCache, NullCache, RenderCache};
use gw_config::{CacheBackend, Config, HostPaths};
use gw_search::SearchIndex;
use gw_storage::Storage;
use gw_storage_fs::FsStorage;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;

use request::Request;
use response::Response;
use state::AppState;

pub use error::ServerError;

/// Maximum request line length: 1024 URL bytes plus CRLF.
const MAX_REQUEST_LEN: usize = 1026;

/// Run the server until a shutdown signal arrives.
///
/// # Arguments
///
/// * `config` - Validated per-host configuration
/// * `paths` - Validated host directory layout
///
/// # Errors
///
/// Returns [`ServerError`] when startup fails (cache, index, TLS, bind)
/// or the accept loop breaks down. Per-request failures are answered with
/// a failure status and never end up here.
pub async fn run_server(config: Config, paths: &HostPaths) -> Result<(), ServerError> {
    let storage: Arc<dyn Storage> = Arc::new(
        FsStorage::new(paths.data_dir()).with_page_extension(&config.wiki.page_extension),
    );
    let cache: Arc<dyn RenderCache> = match config.cache.backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
        CacheBackend::None => Arc::new(NullCache),
    };
    // A fresh generation must never serve bodies rendered by a previous one
    cache.flush();

    let search = SearchIndex::connect(&config.search.database).await?;
    search.rebuild().await?;

    let address = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState {
        config,
        storage,
        cache,
        search,
    });

    let indexed = indexer::build(&state).await?;
    tracing::info!(pages = indexed, "search index built");

    let tls_config = tls::load(&paths.certificate(), &paths.key())?;
    let acceptor = TlsAcceptor::from(tls_config);

    let listener = TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "listening");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                let acceptor = acceptor.clone();
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    if let Err(e) = serve_connection(acceptor, stream, &state).await {
                        tracing::debug!(peer = %peer, error = %e, "connection failed");
                    }
                });
            }
            () = shutdown_signal() => break,
        }
    }
    Ok(())
}

/// Serve a single connection: one request, one response, close.
async fn serve_connection(
    acceptor: TlsAcceptor,
    stream: TcpStream,
    state: &AppState,
) -> Result<(), ServerError> {
    let mut stream = acceptor.accept(stream).await?;

    let parsed = match read_request_line(&mut stream).await {
        Ok(line) => Request::parse(&line),
        Err(e) => Err(e),
    };
    let response = match parsed {
        Ok(request) => {
            let response = handlers::handle(state, &request).await;
            tracing::debug!(
                host = request.host(),
                path = request.path(),
                status = response.status().code(),
                "request served"
            );
            response
        }
        Err(e) => {
            tracing::debug!(error = %e, "malformed request");
            Response::bad_request()
        }
    };

    stream.write_all(&response.to_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Read the CRLF-terminated request line, bounded by [`MAX_REQUEST_LEN`].
async fn read_request_line<S>(stream: &mut S) -> Result<String, ServerError>
where
    S: AsyncReadExt + Unpin,
{
    let mut buf = Vec::with_capacity(256);
    let mut chunk = [0u8; 256];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.contains(&b'\n') {
            break;
        }
        if buf.len() > MAX_REQUEST_LEN {
            return Err(ServerError::InvalidRequest(
                "request line too long".to_owned(),
            ));
        }
    }
    let end = buf
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| ServerError::InvalidRequest("missing line terminator".to_owned()))?;
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
