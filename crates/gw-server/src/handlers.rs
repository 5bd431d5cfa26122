//! Request handlers and response assembly.
//!
//! [`handle`] is the single entry point: it classifies the request path,
//! runs the matching handler, and turns an internal failure into a
//! temporary-failure response for this request alone. Page, directory,
//! and home bodies are assembled here from the renderer's output plus
//! navigation menus and the link/action/alias footers, then written
//! through to the render cache. Search and media responses are never
//! cached.

use std::collections::HashSet;
use std::path::Path;

use gw_renderer::{GemtextRenderer, outbound_links};
use gw_search::escape_match;
use gw_storage::StorageError;
use percent_encoding::percent_decode_str;

use crate::error::ServerError;
use crate::navigation::{self, Menu};
use crate::request::Request;
use crate::response::Response;
use crate::route::{self, Route};
use crate::state::AppState;

/// Cache key for the capsule root; no source path ever collides with it
/// because real keys are absolute paths.
pub(crate) const ROOT_CACHE_KEY: &str = "~root";

/// Macro token the renderer replaces with the capsule's base URL.
pub(crate) const BASE_MACRO: &str = "%base%";

/// Pattern matching the DokuWiki index-menu placeholder; the page and home
/// handlers substitute the assembled menu block for it, the indexer
/// substitutes nothing.
pub(crate) const INDEX_MENU_PATTERN: &str = r"\{\{indexmenu>[^}]*\}\}";

/// Handle one parsed request.
pub(crate) async fn handle(state: &AppState, request: &Request) -> Response {
    let route = route::classify(request.path(), state.storage.as_ref());
    let result = match route {
        Route::Home => home(state),
        Route::Search => search(state, request.query()).await,
        Route::Page { uri, path } => page(state, &uri, &path),
        Route::Directory { uri, path } => directory(state, &uri, &path),
        Route::Media { path } => media(state, &path),
        Route::NotFound => Ok(not_found(state)),
    };
    result.unwrap_or_else(|e| {
        tracing::error!(path = request.path(), error = %e, "request failed");
        Response::failure(&state.config.strings.error)
    })
}

/// Not-found response with the configured message.
fn not_found(state: &AppState) -> Response {
    Response::not_found(&state.config.strings.not_found)
}

/// Home route: the configured home page under the root cache key, falling
/// back to a root directory listing when no home page exists.
fn home(state: &AppState) -> Result<Response, ServerError> {
    if let Some(cached) = state.cache.get(ROOT_CACHE_KEY) {
        return Ok(Response::gemtext(cached));
    }
    if let Some(path) = state.storage.page_path(&state.config.wiki.home) {
        let body = page_body(state, &state.config.wiki.home, &path)?;
        state.cache.set(ROOT_CACHE_KEY, &body);
        return Ok(Response::gemtext(body));
    }
    let menu = navigation::children(state.storage.as_ref(), "")?;
    if menu.is_empty() {
        return Ok(not_found(state));
    }
    let body = directory_body(state, "", &menu);
    state.cache.set(ROOT_CACHE_KEY, &body);
    Ok(Response::gemtext(body))
}

/// Page route: cached by source path, assembled on miss.
fn page(state: &AppState, uri: &str, path: &Path) -> Result<Response, ServerError> {
    let key = path.to_string_lossy();
    if let Some(cached) = state.cache.get(&key) {
        return Ok(Response::gemtext(cached));
    }
    let body = page_body(state, uri, path)?;
    state.cache.set(&key, &body);
    Ok(Response::gemtext(body))
}

/// Directory route: cached by directory path, assembled on miss.
fn directory(state: &AppState, uri: &str, path: &Path) -> Result<Response, ServerError> {
    let key = path.to_string_lossy();
    if let Some(cached) = state.cache.get(&key) {
        return Ok(Response::gemtext(cached));
    }
    let menu = navigation::children(state.storage.as_ref(), uri)?;
    let body = directory_body(state, uri, &menu);
    state.cache.set(&key, &body);
    Ok(Response::gemtext(body))
}

/// Media route: raw bytes with their MIME type, no cache, no renderer.
fn media(state: &AppState, path: &Path) -> Result<Response, ServerError> {
    let Some(mime) = state.storage.mime_for_path(path) else {
        return Ok(not_found(state));
    };
    match state.storage.read(path) {
        Ok(bytes) => Ok(Response::success(mime, bytes)),
        Err(StorageError::NotFound(_)) => Ok(not_found(state)),
        Err(e) => Err(e.into()),
    }
}

/// Search route: prompt for input, or query the index and list the hits.
async fn search(state: &AppState, raw_query: Option<&str>) -> Result<Response, ServerError> {
    let strings = &state.config.strings;
    let decoded = percent_decode_str(raw_query.unwrap_or_default())
        .decode_utf8_lossy()
        .trim()
        .to_owned();
    if decoded.is_empty() {
        return Ok(Response::input(&strings.search_prompt));
    }

    let results = state.search.query(&escape_match(&decoded)).await?;

    let mut lines = vec![
        format!("# {}", strings.search),
        String::new(),
        format!("{}: {}", strings.results, results.total),
    ];
    if results.hits.is_empty() {
        lines.push(String::new());
        lines.push(strings.nothing_found.clone());
    } else {
        lines.push(String::new());
        for hit in &results.hits {
            if hit.name.is_empty() {
                lines.push(format!("=> /{}", hit.uri));
            } else {
                lines.push(format!("=> /{} {}", hit.uri, hit.name));
            }
        }
    }
    lines.extend(actions_lines(state, ""));
    lines.extend(aliases_lines(state, ""));
    Ok(Response::gemtext(join_body(lines)))
}

/// Assemble a full page body: rendered content with the menu substituted
/// for the index-menu placeholder, extracted links, actions, and aliases.
fn page_body(state: &AppState, uri: &str, path: &Path) -> Result<String, ServerError> {
    let strings = &state.config.strings;
    let bytes = state.storage.read(path)?;
    let source = String::from_utf8_lossy(&bytes).into_owned();

    let menu = navigation::children(state.storage.as_ref(), uri)?;
    let menu_block = navigation::menu_lines(strings, &menu).join("\n");

    let mut renderer = GemtextRenderer::new();
    renderer.set_macro(BASE_MACRO, state.config.server.base_url());
    // `$` has group-reference meaning in rule replacements; menu content is
    // literal text
    renderer.set_rule(INDEX_MENU_PATTERN, &menu_block.replace('$', "$$"))?;
    let content = renderer.render(&source);

    let mut lines = vec![content.trim_end().to_owned()];

    let mut seen = HashSet::new();
    let links: Vec<&str> = outbound_links(&content)
        .into_iter()
        .filter(|target| seen.insert(*target))
        .collect();
    if !links.is_empty() {
        lines.push(String::new());
        lines.push(format!("## {}", strings.links));
        lines.extend(links.iter().map(|target| format!("=> {target}")));
    }

    lines.extend(actions_lines(state, uri));
    lines.extend(aliases_lines(state, uri));
    Ok(join_body(lines))
}

/// Assemble a directory body: resolved heading, menus, footers.
fn directory_body(state: &AppState, uri: &str, menu: &Menu) -> String {
    let strings = &state.config.strings;
    let mut lines = vec![navigation::directory_heading(
        state.storage.as_ref(),
        strings,
        uri,
    )];

    let menu_lines = navigation::menu_lines(strings, menu);
    if !menu_lines.is_empty() {
        lines.push(String::new());
        lines.extend(menu_lines);
    }

    lines.extend(actions_lines(state, uri));
    lines.extend(aliases_lines(state, uri));
    join_body(lines)
}

/// The Actions footer: search, home, source (when configured), about.
fn actions_lines(state: &AppState, uri: &str) -> Vec<String> {
    let strings = &state.config.strings;
    let mut lines = vec![
        String::new(),
        format!("## {}", strings.actions),
        format!("=> /search {}", strings.search),
        format!("=> {} {}", state.config.server.base_url(), strings.main),
    ];
    if let Some(source_url) = &state.config.wiki.source_url {
        lines.push(format!(
            "=> {} {}",
            with_suffix(source_url, uri),
            strings.source
        ));
    }
    if !strings.about.is_empty() {
        lines.push(strings.about.clone());
    }
    lines
}

/// The Aliases footer: one absolute link per configured alias, carrying
/// the same relative suffix as the served URI.
fn aliases_lines(state: &AppState, uri: &str) -> Vec<String> {
    if state.config.aliases.is_empty() {
        return Vec::new();
    }
    let strings = &state.config.strings;
    let mut lines = vec![String::new(), format!("## {}", strings.aliases)];
    for (base, name) in &state.config.aliases {
        lines.push(format!("=> {} {}", with_suffix(base, uri), name));
    }
    lines
}

/// Append a URI suffix to an external base URL.
fn with_suffix(base: &str, uri: &str) -> String {
    let base = base.trim_end_matches('/');
    if uri.is_empty() {
        base.to_owned()
    } else {
        format!("{base}/{uri}")
    }
}

/// Join body lines into the final newline-terminated gemtext.
fn join_body(lines: Vec<String>) -> String {
    let mut body = lines.join("\n");
    body.push('\n');
    body
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gw_cache::{MemoryCache, RenderCache};
    use gw_config::Config;
    use gw_search::{SearchDocument, SearchIndex};
    use gw_storage::MockStorage;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::response::Status;

    async fn state_with(config: Config, storage: MockStorage) -> AppState {
        let search = SearchIndex::connect("sqlite::memory:").await.unwrap();
        search.rebuild().await.unwrap();
        AppState {
            config,
            storage: Arc::new(storage),
            cache: Arc::new(MemoryCache::new()),
            search,
        }
    }

    fn body_text(response: &Response) -> String {
        String::from_utf8(response.body().unwrap().to_vec()).unwrap()
    }

    async fn request(state: &AppState, line: &str) -> Response {
        handle(state, &Request::parse(line).unwrap()).await
    }

    #[tokio::test]
    async fn test_home_renders_configured_page() {
        let mut config = Config::default();
        config.wiki.home = "intro".to_owned();
        let storage = MockStorage::new().with_page("intro", "====== Intro ======\nwelcome text");
        let state = state_with(config, storage).await;

        let response = request(&state, "gemini://localhost/").await;

        assert_eq!(response.status(), Status::Success);
        assert_eq!(response.meta(), "text/gemini");
        let body = body_text(&response);
        assert!(body.contains("# Intro"));
        assert!(body.contains("=> /search Search"));
    }

    #[tokio::test]
    async fn test_home_missing_page_falls_back_to_root_listing() {
        let storage = MockStorage::new().with_page("wiki:syntax", "====== Syntax ======");
        let state = state_with(Config::default(), storage).await;

        let response = request(&state, "gemini://localhost/").await;

        assert_eq!(response.status(), Status::Success);
        let body = body_text(&response);
        assert!(body.contains("# Welcome"));
        assert!(body.contains("=> /wiki"));
    }

    #[tokio::test]
    async fn test_home_empty_tree_is_not_found() {
        let state = state_with(Config::default(), MockStorage::new()).await;

        let response = request(&state, "gemini://localhost/").await;

        assert_eq!(response.status(), Status::NotFound);
    }

    #[tokio::test]
    async fn test_page_request_twice_is_byte_identical_and_cached() {
        let storage = MockStorage::new().with_page("wiki:syntax", "====== Syntax ======\nbody");
        let state = state_with(Config::default(), storage).await;

        let first = request(&state, "gemini://localhost/wiki:syntax").await;
        let second = request(&state, "gemini://localhost/wiki:syntax").await;

        assert_eq!(first, second);
        // The second response came from the cache: planting a marker body
        // under the same key must change what a third request returns
        let key = state.storage.page_path("wiki:syntax").unwrap();
        state.cache.set(&key.to_string_lossy(), "# marker\n");
        let third = request(&state, "gemini://localhost/wiki:syntax").await;
        assert_eq!(body_text(&third), "# marker\n");
    }

    #[tokio::test]
    async fn test_flush_forces_one_rerender() {
        let storage = MockStorage::new().with_page("a", "====== A ======");
        let state = state_with(Config::default(), storage).await;

        let first = request(&state, "gemini://localhost/a").await;
        state.cache.flush();
        let second = request(&state, "gemini://localhost/a").await;

        // Re-rendered identically and cached again
        assert_eq!(first, second);
        let key = state.storage.page_path("a").unwrap();
        assert!(state.cache.get(&key.to_string_lossy()).is_some());
    }

    #[tokio::test]
    async fn test_page_body_sections() {
        let mut config = Config::default();
        config.wiki.source_url = Some("https://wiki.example.org".to_owned());
        config
            .aliases
            .insert("https://mirror.example.org".to_owned(), "Mirror".to_owned());
        let storage = MockStorage::new()
            .with_page("guide", "====== Guide ======\nsee [[guide:setup|setup]]")
            .with_page("guide:setup", "====== Setup ======");
        let state = state_with(config, storage).await;

        let body = body_text(&request(&state, "gemini://localhost/guide").await);

        // Extracted outbound links under the Links heading
        assert!(body.contains("## Links\n=> /guide:setup"));
        // Actions with search, home, source
        assert!(body.contains("## Actions"));
        assert!(body.contains("=> /search Search"));
        assert!(body.contains("=> gemini://localhost Main page"));
        assert!(body.contains("=> https://wiki.example.org/guide Source"));
        // Aliases carry the same suffix
        assert!(body.contains("## Aliases\n=> https://mirror.example.org/guide Mirror"));
    }

    #[tokio::test]
    async fn test_page_index_menu_placeholder_substituted() {
        let storage = MockStorage::new()
            .with_page("guide", "====== Guide ======\n{{indexmenu>:guide}}")
            .with_page("guide:setup", "====== Setup ======");
        let state = state_with(Config::default(), storage).await;

        let body = body_text(&request(&state, "gemini://localhost/guide").await);

        assert!(body.contains("## Pages\n=> /guide:setup Setup"));
        assert!(!body.contains("indexmenu"));
    }

    #[tokio::test]
    async fn test_base_macro_substituted() {
        let storage = MockStorage::new().with_page("a", "home is %base%/start");
        let state = state_with(Config::default(), storage).await;

        let body = body_text(&request(&state, "gemini://localhost/a").await);

        assert!(body.contains("home is gemini://localhost/start"));
    }

    #[tokio::test]
    async fn test_directory_listing() {
        let storage = MockStorage::new()
            .with_page("wiki:wiki", "====== The Wiki ======")
            .with_page("wiki:syntax", "====== Syntax ======");
        let state = state_with(Config::default(), storage).await;

        let response = request(&state, "gemini://localhost/wiki").await;

        assert_eq!(response.status(), Status::Success);
        let body = body_text(&response);
        assert!(body.starts_with("# The Wiki\n"));
        assert!(body.contains("## Pages"));
        assert!(body.contains("=> /wiki:syntax Syntax"));
        // Directories extract no links from a body
        assert!(!body.contains("## Links"));
    }

    #[tokio::test]
    async fn test_directory_cached_under_directory_path() {
        let storage = MockStorage::new().with_page("wiki:syntax", "x");
        let state = state_with(Config::default(), storage).await;

        request(&state, "gemini://localhost/wiki").await;

        let key = state.storage.directory_path("wiki").unwrap();
        assert!(state.cache.get(&key.to_string_lossy()).is_some());
    }

    #[tokio::test]
    async fn test_media_bypasses_cache_and_renderer() {
        let storage =
            MockStorage::new().with_media("logo.png", vec![0x89, 0x50, 0x4e, 0x47], "image/png");
        let state = state_with(Config::default(), storage).await;

        let response = request(&state, "gemini://localhost/logo.png").await;

        assert_eq!(response.status(), Status::Success);
        assert_eq!(response.meta(), "image/png");
        assert_eq!(response.body().unwrap(), &[0x89, 0x50, 0x4e, 0x47]);
        let key = state.storage.media_path("logo.png").unwrap();
        assert_eq!(state.cache.get(&key.to_string_lossy()), None);
    }

    #[tokio::test]
    async fn test_missing_page_is_not_found() {
        let state = state_with(Config::default(), MockStorage::new().with_page("a", "x")).await;

        let response = request(&state, "gemini://localhost/missingpage").await;

        assert_eq!(response.status(), Status::NotFound);
        assert_eq!(response.meta(), "Resource not found");
    }

    #[tokio::test]
    async fn test_two_segment_path_is_not_found() {
        let storage = MockStorage::new().with_page("a:b", "x");
        let state = state_with(Config::default(), storage).await;

        let response = request(&state, "gemini://localhost/a/b").await;

        assert_eq!(response.status(), Status::NotFound);
    }

    #[tokio::test]
    async fn test_search_without_query_asks_for_input() {
        let state = state_with(Config::default(), MockStorage::new()).await;

        let response = request(&state, "gemini://localhost/search").await;

        assert_eq!(response.status(), Status::Input);
        assert_eq!(response.meta(), "Enter a search query");
    }

    #[tokio::test]
    async fn test_search_blank_query_asks_for_input() {
        let state = state_with(Config::default(), MockStorage::new()).await;

        let response = request(&state, "gemini://localhost/search?%20%20").await;

        assert_eq!(response.status(), Status::Input);
    }

    #[tokio::test]
    async fn test_search_lists_hits() {
        let state = state_with(Config::default(), MockStorage::new()).await;
        state
            .search
            .submit(&SearchDocument {
                uri: "wiki:syntax".to_owned(),
                name: "Syntax".to_owned(),
                data: "formatting rules".to_owned(),
            })
            .await
            .unwrap();

        let response = request(&state, "gemini://localhost/search?formatting").await;

        assert_eq!(response.status(), Status::Success);
        let body = body_text(&response);
        assert!(body.contains("# Search"));
        assert!(body.contains("Results: 1"));
        assert!(body.contains("=> /wiki:syntax Syntax"));
    }

    #[tokio::test]
    async fn test_search_nothing_found() {
        let state = state_with(Config::default(), MockStorage::new()).await;

        let response = request(&state, "gemini://localhost/search?absent").await;

        let body = body_text(&response);
        assert!(body.contains("Results: 0"));
        assert!(body.contains("Nothing found"));
    }

    #[tokio::test]
    async fn test_search_is_never_cached() {
        let state = state_with(Config::default(), MockStorage::new()).await;

        request(&state, "gemini://localhost/search?term").await;

        assert_eq!(state.cache.get(ROOT_CACHE_KEY), None);
    }

    #[tokio::test]
    async fn test_home_cached_under_root_sentinel() {
        let storage = MockStorage::new().with_page("start", "====== Start ======");
        let state = state_with(Config::default(), storage).await;

        request(&state, "gemini://localhost/").await;

        assert!(state.cache.get(ROOT_CACHE_KEY).is_some());
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(
            with_suffix("https://a.example.org/", "x:y"),
            "https://a.example.org/x:y"
        );
        assert_eq!(with_suffix("https://a.example.org", ""), "https://a.example.org");
    }
}
