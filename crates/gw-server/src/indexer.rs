//! Startup indexing pass.
//!
//! Walks the whole content tree once, renders every page the same way the
//! page handler would (same macros, placeholder stripped instead of
//! menu-filled), and submits the results to the search index. Runs to
//! completion before the listener starts accepting - the index is never
//! built while requests are being served.

use gw_renderer::{GemtextRenderer, first_heading};
use gw_search::SearchDocument;

use crate::error::ServerError;
use crate::handlers::{BASE_MACRO, INDEX_MENU_PATTERN};
use crate::state::AppState;

/// Index every page in the content tree.
///
/// Files without the configured page extension are ignored; files whose
/// URI cannot be resolved are skipped silently - stray files in the page
/// tree are expected, not an error. Returns the number of submitted
/// documents.
///
/// # Errors
///
/// Returns [`ServerError`] when the tree walk, a page read, or an index
/// submission fails; startup aborts rather than serving a partial index.
pub(crate) async fn build(state: &AppState) -> Result<usize, ServerError> {
    let ext = state.config.wiki.page_extension.as_str();
    let base_url = state.config.server.base_url();

    let mut submitted = 0usize;
    let mut skipped = 0usize;
    for path in state.storage.list_all()? {
        if !path.extension().is_some_and(|e| e == ext) {
            continue;
        }
        let Some(uri) = state.storage.uri_for_path(&path) else {
            skipped += 1;
            continue;
        };

        let bytes = state.storage.read(&path)?;
        let mut renderer = GemtextRenderer::new();
        renderer.set_macro(BASE_MACRO, &base_url);
        renderer.set_rule(INDEX_MENU_PATTERN, "")?;
        let data = renderer.render(&String::from_utf8_lossy(&bytes));
        let name = first_heading(&data).unwrap_or(&uri).to_owned();

        state
            .search
            .submit(&SearchDocument {
                uri,
                name,
                data,
            })
            .await?;
        submitted += 1;
    }
    if skipped > 0 {
        tracing::debug!(skipped, "pages without a resolvable uri were skipped");
    }
    Ok(submitted)
}
