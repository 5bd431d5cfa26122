//! Navigation assembly.
//!
//! Produces the child-section and child-page link lists one level below a
//! URI. Both lists are deduplicated and sorted ascending by URI - that
//! ordering is part of the contract, since assembled menus end up in
//! cached bodies and tests compare them byte for byte.

use std::collections::BTreeSet;
use std::path::Path;

use gw_config::Strings;
use gw_renderer::{GemtextRenderer, first_heading};
use gw_storage::{Storage, StorageError, uri};

/// A single menu link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MenuEntry {
    /// Target URI.
    pub uri: String,
    /// Display label; sections without a resolvable title have none.
    pub label: Option<String>,
}

impl MenuEntry {
    /// Render as a gemtext link line.
    pub fn to_line(&self) -> String {
        match &self.label {
            Some(label) => format!("=> /{} {}", self.uri, label),
            None => format!("=> /{}", self.uri),
        }
    }
}

/// Child sections and pages of one URI.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Menu {
    /// Namespaces one level below, sorted ascending.
    pub sections: Vec<MenuEntry>,
    /// Pages one level below, sorted ascending.
    pub pages: Vec<MenuEntry>,
}

impl Menu {
    /// Whether both lists are empty.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.pages.is_empty()
    }
}

/// Collect the children of `uri`, one level deep.
///
/// The content tree below the URI is enumerated once; pages exactly one
/// level down become page entries, anything deeper contributes its
/// depth-plus-one prefix as a section. Grandchildren are never flattened
/// into the listing, and a URI never appears in its own section list.
pub(crate) fn children(storage: &dyn Storage, uri: &str) -> Result<Menu, StorageError> {
    let Some(dir) = storage.directory_path(uri) else {
        return Ok(Menu::default());
    };

    let child_depth = uri::depth(uri) + 1;
    let mut section_uris = BTreeSet::new();
    let mut page_uris = BTreeSet::new();
    for path in storage.pages_under(&dir)? {
        let Some(child) = storage.uri_for_path(&path) else {
            continue;
        };
        if !uri::is_within(&child, uri) {
            continue;
        }
        if uri::depth(&child) == child_depth {
            page_uris.insert(child);
        } else {
            section_uris.insert(uri::truncate(&child, child_depth));
        }
    }
    section_uris.remove(uri);

    Ok(Menu {
        sections: section_uris
            .into_iter()
            .map(|s| {
                let label = section_label(storage, &s);
                MenuEntry { uri: s, label }
            })
            .collect(),
        pages: page_uris
            .into_iter()
            .map(|p| {
                let label = storage
                    .page_path(&p)
                    .and_then(|path| page_title(storage, &path))
                    .unwrap_or_else(|| uri::leaf(&p).to_owned());
                MenuEntry {
                    uri: p,
                    label: Some(label),
                }
            })
            .collect(),
    })
}

/// Resolve a section's display label.
///
/// Prefers the same-named index page nested one level under the section
/// (`a:b` -> page `a:b:b`), then a page at the section path itself, then
/// gives up - an unlabeled section link is still useful.
pub(crate) fn section_label(storage: &dyn Storage, section: &str) -> Option<String> {
    let index = uri::join(section, uri::leaf(section));
    [index, section.to_owned()].iter().find_map(|candidate| {
        storage
            .page_path(candidate)
            .and_then(|path| page_title(storage, &path))
    })
}

/// First heading of a page, rendered without request context.
pub(crate) fn page_title(storage: &dyn Storage, path: &Path) -> Option<String> {
    let bytes = storage.read(path).ok()?;
    let rendered = GemtextRenderer::new().render(&String::from_utf8_lossy(&bytes));
    first_heading(&rendered).map(ToOwned::to_owned)
}

/// Build a directory heading by resolving each URI prefix to a title.
///
/// The root directory is titled with the configured welcome string; so is
/// the first segment of any path that resolves to no title. Deeper
/// untitled prefixes fall back to their own segment name.
pub(crate) fn directory_heading(storage: &dyn Storage, strings: &Strings, uri: &str) -> String {
    if uri.is_empty() {
        return format!("# {}", strings.welcome);
    }
    let parts: Vec<String> = uri::prefixes(uri)
        .iter()
        .enumerate()
        .map(|(i, prefix)| {
            section_label(storage, prefix).unwrap_or_else(|| {
                if i == 0 {
                    strings.welcome.clone()
                } else {
                    uri::leaf(prefix).to_owned()
                }
            })
        })
        .collect();
    format!("# {}", parts.join(" / "))
}

/// Render a menu as gemtext lines, omitting headers of empty lists.
pub(crate) fn menu_lines(strings: &Strings, menu: &Menu) -> Vec<String> {
    let mut lines = Vec::new();
    if !menu.sections.is_empty() {
        lines.push(format!("## {}", strings.sections));
        lines.extend(menu.sections.iter().map(MenuEntry::to_line));
    }
    if !menu.pages.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("## {}", strings.pages));
        lines.extend(menu.pages.iter().map(MenuEntry::to_line));
    }
    lines
}

#[cfg(test)]
mod tests {
    use gw_storage::MockStorage;
    use pretty_assertions::assert_eq;

    use super::*;

    fn storage() -> MockStorage {
        MockStorage::new()
            .with_page("start", "====== Start ======")
            .with_page("wiki:wiki", "====== The Wiki ======")
            .with_page("wiki:syntax", "====== Syntax ======")
            .with_page("wiki:plugins:indexmenu", "====== Indexmenu ======")
            .with_page("notes:todo", "no heading here")
    }

    #[test]
    fn test_children_of_root() {
        let storage = storage();

        let menu = children(&storage, "").unwrap();

        let sections: Vec<&str> = menu.sections.iter().map(|e| e.uri.as_str()).collect();
        let pages: Vec<&str> = menu.pages.iter().map(|e| e.uri.as_str()).collect();
        assert_eq!(sections, vec!["notes", "wiki"]);
        assert_eq!(pages, vec!["start"]);
    }

    #[test]
    fn test_children_one_level_only() {
        let storage = storage();

        let menu = children(&storage, "wiki").unwrap();

        let pages: Vec<&str> = menu.pages.iter().map(|e| e.uri.as_str()).collect();
        // "wiki:plugins:indexmenu" is a grandchild: only its prefix shows up
        assert_eq!(pages, vec!["wiki:syntax", "wiki:wiki"]);
        let sections: Vec<&str> = menu.sections.iter().map(|e| e.uri.as_str()).collect();
        assert_eq!(sections, vec!["wiki:plugins"]);
    }

    #[test]
    fn test_children_sorted_and_deduplicated() {
        let storage = MockStorage::new()
            .with_page("z:a", "x")
            .with_page("a:b", "x")
            .with_page("a:c", "x")
            .with_page("m:x:deep", "x")
            .with_page("m:y:deep", "x");

        let menu = children(&storage, "").unwrap();

        let sections: Vec<&str> = menu.sections.iter().map(|e| e.uri.as_str()).collect();
        assert_eq!(sections, vec!["a", "m", "z"]);
        assert!(menu.pages.is_empty());
    }

    #[test]
    fn test_children_of_leaf_page_is_empty() {
        let storage = storage();

        let menu = children(&storage, "start").unwrap();

        assert!(menu.is_empty());
    }

    #[test]
    fn test_section_label_prefers_nested_index_page() {
        let storage = storage();

        assert_eq!(
            section_label(&storage, "wiki").as_deref(),
            Some("The Wiki")
        );
    }

    #[test]
    fn test_section_label_falls_back_to_section_page() {
        let storage = MockStorage::new()
            .with_page("docs", "====== Documentation ======")
            .with_page("docs:intro", "x");

        assert_eq!(
            section_label(&storage, "docs").as_deref(),
            Some("Documentation")
        );
    }

    #[test]
    fn test_section_label_absent() {
        let storage = storage();

        assert_eq!(section_label(&storage, "notes"), None);
    }

    #[test]
    fn test_page_label_falls_back_to_leaf() {
        let storage = storage();

        let menu = children(&storage, "notes").unwrap();

        assert_eq!(menu.pages[0].label.as_deref(), Some("todo"));
    }

    #[test]
    fn test_menu_lines_omit_empty_headers() {
        let strings = Strings::default();
        let menu = Menu {
            sections: Vec::new(),
            pages: vec![MenuEntry {
                uri: "start".to_owned(),
                label: Some("Start".to_owned()),
            }],
        };

        let lines = menu_lines(&strings, &menu);

        assert_eq!(lines, vec!["## Pages".to_owned(), "=> /start Start".to_owned()]);
    }

    #[test]
    fn test_menu_lines_empty_menu_is_no_lines() {
        let lines = menu_lines(&Strings::default(), &Menu::default());

        assert!(lines.is_empty());
    }

    #[test]
    fn test_unlabeled_section_line() {
        let entry = MenuEntry {
            uri: "notes".to_owned(),
            label: None,
        };

        assert_eq!(entry.to_line(), "=> /notes");
    }

    #[test]
    fn test_directory_heading_walks_prefixes() {
        let storage = storage();

        assert_eq!(
            directory_heading(&storage, &Strings::default(), "wiki:plugins"),
            "# The Wiki / plugins"
        );
    }

    #[test]
    fn test_directory_heading_root_is_welcome() {
        let storage = storage();

        assert_eq!(
            directory_heading(&storage, &Strings::default(), ""),
            "# Welcome"
        );
    }

    #[test]
    fn test_directory_heading_untitled_first_segment() {
        let storage = storage();

        assert_eq!(
            directory_heading(&storage, &Strings::default(), "notes"),
            "# Welcome"
        );
    }
}
