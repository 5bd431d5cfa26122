//! Line-level wikitext transformation rules.
//!
//! Gemtext is line-oriented, so the conversion works line by line: block
//! markup (headings, lists) rewrites the whole line, inline markup is
//! stripped in place, and links collected from a line are emitted as
//! `=>` lines directly after it.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Unordered/ordered list item: two or more leading spaces, `*` or `-`.
static LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{2,}[*-]\s*(.*)$").unwrap());

/// Internal or external link: `[[target]]` or `[[target|label]]`.
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^|\[\]]+?)(?:\|([^\[\]]*))?\]\]").unwrap());

/// Embedded media: `{{target}}` or `{{target|caption}}`.
static MEDIA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^|{}]+?)(?:\|([^{}]*))?\}\}").unwrap());

/// Bold `**text**`.
static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

/// Italic `//text//`. The guard group keeps `://` in URLs intact.
static ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^:])//([^/]+?)//").unwrap());

/// Underline `__text__`.
static UNDERLINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"__(.*?)__").unwrap());

/// Monospace `''text''`.
static MONO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"''(.*?)''").unwrap());

/// Escaped spans: `<nowiki>text</nowiki>` or `%%text%%`.
static NOWIKI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<nowiki>(.*?)</nowiki>|%%(.*?)%%").unwrap());

/// Opening code/file block tag, optionally with a language hint.
static CODE_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<(?:code|file)(?:\s+(\w+))?[^>]*>\s*$").unwrap());

/// Closing code/file block tag.
static CODE_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^</(?:code|file)>\s*$").unwrap());

/// A link collected from inline markup, emitted as its own gemtext line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Link {
    pub target: String,
    pub label: String,
}

impl Link {
    /// Render as a gemtext link line.
    pub fn to_line(&self) -> String {
        if self.label.is_empty() {
            format!("=> {}", self.target)
        } else {
            format!("=> {} {}", self.target, self.label)
        }
    }
}

/// Match an opening code fence, returning the optional language hint.
pub(crate) fn code_open(line: &str) -> Option<&str> {
    CODE_OPEN_RE
        .captures(line.trim())
        .map(|c| c.get(1).map_or("", |m| m.as_str()))
}

/// Whether the line closes a code block.
pub(crate) fn code_close(line: &str) -> bool {
    CODE_CLOSE_RE.is_match(line.trim())
}

/// Rewrite block-level markup: headings and list items.
pub(crate) fn block(line: &str) -> String {
    if let Some(heading) = heading(line) {
        return heading;
    }
    if let Some(caps) = LIST_RE.captures(line) {
        return format!("* {}", &caps[1]);
    }
    line.to_owned()
}

/// Convert a `== ... ==` heading line.
///
/// DokuWiki levels run from `======` (page title) down to `==`; gemtext has
/// three levels, so everything below the second collapses onto `###`.
fn heading(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if !trimmed.starts_with("==") || !trimmed.ends_with("==") || trimmed.len() < 5 {
        return None;
    }
    let opening = trimmed.chars().take_while(|c| *c == '=').count();
    let closing = trimmed.chars().rev().take_while(|c| *c == '=').count();
    let n = opening.min(closing).min(6);
    if n * 2 >= trimmed.len() {
        return None;
    }
    let text = trimmed[n..trimmed.len() - n].trim();
    if text.is_empty() {
        return None;
    }
    let level = match n {
        6 => "#",
        5 => "##",
        _ => "###",
    };
    Some(format!("{level} {text}"))
}

/// Placeholder delimiter for escaped spans, restored after all other
/// rules ran. U+001A never appears in wiki source.
const ESCAPE_MARK: char = '\u{1a}';

/// Strip inline markup and extract links from a line.
///
/// Link and media markup is replaced by its label text; the collected
/// targets are returned so the caller can emit them as separate lines.
/// `<nowiki>` and `%%` spans are carved out first so their content
/// survives the other rules verbatim.
pub(crate) fn inline(line: &str) -> (String, Vec<Link>) {
    let mut links = Vec::new();

    let mut escaped: Vec<String> = Vec::new();
    let text = NOWIKI_RE.replace_all(line, |caps: &Captures<'_>| {
        let content = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map_or("", |m| m.as_str());
        escaped.push(content.to_owned());
        format!("{ESCAPE_MARK}{}{ESCAPE_MARK}", escaped.len() - 1)
    });

    let text = LINK_RE.replace_all(&text, |caps: &Captures<'_>| {
        let target = link_target(&caps[1]);
        let label = caps
            .get(2)
            .map_or_else(|| link_label(&caps[1]), |m| m.as_str().trim().to_owned());
        let shown = label.clone();
        links.push(Link { target, label });
        shown
    });

    let text = MEDIA_RE.replace_all(&text, |caps: &Captures<'_>| {
        let target = link_target(caps[1].split('?').next().unwrap_or(""));
        let label = caps
            .get(2)
            .map_or_else(String::new, |m| m.as_str().trim().to_owned());
        let shown = label.clone();
        links.push(Link { target, label });
        shown
    });

    let text = BOLD_RE.replace_all(&text, "$1");
    let text = ITALIC_RE.replace_all(&text, "$1$2");
    let text = UNDERLINE_RE.replace_all(&text, "$1");
    let text = MONO_RE.replace_all(&text, "$1");
    let mut text = text
        .trim_end()
        .trim_end_matches("\\\\")
        .trim_end()
        .to_owned();
    for (i, content) in escaped.iter().enumerate() {
        text = text.replace(&format!("{ESCAPE_MARK}{i}{ESCAPE_MARK}"), content);
    }

    (text, links)
}

/// Resolve a raw link target to a gemtext-addressable form.
///
/// External URLs pass through; wiki identifiers become root-relative paths
/// with their section anchor stripped (gemtext has no fragments).
fn link_target(raw: &str) -> String {
    let raw = raw.trim();
    if raw.contains("://") || raw.starts_with("mailto:") {
        return raw.to_owned();
    }
    let id = raw.split('#').next().unwrap_or("").trim_matches(':');
    format!("/{id}")
}

/// Default display text for a link written without a label.
fn link_label(raw: &str) -> String {
    let raw = raw.trim();
    if raw.contains("://") {
        return raw.to_owned();
    }
    raw.split('#')
        .next()
        .unwrap_or("")
        .rsplit(':')
        .next()
        .unwrap_or("")
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_heading_levels() {
        assert_eq!(block("====== Title ======"), "# Title");
        assert_eq!(block("===== Sub ====="), "## Sub");
        assert_eq!(block("==== Deep ===="), "### Deep");
        assert_eq!(block("== Deepest =="), "### Deepest");
    }

    #[test]
    fn test_heading_requires_text() {
        assert_eq!(block("======"), "======");
        assert_eq!(block("== =="), "== ==");
    }

    #[test]
    fn test_list_items() {
        assert_eq!(block("  * first"), "* first");
        assert_eq!(block("    - ordered"), "* ordered");
        assert_eq!(block("no list"), "no list");
    }

    #[test]
    fn test_inline_formatting_stripped() {
        let (text, links) = inline("**bold** and //italic// and __under__ and ''mono''");
        assert_eq!(text, "bold and italic and under and mono");
        assert!(links.is_empty());
    }

    #[test]
    fn test_italic_preserves_urls() {
        let (text, _) = inline("see gemini://example.org for details");
        assert_eq!(text, "see gemini://example.org for details");
    }

    #[test]
    fn test_internal_link() {
        let (text, links) = inline("read [[wiki:syntax|the syntax page]] first");
        assert_eq!(text, "read the syntax page first");
        assert_eq!(
            links,
            vec![Link {
                target: "/wiki:syntax".to_owned(),
                label: "the syntax page".to_owned(),
            }]
        );
    }

    #[test]
    fn test_unlabeled_link_uses_leaf() {
        let (text, links) = inline("see [[wiki:syntax]]");
        assert_eq!(text, "see syntax");
        assert_eq!(links[0].target, "/wiki:syntax");
        assert_eq!(links[0].label, "syntax");
    }

    #[test]
    fn test_external_link_passes_through() {
        let (_, links) = inline("[[https://example.org/page|example]]");
        assert_eq!(links[0].target, "https://example.org/page");
    }

    #[test]
    fn test_anchor_is_stripped() {
        let (_, links) = inline("[[wiki:syntax#lists]]");
        assert_eq!(links[0].target, "/wiki:syntax");
    }

    #[test]
    fn test_media_with_size_suffix() {
        let (text, links) = inline("{{wiki:logo.png?200|The logo}}");
        assert_eq!(text, "The logo");
        assert_eq!(links[0].target, "/wiki:logo.png");
        assert_eq!(links[0].label, "The logo");
    }

    #[test]
    fn test_nowiki_spans() {
        let (text, _) = inline("<nowiki>**raw**</nowiki> and %%//also//%%");
        assert_eq!(text, "**raw** and //also//");
    }

    #[test]
    fn test_forced_linebreak_trimmed() {
        let (text, _) = inline("end of line \\\\");
        assert_eq!(text, "end of line");
    }

    #[test]
    fn test_code_fences() {
        assert_eq!(code_open("<code php>"), Some("php"));
        assert_eq!(code_open("<code>"), Some(""));
        assert_eq!(code_open("<file ini>"), Some("ini"));
        assert_eq!(code_open("plain text"), None);
        assert!(code_close("</code>"));
        assert!(code_close("</file>"));
        assert!(!code_close("</b>"));
    }

    #[test]
    fn test_link_line_rendering() {
        let link = Link {
            target: "/a:b".to_owned(),
            label: String::new(),
        };
        assert_eq!(link.to_line(), "=> /a:b");

        let link = Link {
            target: "/a:b".to_owned(),
            label: "B".to_owned(),
        };
        assert_eq!(link.to_line(), "=> /a:b B");
    }
}
