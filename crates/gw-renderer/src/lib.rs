//! DokuWiki wikitext to gemtext renderer.
//!
//! [`GemtextRenderer`] converts raw wiki source into gemtext. The
//! conversion is rule-driven: block markup (headings, lists, code blocks)
//! is rewritten line by line, inline markup is stripped, and links are
//! lifted onto their own `=>` lines as gemtext requires.
//!
//! Two per-instance hooks let the caller shape the output before the
//! structural pass runs:
//!
//! - **Macros** ([`set_macro`](GemtextRenderer::set_macro)): literal token
//!   substitution, e.g. `%base%` -> the capsule's base URL.
//! - **Content rules** ([`set_rule`](GemtextRenderer::set_rule)): regex
//!   substitutions, e.g. replacing an index-menu placeholder with an
//!   assembled navigation block.
//!
//! Both are request-scoped state; a renderer instance is cheap to build
//! because the structural rule set is compiled once per process.
//!
//! # Example
//!
//! ```
//! use gw_renderer::{GemtextRenderer, first_heading};
//!
//! let renderer = GemtextRenderer::new();
//! let gemtext = renderer.render("====== Hello ======\nSome **bold** text.");
//! assert_eq!(first_heading(&gemtext), Some("Hello"));
//! ```

mod rules;

use regex::Regex;

/// Renderer error.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A caller-supplied content rule failed to compile.
    #[error("invalid content rule: {0}")]
    Rule(#[from] regex::Error),
}

/// Wikitext to gemtext converter with per-instance macros and content rules.
#[derive(Debug, Default)]
pub struct GemtextRenderer {
    /// Literal token substitutions, applied first.
    macros: Vec<(String, String)>,
    /// Caller-injected regex substitutions, applied after macros.
    content_rules: Vec<(Regex, String)>,
}

impl GemtextRenderer {
    /// Create a renderer with the default rule set and no macros.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a literal macro substitution.
    ///
    /// Every occurrence of `token` in the source is replaced by `value`
    /// before any other processing.
    pub fn set_macro(&mut self, token: impl Into<String>, value: impl Into<String>) {
        self.macros.push((token.into(), value.into()));
    }

    /// Register a content rule: a regex substitution applied to the whole
    /// source after macros and before the structural pass.
    ///
    /// The replacement may use `$1`-style group references and may span
    /// multiple output lines (e.g. an injected menu block).
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Rule`] when the pattern does not compile.
    pub fn set_rule(&mut self, pattern: &str, replacement: &str) -> Result<(), RenderError> {
        let re = Regex::new(pattern)?;
        self.content_rules.push((re, replacement.to_owned()));
        Ok(())
    }

    /// Convert wiki source to gemtext.
    #[must_use]
    pub fn render(&self, source: &str) -> String {
        let mut text = source.to_owned();
        for (token, value) in &self.macros {
            text = text.replace(token, value);
        }
        for (re, replacement) in &self.content_rules {
            text = re.replace_all(&text, replacement.as_str()).into_owned();
        }

        let mut out: Vec<String> = Vec::new();
        let mut in_code = false;
        for line in text.lines() {
            if in_code {
                if rules::code_close(line) {
                    out.push("```".to_owned());
                    in_code = false;
                } else {
                    out.push(line.to_owned());
                }
                continue;
            }
            if let Some(lang) = rules::code_open(line) {
                out.push(format!("```{lang}"));
                in_code = true;
                continue;
            }

            let (converted, links) = rules::inline(&rules::block(line));
            out.push(converted);
            out.extend(links.iter().map(rules::Link::to_line));
        }
        // An unterminated code block still produces valid gemtext
        if in_code {
            out.push("```".to_owned());
        }

        let mut body = out.join("\n");
        body.push('\n');
        body
    }
}

/// Extract the first top-level heading from rendered gemtext.
#[must_use]
pub fn first_heading(gemtext: &str) -> Option<&str> {
    gemtext
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(str::trim)
}

/// Extract the targets of all link lines from rendered gemtext.
#[must_use]
pub fn outbound_links(gemtext: &str) -> Vec<&str> {
    gemtext
        .lines()
        .filter_map(|line| line.strip_prefix("=>"))
        .filter_map(|rest| rest.split_whitespace().next())
        .collect()
}
