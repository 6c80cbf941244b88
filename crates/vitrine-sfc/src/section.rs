//! Splits a snippet into component definitions.
//!
//! A snippet is a sequence of top-level `<template>`, `<script>` and `<style>`
//! blocks. Every template starts a new definition; the script and style that
//! follow it (before the next template) belong to that definition.

use regex::Regex;
use std::sync::LazyLock;

use crate::diagnostics::Span;
use crate::error::SfcError;

/// One component extracted from a snippet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentDefinition {
    /// Inner markup of the `<template>` block
    pub template: String,

    /// Inner source of the `<script>` block, if any
    pub behavior: Option<String>,

    /// Inner text of the `<style>` block, if any
    pub style: Option<String>,

    /// Line of the `<template>` tag within the snippet (1-indexed)
    pub line: usize,

    /// Column the template markup starts at on that line (1-indexed)
    pub column: usize,
}

impl ComponentDefinition {
    /// Create a definition with only a template section.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            line: 1,
            column: 1,
            ..Default::default()
        }
    }

    pub fn with_behavior(mut self, behavior: impl Into<String>) -> Self {
        self.behavior = Some(behavior.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

static BLOCK_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--|<(template|script|style)\b([^>]*)>").expect("Invalid block open regex")
});

static TEMPLATE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<template\b[^>]*?(/?)>|</template\s*>").expect("Invalid template tag regex")
});

static SCRIPT_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</script\s*>").expect("Invalid script close regex"));

static STYLE_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</style\s*>").expect("Invalid style close regex"));

/// Extract every component definition from a snippet, in source order.
///
/// Returns an empty list when the snippet has no `<template>` block.
pub fn extract_definitions(snippet: &str) -> Result<Vec<ComponentDefinition>, SfcError> {
    let mut definitions: Vec<ComponentDefinition> = Vec::new();
    let mut leading_style: Option<String> = None;
    let mut pos = 0;

    while let Some(caps) = BLOCK_OPEN_RE.captures_at(snippet, pos) {
        let Some(open) = caps.get(0) else {
            break;
        };

        if open.as_str() == "<!--" {
            match snippet[open.end()..].find("-->") {
                Some(end) => {
                    pos = open.end() + end + 3;
                    continue;
                }
                None => break,
            }
        }

        let kind = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let attrs = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let line = Span::from_offset(snippet, open.start()).line;

        // Self-closing blocks carry no content
        if attrs.trim_end().ends_with('/') {
            pos = open.end();
            continue;
        }

        let closed = match kind {
            "template" => find_template_close(snippet, open.end()),
            "script" => find_raw_close(snippet, open.end(), &SCRIPT_CLOSE_RE),
            _ => find_raw_close(snippet, open.end(), &STYLE_CLOSE_RE),
        };
        let Some((content, next)) = closed else {
            return Err(ambiguity(format!(
                "<{}> block at line {} is never closed",
                kind, line
            )));
        };
        pos = next;

        match kind {
            "template" => definitions.push(ComponentDefinition {
                template: content.to_string(),
                behavior: None,
                style: None,
                line,
                column: Span::from_offset(snippet, open.end()).column,
            }),
            "script" => {
                let Some(current) = definitions.last_mut() else {
                    return Err(ambiguity(format!(
                        "<script> block at line {} appears before any <template>",
                        line
                    )));
                };
                if current.behavior.is_some() {
                    return Err(ambiguity(format!(
                        "component at line {} has more than one <script> block",
                        current.line
                    )));
                }
                current.behavior = Some(content.to_string());
            }
            _ => match definitions.last_mut() {
                Some(current) => {
                    if current.style.is_some() {
                        return Err(ambiguity(format!(
                            "component at line {} has more than one <style> block",
                            current.line
                        )));
                    }
                    current.style = Some(content.to_string());
                }
                None => {
                    if leading_style.is_some() {
                        return Err(ambiguity(format!(
                            "more than one <style> block before the first <template> (line {})",
                            line
                        )));
                    }
                    leading_style = Some(content.to_string());
                }
            },
        }
    }

    if let Some(style) = leading_style {
        if let Some(first) = definitions.first_mut() {
            if first.style.is_some() {
                return Err(ambiguity(format!(
                    "component at line {} has more than one <style> block",
                    first.line
                )));
            }
            first.style = Some(style);
        }
    }

    Ok(definitions)
}

/// Find the `</template>` matching an opening tag whose `>` ends at `start`.
///
/// Returns the inner content and the offset just past the closing tag.
fn find_template_close(source: &str, start: usize) -> Option<(&str, usize)> {
    let remaining = &source[start..];
    let mut depth = 1;

    for caps in TEMPLATE_TAG_RE.captures_iter(remaining) {
        let tag = caps.get(0)?;
        if tag.as_str().starts_with("</") {
            depth -= 1;
            if depth == 0 {
                return Some((&remaining[..tag.start()], start + tag.end()));
            }
        } else if caps.get(1).map(|m| m.as_str()) != Some("/") {
            depth += 1;
        }
    }

    None
}

/// Find the closing tag of a raw-text block (script or style).
fn find_raw_close<'a>(source: &'a str, start: usize, close: &Regex) -> Option<(&'a str, usize)> {
    let remaining = &source[start..];
    close
        .find(remaining)
        .map(|m| (&remaining[..m.start()], start + m.end()))
}

fn ambiguity(message: String) -> SfcError {
    SfcError::SectionExtractionAmbiguity(message)
}
