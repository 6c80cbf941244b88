//! Collected style sections of a build pass.

use regex::Regex;
use std::sync::LazyLock;

static STYLE_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^<style\b[^>]*>").expect("Invalid style open regex"));

static STYLE_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</style\s*>$").expect("Invalid style close regex"));

/// Ordered, append-only collection of style texts.
///
/// Texts keep the order in which snippets were processed so the concatenated
/// stylesheet is deterministic for a given set of documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleAccumulator {
    styles: Vec<String>,
}

impl StyleAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a style section, stripping any wrapping `<style>` tags.
    ///
    /// Blank sections contribute nothing. Returns whether a text was added.
    pub fn push(&mut self, style: &str) -> bool {
        let text = strip_style_tags(style);
        if text.is_empty() {
            return false;
        }
        self.styles.push(text.to_string());
        true
    }

    /// Move every text of `other` to the end of this accumulator.
    pub fn append(&mut self, other: &mut StyleAccumulator) {
        self.styles.append(&mut other.styles);
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.styles.iter().map(String::as_str)
    }

    /// All texts joined with newlines, ready for the stylesheet pipeline.
    pub fn concatenated(&self) -> String {
        self.styles.join("\n")
    }

    /// Drop every collected text. Only used between full regeneration passes.
    pub fn clear(&mut self) {
        self.styles.clear();
    }

    pub fn into_vec(self) -> Vec<String> {
        self.styles
    }
}

/// Trim a style section and remove a surrounding `<style ...>...</style>`.
pub fn strip_style_tags(style: &str) -> &str {
    let mut text = style.trim();
    if let Some(open) = STYLE_OPEN_RE.find(text) {
        text = &text[open.end()..];
        if let Some(close) = STYLE_CLOSE_RE.find(text) {
            text = &text[..close.start()];
        }
    }
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_wrapping_style_tags() {
        assert_eq!(
            strip_style_tags("  <style scoped>\n.a { color: red; }\n</style>\n"),
            ".a { color: red; }"
        );
        assert_eq!(strip_style_tags("\n.b { margin: 0 }\n"), ".b { margin: 0 }");
    }

    #[test]
    fn preserves_append_order() {
        let mut styles = StyleAccumulator::new();
        assert!(styles.push(".first {}"));
        assert!(styles.push("<style>.second {}</style>"));
        assert!(!styles.push("   "));

        let collected: Vec<&str> = styles.iter().collect();
        assert_eq!(collected, vec![".first {}", ".second {}"]);
        assert_eq!(styles.concatenated(), ".first {}\n.second {}");
    }

    #[test]
    fn appends_other_accumulator() {
        let mut pass = StyleAccumulator::new();
        pass.push(".a {}");

        let mut snippet = StyleAccumulator::new();
        snippet.push(".b {}");
        pass.append(&mut snippet);

        assert!(snippet.is_empty());
        assert_eq!(pass.len(), 2);

        pass.clear();
        assert!(pass.is_empty());
    }
}
