//! Code block classification.

/// Language of a fenced code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    Vue,
    Html,
    JavaScript,
    Css,
    Json,
    Bash,
    #[default]
    Unknown,
}

impl Language {
    /// Parse language from code fence info string.
    pub fn from_info(info: &str) -> Self {
        let lang = info.split_whitespace().next().unwrap_or("");
        match lang.to_lowercase().as_str() {
            "vue" => Self::Vue,
            "html" | "htm" => Self::Html,
            "js" | "javascript" => Self::JavaScript,
            "css" => Self::Css,
            "json" => Self::Json,
            "bash" | "sh" | "shell" => Self::Bash,
            _ => Self::Unknown,
        }
    }

    /// Whether blocks in this language may define components.
    pub fn can_embed_components(&self) -> bool {
        matches!(self, Self::Vue | Self::Html)
    }
}

/// What to do with a code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockMode {
    /// Show the source and mount its components (default)
    #[default]
    Demo,
    /// Show the source only
    Source,
}

impl BlockMode {
    /// Parse mode from code fence info string.
    pub fn from_info(info: &str) -> Self {
        if info.split_whitespace().skip(1).any(|word| word == "no-demo") {
            Self::Source
        } else {
            Self::Demo
        }
    }
}

/// A fenced code block.
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    /// Unique identifier for this block (format: snippet-{line_number})
    pub id: String,

    pub language: Language,

    pub mode: BlockMode,

    /// Language token as written in the info string
    pub lang_tag: Option<String>,

    /// Block content
    pub source: String,

    /// Line of the opening fence (1-indexed)
    pub line_number: usize,
}

impl Snippet {
    /// Create a snippet from a code fence info string and its content.
    pub fn new(info: &str, source: String, line_number: usize) -> Self {
        Self {
            id: format!("snippet-{}", line_number),
            language: Language::from_info(info),
            mode: BlockMode::from_info(info),
            lang_tag: info.split_whitespace().next().map(str::to_string),
            source,
            line_number,
        }
    }

    /// Whether the block defines components that should be mounted.
    pub fn is_demo(&self) -> bool {
        self.mode == BlockMode::Demo
            && self.language.can_embed_components()
            && self.source.contains("<template")
    }

    /// Line in the markdown file of a line within the block's content.
    pub fn source_line(&self, line: usize) -> usize {
        self.line_number + line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_language() {
        assert_eq!(Language::from_info("vue"), Language::Vue);
        assert_eq!(Language::from_info("HTML no-demo"), Language::Html);
        assert_eq!(Language::from_info("js"), Language::JavaScript);
        assert_eq!(Language::from_info(""), Language::Unknown);
    }

    #[test]
    fn parses_mode() {
        assert_eq!(BlockMode::from_info("vue"), BlockMode::Demo);
        assert_eq!(BlockMode::from_info("vue no-demo"), BlockMode::Source);
        assert_eq!(BlockMode::from_info("no-demo"), BlockMode::Demo);
    }

    #[test]
    fn detects_demo_snippets() {
        let demo = Snippet::new("vue", "<template><p>x</p></template>".to_string(), 3);
        assert!(demo.is_demo());
        assert_eq!(demo.id, "snippet-3");
        assert_eq!(demo.lang_tag.as_deref(), Some("vue"));

        let source_only = Snippet::new("vue no-demo", demo.source.clone(), 3);
        assert!(!source_only.is_demo());

        let script = Snippet::new("js", "const t = '<template>';".to_string(), 3);
        assert!(!script.is_demo());

        let markup = Snippet::new("html", "<p>no component</p>".to_string(), 3);
        assert!(!markup.is_demo());
    }

    #[test]
    fn maps_content_lines_to_file_lines() {
        let snippet = Snippet::new("vue", String::new(), 10);
        assert_eq!(snippet.source_line(1), 11);
    }
}
