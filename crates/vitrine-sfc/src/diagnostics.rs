//! Structured diagnostics reported by the pipeline stages.

use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Advisory hint; never affects the output
    Tip,
    /// Output was produced but may not behave as written
    Warning,
    /// The stage fell back to a no-op artifact
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Tip => f.write_str("tip"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A position in the source a diagnostic points at (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    /// Compute the line and column of a byte offset into `source`.
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        Self { line, column }
    }
}

/// A single message produced while compiling a snippet.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Option<Span>,
    pub message: String,
}

impl Diagnostic {
    pub fn tip(message: impl Into<String>) -> Self {
        Self::new(Severity::Tip, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            span: None,
            message: message.into(),
        }
    }

    /// Attach a source position.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Emit this diagnostic through `tracing`.
    pub fn log(&self) {
        match self.severity {
            Severity::Tip => tracing::info!("{}", self),
            Severity::Warning | Severity::Error => tracing::warn!("{}", self),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(span) = self.span {
            write!(f, " (line {}, column {})", span.line, span.column)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_span_from_offset() {
        let source = "<div>\n  <span>\n</div>";

        assert_eq!(Span::from_offset(source, 0), Span { line: 1, column: 1 });
        assert_eq!(Span::from_offset(source, 8), Span { line: 2, column: 3 });
        assert_eq!(
            Span::from_offset(source, source.len() + 10),
            Span { line: 3, column: 7 }
        );
    }

    #[test]
    fn displays_with_position() {
        let diagnostic = Diagnostic::error("tag <span> has no matching end tag.")
            .with_span(Span { line: 2, column: 3 });

        assert_eq!(
            diagnostic.to_string(),
            "error: tag <span> has no matching end tag. (line 2, column 3)"
        );
        assert!(diagnostic.is_error());
        assert!(!Diagnostic::tip("hint").is_error());
    }
}
