//! Errors raised by the compilation pipeline.

use crate::diagnostics::{Diagnostic, Span};

/// Errors that can occur while compiling an embedded component.
#[derive(Debug, thiserror::Error)]
pub enum SfcError {
    #[error("{message}")]
    MarkupCompile { message: String, span: Option<Span> },

    #[error("Component template should contain exactly one root element: {0}")]
    MissingRootElement(String),

    #[error("Ambiguous component sections: {0}")]
    SectionExtractionAmbiguity(String),

    #[error("Failed to downlevel generated program: {message}")]
    DownlevelSyntax { message: String, program: String },

    #[error("Invalid downlevel targets '{query}': {message}")]
    InvalidTargets { query: String, message: String },

    #[error("Failed to render generated source: {0}")]
    Source(#[from] minijinja::Error),
}

impl SfcError {
    /// Markup compile error pointing at a position in the template.
    pub fn markup(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::MarkupCompile {
            message: message.into(),
            span,
        }
    }

    /// Convert into an error diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.to_string());
        match self {
            SfcError::MarkupCompile {
                span: Some(span), ..
            } => diagnostic.with_span(*span),
            _ => diagnostic,
        }
    }
}
