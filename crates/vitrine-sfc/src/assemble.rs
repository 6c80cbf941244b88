//! Merges a component definition into one mountable module.

use crate::behavior::{normalize_behavior, EMPTY_BEHAVIOR};
use crate::diagnostics::{Diagnostic, Span};
use crate::downlevel::{downlevel_expression, Targets};
use crate::error::SfcError;
use crate::pass::ScopeId;
use crate::section::ComponentDefinition;
use crate::source::SourceBuilder;
use crate::style::StyleAccumulator;
use crate::template::{
    compile_template, CompileOptions, CompiledTemplate, TemplateCompiler, VueTemplateCompiler,
};

/// Class of the synthetic root element every template is wrapped in.
pub const ROOT_CLASS: &str = "component";

/// Wrap template markup in the single root element the compiler requires.
pub fn wrap_root(template: &str) -> String {
    format!("<div class=\"{}\">\n{}\n</div>", ROOT_CLASS, template)
}

/// One merged component, prior to downleveling.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledModule {
    /// Expression evaluating to the component options object
    pub source: String,

    pub scope_id: ScopeId,

    /// Static `name` declared by the behavior section
    pub name: Option<String>,

    /// Whether the template failed to compile and the module renders nothing
    pub has_error: bool,

    pub diagnostics: Vec<Diagnostic>,
}

/// Compiles and merges component definitions.
pub struct Assembler {
    compiler: Box<dyn TemplateCompiler>,
    preserve_whitespace: bool,
    source: SourceBuilder,
}

impl Assembler {
    /// Assembler using the built-in Vue template compiler.
    pub fn new(preserve_whitespace: bool) -> Self {
        Self::with_compiler(Box::new(VueTemplateCompiler), preserve_whitespace)
    }

    pub fn with_compiler(compiler: Box<dyn TemplateCompiler>, preserve_whitespace: bool) -> Self {
        Self {
            compiler,
            preserve_whitespace,
            source: SourceBuilder::new(),
        }
    }

    pub fn source(&self) -> &SourceBuilder {
        &self.source
    }

    /// Assemble one definition.
    ///
    /// A template that fails to compile still yields a module (one that
    /// renders nothing). An ambiguous behavior section fails the definition.
    /// The style section, if any, is appended to `styles`.
    pub fn assemble(
        &self,
        definition: &ComponentDefinition,
        scope_id: ScopeId,
        styles: &mut StyleAccumulator,
    ) -> Result<AssembledModule, SfcError> {
        let behavior = normalize_behavior(definition.behavior.as_deref())?;
        let template = self.compile(&definition.template, scope_id);

        if let Some(style) = &definition.style {
            styles.push(style);
        }

        let source = self.source.component(&behavior.body, &template)?;
        let diagnostics = template
            .diagnostics
            .into_iter()
            .map(|d| relocate(d, definition.line, definition.column))
            .collect();

        tracing::debug!(
            scope = %scope_id,
            name = behavior.name.as_deref().unwrap_or("<anonymous>"),
            "Assembled component"
        );

        Ok(AssembledModule {
            source,
            scope_id,
            name: behavior.name,
            has_error: template.has_error,
            diagnostics,
        })
    }

    /// Compile bare markup into a component-shaped expression with no
    /// behavior of its own, downleveled for `targets`.
    pub fn compile_snippet(
        &self,
        markup: &str,
        scope_id: ScopeId,
        targets: &Targets,
    ) -> Result<String, SfcError> {
        let template = self.compile(markup, scope_id);
        let expression = self.source.component(EMPTY_BEHAVIOR, &template)?;
        downlevel_expression(&expression, targets)
    }

    fn compile(&self, markup: &str, scope_id: ScopeId) -> CompiledTemplate {
        let options = CompileOptions {
            scope_id: Some(scope_id),
            preserve_whitespace: self.preserve_whitespace,
        };
        compile_template(self.compiler.as_ref(), &wrap_root(markup), &options)
    }
}

/// Map a span in the wrapped template back to the snippet.
///
/// Line 1 of the wrapped markup is the synthetic root; line 2 starts right
/// after the `<template>` tag, at `template_column` of the definition's line.
fn relocate(mut diagnostic: Diagnostic, template_line: usize, template_column: usize) -> Diagnostic {
    if let Some(span) = diagnostic.span {
        let column = match span.line {
            0 | 1 => template_column,
            2 => span.column + template_column - 1,
            _ => span.column,
        };
        diagnostic.span = Some(Span {
            line: template_line + span.line.saturating_sub(2),
            column,
        });
    }
    diagnostic
}
