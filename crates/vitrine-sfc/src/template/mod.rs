//! Markup compilation.
//!
//! [`TemplateCompiler`] is the pluggable capability that turns markup into
//! render procedure bodies. [`compile_template`] wraps any implementation
//! with the fallback rules the assembler depends on: a failed compile never
//! escapes as an error, it becomes a no-op template.

mod codegen;
mod parser;

pub use codegen::js_string;
pub use parser::{parse, Attr, Element, Node, ParsedTemplate, Text};

use crate::diagnostics::{Diagnostic, Severity};
use crate::format::to_callable;
use crate::pass::ScopeId;

/// Options threaded through to the underlying compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Emitted as a `data-v-<id>` attribute on every element
    pub scope_id: Option<ScopeId>,
    /// Collapse inter-element whitespace to one space instead of dropping it
    pub preserve_whitespace: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            scope_id: None,
            preserve_whitespace: true,
        }
    }
}

/// Output of a markup compiler before fallback handling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCompileOutput {
    pub render: String,
    pub static_renders: Vec<String>,
    pub tips: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
}

/// A markup compilation capability.
pub trait TemplateCompiler: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Compile a single-rooted block of markup into render procedure bodies.
    ///
    /// Implementations report problems through `tips` and `errors` instead of
    /// failing.
    fn compile(&self, markup: &str, options: &CompileOptions) -> RawCompileOutput;
}

/// Compiles templates for the Vue 2 runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct VueTemplateCompiler;

impl TemplateCompiler for VueTemplateCompiler {
    fn name(&self) -> &'static str {
        "vue"
    }

    fn compile(&self, markup: &str, options: &CompileOptions) -> RawCompileOutput {
        let parsed = match parser::parse(markup) {
            Ok(parsed) => parsed,
            Err(e) => {
                return RawCompileOutput {
                    errors: vec![e.to_diagnostic()],
                    ..RawCompileOutput::default()
                }
            }
        };

        match codegen::generate(&parsed.root, options) {
            Ok(code) => {
                let mut tips = parsed.tips;
                tips.extend(code.tips);
                RawCompileOutput {
                    render: code.render,
                    static_renders: code.static_renders,
                    tips,
                    errors: Vec::new(),
                }
            }
            Err(e) => RawCompileOutput {
                tips: parsed.tips,
                errors: vec![e.to_diagnostic()],
                ..RawCompileOutput::default()
            },
        }
    }
}

/// A compiled template, ready to be merged into a component object.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    /// Callable source of the primary render procedure
    pub render: String,

    /// Callable sources of the static render procedures
    pub static_renders: Vec<String>,

    pub diagnostics: Vec<Diagnostic>,
    pub has_error: bool,
}

impl CompiledTemplate {
    /// A template that renders nothing.
    pub fn noop(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            render: "function () {}".to_string(),
            static_renders: Vec::new(),
            diagnostics,
            has_error: true,
        }
    }
}

/// Compile markup, falling back to a no-op template on errors.
pub fn compile_template(
    compiler: &dyn TemplateCompiler,
    markup: &str,
    options: &CompileOptions,
) -> CompiledTemplate {
    let output = compiler.compile(markup, options);

    for tip in &output.tips {
        tip.log();
    }

    let mut diagnostics = output.tips;
    let errors: Vec<Diagnostic> = output
        .errors
        .into_iter()
        .map(|mut e| {
            e.severity = Severity::Error;
            e
        })
        .collect();

    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(|e| format!("  - {}", e)).collect();
        tracing::warn!(
            "Error compiling template with {}:\n\n{}\n\n{}",
            compiler.name(),
            pad(markup),
            messages.join("\n")
        );
        diagnostics.extend(errors);
        return CompiledTemplate::noop(diagnostics);
    }

    tracing::debug!(
        "Compiled template ({} static render procedures)",
        output.static_renders.len()
    );

    CompiledTemplate {
        render: to_callable(&output.render),
        static_renders: output.static_renders.iter().map(|s| to_callable(s)).collect(),
        diagnostics,
        has_error: false,
    }
}

/// Indent every line of `source` by two spaces for log output.
fn pad(source: &str) -> String {
    source
        .lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}
