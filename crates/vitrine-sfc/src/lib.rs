//! Embedded component compilation pipeline.
//!
//! Turns a documentation snippet made of `<template>`, `<script>` and `<style>`
//! blocks into a self-mounting script that renders the component next to the
//! snippet's code sample.

pub mod assemble;
pub mod behavior;
pub mod diagnostics;
pub mod downlevel;
pub mod error;
pub mod format;
pub mod pass;
pub mod section;
pub mod source;
pub mod style;
pub mod template;

pub use assemble::{wrap_root, AssembledModule, Assembler};
pub use behavior::{normalize_behavior, NormalizedBehavior};
pub use diagnostics::{Diagnostic, Severity, Span};
pub use downlevel::{downlevel, downlevel_expression, EsLevel, Targets};
pub use error::SfcError;
pub use format::to_callable;
pub use pass::{BootstrapProgram, BuildPass, PipelineConfig, ScopeAllocator, ScopeId, SnippetOutput};
pub use section::{extract_definitions, ComponentDefinition};
pub use style::StyleAccumulator;
pub use template::{
    compile_template, CompileOptions, CompiledTemplate, RawCompileOutput, TemplateCompiler,
    VueTemplateCompiler,
};
