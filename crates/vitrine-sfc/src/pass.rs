//! Build pass state and the multi-component orchestrator.
//!
//! A [`BuildPass`] owns everything that lives for one documentation build:
//! the scope id counter, the collected style texts and the diagnostics log.
//! A watcher that regenerates the whole site creates a new pass or calls
//! [`BuildPass::reset`]; nothing is shared between passes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::assemble::{AssembledModule, Assembler};
use crate::diagnostics::Diagnostic;
use crate::downlevel::{downlevel, Targets};
use crate::error::SfcError;
use crate::section::{extract_definitions, ComponentDefinition};
use crate::style::StyleAccumulator;
use crate::template::TemplateCompiler;

/// Identifier namespacing one compiled component's styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic scope id counter. The first id handed out is 1.
#[derive(Debug, Clone)]
pub struct ScopeAllocator {
    next: u32,
}

impl ScopeAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> ScopeId {
        let id = ScopeId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u32 {
        self.next - 1
    }

    /// Start over from 1. Only valid between full regeneration passes.
    pub fn reset(&mut self) {
        self.next = 1;
    }
}

impl Default for ScopeAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Environments the generated programs must run on
    pub targets: Targets,

    /// Keep inter-element whitespace in templates as a single space
    pub preserve_whitespace: bool,

    /// Class of the placeholder each demo is mounted into
    pub demo_class: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            targets: Targets::default(),
            preserve_whitespace: true,
            demo_class: "rule-demo".to_string(),
        }
    }
}

/// The executable output for one snippet.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapProgram {
    /// Downleveled program source; empty for a no-op program
    pub source: String,

    /// Number of components the program defines
    pub components: usize,

    pub diagnostics: Vec<Diagnostic>,
}

impl BootstrapProgram {
    /// A program that does nothing.
    pub fn empty(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            source: String::new(),
            components: 0,
            diagnostics,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

/// Result of compiling the embedded components of one snippet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnippetOutput {
    /// `<script>` element running the bootstrap program, or empty
    pub script_markup: String,

    pub diagnostics: Vec<Diagnostic>,

    /// Number of components mounted or registered by the script
    pub components: usize,
}

impl SnippetOutput {
    pub fn is_empty(&self) -> bool {
        self.script_markup.is_empty()
    }

    /// Whether anything went wrong while compiling the snippet.
    pub fn has_error(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// State of one documentation build.
pub struct BuildPass {
    config: PipelineConfig,
    assembler: Assembler,
    scopes: ScopeAllocator,
    styles: StyleAccumulator,
    diagnostics: Vec<Diagnostic>,
}

impl BuildPass {
    pub fn new(config: PipelineConfig) -> Self {
        let assembler = Assembler::new(config.preserve_whitespace);
        Self::with_assembler(config, assembler)
    }

    /// A pass using a custom markup compiler.
    pub fn with_compiler(config: PipelineConfig, compiler: Box<dyn TemplateCompiler>) -> Self {
        let assembler = Assembler::with_compiler(compiler, config.preserve_whitespace);
        Self::with_assembler(config, assembler)
    }

    fn with_assembler(config: PipelineConfig, assembler: Assembler) -> Self {
        Self {
            config,
            assembler,
            scopes: ScopeAllocator::new(),
            styles: StyleAccumulator::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn assembler(&self) -> &Assembler {
        &self.assembler
    }

    /// Scope ids handed out so far in this pass.
    pub fn components_compiled(&self) -> u32 {
        self.scopes.allocated()
    }

    /// Every diagnostic recorded by [`BuildPass::compile_embedded_components`].
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn styles(&self) -> &StyleAccumulator {
        &self.styles
    }

    pub fn take_styles(&mut self) -> StyleAccumulator {
        std::mem::take(&mut self.styles)
    }

    pub fn concatenated_styles(&self) -> String {
        self.styles.concatenated()
    }

    /// Forget all state ahead of a full regeneration.
    pub fn reset(&mut self) {
        self.scopes.reset();
        self.styles.clear();
        self.diagnostics.clear();
    }

    /// Compile the component definitions of one snippet into a program.
    ///
    /// The first definition is the demo, mounted into a placeholder before
    /// the snippet's code block. The rest are registered as global
    /// components first. A program that fails to downlevel degrades to an
    /// empty one carrying the error; an ambiguous behavior section fails the
    /// whole snippet. Style texts reach the pass as each definition is
    /// assembled, so they survive a program that fails to downlevel.
    pub fn orchestrate(
        &mut self,
        definitions: &[ComponentDefinition],
    ) -> Result<BootstrapProgram, SfcError> {
        let Some((demo, reusable)) = definitions.split_first() else {
            return Ok(BootstrapProgram::empty(Vec::new()));
        };

        let demo = self.assemble(demo)?;
        let reusable = reusable
            .iter()
            .map(|definition| self.assemble(definition))
            .collect::<Result<Vec<_>, _>>()?;

        let mut diagnostics = demo.diagnostics.clone();
        for module in &reusable {
            diagnostics.extend(module.diagnostics.iter().cloned());
            if module.name.is_none() {
                let warning = Diagnostic::warning(format!(
                    "reusable component (scope {}) declares no static `name`; it is registered under its runtime name",
                    module.scope_id
                ));
                warning.log();
                diagnostics.push(warning);
            }
        }

        let modules: Vec<String> = reusable.iter().map(|m| m.source.clone()).collect();
        let program =
            self.assembler
                .source()
                .bootstrap(&demo.source, &modules, &self.config.demo_class)?;

        match downlevel(&program, &self.config.targets) {
            Ok(source) => Ok(BootstrapProgram {
                source,
                components: reusable.len() + 1,
                diagnostics,
            }),
            Err(e @ SfcError::DownlevelSyntax { .. }) => {
                if let SfcError::DownlevelSyntax { message, program } = &e {
                    tracing::warn!(
                        "Failed to downlevel demo program, skipping it: {}\n\n{}",
                        message,
                        program
                    );
                }
                diagnostics.push(e.to_diagnostic());
                Ok(BootstrapProgram::empty(diagnostics))
            }
            Err(e) => Err(e),
        }
    }

    /// Compile every component embedded in a snippet into script markup.
    ///
    /// Never fails: problems end up in the output's diagnostics and, when no
    /// program could be produced, an empty `script_markup`.
    pub fn compile_embedded_components(&mut self, snippet: &str) -> SnippetOutput {
        let output = match extract_definitions(snippet) {
            Ok(definitions) => match self.orchestrate(&definitions) {
                Ok(program) => SnippetOutput {
                    script_markup: script_markup(&program.source),
                    diagnostics: program.diagnostics,
                    components: program.components,
                },
                Err(e) => failed(e),
            },
            Err(e) => failed(e),
        };

        self.diagnostics.extend(output.diagnostics.iter().cloned());
        output
    }

    fn assemble(&mut self, definition: &ComponentDefinition) -> Result<AssembledModule, SfcError> {
        let scope_id = self.scopes.next_id();
        self.assembler.assemble(definition, scope_id, &mut self.styles)
    }
}

fn failed(error: SfcError) -> SnippetOutput {
    let diagnostic = error.to_diagnostic();
    diagnostic.log();
    SnippetOutput {
        diagnostics: vec![diagnostic],
        ..SnippetOutput::default()
    }
}

/// Wrap a program in a script element; an empty program yields no markup.
fn script_markup(program: &str) -> String {
    if program.is_empty() {
        return String::new();
    }
    format!("<script>\n{}</script>", program.replace("</script", "<\\/script"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downlevel::{find_unsupported, EsLevel};
    use crate::template::{CompileOptions, RawCompileOutput};
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;
    use pretty_assertions::assert_eq;

    const HI_SNIPPET: &str = "<template><span>{{msg}}</span></template><script>export default { data(){ return {msg:'hi'} } }</script>";

    fn pass() -> BuildPass {
        BuildPass::new(PipelineConfig::default())
    }

    fn parses(source: &str) -> bool {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
        !ret.panicked && ret.errors.is_empty()
    }

    /// The program inside `script_markup`, checked to run on an ES5 engine.
    fn assert_es5_program(script_markup: &str) {
        let program = script_markup
            .trim_start_matches("<script>\n")
            .trim_end_matches("</script>");
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, program, SourceType::cjs()).parse();

        assert!(!ret.panicked && ret.errors.is_empty(), "{:?}", ret.errors);
        assert_eq!(find_unsupported(&ret.program, EsLevel::Es5), None);
        assert!(!program.contains("require("));
        assert!(!program.contains("import"));
    }

    #[test]
    fn allocates_increasing_scope_ids() {
        let mut scopes = ScopeAllocator::new();
        let ids: Vec<u32> = (0..5).map(|_| scopes.next_id().get()).collect();

        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(scopes.allocated(), 5);

        scopes.reset();
        assert_eq!(scopes.next_id(), ScopeId::new(1));
    }

    #[test]
    fn compiles_the_hi_snippet() {
        let mut pass = pass();

        let output = pass.compile_embedded_components(HI_SNIPPET);

        assert!(!output.has_error());
        assert_eq!(output.components, 1);
        assert!(output.script_markup.starts_with("<script>\n"));
        assert!(output.script_markup.ends_with("</script>"));
        assert!(output.script_markup.contains("msg: 'hi'") || output.script_markup.contains("msg: \"hi\""));
        assert!(output.script_markup.contains("data-v-1"));
        assert!(output.script_markup.contains("$mount(mount)"));

        let program = output
            .script_markup
            .trim_start_matches("<script>\n")
            .trim_end_matches("</script>");
        assert!(parses(program));
        assert!(!program.contains("data()"));
        assert_es5_program(&output.script_markup);
    }

    #[test]
    fn lowers_modern_behavior_for_default_targets() {
        let snippet = r#"<template><p @click="bump">{{ label }}</p></template>
<script>
let defaults = { count: 0 };
export default {
  data() {
    return { ...defaults, label: 'clicks' };
  },
  methods: {
    bump() { this.count++; }
  }
}
</script>"#;
        let mut pass = pass();

        let output = pass.compile_embedded_components(snippet);

        assert!(!output.has_error(), "{:?}", output.diagnostics);
        assert!(output.script_markup.contains("__assign"));
        assert_es5_program(&output.script_markup);
    }

    #[test]
    fn registers_reusable_components_before_mounting_demo() {
        let definitions = vec![
            ComponentDefinition::new("<div><child-a></child-a><child-b></child-b></div>"),
            ComponentDefinition::new("<p>a</p>").with_behavior("export default { name: 'child-a' }"),
            ComponentDefinition::new("<p>b</p>").with_behavior("export default { name: 'child-b' }"),
        ];

        let program = pass().orchestrate(&definitions).unwrap();

        assert_eq!(program.components, 3);
        assert_eq!(program.source.matches("Vue.component(").count(), 2);
        let last_registration = program.source.rfind("Vue.component(").unwrap();
        let extend = program.source.find("Vue.extend(").unwrap();
        let mount = program.source.find("$mount(").unwrap();
        assert!(last_registration < extend);
        assert!(extend < mount);
        assert!(program.source.find("\"child-a\"").unwrap() < program.source.find("\"child-b\"").unwrap());
        assert!(program.diagnostics.is_empty());
    }

    #[test]
    fn warns_about_unnamed_reusable_components() {
        let definitions = vec![
            ComponentDefinition::new("<p>demo</p>"),
            ComponentDefinition::new("<p>anon</p>"),
        ];

        let program = pass().orchestrate(&definitions).unwrap();

        assert!(!program.is_empty());
        assert_eq!(program.diagnostics.len(), 1);
        assert_eq!(program.diagnostics[0].severity, crate::Severity::Warning);
    }

    #[test]
    fn scope_ids_increase_across_snippets() {
        let mut pass = pass();

        let first = pass.compile_embedded_components("<template><p>{{ a }}</p></template><template><i>{{ b }}</i></template>");
        let second = pass.compile_embedded_components("<template><p>{{ c }}</p></template>");

        assert!(first.script_markup.contains("data-v-1"));
        assert!(first.script_markup.contains("data-v-2"));
        assert!(second.script_markup.contains("data-v-3"));
        assert!(!second.script_markup.contains("data-v-1\""));
        assert_eq!(pass.components_compiled(), 3);
    }

    #[test]
    fn malformed_template_still_mounts() {
        let mut pass = pass();

        let output = pass.compile_embedded_components("<template><span>oops</template>");

        assert!(output.has_error());
        assert!(!output.is_empty());
        assert!(output.script_markup.contains("$mount(mount)"));
        assert_eq!(pass.diagnostics().len(), 1);
    }

    #[test]
    fn no_definitions_yield_empty_program() {
        let program = pass().orchestrate(&[]).unwrap();
        assert!(program.is_empty());

        let output = pass().compile_embedded_components("<p>just prose</p>");
        assert_eq!(output, SnippetOutput::default());
    }

    #[test]
    fn keeps_style_order_across_snippets() {
        let mut pass = pass();

        pass.compile_embedded_components("<template><p>1</p></template><style>.one {}</style>");
        pass.compile_embedded_components("<style>.two {}</style><template><p>2</p></template>");
        pass.compile_embedded_components("<template><p>3</p></template>");
        pass.compile_embedded_components(
            "<template><p>4</p></template><style>.four {}</style><template><p>5</p></template><style>.five {}</style>",
        );

        assert_eq!(
            pass.styles().iter().collect::<Vec<_>>(),
            vec![".one {}", ".two {}", ".four {}", ".five {}"]
        );
        assert_eq!(pass.concatenated_styles(), ".one {}\n.two {}\n.four {}\n.five {}");
    }

    #[test]
    fn ambiguous_snippet_fails_alone() {
        let mut pass = pass();

        let bad = pass.compile_embedded_components(
            "<template><p>x</p></template><script>export default {}</script><script>export default {}</script><style>.bad {}</style>",
        );
        let good = pass.compile_embedded_components("<template><p>{{ y }}</p></template><style>.good {}</style>");

        assert!(bad.is_empty());
        assert!(bad.has_error());
        assert!(!good.is_empty());
        assert_eq!(pass.styles().iter().collect::<Vec<_>>(), vec![".good {}"]);
    }

    #[test]
    fn downlevel_failure_yields_empty_program() {
        struct Truncating;

        impl TemplateCompiler for Truncating {
            fn name(&self) -> &'static str {
                "truncating"
            }

            fn compile(&self, _markup: &str, _options: &CompileOptions) -> RawCompileOutput {
                RawCompileOutput {
                    render: "return _c(\"div\",[_v(1 + ".to_string(),
                    ..RawCompileOutput::default()
                }
            }
        }

        let mut pass = BuildPass::with_compiler(PipelineConfig::default(), Box::new(Truncating));

        let output =
            pass.compile_embedded_components("<template><p>x</p></template><style>.lost {}</style>");

        assert!(output.is_empty());
        assert!(output.has_error());
        assert_eq!(pass.styles().iter().collect::<Vec<_>>(), vec![".lost {}"]);
    }

    #[test]
    fn escapes_closing_script_tags() {
        assert_eq!(
            script_markup("var s = \"</script>\";\n"),
            "<script>\nvar s = \"<\\/script>\";\n</script>"
        );
        assert_eq!(script_markup(""), "");
    }

    #[test]
    fn reset_clears_pass_state() {
        let mut pass = pass();
        pass.compile_embedded_components("<template><p>1</p></template><style>.one {}</style>");

        pass.reset();

        assert!(pass.styles().is_empty());
        assert!(pass.diagnostics().is_empty());
        let output = pass.compile_embedded_components("<template><p>{{ a }}</p></template>");
        assert!(output.script_markup.contains("data-v-1"));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"demo_class": "demo"}"#).unwrap();

        assert_eq!(config.demo_class, "demo");
        assert_eq!(config.targets, Targets::default());
        assert!(config.preserve_whitespace);
    }
}
