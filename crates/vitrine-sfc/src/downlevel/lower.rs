//! Source-level lowering of newer syntax.
//!
//! Each round parses the program, collects non-overlapping text edits for
//! every construct above the target edition and applies them. Constructs
//! nested inside a rewritten one are copied verbatim and picked up by the
//! next round, so the loop runs until a round finds nothing to do.

use std::cell::Cell;
use std::collections::{BTreeSet, HashSet};

use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};
use oxc_syntax::scope::{ScopeFlags, ScopeId};

use super::level::EsLevel;
use super::syntax_error;
use crate::error::SfcError;
use crate::template::js_string;

const MAX_ROUNDS: usize = 32;

/// Runtime support functions referenced by lowered code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Helper {
    /// Own-property copy standing in for object spread
    Assign,
    /// Array copy of an array-like, standing in for array spread
    ToArray,
}

impl Helper {
    pub fn name(self) -> &'static str {
        match self {
            Helper::Assign => "__assign",
            Helper::ToArray => "__toArray",
        }
    }

    /// ES5 definition of the helper.
    pub fn source(self) -> &'static str {
        match self {
            Helper::Assign => ASSIGN_HELPER,
            Helper::ToArray => TO_ARRAY_HELPER,
        }
    }
}

const ASSIGN_HELPER: &str = "var __assign = function (target) {
  for (var i = 1; i < arguments.length; i++) {
    var source = arguments[i];
    if (source != null) {
      for (var key in source) {
        if (Object.prototype.hasOwnProperty.call(source, key)) {
          target[key] = source[key];
        }
      }
    }
  }
  return target;
};
";

const TO_ARRAY_HELPER: &str = "var __toArray = function (value) {
  return Array.prototype.slice.call(value);
};
";

/// Program text after lowering, with the helpers it calls.
#[derive(Debug, Clone, PartialEq)]
pub struct Lowered {
    pub code: String,
    pub helpers: BTreeSet<Helper>,
}

/// Rewrite everything in `source` that `level` cannot run and this pass
/// knows how to express in older syntax.
///
/// Constructs with no safe rewrite are left in place for the syntax check,
/// except block-scoped bindings whose `var` form would change meaning, which
/// fail here.
pub fn lower(source: &str, level: EsLevel) -> Result<Lowered, SfcError> {
    let mut code = source.to_string();
    let mut helpers = BTreeSet::new();

    for _ in 0..MAX_ROUNDS {
        let (edits, used) = collect_edits(&code, level, source)?;
        if edits.is_empty() {
            return Ok(Lowered { code, helpers });
        }
        helpers.extend(used);
        code = apply_edits(&code, edits);
    }

    Err(SfcError::DownlevelSyntax {
        message: "syntax lowering did not settle".to_string(),
        program: source.to_string(),
    })
}

fn collect_edits(
    code: &str,
    level: EsLevel,
    program: &str,
) -> Result<(Vec<Edit>, BTreeSet<Helper>), SfcError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, SourceType::cjs()).parse();
    if ret.panicked || !ret.errors.is_empty() {
        return Err(syntax_error(ret.errors.iter().map(|e| e.to_string()), program));
    }

    let mut lowering = Lowering::new(code, level);
    lowering.visit_program(&ret.program);

    if let Some(reason) = lowering.blocked {
        return Err(SfcError::DownlevelSyntax {
            message: reason,
            program: program.to_string(),
        });
    }
    Ok((lowering.edits, lowering.helpers))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    start: u32,
    end: u32,
    text: String,
}

/// Apply edits front to back, skipping any that overlap an earlier one.
fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| (e.start, e.end));

    let mut out = String::with_capacity(source.len() + 64);
    let mut cursor = 0usize;
    for edit in edits {
        let (start, end) = (edit.start as usize, edit.end as usize);
        if start < cursor {
            continue;
        }
        out.push_str(&source[cursor..start]);
        out.push_str(&edit.text);
        cursor = end;
    }
    out.push_str(&source[cursor..]);
    out
}

#[derive(Debug, Default)]
struct LoopState {
    binds: bool,
    captures: bool,
}

/// Bindings of one function (or the program).
#[derive(Debug)]
struct Frame {
    arrow: bool,
    /// Lexical names declared directly in each open block
    blocks: Vec<HashSet<String>>,
    /// Lexical names declared in closed descendants of each open block
    nested: Vec<HashSet<String>>,
    vars: HashSet<String>,
    /// Lexical names declared below the top block
    inner_lexical: HashSet<String>,
    loops: Vec<LoopState>,
}

impl Frame {
    fn new(arrow: bool) -> Self {
        Self {
            arrow,
            blocks: vec![HashSet::new()],
            nested: vec![HashSet::new()],
            vars: HashSet::new(),
            inner_lexical: HashSet::new(),
            loops: Vec::new(),
        }
    }
}

enum ScopeKind {
    Frame,
    Block,
}

struct Lowering<'s> {
    source: &'s str,
    level: EsLevel,
    edits: Vec<Edit>,
    helpers: BTreeSet<Helper>,
    blocked: Option<String>,
    frames: Vec<Frame>,
    scopes: Vec<ScopeKind>,
    loop_heads: Vec<Span>,
}

impl<'s> Lowering<'s> {
    fn new(source: &'s str, level: EsLevel) -> Self {
        Self {
            source,
            level,
            edits: Vec::new(),
            helpers: BTreeSet::new(),
            blocked: None,
            frames: Vec::new(),
            scopes: Vec::new(),
            loop_heads: Vec::new(),
        }
    }

    /// Whether a feature of edition `feature` must be rewritten.
    fn lowers(&self, feature: EsLevel) -> bool {
        self.level < feature
    }

    fn text(&self, span: Span) -> &'s str {
        &self.source[span.start as usize..span.end as usize]
    }

    fn replace(&mut self, span: Span, text: String) {
        self.edits.push(Edit {
            start: span.start,
            end: span.end,
            text,
        });
    }

    fn insert(&mut self, at: u32, text: impl Into<String>) {
        self.edits.push(Edit {
            start: at,
            end: at,
            text: text.into(),
        });
    }

    fn block(&mut self, reason: String) {
        if self.blocked.is_none() {
            self.blocked = Some(reason);
        }
    }

    fn declare_lexical(&mut self, name: &str) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        let depth = frame.blocks.len() - 1;
        let shadows = frame.blocks[..depth].iter().any(|b| b.contains(name))
            || frame.nested[depth].contains(name)
            || (depth > 0 && frame.vars.contains(name));

        frame.blocks[depth].insert(name.to_string());
        if depth > 0 {
            frame.inner_lexical.insert(name.to_string());
        }
        for state in &mut frame.loops {
            state.binds = true;
        }

        if shadows {
            self.block(format!(
                "block-scoped `{name}` shadows another binding of the same function and cannot become `var`"
            ));
        }
    }

    fn declare_var(&mut self, name: &str) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        frame.vars.insert(name.to_string());
        if frame.inner_lexical.contains(name) {
            self.block(format!(
                "`{name}` is declared both block-scoped and function-scoped and cannot become `var`"
            ));
        }
    }

    fn in_loop(&mut self, head: Option<Span>, visit: impl FnOnce(&mut Self)) {
        if let Some(frame) = self.frames.last_mut() {
            frame.loops.push(LoopState::default());
        }
        if let Some(head) = head {
            self.loop_heads.push(head);
        }

        visit(self);

        if head.is_some() {
            self.loop_heads.pop();
        }
        let state = self.frames.last_mut().and_then(|f| f.loops.pop());
        if let Some(LoopState {
            binds: true,
            captures: true,
        }) = state
        {
            if self.lowers(EsLevel::Es2015) {
                self.block(
                    "a closure inside a loop captures a block-scoped binding that cannot become `var`"
                        .to_string(),
                );
            }
        }
    }

    fn lower_parameters(&mut self, func: &Function<'_>) {
        let Some(body) = &func.body else {
            return;
        };
        let mut prologue = String::new();

        for param in &func.params.items {
            let BindingPatternKind::AssignmentPattern(pattern) = &param.pattern.kind else {
                continue;
            };
            let BindingPatternKind::BindingIdentifier(id) = &pattern.left.kind else {
                continue;
            };
            let name = id.name.as_str();
            prologue.push_str(&format!(
                "if ({name} === void 0) {name} = {};",
                self.text(pattern.right.span())
            ));
            self.replace(param.span, name.to_string());
        }

        if let Some(rest) = &func.params.rest {
            if let BindingPatternKind::BindingIdentifier(id) = &rest.argument.kind {
                let start = func
                    .params
                    .items
                    .last()
                    .map_or(rest.span.start, |p| p.span.end);
                prologue.push_str(&format!(
                    "var {} = Array.prototype.slice.call(arguments, {});",
                    id.name,
                    func.params.items.len()
                ));
                self.replace(Span::new(start, rest.span.end), String::new());
            }
        }

        if !prologue.is_empty() {
            let at = body
                .directives
                .last()
                .map_or(body.span.start + 1, |d| d.span.end);
            self.insert(at, prologue);
        }
    }

    fn lower_object_spread(&mut self, object: &ObjectExpression<'_>) {
        let mut args: Vec<String> = Vec::new();
        let mut chunk: Vec<&str> = Vec::new();

        for property in &object.properties {
            match property {
                ObjectPropertyKind::ObjectProperty(p) => chunk.push(self.text(p.span)),
                ObjectPropertyKind::SpreadProperty(spread) => {
                    if args.is_empty() && chunk.is_empty() {
                        args.push("{}".to_string());
                    }
                    if !chunk.is_empty() {
                        args.push(format!("{{ {} }}", chunk.join(", ")));
                        chunk.clear();
                    }
                    args.push(self.text(spread.argument.span()).to_string());
                }
            }
        }
        if !chunk.is_empty() {
            args.push(format!("{{ {} }}", chunk.join(", ")));
        }

        self.helpers.insert(Helper::Assign);
        self.replace(
            object.span,
            format!("{}({})", Helper::Assign.name(), args.join(", ")),
        );
    }

    fn lower_array_spread(&mut self, array: &ArrayExpression<'_>) {
        let mut args: Vec<String> = Vec::new();
        let mut chunk: Vec<&str> = Vec::new();

        for element in &array.elements {
            match element {
                ArrayExpressionElement::SpreadElement(spread) => {
                    if !chunk.is_empty() {
                        args.push(format!("[{}]", chunk.join(", ")));
                        chunk.clear();
                    }
                    args.push(format!(
                        "{}({})",
                        Helper::ToArray.name(),
                        self.text(spread.argument.span())
                    ));
                }
                ArrayExpressionElement::Elision(_) => return,
                element => chunk.push(self.text(element.span())),
            }
        }
        if !chunk.is_empty() {
            args.push(format!("[{}]", chunk.join(", ")));
        }

        self.helpers.insert(Helper::ToArray);
        self.replace(array.span, format!("[].concat({})", args.join(", ")));
    }
}

impl<'a> Visit<'a> for Lowering<'_> {
    fn enter_scope(&mut self, flags: ScopeFlags, _scope_id: &Cell<Option<ScopeId>>) {
        if flags.intersects(ScopeFlags::Var) {
            if let Some(parent) = self.frames.last_mut() {
                for state in &mut parent.loops {
                    state.captures = true;
                }
            }
            self.frames.push(Frame::new(flags.is_arrow()));
            self.scopes.push(ScopeKind::Frame);
        } else if let Some(frame) = self.frames.last_mut() {
            frame.blocks.push(HashSet::new());
            frame.nested.push(HashSet::new());
            self.scopes.push(ScopeKind::Block);
        }
    }

    fn leave_scope(&mut self) {
        match self.scopes.pop() {
            Some(ScopeKind::Frame) => {
                self.frames.pop();
            }
            Some(ScopeKind::Block) => {
                let Some(frame) = self.frames.last_mut() else {
                    return;
                };
                let (Some(names), Some(nested)) = (frame.blocks.pop(), frame.nested.pop()) else {
                    return;
                };
                if let Some(parent) = frame.nested.last_mut() {
                    parent.extend(names);
                    parent.extend(nested);
                }
            }
            None => {}
        }
    }

    fn visit_variable_declaration(&mut self, it: &VariableDeclaration<'a>) {
        let lexical = matches!(
            it.kind,
            VariableDeclarationKind::Let | VariableDeclarationKind::Const
        );

        if self.lowers(EsLevel::Es2015) {
            let names: Vec<String> = it
                .declarations
                .iter()
                .flat_map(|d| d.id.get_binding_identifiers())
                .map(|id| id.name.to_string())
                .collect();
            for name in &names {
                if lexical {
                    self.declare_lexical(name);
                } else if it.kind.is_var() {
                    self.declare_var(name);
                }
            }

            if lexical {
                let keyword = it.kind.as_str().len() as u32;
                self.replace(
                    Span::new(it.span.start, it.span.start + keyword),
                    "var".to_string(),
                );

                // A `var` is not re-initialised on each iteration.
                let in_loop = self.frames.last().is_some_and(|f| !f.loops.is_empty());
                if in_loop && !self.loop_heads.contains(&it.span) {
                    for declarator in &it.declarations {
                        if declarator.init.is_none() {
                            self.insert(declarator.id.span().end, " = void 0");
                        }
                    }
                }
            }
        }

        walk::walk_variable_declaration(self, it);
    }

    fn visit_formal_parameters(&mut self, it: &FormalParameters<'a>) {
        if self.lowers(EsLevel::Es2015) {
            let mut names: Vec<String> = it
                .items
                .iter()
                .flat_map(|p| p.pattern.get_binding_identifiers())
                .map(|id| id.name.to_string())
                .collect();
            if let Some(rest) = &it.rest {
                names.extend(
                    rest.argument
                        .get_binding_identifiers()
                        .into_iter()
                        .map(|id| id.name.to_string()),
                );
            }
            for name in &names {
                self.declare_var(name);
            }
        }
        walk::walk_formal_parameters(self, it);
    }

    fn visit_for_statement(&mut self, it: &ForStatement<'a>) {
        let head = match &it.init {
            Some(ForStatementInit::VariableDeclaration(decl)) => Some(decl.span),
            _ => None,
        };
        self.in_loop(head, |v| walk::walk_for_statement(v, it));
    }

    fn visit_for_in_statement(&mut self, it: &ForInStatement<'a>) {
        let head = match &it.left {
            ForStatementLeft::VariableDeclaration(decl) => Some(decl.span),
            _ => None,
        };
        self.in_loop(head, |v| walk::walk_for_in_statement(v, it));
    }

    fn visit_for_of_statement(&mut self, it: &ForOfStatement<'a>) {
        let head = match &it.left {
            ForStatementLeft::VariableDeclaration(decl) => Some(decl.span),
            _ => None,
        };
        self.in_loop(head, |v| walk::walk_for_of_statement(v, it));
    }

    fn visit_while_statement(&mut self, it: &WhileStatement<'a>) {
        self.in_loop(None, |v| walk::walk_while_statement(v, it));
    }

    fn visit_do_while_statement(&mut self, it: &DoWhileStatement<'a>) {
        self.in_loop(None, |v| walk::walk_do_while_statement(v, it));
    }

    fn visit_function(&mut self, it: &Function<'a>, flags: ScopeFlags) {
        if self.lowers(EsLevel::Es2015) && !it.generator && !it.r#async {
            self.lower_parameters(it);
        }
        walk::walk_function(self, it, flags);
    }

    fn visit_arrow_function_expression(&mut self, it: &ArrowFunctionExpression<'a>) {
        if self.lowers(EsLevel::Es2015) && !it.r#async {
            let params = self.text(it.params.span);
            let params = if params.starts_with('(') {
                params.to_string()
            } else {
                format!("({params})")
            };
            let body = if it.expression {
                match it.body.statements.first() {
                    Some(Statement::ExpressionStatement(stmt)) => {
                        Some(format!("{{ return {}; }}", self.text(stmt.expression.span())))
                    }
                    _ => None,
                }
            } else {
                Some(self.text(it.body.span).to_string())
            };
            if let Some(body) = body {
                self.replace(
                    it.span,
                    format!("(function {params} {body}).bind(this)"),
                );
            }
        }
        walk::walk_arrow_function_expression(self, it);
    }

    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        if self.lowers(EsLevel::Es2015)
            && it.name.as_str() == "arguments"
            && self.frames.last().is_some_and(|f| f.arrow)
        {
            self.block("an arrow function reads `arguments`".to_string());
        }
        walk::walk_identifier_reference(self, it);
    }

    fn visit_object_expression(&mut self, it: &ObjectExpression<'a>) {
        let spreads = it
            .properties
            .iter()
            .any(|p| matches!(p, ObjectPropertyKind::SpreadProperty(_)));
        if spreads && self.lowers(EsLevel::Es2018) {
            self.lower_object_spread(it);
        }
        walk::walk_object_expression(self, it);
    }

    fn visit_object_property(&mut self, it: &ObjectProperty<'a>) {
        if self.lowers(EsLevel::Es2015) && !it.computed && matches!(it.kind, PropertyKind::Init) {
            let key_end = it.key.span().end;
            if it.method {
                if let Expression::FunctionExpression(func) = &it.value {
                    if !func.generator && !func.r#async {
                        self.insert(key_end, ": function");
                    }
                }
            } else if it.shorthand {
                let name = self.text(it.key.span());
                self.insert(key_end, format!(": {name}"));
            }
        }
        walk::walk_object_property(self, it);
    }

    fn visit_array_expression(&mut self, it: &ArrayExpression<'a>) {
        let spreads = it
            .elements
            .iter()
            .any(|e| matches!(e, ArrayExpressionElement::SpreadElement(_)));
        if spreads && self.lowers(EsLevel::Es2015) {
            self.lower_array_spread(it);
        }
        walk::walk_array_expression(self, it);
    }

    fn visit_template_literal(&mut self, it: &TemplateLiteral<'a>) {
        if self.lowers(EsLevel::Es2015) {
            let cooked: Option<Vec<&str>> = it
                .quasis
                .iter()
                .map(|q| q.value.cooked.as_ref().map(|c| c.as_str()))
                .collect();
            if let Some(cooked) = cooked {
                let mut parts = vec![js_string(cooked.first().copied().unwrap_or(""))];
                for (i, expression) in it.expressions.iter().enumerate() {
                    parts.push(format!("({})", self.text(expression.span())));
                    if let Some(quasi) = cooked.get(i + 1).filter(|q| !q.is_empty()) {
                        parts.push(js_string(quasi));
                    }
                }
                self.replace(it.span, format!("({})", parts.join(" + ")));
            }
        }
        walk::walk_template_literal(self, it);
    }

    fn visit_tagged_template_expression(&mut self, it: &TaggedTemplateExpression<'a>) {
        // The quasi stays a template; only its parts are lowered.
        self.visit_expression(&it.tag);
        for expression in &it.quasi.expressions {
            self.visit_expression(expression);
        }
    }

    fn visit_binary_expression(&mut self, it: &BinaryExpression<'a>) {
        if it.operator == BinaryOperator::Exponential && self.lowers(EsLevel::Es2016) {
            self.replace(
                it.span,
                format!(
                    "Math.pow({}, {})",
                    self.text(it.left.span()),
                    self.text(it.right.span())
                ),
            );
        }
        walk::walk_binary_expression(self, it);
    }

    fn visit_logical_expression(&mut self, it: &LogicalExpression<'a>) {
        if it.operator == LogicalOperator::Coalesce && self.lowers(EsLevel::Es2020) {
            if let Expression::Identifier(id) = &it.left {
                let name = id.name.as_str();
                self.replace(
                    it.span,
                    format!(
                        "({name} !== null && {name} !== void 0 ? {name} : ({}))",
                        self.text(it.right.span())
                    ),
                );
            }
        }
        walk::walk_logical_expression(self, it);
    }

    fn visit_catch_clause(&mut self, it: &CatchClause<'a>) {
        if it.param.is_none() && self.lowers(EsLevel::Es2019) {
            self.insert(it.span.start + "catch".len() as u32, " (_unused)");
        }
        walk::walk_catch_clause(self, it);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn es5(source: &str) -> String {
        lower(source, EsLevel::Es5).unwrap().code
    }

    fn blocked(source: &str) -> String {
        match lower(source, EsLevel::Es5) {
            Err(SfcError::DownlevelSyntax { message, .. }) => message,
            other => panic!("expected DownlevelSyntax, got {:?}", other),
        }
    }

    #[test]
    fn expands_shorthand_methods_and_properties() {
        assert_eq!(
            es5("var o = { data() { return { msg: msg }; }, msg };"),
            "var o = { data: function() { return { msg: msg }; }, msg: msg };"
        );
    }

    #[test]
    fn keeps_accessors_and_long_form_properties() {
        let source = "var o = { get a() { return 1; }, b: function () {} };";

        assert_eq!(es5(source), source);
    }

    #[test]
    fn turns_block_bindings_into_var() {
        assert_eq!(
            es5("let a = 1;\nconst b = a + 1;"),
            "var a = 1;\nvar b = a + 1;"
        );
    }

    #[test]
    fn reinitialises_loop_body_bindings() {
        assert_eq!(
            es5("for (let i = 0; i < 2; i++) { let seen; seen = i; }"),
            "for (var i = 0; i < 2; i++) { var seen = void 0; seen = i; }"
        );
    }

    #[test]
    fn allows_sibling_blocks_reusing_a_name() {
        let code = es5("for (let i = 0; i < 2; i++) {}\nfor (let i = 0; i < 2; i++) {}");

        assert_eq!(code.matches("var i = 0").count(), 2);
    }

    #[test]
    fn refuses_shadowing_block_bindings() {
        let message = blocked("let x = 1;\n{ let x = 2; }");

        assert!(message.contains("`x`"));
    }

    #[test]
    fn refuses_block_and_function_binding_of_one_name() {
        assert!(blocked("function f() { { let y = 1; } var y = 2; }").contains("`y`"));
    }

    #[test]
    fn refuses_loop_bindings_captured_by_closures() {
        let message =
            blocked("var fns = [];\nfor (let i = 0; i < 3; i++) { fns.push(function () { return i; }); }");

        assert!(message.contains("closure"));
    }

    #[test]
    fn lowers_template_literals_to_concatenation() {
        assert_eq!(
            es5("var s = `a${b}c${d}`;"),
            "var s = (\"a\" + (b) + \"c\" + (d));"
        );
        assert_eq!(es5("var t = `line\\n`;"), "var t = (\"line\\n\");");
    }

    #[test]
    fn binds_arrow_functions_to_enclosing_this() {
        assert_eq!(
            es5("var f = x => x * 2;"),
            "var f = (function (x) { return x * 2; }).bind(this);"
        );
        assert_eq!(
            es5("var g = (a, b) => { return a + b; };"),
            "var g = (function (a, b) { return a + b; }).bind(this);"
        );
    }

    #[test]
    fn lowers_nested_constructs_over_several_rounds() {
        let code = es5("var f = () => `${(() => 1)()}`;");

        assert!(!code.contains("=>"));
        assert!(!code.contains('`'));
        assert_eq!(code.matches(".bind(this)").count(), 2);
    }

    #[test]
    fn refuses_arrows_reading_arguments() {
        assert!(blocked("function f() { return () => arguments[0]; }").contains("arguments"));
    }

    #[test]
    fn moves_default_and_rest_parameters_into_the_body() {
        assert_eq!(
            es5("function f(a, b = 2, ...rest) { return a + b + rest.length; }"),
            "function f(a, b) {if (b === void 0) b = 2;var rest = Array.prototype.slice.call(arguments, 2); return a + b + rest.length; }"
        );
    }

    #[test]
    fn spreads_objects_through_assign_helper() {
        let lowered = lower("var o = { a: 1, ...base, b };", EsLevel::Es5).unwrap();

        assert_eq!(lowered.code, "var o = __assign({ a: 1 }, base, { b: b });");
        assert!(lowered.helpers.contains(&Helper::Assign));
    }

    #[test]
    fn object_spread_is_kept_where_supported() {
        let lowered = lower("var o = { ...base };", EsLevel::Es2018).unwrap();

        assert_eq!(lowered.code, "var o = { ...base };");
        assert!(lowered.helpers.is_empty());
    }

    #[test]
    fn spreads_arrays_through_concat() {
        let lowered = lower("var xs = [0, ...ys, 9];", EsLevel::Es5).unwrap();

        assert_eq!(lowered.code, "var xs = [].concat([0], __toArray(ys), [9]);");
        assert!(lowered.helpers.contains(&Helper::ToArray));
    }

    #[test]
    fn lowers_exponentiation_and_nullish_coalescing() {
        assert_eq!(es5("var p = a ** 2;"), "var p = Math.pow(a, 2);");
        assert_eq!(
            es5("var v = a ?? 'x';"),
            "var v = (a !== null && a !== void 0 ? a : ('x'));"
        );
    }

    #[test]
    fn names_the_optional_catch_binding() {
        assert_eq!(
            es5("try { f(); } catch { g(); }"),
            "try { f(); } catch (_unused) { g(); }"
        );
    }

    #[test]
    fn leaves_modern_targets_untouched() {
        let source = "let f = (x) => `${x}`;";

        assert_eq!(lower(source, EsLevel::LATEST).unwrap().code, source);
    }

    #[test]
    fn applies_non_overlapping_edits_only() {
        let edits = vec![
            Edit { start: 4, end: 9, text: "X".into() },
            Edit { start: 6, end: 7, text: "Y".into() },
            Edit { start: 0, end: 0, text: ">".into() },
        ];

        assert_eq!(apply_edits("abc defgh ij", edits), ">abc X ij");
    }
}
