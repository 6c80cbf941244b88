//! Detection of syntax newer than a target edition.

use oxc_ast::ast::*;
use oxc_ast_visit::{walk, Visit};
use oxc_span::Span;
use oxc_syntax::scope::ScopeFlags;

use super::level::EsLevel;

/// First construct in a program that a target edition cannot run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsupported {
    pub construct: &'static str,
    /// Edition that introduced the construct
    pub introduced: EsLevel,
    pub span: Span,
}

impl Unsupported {
    /// Human readable description, with the line the construct starts on.
    pub fn describe(&self, source: &str, level: EsLevel) -> String {
        let line = source
            .get(..self.span.start as usize)
            .map_or(1, |before| before.matches('\n').count() + 1);
        format!(
            "{} needs {} but the targets only guarantee {} (line {})",
            self.construct, self.introduced, level, line
        )
    }
}

/// Find the first construct of `program` newer than `level`.
pub fn find_unsupported(program: &Program<'_>, level: EsLevel) -> Option<Unsupported> {
    let mut check = SyntaxCheck { level, found: None };
    check.visit_program(program);
    check.found
}

struct SyntaxCheck {
    level: EsLevel,
    found: Option<Unsupported>,
}

impl SyntaxCheck {
    fn report(&mut self, construct: &'static str, introduced: EsLevel, span: Span) {
        if introduced > self.level && self.found.is_none() {
            self.found = Some(Unsupported {
                construct,
                introduced,
                span,
            });
        }
    }
}

impl<'a> Visit<'a> for SyntaxCheck {
    fn visit_arrow_function_expression(&mut self, it: &ArrowFunctionExpression<'a>) {
        self.report("arrow function", EsLevel::Es2015, it.span);
        if it.r#async {
            self.report("async function", EsLevel::Es2017, it.span);
        }
        walk::walk_arrow_function_expression(self, it);
    }

    fn visit_function(&mut self, it: &Function<'a>, flags: ScopeFlags) {
        if it.generator {
            self.report("generator function", EsLevel::Es2015, it.span);
        }
        if it.r#async {
            self.report("async function", EsLevel::Es2017, it.span);
        }
        walk::walk_function(self, it, flags);
    }

    fn visit_class(&mut self, it: &Class<'a>) {
        self.report("class", EsLevel::Es2015, it.span);
        walk::walk_class(self, it);
    }

    fn visit_variable_declaration(&mut self, it: &VariableDeclaration<'a>) {
        if it.kind.is_lexical() {
            self.report("block-scoped declaration", EsLevel::Es2015, it.span);
        }
        walk::walk_variable_declaration(self, it);
    }

    fn visit_template_literal(&mut self, it: &TemplateLiteral<'a>) {
        self.report("template literal", EsLevel::Es2015, it.span);
        walk::walk_template_literal(self, it);
    }

    fn visit_tagged_template_expression(&mut self, it: &TaggedTemplateExpression<'a>) {
        self.report("tagged template", EsLevel::Es2015, it.span);
        walk::walk_tagged_template_expression(self, it);
    }

    fn visit_object_property(&mut self, it: &ObjectProperty<'a>) {
        if it.method {
            self.report("shorthand method", EsLevel::Es2015, it.span);
        }
        if it.shorthand {
            self.report("shorthand property", EsLevel::Es2015, it.span);
        }
        if it.computed {
            self.report("computed property key", EsLevel::Es2015, it.span);
        }
        walk::walk_object_property(self, it);
    }

    fn visit_object_property_kind(&mut self, it: &ObjectPropertyKind<'a>) {
        if let ObjectPropertyKind::SpreadProperty(spread) = it {
            self.report("object spread", EsLevel::Es2018, spread.span);
        }
        walk::walk_object_property_kind(self, it);
    }

    fn visit_array_expression_element(&mut self, it: &ArrayExpressionElement<'a>) {
        if let ArrayExpressionElement::SpreadElement(spread) = it {
            self.report("array spread", EsLevel::Es2015, spread.span);
        }
        walk::walk_array_expression_element(self, it);
    }

    fn visit_argument(&mut self, it: &Argument<'a>) {
        if let Argument::SpreadElement(spread) = it {
            self.report("spread argument", EsLevel::Es2015, spread.span);
        }
        walk::walk_argument(self, it);
    }

    fn visit_assignment_pattern(&mut self, it: &AssignmentPattern<'a>) {
        self.report("default value", EsLevel::Es2015, it.span);
        walk::walk_assignment_pattern(self, it);
    }

    fn visit_binding_rest_element(&mut self, it: &BindingRestElement<'a>) {
        self.report("rest element", EsLevel::Es2015, it.span);
        walk::walk_binding_rest_element(self, it);
    }

    fn visit_object_pattern(&mut self, it: &ObjectPattern<'a>) {
        self.report("destructuring", EsLevel::Es2015, it.span);
        walk::walk_object_pattern(self, it);
    }

    fn visit_array_pattern(&mut self, it: &ArrayPattern<'a>) {
        self.report("destructuring", EsLevel::Es2015, it.span);
        walk::walk_array_pattern(self, it);
    }

    fn visit_array_assignment_target(&mut self, it: &ArrayAssignmentTarget<'a>) {
        self.report("destructuring assignment", EsLevel::Es2015, it.span);
        walk::walk_array_assignment_target(self, it);
    }

    fn visit_object_assignment_target(&mut self, it: &ObjectAssignmentTarget<'a>) {
        self.report("destructuring assignment", EsLevel::Es2015, it.span);
        walk::walk_object_assignment_target(self, it);
    }

    fn visit_for_of_statement(&mut self, it: &ForOfStatement<'a>) {
        self.report("for...of loop", EsLevel::Es2015, it.span);
        if it.r#await {
            self.report("for await loop", EsLevel::Es2018, it.span);
        }
        walk::walk_for_of_statement(self, it);
    }

    fn visit_meta_property(&mut self, it: &MetaProperty<'a>) {
        self.report("meta property", EsLevel::Es2015, it.span);
        walk::walk_meta_property(self, it);
    }

    fn visit_super(&mut self, it: &Super) {
        self.report("super", EsLevel::Es2015, it.span);
        walk::walk_super(self, it);
    }

    fn visit_binary_expression(&mut self, it: &BinaryExpression<'a>) {
        if it.operator == BinaryOperator::Exponential {
            self.report("exponentiation operator", EsLevel::Es2016, it.span);
        }
        walk::walk_binary_expression(self, it);
    }

    fn visit_assignment_expression(&mut self, it: &AssignmentExpression<'a>) {
        match it.operator {
            AssignmentOperator::Exponential => {
                self.report("exponentiation assignment", EsLevel::Es2016, it.span)
            }
            AssignmentOperator::LogicalOr
            | AssignmentOperator::LogicalAnd
            | AssignmentOperator::LogicalNullish => {
                self.report("logical assignment", EsLevel::Es2021, it.span)
            }
            _ => {}
        }
        walk::walk_assignment_expression(self, it);
    }

    fn visit_await_expression(&mut self, it: &AwaitExpression<'a>) {
        self.report("await", EsLevel::Es2017, it.span);
        walk::walk_await_expression(self, it);
    }

    fn visit_catch_clause(&mut self, it: &CatchClause<'a>) {
        if it.param.is_none() {
            self.report("optional catch binding", EsLevel::Es2019, it.span);
        }
        walk::walk_catch_clause(self, it);
    }

    fn visit_chain_expression(&mut self, it: &ChainExpression<'a>) {
        self.report("optional chaining", EsLevel::Es2020, it.span);
        walk::walk_chain_expression(self, it);
    }

    fn visit_logical_expression(&mut self, it: &LogicalExpression<'a>) {
        if it.operator == LogicalOperator::Coalesce {
            self.report("nullish coalescing", EsLevel::Es2020, it.span);
        }
        walk::walk_logical_expression(self, it);
    }

    fn visit_big_int_literal(&mut self, it: &BigIntLiteral<'a>) {
        self.report("BigInt literal", EsLevel::Es2020, it.span);
        walk::walk_big_int_literal(self, it);
    }

    fn visit_import_expression(&mut self, it: &ImportExpression<'a>) {
        self.report("dynamic import", EsLevel::Es2020, it.span);
        walk::walk_import_expression(self, it);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;
    use pretty_assertions::assert_eq;

    fn first_unsupported(source: &str, level: EsLevel) -> Option<(&'static str, EsLevel)> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
        assert!(ret.errors.is_empty(), "{:?}", ret.errors);
        find_unsupported(&ret.program, level).map(|u| (u.construct, u.introduced))
    }

    #[test]
    fn accepts_plain_es5() {
        let source = "var o = { a: 1, get b() { return 2; } };\nfunction f(x) { with (this) { return [x, o]; } }\ntry { f(1); } catch (e) {}";

        assert_eq!(first_unsupported(source, EsLevel::Es5), None);
    }

    #[test]
    fn reports_es2015_constructs_for_es5() {
        let cases = [
            ("class A {}", "class"),
            ("const a = 1;", "block-scoped declaration"),
            ("var o = { m() {} };", "shorthand method"),
            ("var o = { [k]: 1 };", "computed property key"),
            ("var [a, b] = xs;", "destructuring"),
            ("f(...args);", "spread argument"),
            ("for (var x of xs) {}", "for...of loop"),
            ("function* g() {}", "generator function"),
            ("var s = `x`;", "template literal"),
        ];

        for (source, construct) in cases {
            assert_eq!(
                first_unsupported(source, EsLevel::Es5),
                Some((construct, EsLevel::Es2015)),
                "{source}"
            );
        }
    }

    #[test]
    fn respects_the_target_edition() {
        assert_eq!(first_unsupported("class A {}", EsLevel::Es2015), None);
        assert_eq!(
            first_unsupported("var v = a?.b;", EsLevel::Es2017),
            Some(("optional chaining", EsLevel::Es2020))
        );
        assert_eq!(first_unsupported("var v = a?.b;", EsLevel::Es2020), None);
        assert_eq!(
            first_unsupported("async function f() { await g(); }", EsLevel::Es2016),
            Some(("async function", EsLevel::Es2017))
        );
    }

    #[test]
    fn describes_the_offending_line() {
        let source = "var a = 1;\nvar b = 2;\nclass C {}";
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();

        let found = find_unsupported(&ret.program, EsLevel::Es5).unwrap();

        assert_eq!(
            found.describe(source, EsLevel::Es5),
            "class needs ES2015 but the targets only guarantee ES5 (line 3)"
        );
    }
}
