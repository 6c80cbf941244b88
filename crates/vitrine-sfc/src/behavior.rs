//! Rewrites a behavior section into the body of an initializer function.
//!
//! The section's `export default <value>` becomes a trailing `return <value>;`
//! so the section can run inside an immediately-invoked function.

use oxc_allocator::Allocator;
use oxc_ast::ast::{ExportDefaultDeclarationKind, Expression, ObjectPropertyKind, PropertyKey, Statement};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};

use crate::error::SfcError;

/// Initializer body used when a definition has no behavior section.
pub const EMPTY_BEHAVIOR: &str = "return {};";

/// A behavior section rewritten into an initializer body.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBehavior {
    /// Statements ending in `return <component options>;`
    pub body: String,

    /// Static `name` property of the exported object literal, if present
    pub name: Option<String>,

    /// Whether the default export is an object literal
    pub is_object_literal: bool,
}

impl NormalizedBehavior {
    fn empty() -> Self {
        Self {
            body: EMPTY_BEHAVIOR.to_string(),
            name: None,
            is_object_literal: true,
        }
    }
}

/// Normalize a behavior section.
///
/// A missing or blank section yields an empty component object. Otherwise the
/// section must be a module with exactly one `export default` and no imports or
/// other exports.
pub fn normalize_behavior(section: Option<&str>) -> Result<NormalizedBehavior, SfcError> {
    let Some(source) = section.filter(|s| !s.trim().is_empty()) else {
        return Ok(NormalizedBehavior::empty());
    };

    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();

    if !ret.errors.is_empty() || ret.panicked {
        let messages: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
        return Err(ambiguity(format!(
            "behavior section does not parse: {}",
            messages.join("; ")
        )));
    }

    let mut statements: Vec<&str> = Vec::new();
    let mut exported: Option<&str> = None;
    let mut name = None;
    let mut is_object_literal = false;

    for statement in &ret.program.body {
        match statement {
            Statement::ExportDefaultDeclaration(decl) => {
                if exported.is_some() {
                    return Err(ambiguity(
                        "behavior section has more than one `export default`".to_string(),
                    ));
                }
                exported = Some(slice(source, decl.declaration.span()));
                if let ExportDefaultDeclarationKind::ObjectExpression(object) = &decl.declaration {
                    is_object_literal = true;
                    name = object.properties.iter().find_map(static_name_property);
                }
            }
            Statement::ImportDeclaration(_) => {
                return Err(ambiguity(
                    "behavior section cannot import modules inside a demo".to_string(),
                ));
            }
            Statement::ExportNamedDeclaration(_) | Statement::ExportAllDeclaration(_) => {
                return Err(ambiguity(
                    "behavior section may only contain a single `export default`".to_string(),
                ));
            }
            other => statements.push(slice(source, other.span())),
        }
    }

    let Some(exported) = exported else {
        return Err(ambiguity(
            "behavior section has no `export default` declaration".to_string(),
        ));
    };

    let mut body = statements.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    body.push_str("return ");
    body.push_str(exported.trim());
    body.push(';');

    Ok(NormalizedBehavior {
        body,
        name,
        is_object_literal,
    })
}

/// Value of a `name: '...'` property.
fn static_name_property(property: &ObjectPropertyKind) -> Option<String> {
    let ObjectPropertyKind::ObjectProperty(property) = property else {
        return None;
    };
    let is_name = match &property.key {
        PropertyKey::StaticIdentifier(ident) => ident.name.as_str() == "name",
        PropertyKey::StringLiteral(lit) => lit.value.as_str() == "name",
        _ => false,
    };
    if !is_name {
        return None;
    }
    match &property.value {
        Expression::StringLiteral(lit) => Some(lit.value.to_string()),
        _ => None,
    }
}

fn slice(source: &str, span: oxc_span::Span) -> &str {
    &source[span.start as usize..span.end as usize]
}

fn ambiguity(message: String) -> SfcError {
    SfcError::SectionExtractionAmbiguity(message)
}
