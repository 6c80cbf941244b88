//! Render procedure formatting.
//!
//! Compiled procedures can end up in front of documentation readers, so they
//! are pretty-printed rather than embedded as one long line.

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::{ParseOptions, Parser};
use oxc_span::SourceType;

const INDENT: &str = "    ";

/// Wrap a procedure body in a zero-argument function expression.
///
/// The body is re-printed with four-space indentation. A body that does not
/// parse is embedded as written.
pub fn to_callable(body: &str) -> String {
    let printed = pretty_print(body).unwrap_or_else(|| body.trim().to_string());
    if printed.is_empty() {
        return "function () {}".to_string();
    }

    let indented: Vec<String> = printed
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{}{}", INDENT, line)
            }
        })
        .collect();

    format!("function () {{\n{}\n}}", indented.join("\n"))
}

fn pretty_print(body: &str) -> Option<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, body, SourceType::cjs())
        .with_options(ParseOptions {
            allow_return_outside_function: true,
            ..ParseOptions::default()
        })
        .parse();

    if ret.panicked || !ret.errors.is_empty() {
        return None;
    }

    let code = Codegen::new().build(&ret.program).code;
    Some(retab(code.trim_end()))
}

/// Replace leading tabs with four spaces each.
fn retab(code: &str) -> String {
    code.lines()
        .map(|line| {
            let tabs = line.len() - line.trim_start_matches('\t').len();
            format!("{}{}", INDENT.repeat(tabs), &line[tabs..])
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn wraps_and_indents_body() {
        let callable = to_callable("with(this){return _c(\"div\")}");

        assert!(callable.starts_with("function () {\n    with"));
        assert!(callable.contains("\n        return _c(\"div\");\n"));
        assert!(callable.ends_with("\n    }\n}"));
        assert!(!callable.contains('\t'));
    }

    #[test]
    fn is_deterministic() {
        let body = "with(this){return _c(\"p\",[_v(_s(msg))])}";
        assert_eq!(to_callable(body), to_callable(body));
    }

    #[test]
    fn embeds_unparsable_body_as_written() {
        assert_eq!(to_callable("return ("), "function () {\n    return (\n}");
    }

    #[test]
    fn empty_body_is_empty_function() {
        assert_eq!(to_callable("   "), "function () {}");
    }

    #[test]
    fn output_parses_as_expression() {
        let callable = to_callable("with(this){return _c(\"div\",[_v(\"a\")])}");
        let allocator = Allocator::default();

        assert!(Parser::new(&allocator, &callable, SourceType::cjs())
            .parse_expression()
            .is_ok());
    }
}
