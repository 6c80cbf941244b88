//! Render-procedure generation for the Vue 2 runtime helpers.
//!
//! `_c` creates an element, `_v` a text node, `_s` stringifies an
//! interpolation, `_e` renders nothing, `_l` maps a list and `_m(i)` renders
//! the i-th static render procedure.

use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::Regex;
use std::sync::LazyLock;

use super::parser::{Attr, Element, Node};
use super::CompileOptions;
use crate::diagnostics::{Diagnostic, Span};
use crate::error::SfcError;

/// Generated render procedure bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedCode {
    /// Body of the primary render procedure
    pub render: String,

    /// Bodies of the hoisted static render procedures, in `_m(i)` order
    pub static_renders: Vec<String>,

    /// Advisory messages
    pub tips: Vec<Diagnostic>,
}

static INTERPOLATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{((?s).+?)\}\}").expect("Invalid interpolation regex"));

static FOR_ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\(([^)]*)\)|([\w$]+))\s+(?:in|of)\s+((?s).+?)\s*$")
        .expect("Invalid v-for regex")
});

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][\w$]*$").expect("Invalid identifier regex"));

static SIMPLE_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*|\['[^']*?'\]|\["[^"]*?"\]|\[\d+\]|\[[A-Za-z_$][\w$]*\])*$"#,
    )
    .expect("Invalid simple path regex")
});

static FUNCTION_EXPRESSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[\w$]+|\([^)]*?\))\s*=>|^function\s*\(").expect("Invalid function regex")
});

/// Generate render procedures for a parsed root element.
pub fn generate(root: &Element, options: &CompileOptions) -> Result<GeneratedCode, SfcError> {
    let mut generator = Generator {
        options,
        static_renders: Vec::new(),
        tips: Vec::new(),
        for_depth: 0,
        hoisting: true,
    };

    let code = generator.element(root)?;

    Ok(GeneratedCode {
        render: with_this(&code),
        static_renders: generator.static_renders,
        tips: generator.tips,
    })
}

fn with_this(code: &str) -> String {
    format!("with(this){{return {}}}", code)
}

/// A child after whitespace handling.
enum Child<'a> {
    Element(&'a Element),
    Text(String, Span),
}

struct Generator<'o> {
    options: &'o CompileOptions,
    static_renders: Vec<String>,
    tips: Vec<Diagnostic>,
    for_depth: usize,
    hoisting: bool,
}

impl Generator<'_> {
    fn element(&mut self, el: &Element) -> Result<String, SfcError> {
        match el.attr("v-for") {
            Some(attr) => self.for_loop(el, attr),
            None => self.element_inner(el),
        }
    }

    fn element_inner(&mut self, el: &Element) -> Result<String, SfcError> {
        if self.hoisting && self.for_depth == 0 && self.is_static_root(el) {
            let index = self.static_renders.len();
            self.hoisting = false;
            let code = self.plain_element(el);
            self.hoisting = true;
            self.static_renders.push(with_this(&code?));
            return Ok(format!("_m({})", index));
        }

        if el.tag == "template" {
            return Ok(self
                .children(el)?
                .map(|(children, _)| children)
                .unwrap_or_else(|| "[]".to_string()));
        }

        self.plain_element(el)
    }

    fn for_loop(&mut self, el: &Element, attr: &Attr) -> Result<String, SfcError> {
        let value = required_value(attr)?;
        let Some(caps) = FOR_ALIAS_RE.captures(value) else {
            return Err(SfcError::markup(
                format!("invalid v-for expression: {}", value),
                Some(attr.span),
            ));
        };

        let aliases: Vec<&str> = match (caps.get(1), caps.get(2)) {
            (Some(list), _) => list.as_str().split(',').map(str::trim).collect(),
            (None, Some(single)) => vec![single.as_str()],
            (None, None) => Vec::new(),
        };
        if aliases.is_empty() || aliases.iter().any(|a| !IDENTIFIER_RE.is_match(a)) {
            return Err(SfcError::markup(
                format!("invalid v-for alias in: {}", value),
                Some(attr.span),
            ));
        }

        let source = &caps[3];
        check_expression(source, "v-for", attr.span)?;

        if is_component(&el.tag) && !el.has_attr("key") && !el.has_attr(":key") {
            self.tips.push(
                Diagnostic::tip(format!(
                    "<{}>: component lists rendered with v-for should have explicit keys.",
                    el.tag
                ))
                .with_span(el.span),
            );
        }

        self.for_depth += 1;
        let inner = self.element_inner(el);
        self.for_depth -= 1;
        let mut inner = inner?;

        // v-for takes precedence over v-if on the same element
        if let Some(condition) = el.attr("v-if") {
            let condition_value = required_value(condition)?;
            check_expression(condition_value, "v-if", condition.span)?;
            inner = format!("({})?{}:_e()", condition_value, inner);
        }

        Ok(format!(
            "_l(({}),function({}){{return {}}})",
            source,
            aliases.join(","),
            inner
        ))
    }

    fn if_chain(&mut self, branches: &[(Option<&Attr>, &Element)]) -> Result<String, SfcError> {
        let mut code = "_e()".to_string();

        for (condition, el) in branches.iter().rev() {
            let rendered = self.element(el)?;
            code = match condition {
                Some(attr) => {
                    let value = required_value(attr)?;
                    check_expression(value, &attr.name, attr.span)?;
                    format!("({})?{}:{}", value, rendered, code)
                }
                None => rendered,
            };
        }

        Ok(code)
    }

    fn plain_element(&mut self, el: &Element) -> Result<String, SfcError> {
        let data = self.data(el)?;
        let children = self.children(el)?;

        let mut code = format!("_c({}", js_string(&el.tag));
        if let Some(data) = data {
            code.push(',');
            code.push_str(&data);
        }
        if let Some((children, normalization)) = children {
            code.push(',');
            code.push_str(&children);
            if normalization > 0 {
                code.push_str(&format!(",{}", normalization));
            }
        }
        code.push(')');
        Ok(code)
    }

    /// Children array and normalization hint, or `None` for no children.
    fn children(&mut self, el: &Element) -> Result<Option<(String, u8)>, SfcError> {
        let nodes = self.significant_children(el);
        if nodes.is_empty() {
            return Ok(None);
        }

        let mut parts = Vec::new();
        let mut normalization = 0u8;
        let mut i = 0;

        while i < nodes.len() {
            let child = match &nodes[i] {
                Child::Text(content, span) => {
                    parts.push(self.text(content, *span)?);
                    i += 1;
                    continue;
                }
                Child::Element(child) => *child,
            };

            if let Some(stray) = child
                .attr("v-else-if")
                .or_else(|| child.attr("v-else"))
            {
                return Err(SfcError::markup(
                    format!(
                        "{} used on element <{}> without corresponding v-if.",
                        stray.name, child.tag
                    ),
                    Some(stray.span),
                ));
            }

            if child.has_attr("v-if") && !child.has_attr("v-for") {
                let mut branches: Vec<(Option<&Attr>, &Element)> = vec![(child.attr("v-if"), child)];
                let mut next = i + 1;
                loop {
                    let mut k = next;
                    while let Some(Child::Text(content, _)) = nodes.get(k) {
                        if !content.trim().is_empty() {
                            break;
                        }
                        k += 1;
                    }
                    let Some(Child::Element(candidate)) = nodes.get(k) else {
                        break;
                    };
                    if let Some(attr) = candidate.attr("v-else-if") {
                        branches.push((Some(attr), candidate));
                        next = k + 1;
                    } else if candidate.has_attr("v-else") {
                        branches.push((None, candidate));
                        next = k + 1;
                        break;
                    } else {
                        break;
                    }
                }

                for (_, branch) in &branches {
                    normalization = normalization.max(normalization_type(branch));
                }
                parts.push(self.if_chain(&branches)?);
                i = next;
                continue;
            }

            normalization = normalization.max(normalization_type(child));
            parts.push(self.element(child)?);
            i += 1;
        }

        Ok(Some((format!("[{}]", parts.join(",")), normalization)))
    }

    fn significant_children<'e>(&self, el: &'e Element) -> Vec<Child<'e>> {
        significant_children(el, self.options.preserve_whitespace)
    }

    fn text(&mut self, content: &str, span: Span) -> Result<String, SfcError> {
        let mut parts = Vec::new();
        let mut last = 0;

        for caps in INTERPOLATION_RE.captures_iter(content) {
            let (Some(whole), Some(expr)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() > last {
                parts.push(js_string(&content[last..whole.start()]));
            }
            let expr = expr.as_str().trim();
            check_expression(expr, "interpolation", span)?;
            parts.push(format!("_s({})", expr));
            last = whole.end();
        }

        if last < content.len() {
            parts.push(js_string(&content[last..]));
        }

        Ok(format!("_v({})", parts.join("+")))
    }

    fn data(&mut self, el: &Element) -> Result<Option<String>, SfcError> {
        let mut directives = Vec::new();
        let mut key = None;
        let mut reference = None;
        let mut static_class = None;
        let mut class = None;
        let mut static_style = None;
        let mut style = None;
        let mut attrs: Vec<(String, String)> = Vec::new();
        let mut dom_props: Vec<(String, String)> = Vec::new();
        let mut on: Vec<(String, String)> = Vec::new();
        let mut native_on: Vec<(String, String)> = Vec::new();

        for attr in &el.attrs {
            let name = attr.name.as_str();

            if matches!(name, "v-for" | "v-if" | "v-else-if" | "v-else") {
                continue;
            }

            if let Some(binding) = name.strip_prefix(':').or_else(|| name.strip_prefix("v-bind:")) {
                let value = required_value(attr)?;
                check_expression(value, name, attr.span)?;
                let (arg, modifiers) = split_modifiers(binding);
                let value = format!("({})", value);
                match arg {
                    "class" => class = Some(value),
                    "style" => style = Some(value),
                    "key" => key = Some(value),
                    "ref" => reference = Some(value),
                    _ if modifiers.contains(&"prop") => dom_props.push((camelize(arg), value)),
                    _ if modifiers.contains(&"camel") => attrs.push((camelize(arg), value)),
                    _ => attrs.push((arg.to_string(), value)),
                }
                continue;
            }

            if let Some(event) = name.strip_prefix('@').or_else(|| name.strip_prefix("v-on:")) {
                let (event, modifiers) = split_modifiers(event);
                let handler = self.handler(attr, &modifiers)?;
                let event = event_key(event, &modifiers);
                let target = if modifiers.contains(&"native") {
                    &mut native_on
                } else {
                    &mut on
                };
                if target.iter().any(|(existing, _)| *existing == event) {
                    self.tips.push(
                        Diagnostic::tip(format!(
                            "<{}>: duplicate listener for '{}', only the first is used.",
                            el.tag, event
                        ))
                        .with_span(attr.span),
                    );
                    continue;
                }
                target.push((event, handler));
                continue;
            }

            match name {
                "v-html" | "v-text" => {
                    let value = required_value(attr)?;
                    check_expression(value, name, attr.span)?;
                    let prop = if name == "v-html" {
                        "innerHTML"
                    } else {
                        "textContent"
                    };
                    dom_props.push((prop.to_string(), format!("_s({})", value)));
                }
                "v-model" => {
                    self.tips.push(
                        Diagnostic::tip(format!(
                            "<{}>: v-model is not supported in embedded demos and was ignored; bind :value and listen to @input instead.",
                            el.tag
                        ))
                        .with_span(attr.span),
                    );
                }
                "v-bind" | "v-on" => {
                    self.tips.push(
                        Diagnostic::tip(format!(
                            "<{}>: object syntax for {} is not supported and was ignored.",
                            el.tag, name
                        ))
                        .with_span(attr.span),
                    );
                }
                _ if name.starts_with("v-") => {
                    directives.push(self.directive(attr)?);
                }
                "key" => key = Some(js_string(attr.value.as_deref().unwrap_or_default())),
                "ref" => reference = Some(js_string(attr.value.as_deref().unwrap_or_default())),
                "class" => {
                    let classes = attr
                        .value
                        .as_deref()
                        .unwrap_or_default()
                        .split_whitespace()
                        .collect::<Vec<_>>()
                        .join(" ");
                    static_class = Some(js_string(&classes));
                }
                "style" => {
                    static_style = Some(static_style_object(attr.value.as_deref().unwrap_or_default()));
                }
                _ => attrs.push((
                    name.to_string(),
                    js_string(attr.value.as_deref().unwrap_or_default()),
                )),
            }
        }

        if let Some(scope) = self.options.scope_id {
            attrs.push((format!("data-v-{}", scope), js_string("")));
        }

        let mut fields = Vec::new();
        if !directives.is_empty() {
            fields.push(format!("directives:[{}]", directives.join(",")));
        }
        if let Some(key) = key {
            fields.push(format!("key:{}", key));
        }
        if let Some(reference) = reference {
            fields.push(format!("ref:{}", reference));
        }
        if let Some(static_class) = static_class {
            fields.push(format!("staticClass:{}", static_class));
        }
        if let Some(class) = class {
            fields.push(format!("class:{}", class));
        }
        if let Some(static_style) = static_style {
            fields.push(format!("staticStyle:{}", static_style));
        }
        if let Some(style) = style {
            fields.push(format!("style:{}", style));
        }
        if !attrs.is_empty() {
            fields.push(format!("attrs:{}", object(&attrs)));
        }
        if !dom_props.is_empty() {
            fields.push(format!("domProps:{}", object(&dom_props)));
        }
        if !on.is_empty() {
            fields.push(format!("on:{}", object(&on)));
        }
        if !native_on.is_empty() {
            fields.push(format!("nativeOn:{}", object(&native_on)));
        }

        if fields.is_empty() {
            Ok(None)
        } else {
            Ok(Some(format!("{{{}}}", fields.join(","))))
        }
    }

    fn handler(&mut self, attr: &Attr, modifiers: &[&str]) -> Result<String, SfcError> {
        let mut guard = String::new();
        for modifier in modifiers {
            match *modifier {
                "stop" => guard.push_str("$event.stopPropagation();"),
                "prevent" => guard.push_str("$event.preventDefault();"),
                "self" => guard.push_str("if($event.target !== $event.currentTarget)return null;"),
                "native" | "once" | "capture" | "passive" => {}
                other => self.tips.push(
                    Diagnostic::tip(format!("unsupported event modifier '.{}' was ignored.", other))
                        .with_span(attr.span),
                ),
            }
        }

        let value = attr.value.as_deref().map(str::trim).unwrap_or_default();
        let handler = if value.is_empty() {
            format!("function($event){{{}}}", guard)
        } else if SIMPLE_PATH_RE.is_match(value) || FUNCTION_EXPRESSION_RE.is_match(value) {
            if guard.is_empty() {
                value.to_string()
            } else {
                format!(
                    "function($event){{{}return ({}).apply(null, arguments)}}",
                    guard, value
                )
            }
        } else {
            format!("function($event){{{}{}}}", guard, value)
        };

        check_expression(&handler, &attr.name, attr.span)?;
        Ok(handler)
    }

    fn directive(&mut self, attr: &Attr) -> Result<String, SfcError> {
        let raw = attr.name.as_str();
        let body = raw.trim_start_matches("v-");
        let (name_and_arg, modifiers) = split_modifiers(body);
        let (name, arg) = match name_and_arg.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (name_and_arg, None),
        };

        let mut fields = vec![
            format!("name:{}", js_string(name)),
            format!("rawName:{}", js_string(raw)),
        ];
        if let Some(value) = attr.value.as_deref() {
            check_expression(value, raw, attr.span)?;
            fields.push(format!("value:({})", value));
            fields.push(format!("expression:{}", js_string(value)));
        }
        if let Some(arg) = arg {
            fields.push(format!("arg:{}", js_string(arg)));
        }
        if !modifiers.is_empty() {
            let flags: Vec<(String, String)> = modifiers
                .iter()
                .map(|m| (m.to_string(), "true".to_string()))
                .collect();
            fields.push(format!("modifiers:{}", object(&flags)));
        }

        Ok(format!("{{{}}}", fields.join(",")))
    }

    fn is_static_root(&self, el: &Element) -> bool {
        if !is_static(el) {
            return false;
        }
        let children = self.significant_children(el);
        match children.as_slice() {
            [] => false,
            [Child::Text(..)] => false,
            _ => true,
        }
    }
}

fn significant_children(el: &Element, preserve_whitespace: bool) -> Vec<Child<'_>> {
    let mut children = Vec::new();

    for node in &el.children {
        match node {
            Node::Element(child) => children.push(Child::Element(child)),
            Node::Text(text) if el.tag == "pre" => {
                children.push(Child::Text(text.content.clone(), text.span))
            }
            Node::Text(text) if text.is_whitespace() => {
                if preserve_whitespace && !children.is_empty() {
                    children.push(Child::Text(" ".to_string(), text.span));
                }
            }
            Node::Text(text) => children.push(Child::Text(text.content.clone(), text.span)),
        }
    }

    // Trailing whitespace never renders anything useful
    if el.tag != "pre" {
        while let Some(Child::Text(content, _)) = children.last() {
            if !content.trim().is_empty() {
                break;
            }
            children.pop();
        }
    }

    children
}

/// Whether a subtree renders the same output for every instance.
fn is_static(el: &Element) -> bool {
    if is_component(&el.tag) || el.tag == "template" {
        return false;
    }
    if el.attrs.iter().any(|a| is_dynamic_attr(&a.name)) {
        return false;
    }
    el.children.iter().all(|child| match child {
        Node::Element(child) => is_static(child),
        Node::Text(text) => !INTERPOLATION_RE.is_match(&text.content),
    })
}

fn is_dynamic_attr(name: &str) -> bool {
    name.starts_with(':')
        || name.starts_with('@')
        || name.starts_with("v-")
        || name == "key"
        || name == "ref"
}

/// Tags resolved as components rather than platform elements.
fn is_component(tag: &str) -> bool {
    tag.contains('-')
        || tag.chars().any(|c| c.is_ascii_uppercase())
        || tag == "component"
        || tag == "slot"
}

/// 2 when a child may produce nested arrays, 1 when it may be a component.
fn normalization_type(el: &Element) -> u8 {
    if el.has_attr("v-for") || el.tag == "template" || el.tag == "slot" {
        2
    } else if is_component(&el.tag) {
        1
    } else {
        0
    }
}

fn required_value(attr: &Attr) -> Result<&str, SfcError> {
    match attr.value.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(SfcError::markup(
            format!("{} requires a value", attr.name),
            Some(attr.span),
        )),
    }
}

/// Validate a template expression with the JavaScript parser.
fn check_expression(expr: &str, context: &str, span: Span) -> Result<(), SfcError> {
    let allocator = Allocator::default();
    match Parser::new(&allocator, expr, SourceType::cjs()).parse_expression() {
        Ok(_) => Ok(()),
        Err(errors) => {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            Err(SfcError::markup(
                format!(
                    "invalid expression in {}: {} ({})",
                    context,
                    expr.trim(),
                    messages.join("; ")
                ),
                Some(span),
            ))
        }
    }
}

fn split_modifiers(name: &str) -> (&str, Vec<&str>) {
    let mut parts = name.split('.');
    let base = parts.next().unwrap_or_default();
    (base, parts.filter(|m| !m.is_empty()).collect())
}

/// Event key with Vue's capture/once/passive prefixes.
fn event_key(event: &str, modifiers: &[&str]) -> String {
    let mut key = String::new();
    if modifiers.contains(&"passive") {
        key.push('&');
    }
    if modifiers.contains(&"once") {
        key.push('~');
    }
    if modifiers.contains(&"capture") {
        key.push('!');
    }
    key.push_str(event);
    key
}

fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn static_style_object(style: &str) -> String {
    let entries: Vec<(String, String)> = style
        .split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .map(|(property, value)| (property.trim().to_string(), js_string(value.trim())))
        .filter(|(property, _)| !property.is_empty())
        .collect();
    object(&entries)
}

/// Object literal with quoted keys and pre-rendered values.
fn object(entries: &[(String, String)]) -> String {
    let fields: Vec<String> = entries
        .iter()
        .map(|(key, value)| format!("{}:{}", js_string(key), value))
        .collect();
    format!("{{{}}}", fields.join(","))
}

/// Quote a string as a JavaScript literal that is also safe for old engines.
pub fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
