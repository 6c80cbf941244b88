//! Strict markup parser for component templates.
//!
//! Unlike a browser's HTML parser this one never recovers from mismatched
//! tags: a template that does not describe a single well-formed tree is
//! rejected so the author sees the mistake in the build log.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::diagnostics::{Diagnostic, Span};
use crate::error::SfcError;

/// A node of a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(Text),
}

/// An element and its subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<Attr>,
    pub children: Vec<Node>,
    pub span: Span,
}

/// An attribute as written in the template.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub name: String,
    /// Decoded value; `None` for bare attributes like `disabled`
    pub value: Option<String>,
    pub span: Span,
}

/// A run of text, entities decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub content: String,
    pub span: Span,
}

impl Element {
    /// Look up an attribute by its exact name.
    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs.iter().find(|a| a.name == name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }
}

impl Text {
    pub fn is_whitespace(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Result of parsing a template.
#[derive(Debug, Clone)]
pub struct ParsedTemplate {
    pub root: Element,
    pub tips: Vec<Diagnostic>,
}

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

static START_TAG_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<([a-zA-Z][\w\-.:]*)").expect("Invalid start tag regex")
});

static START_TAG_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(/?)>").expect("Invalid start tag close regex"));

static END_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^</([a-zA-Z][\w\-.:]*)\s*>").expect("Invalid end tag regex")
});

static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("Invalid attribute regex")
});

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(lt|gt|amp|quot|#39|apos|nbsp);").expect("Invalid entity regex")
});

/// Parse template markup into a single-rooted tree.
pub fn parse(markup: &str) -> Result<ParsedTemplate, SfcError> {
    let mut parser = MarkupParser {
        source: markup,
        pos: 0,
        stack: Vec::new(),
        roots: Vec::new(),
        tips: Vec::new(),
    };
    parser.run()?;
    parser.finish()
}

struct MarkupParser<'a> {
    source: &'a str,
    pos: usize,
    stack: Vec<Element>,
    roots: Vec<Node>,
    tips: Vec<Diagnostic>,
}

impl<'a> MarkupParser<'a> {
    fn run(&mut self) -> Result<(), SfcError> {
        while self.pos < self.source.len() {
            let rest = &self.source[self.pos..];

            if rest.starts_with("<!--") {
                let Some(end) = rest.find("-->") else {
                    return Err(self.error("unterminated comment", self.pos));
                };
                self.pos += end + 3;
                continue;
            }

            if let Some(caps) = END_TAG_RE.captures(rest) {
                let len = caps[0].len();
                self.close_element(&caps[1])?;
                self.pos += len;
                continue;
            }

            if let Some(caps) = START_TAG_OPEN_RE.captures(rest) {
                let tag = caps[1].to_string();
                let start = self.pos;
                self.pos += caps[0].len();
                self.open_element(tag, start)?;
                continue;
            }

            self.text();
        }

        Ok(())
    }

    /// Consume text up to the next tag, keeping `{{ }}` interpolations intact.
    fn text(&mut self) {
        let start = self.pos;
        let bytes = self.source.as_bytes();
        let mut end = self.pos;

        // A `<` that did not start a tag is literal text
        if bytes.get(end) == Some(&b'<') {
            end += 1;
        }

        while end < bytes.len() {
            if bytes[end] == b'{' && bytes.get(end + 1) == Some(&b'{') {
                match self.source[end + 2..].find("}}") {
                    Some(close) => {
                        end += close + 4;
                        continue;
                    }
                    None => {
                        end = bytes.len();
                        break;
                    }
                }
            }
            if bytes[end] == b'<' {
                break;
            }
            end += 1;
        }

        let raw = &self.source[start..end];
        self.pos = end;
        self.append(Node::Text(Text {
            content: decode_entities(raw),
            span: Span::from_offset(self.source, start),
        }));
    }

    fn open_element(&mut self, tag: String, start: usize) -> Result<(), SfcError> {
        let span = Span::from_offset(self.source, start);
        let mut attrs: Vec<Attr> = Vec::new();

        loop {
            let rest = &self.source[self.pos..];
            if let Some(caps) = START_TAG_CLOSE_RE.captures(rest) {
                let self_closing = &caps[1] == "/";
                self.pos += caps[0].len();
                return self.start_element(tag, attrs, span, self_closing);
            }

            let Some(caps) = ATTRIBUTE_RE.captures(rest) else {
                return Err(self.error(format!("malformed start tag <{}>", tag), start));
            };
            let attr = self.attribute(&caps);
            if attrs.iter().any(|a| a.name == attr.name) {
                return Err(SfcError::markup(
                    format!("duplicate attribute: {}", attr.name),
                    Some(attr.span),
                ));
            }
            self.pos += caps[0].len();
            attrs.push(attr);
        }
    }

    fn attribute(&self, caps: &Captures<'_>) -> Attr {
        let offset = caps
            .get(1)
            .map(|m| self.pos + m.start())
            .unwrap_or(self.pos);
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| decode_entities(m.as_str()));

        Attr {
            name: caps[1].to_string(),
            value,
            span: Span::from_offset(self.source, offset),
        }
    }

    fn start_element(
        &mut self,
        tag: String,
        attrs: Vec<Attr>,
        span: Span,
        self_closing: bool,
    ) -> Result<(), SfcError> {
        if tag == "script" || tag == "style" {
            self.skip_raw_element(&tag, span)?;
            self.tips.push(
                Diagnostic::tip(format!(
                    "Templates should only be responsible for mapping the state to the UI. Avoid placing tags with side-effects in your templates, such as <{}>, as they will not be parsed.",
                    tag
                ))
                .with_span(span),
            );
            return Ok(());
        }

        let element = Element {
            tag,
            attrs,
            children: Vec::new(),
            span,
        };

        if self_closing || VOID_ELEMENTS.contains(&element.tag.as_str()) {
            self.append(Node::Element(element));
        } else {
            self.stack.push(element);
        }
        Ok(())
    }

    fn skip_raw_element(&mut self, tag: &str, span: Span) -> Result<(), SfcError> {
        let close = format!("</{}", tag);
        match self.source[self.pos..].find(&close) {
            Some(offset) => {
                let after = self.pos + offset;
                let end = self.source[after..]
                    .find('>')
                    .map(|e| after + e + 1)
                    .unwrap_or(self.source.len());
                self.pos = end;
                Ok(())
            }
            None => Err(SfcError::markup(
                format!("tag <{}> has no matching end tag.", tag),
                Some(span),
            )),
        }
    }

    fn close_element(&mut self, tag: &str) -> Result<(), SfcError> {
        let Some(open) = self.stack.pop() else {
            return Err(self.error(format!("stray end tag </{}>", tag), self.pos));
        };

        if open.tag != tag {
            return Err(SfcError::markup(
                format!("tag <{}> has no matching end tag.", open.tag),
                Some(open.span),
            ));
        }

        self.append(Node::Element(open));
        Ok(())
    }

    fn append(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn finish(mut self) -> Result<ParsedTemplate, SfcError> {
        if let Some(open) = self.stack.pop() {
            return Err(SfcError::markup(
                format!("tag <{}> has no matching end tag.", open.tag),
                Some(open.span),
            ));
        }

        let mut root = None;
        for node in self.roots {
            match node {
                Node::Text(text) if text.is_whitespace() => {}
                Node::Text(text) => {
                    return Err(SfcError::MissingRootElement(format!(
                        "text \"{}\" outside root element will be ignored",
                        text.content.trim()
                    )));
                }
                Node::Element(element) => {
                    if root.is_some() {
                        return Err(SfcError::MissingRootElement(format!(
                            "found a second root <{}> at line {}",
                            element.tag, element.span.line
                        )));
                    }
                    root = Some(element);
                }
            }
        }

        match root {
            Some(root) => Ok(ParsedTemplate {
                root,
                tips: self.tips,
            }),
            None => Err(SfcError::MissingRootElement(
                "template is empty".to_string(),
            )),
        }
    }

    fn error(&self, message: impl Into<String>, offset: usize) -> SfcError {
        SfcError::markup(message, Some(Span::from_offset(self.source, offset)))
    }
}

/// Decode the handful of character references templates commonly contain.
pub fn decode_entities(raw: &str) -> String {
    ENTITY_RE
        .replace_all(raw, |caps: &Captures<'_>| match &caps[1] {
            "lt" => "<",
            "gt" => ">",
            "amp" => "&",
            "quot" => "\"",
            "#39" | "apos" => "'",
            _ => "\u{a0}",
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &Node) -> &Element {
        match node {
            Node::Element(el) => el,
            Node::Text(text) => panic!("expected element, got text {:?}", text.content),
        }
    }

    #[test]
    fn parses_nested_elements() {
        let parsed = parse(r#"<div class="component"><span>{{ msg }}</span><br></div>"#).unwrap();

        assert_eq!(parsed.root.tag, "div");
        assert_eq!(parsed.root.attr("class").unwrap().value.as_deref(), Some("component"));
        assert_eq!(parsed.root.children.len(), 2);

        let span = element(&parsed.root.children[0]);
        assert_eq!(span.tag, "span");
        assert!(matches!(&span.children[0], Node::Text(t) if t.content == "{{ msg }}"));
        assert_eq!(element(&parsed.root.children[1]).tag, "br");
    }

    #[test]
    fn keeps_component_casing_and_directive_names() {
        let parsed =
            parse(r#"<div><MyItem :itemKey="k" @click.stop="go" v-if="a > b" disabled /></div>"#)
                .unwrap();

        let item = element(&parsed.root.children[0]);
        assert_eq!(item.tag, "MyItem");
        assert_eq!(item.attr(":itemKey").unwrap().value.as_deref(), Some("k"));
        assert_eq!(item.attr("@click.stop").unwrap().value.as_deref(), Some("go"));
        assert_eq!(item.attr("v-if").unwrap().value.as_deref(), Some("a > b"));
        assert_eq!(item.attr("disabled").unwrap().value, None);
    }

    #[test]
    fn treats_less_than_in_interpolation_as_text() {
        let parsed = parse("<p>{{ a < b }} &amp; more</p>").unwrap();

        assert!(matches!(
            &parsed.root.children[0],
            Node::Text(t) if t.content == "{{ a < b }} & more"
        ));
    }

    #[test]
    fn rejects_mismatched_tags() {
        let result = parse("<div class=\"component\">\n<span>oops\n</div>");

        match result {
            Err(SfcError::MarkupCompile { message, span }) => {
                assert_eq!(message, "tag <span> has no matching end tag.");
                assert_eq!(span, Some(Span { line: 2, column: 1 }));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rejects_unclosed_and_stray_tags() {
        assert!(matches!(parse("<div><p>"), Err(SfcError::MarkupCompile { .. })));
        assert!(matches!(parse("<div></div></p>"), Err(SfcError::MarkupCompile { .. })));
    }

    #[test]
    fn rejects_multiple_roots() {
        assert!(matches!(
            parse("<p>a</p><p>b</p>"),
            Err(SfcError::MissingRootElement(_))
        ));
        assert!(matches!(parse("  "), Err(SfcError::MissingRootElement(_))));
        assert!(matches!(
            parse("text<p>b</p>"),
            Err(SfcError::MissingRootElement(_))
        ));
    }

    #[test]
    fn rejects_duplicate_attributes() {
        assert!(matches!(
            parse(r#"<div id="a" id="b"></div>"#),
            Err(SfcError::MarkupCompile { .. })
        ));
    }

    #[test]
    fn skips_script_tags_with_tip() {
        let parsed = parse("<div><script>alert('x')</script><b>ok</b></div>").unwrap();

        assert_eq!(parsed.root.children.len(), 1);
        assert_eq!(parsed.tips.len(), 1);
        assert!(parsed.tips[0].message.contains("<script>"));
    }
}
