//! Page rendering.

use std::collections::HashMap;

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Parser, Tag, TagEnd};
use vitrine_sfc::{BuildPass, SnippetOutput};

use crate::codeblock::Snippet;
use crate::parser::{line_of, markdown_options, slugify};

/// A snippet compiled while rendering a page.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSnippet {
    /// Line of the snippet's opening fence
    pub line_number: usize,
    pub output: SnippetOutput,
}

/// A markdown page rendered to an HTML fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub html: String,
    pub snippets: Vec<RenderedSnippet>,
}

impl RenderedPage {
    /// Number of components mounted or registered on the page.
    pub fn components(&self) -> usize {
        self.snippets.iter().map(|s| s.output.components).sum()
    }
}

/// Renders markdown pages.
///
/// `::: DEMO` ... `:::` paragraphs become `<div class="demo demo-N">`
/// containers, numbered across every page rendered by the same renderer.
#[derive(Debug, Default)]
pub struct PageRenderer {
    containers: usize,
}

impl PageRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a page, compiling its snippets in document order.
    pub fn render(&mut self, markdown: &str, pass: &mut BuildPass) -> RenderedPage {
        let mut events: Vec<Event<'_>> = Vec::new();
        let mut snippets = Vec::new();
        let mut slugs: HashMap<String, usize> = HashMap::new();
        let mut open_containers = 0;

        let mut iter = Parser::new_ext(markdown, markdown_options()).into_offset_iter();

        while let Some((event, range)) = iter.next() {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let info = match &kind {
                        CodeBlockKind::Fenced(info) => info.to_string(),
                        CodeBlockKind::Indented => String::new(),
                    };
                    let mut source = String::new();
                    for (event, _) in iter.by_ref() {
                        match event {
                            Event::Text(text) => source.push_str(&text),
                            Event::End(TagEnd::CodeBlock) => break,
                            _ => {}
                        }
                    }

                    let snippet = Snippet::new(&info, source, line_of(markdown, range.start));
                    let mut block = code_block_html(&snippet);

                    if snippet.is_demo() {
                        let output = pass.compile_embedded_components(&snippet.source);
                        if !output.is_empty() {
                            block.push_str(&output.script_markup);
                            block.push('\n');
                        }
                        snippets.push(RenderedSnippet {
                            line_number: snippet.line_number,
                            output,
                        });
                    }

                    events.push(Event::Html(block.into()));
                }

                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    let mut inner = Vec::new();
                    let mut title = String::new();
                    for (event, _) in iter.by_ref() {
                        match &event {
                            Event::End(TagEnd::Heading(_)) => break,
                            Event::Text(text) | Event::Code(text) => title.push_str(text),
                            _ => {}
                        }
                        inner.push(event);
                    }

                    let id = id.unwrap_or_else(|| CowStr::from(unique_slug(&title, &mut slugs)));
                    events.push(Event::Start(Tag::Heading {
                        level,
                        id: Some(id),
                        classes,
                        attrs,
                    }));
                    events.extend(inner);
                    events.push(Event::End(TagEnd::Heading(level)));
                }

                Event::Start(Tag::Paragraph) => {
                    let mut inner = Vec::new();
                    for (event, _) in iter.by_ref() {
                        if matches!(event, Event::End(TagEnd::Paragraph)) {
                            break;
                        }
                        inner.push(event);
                    }

                    match container_marker(&inner) {
                        Some(Marker::Open) => {
                            self.containers += 1;
                            open_containers += 1;
                            events.push(Event::Html(
                                format!("<div class=\"demo demo-{}\">\n", self.containers).into(),
                            ));
                        }
                        Some(Marker::Close) if open_containers > 0 => {
                            open_containers -= 1;
                            events.push(Event::Html("</div>\n".into()));
                        }
                        _ => {
                            events.push(Event::Start(Tag::Paragraph));
                            events.extend(inner);
                            events.push(Event::End(TagEnd::Paragraph));
                        }
                    }
                }

                event => events.push(event),
            }
        }

        for _ in 0..open_containers {
            events.push(Event::Html("</div>\n".into()));
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        tracing::debug!(
            snippets = snippets.len(),
            "Rendered page ({} bytes)",
            html_output.len()
        );

        RenderedPage {
            html: html_output,
            snippets,
        }
    }
}

/// Render one page with a fresh renderer.
pub fn render_page(markdown: &str, pass: &mut BuildPass) -> RenderedPage {
    PageRenderer::new().render(markdown, pass)
}

enum Marker {
    Open,
    Close,
}

/// Whether a paragraph consists of nothing but a container marker.
fn container_marker(inner: &[Event<'_>]) -> Option<Marker> {
    let mut text = String::new();
    for event in inner {
        match event {
            Event::Text(t) => text.push_str(t),
            _ => return None,
        }
    }

    let text = text.trim();
    if text == ":::" {
        return Some(Marker::Close);
    }
    let name = text.strip_prefix(":::")?.trim();
    (name == "DEMO").then_some(Marker::Open)
}

fn unique_slug(title: &str, seen: &mut HashMap<String, usize>) -> String {
    let base = slugify(title);
    let count = seen.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        base
    } else {
        format!("{}-{}", base, *count - 1)
    }
}

fn code_block_html(snippet: &Snippet) -> String {
    let class = snippet
        .lang_tag
        .as_deref()
        .map(|lang| format!(" class=\"language-{}\"", escape_html(lang)))
        .unwrap_or_default();
    format!(
        "<pre class=\"hljs\"><code{}>{}</code></pre>\n",
        class,
        escape_html(&snippet.source)
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vitrine_sfc::PipelineConfig;

    fn pass() -> BuildPass {
        BuildPass::new(PipelineConfig::default())
    }

    const PAGE: &str = r#"# Greeting

```vue
<template>
  <span>{{ msg }}</span>
</template>
<script>
export default { data() { return { msg: 'hi' } } }
</script>
<style>
.greeting { color: red; }
</style>
```
"#;

    #[test]
    fn places_script_after_code_block() {
        let mut pass = pass();

        let page = render_page(PAGE, &mut pass);

        let pre = page.html.find("<pre class=\"hljs\"><code class=\"language-vue\">").unwrap();
        let end = page.html.find("</code></pre>").unwrap();
        let script = page.html.find("<script>").unwrap();
        assert!(pre < end && end < script);
        assert!(page.html.contains("&lt;span&gt;{{ msg }}&lt;/span&gt;"));
        assert_eq!(page.snippets.len(), 1);
        assert_eq!(page.snippets[0].line_number, 3);
        assert_eq!(page.components(), 1);
        assert_eq!(pass.concatenated_styles(), ".greeting { color: red; }");
    }

    #[test]
    fn gives_headings_unique_ids() {
        let page = render_page("# Intro\n\n## Usage\n\n## Usage\n", &mut pass());

        assert!(page.html.contains("<h1 id=\"intro\">Intro</h1>"));
        assert!(page.html.contains("<h2 id=\"usage\">Usage</h2>"));
        assert!(page.html.contains("<h2 id=\"usage-1\">Usage</h2>"));
    }

    #[test]
    fn renders_source_only_blocks_without_script() {
        let mut pass = pass();
        let markdown = "```vue no-demo\n<template><p>x</p></template>\n```\n\n```\nplain\n```\n";

        let page = render_page(markdown, &mut pass);

        assert!(!page.html.contains("<script>"));
        assert!(page.html.contains("<pre class=\"hljs\"><code>plain\n</code></pre>"));
        assert!(page.snippets.is_empty());
        assert_eq!(pass.components_compiled(), 0);
    }

    #[test]
    fn failed_snippet_keeps_the_page() {
        let markdown = "```vue\n<template><p>x</p></template>\n<script>export default {}</script>\n<script>export default {}</script>\n```\n\nAfter.\n";

        let page = render_page(markdown, &mut pass());

        assert!(page.html.contains("<p>After.</p>"));
        assert!(!page.html.contains("<script>"));
        assert!(page.snippets[0].output.has_error());
    }

    #[test]
    fn wraps_demo_containers() {
        let markdown = "::: DEMO\n```vue\n<template><p>{{ a }}</p></template>\n```\n:::\n\n::: DEMO\n\ntext\n\n:::\n";
        let mut renderer = PageRenderer::new();

        let first = renderer.render(markdown, &mut pass());
        let second = renderer.render("::: DEMO\n\n:::\n", &mut pass());

        assert!(first.html.starts_with("<div class=\"demo demo-1\">\n<pre"));
        assert!(first.html.contains("<div class=\"demo demo-2\">\n<p>"));
        assert_eq!(first.html.matches("</div>").count(), 2);
        assert!(second.html.contains("demo-3"));
    }

    #[test]
    fn closes_unterminated_containers() {
        let page = render_page("::: DEMO\n\nbody\n", &mut pass());

        assert_eq!(page.html, "<div class=\"demo demo-1\">\n<p>body</p>\n</div>\n");
    }

    #[test]
    fn stray_close_marker_stays_text() {
        let page = render_page(":::\n", &mut pass());

        assert_eq!(page.html, "<p>:::</p>\n");
    }
}
