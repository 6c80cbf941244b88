//! Snippet discovery.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::codeblock::Snippet;

pub(crate) fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Find every code block that defines components to mount, in document order.
pub fn find_snippets(markdown: &str) -> Vec<Snippet> {
    let mut snippets = Vec::new();
    let mut current: Option<(String, usize, String)> = None; // (info, line, source)

    for (event, range) in Parser::new_ext(markdown, markdown_options()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                current = Some((info.to_string(), line_of(markdown, range.start), String::new()));
            }

            Event::Text(text) => {
                if let Some((_, _, source)) = &mut current {
                    source.push_str(&text);
                }
            }

            Event::End(TagEnd::CodeBlock) => {
                if let Some((info, line, source)) = current.take() {
                    let snippet = Snippet::new(&info, source, line);
                    if snippet.is_demo() {
                        snippets.push(snippet);
                    }
                }
            }

            _ => {}
        }
    }

    snippets
}

/// Line (1-indexed) of a byte offset.
pub(crate) fn line_of(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())].matches('\n').count() + 1
}

/// Convert a heading to a URL-safe slug.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_component_snippets() {
        let markdown = r#"# Buttons

Some prose.

```vue
<template>
  <button>{{ label }}</button>
</template>
<script>
export default { data() { return { label: 'Go' } } }
</script>
```

```js
const notADemo = true;
```

```vue no-demo
<template><p>source only</p></template>
```
"#;

        let snippets = find_snippets(markdown);

        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].line_number, 5);
        assert!(snippets[0].source.starts_with("<template>\n  <button>"));
        assert!(snippets[0].source.ends_with("</script>\n"));
    }

    #[test]
    fn ignores_indented_code() {
        let markdown = "Text\n\n    <template><p>x</p></template>\n";

        assert!(find_snippets(markdown).is_empty());
    }

    #[test]
    fn finds_snippets_inside_lists() {
        let markdown = "- item\n\n  ```html\n  <template><p>x</p></template>\n  ```\n";

        let snippets = find_snippets(markdown);

        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].line_number, 3);
    }

    #[test]
    fn slugifies_headings() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Naming: the `name` option"), "naming-the-name-option");
        assert_eq!(slugify("  --Spaces--  "), "spaces");
        assert_eq!(slugify("组件 规范"), "组件-规范");
    }
}
