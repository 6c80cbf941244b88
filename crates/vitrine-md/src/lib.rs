//! Markdown integration for embedded component demos.
//!
//! Finds component snippets in fenced code blocks and renders markdown pages
//! with each snippet's demo script placed right after its code block.

pub mod codeblock;
pub mod parser;
pub mod render;

pub use codeblock::{BlockMode, Language, Snippet};
pub use parser::{find_snippets, slugify};
pub use render::{render_page, PageRenderer, RenderedPage, RenderedSnippet};
