use std::borrow::Cow;
use std::cmp;

use markdown::{CompileOptions, Constructs, Options, ParseOptions};

use crate::content::front_matter;
use crate::content::highlight::CodeHighlighter;
use crate::content::toc;
use crate::content::{PostEntry, RenderMode};
use crate::error::BlogError;

/// Converts one Markdown source text into a structured entry: front-matter
/// fields, rendered HTML body and the optional table of contents.
pub struct EntryRenderer {
    highlighter: CodeHighlighter,
}

impl EntryRenderer {
    pub fn new() -> Self {
        Self {
            highlighter: CodeHighlighter::new(),
        }
    }

    pub fn render(&self, name: &str, raw_text: &str, mode: RenderMode) -> Result<PostEntry, BlogError> {
        let text: Cow<str> = match mode {
            RenderMode::Abstract => truncate_source(raw_text),
            RenderMode::FullContent => Cow::Borrowed(raw_text),
        };

        let (meta, body) = front_matter::split(&text);
        let (body, headings) = toc::inject_anchors(body);
        let body = self.highlighter.rewrite_code_blocks(&body);

        let content = match markdown::to_html_with_options(&body, &markdown_options()) {
            Ok(html) => html,
            Err(e) => {
                return Err(BlogError::Markdown {
                    name: name.to_string(),
                    reason: e.reason,
                })
            }
        };

        Ok(PostEntry {
            name: name.to_string(),
            content,
            date: meta.date.clone(),
            tags: meta.tag_list(),
            author: meta.author,
            category: meta.category,
            template: meta.template,
            kind: meta.kind,
            toc: toc::toc_html(&headings),
        })
    }
}

impl Default for EntryRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn markdown_options() -> Options {
    Options {
        parse: ParseOptions {
            constructs: Constructs {
                math_flow: true,
                math_text: true,
                frontmatter: true,
                ..Constructs::gfm()
            },
            ..ParseOptions::gfm()
        },
        // The highlight and TOC passes inject HTML before conversion
        compile: CompileOptions {
            allow_dangerous_html: true,
            ..CompileOptions::gfm()
        },
    }
}

pub fn abstract_cutoff(char_count: usize) -> usize {
    cmp::max(450, char_count / 10)
}

// Cuts the raw source, not the rendered HTML. The slice is by chars and
// ignores markup, so the result may stop mid-construct.
fn truncate_source(text: &str) -> Cow<str> {
    let cutoff = abstract_cutoff(text.chars().count());
    match text.char_indices().nth(cutoff) {
        Some((byte_pos, _)) => Cow::Owned(text[..byte_pos].to_string()),
        None => Cow::Borrowed(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::POST_DATA;

    #[test]
    fn test_abstract_cutoff_floor() {
        assert_eq!(abstract_cutoff(100), 450);
        assert_eq!(abstract_cutoff(4_500), 450);
        assert_eq!(abstract_cutoff(10_000), 1_000);
    }

    #[test]
    fn test_render_full_entry() {
        let renderer = EntryRenderer::new();
        let entry = renderer.render("getting-started", POST_DATA, RenderMode::FullContent).unwrap();

        assert_eq!(entry.name, "getting-started");
        assert_eq!(entry.date.as_deref(), Some("2024-05-01"));
        assert_eq!(entry.tags, ["rust", "web"]);
        assert_eq!(entry.author.as_deref(), Some("ines"));
        assert_eq!(entry.category.as_deref(), Some("tech"));
        assert_eq!(entry.kind, None);

        assert!(entry.content.contains("<a id=\"getting-started\"></a>"));
        assert!(entry.content.contains("codehilite"));
        assert!(entry.content.contains("language-math"));

        let toc = entry.toc.unwrap();
        assert!(toc.contains("href=\"#getting-started\""));
        assert!(toc.contains("href=\"#details\""));
    }

    #[test]
    fn test_missing_tags_key_yields_empty_list() {
        let renderer = EntryRenderer::new();
        let text = "---\ndate: 2024-01-01\n---\nBody only.\n";
        let entry = renderer.render("p", text, RenderMode::FullContent).unwrap();
        assert_eq!(entry.tags, Vec::<String>::new());
    }

    #[test]
    fn test_comma_separated_tags() {
        let renderer = EntryRenderer::new();
        let text = "---\ntags: a,b,c\n---\nBody.\n";
        let entry = renderer.render("p", text, RenderMode::FullContent).unwrap();
        assert_eq!(entry.tags, ["a", "b", "c"]);
    }

    #[test]
    fn test_abstract_truncates_before_conversion() {
        let renderer = EntryRenderer::new();
        let mut text = String::from("---\ndate: 2024-01-01\n---\n");
        for i in 0..400 {
            text.push_str(&format!("line number {} of the post body\n", i));
        }

        let full = renderer.render("p", &text, RenderMode::FullContent).unwrap();
        let short = renderer.render("p", &text, RenderMode::Abstract).unwrap();
        assert!(short.content.len() < full.content.len());
        assert!(short.content.contains("line number 0"));
        assert!(!short.content.contains("line number 399"));
    }

    #[test]
    fn test_short_text_not_truncated() {
        let renderer = EntryRenderer::new();
        let text = "short body";
        let full = renderer.render("p", text, RenderMode::FullContent).unwrap();
        let short = renderer.render("p", text, RenderMode::Abstract).unwrap();
        assert_eq!(full.content, short.content);
    }

    #[test]
    fn test_no_headings_no_toc() {
        let renderer = EntryRenderer::new();
        let entry = renderer.render("p", "plain paragraph", RenderMode::FullContent).unwrap();
        assert_eq!(entry.toc, None);
    }
}
