use std::iter::Peekable;
use std::str::Lines;

use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

const THEME_NAME: &str = "InspiredGitHub";

struct FencedBlock {
    lang: Option<String>,
    code: String,
}

pub struct CodeHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl CodeHighlighter {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    /// Replaces fenced code blocks with highlighted HTML. Two or more
    /// consecutive blocks (blank lines only between them) become one tab
    /// strip; a single block stays a plain highlighted block.
    pub fn rewrite_code_blocks(&self, body: &str) -> String {
        let mut out = String::new();
        let mut lines = body.lines().peekable();
        let mut group_idx = 0usize;

        while let Some(line) = lines.next() {
            let Some(lang) = fence_open(line) else {
                out.push_str(line);
                out.push('\n');
                continue;
            };

            let mut blocks = vec![read_block(lang, &mut lines)];
            let pending_blanks = loop {
                let mut blanks = 0;
                while matches!(lines.peek(), Some(l) if l.trim().is_empty()) {
                    lines.next();
                    blanks += 1;
                }
                match lines.peek().copied().and_then(fence_open) {
                    Some(next_lang) => {
                        lines.next();
                        blocks.push(read_block(next_lang, &mut lines));
                    }
                    None => break blanks,
                }
            };

            out.push_str(&self.render_group(&blocks, group_idx));
            out.push('\n');
            for _ in 0..pending_blanks {
                out.push('\n');
            }
            group_idx += 1;
        }

        out
    }

    fn render_group(&self, blocks: &[FencedBlock], group_idx: usize) -> String {
        if blocks.len() == 1 {
            let block = &blocks[0];
            let html = self.highlight(&block.code, block.lang.as_deref());
            return format!("<div class=\"codehilite\">{}</div>", pad_blank_lines(&html));
        }

        let mut nav = String::from("<ul class=\"nav nav-tabs\">");
        let mut panes = String::from("<div class=\"tab-content\">");
        for (i, block) in blocks.iter().enumerate() {
            let label = block.lang.as_deref().unwrap_or("code");
            let pane_id = format!("code-tab-{}-{}", group_idx, i);
            let active = if i == 0 { " active" } else { "" };
            nav.push_str(&format!(
                "<li class=\"tab{}\"><a href=\"#{}\">{}</a></li>",
                active, pane_id, label
            ));
            let html = self.highlight(&block.code, block.lang.as_deref());
            panes.push_str(&format!(
                "<div class=\"tab-pane{}\" id=\"{}\">{}</div>",
                active,
                pane_id,
                pad_blank_lines(&html)
            ));
        }
        nav.push_str("</ul>");
        panes.push_str("</div>");

        format!("<div class=\"code-tabs\">{}{}</div>", nav, panes)
    }

    fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(THEME_NAME)
            .unwrap_or_else(|| self.theme_set.themes.values().next().expect("no themes available"));

        match highlighted_html_for_string(code, &self.syntax_set, syntax, theme) {
            Ok(html) => html,
            Err(_) => format!(
                "<pre><code class=\"language-{}\">{}</code></pre>\n",
                lang,
                escape_code(code)
            ),
        }
    }
}

fn fence_open(line: &str) -> Option<String> {
    line.trim_start()
        .strip_prefix("```")
        .map(|rest| rest.trim().to_string())
}

fn read_block(lang: String, lines: &mut Peekable<Lines>) -> FencedBlock {
    let mut code = String::new();
    for line in lines.by_ref() {
        if line.trim_start().starts_with("```") {
            break;
        }
        code.push_str(line);
        code.push('\n');
    }
    let lang = if lang.is_empty() { None } else { Some(lang) };
    FencedBlock { lang, code }
}

// The generated fragment must stay one HTML block through the Markdown
// conversion, so a blank line inside <pre> gets an empty placeholder span.
fn pad_blank_lines(html: &str) -> String {
    let mut out: Vec<&str> = vec![];
    for line in html.lines() {
        if line.trim().is_empty() {
            out.push("<span></span>");
        } else {
            out.push(line);
        }
    }
    out.join("\n")
}

fn escape_code(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
