use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: u8,
    pub title: String,
    pub anchor: String,
}

/// Scans ATX headings outside fenced code blocks, injects an anchor element
/// right before each one and returns the rewritten body plus the heading
/// list for the table of contents.
pub fn inject_anchors(body: &str) -> (String, Vec<Heading>) {
    lazy_static! {
        static ref HEADING_REGEX: Regex = Regex::new(r"^(#{1,6})\s+(.*?)\s*#*\s*$").unwrap();
    }

    let mut out = String::new();
    let mut headings: Vec<Heading> = vec![];
    let mut seen: HashMap<String, u32> = HashMap::new();
    let mut in_fence = false;

    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        } else if !in_fence {
            if let Some(cap) = HEADING_REGEX.captures(line) {
                let title = cap[2].to_string();
                if !title.is_empty() {
                    let anchor = unique_anchor(&title, &mut seen);
                    out.push_str(&format!("<a id=\"{}\"></a>\n", anchor));
                    headings.push(Heading {
                        level: cap[1].len() as u8,
                        title,
                        anchor,
                    });
                }
            }
        }
        out.push_str(line);
        out.push('\n');
    }

    (out, headings)
}

fn unique_anchor(title: &str, seen: &mut HashMap<String, u32>) -> String {
    let mut base = slug::slugify(title);
    if base.is_empty() {
        base = "section".to_string();
    }
    let count = seen.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        base
    } else {
        format!("{}-{}", base, *count - 1)
    }
}

/// Builds the nested-list TOC fragment. No headings, no fragment.
pub fn toc_html(headings: &[Heading]) -> Option<String> {
    if headings.is_empty() {
        return None;
    }

    let mut html = String::from("<div class=\"toc\">");
    let mut stack: Vec<u8> = vec![];

    for h in headings {
        if stack.is_empty() {
            html.push_str("<ul>");
            stack.push(h.level);
        } else {
            let cur = *stack.last().unwrap();
            if h.level > cur {
                html.push_str("<ul>");
                stack.push(h.level);
            } else {
                html.push_str("</li>");
                while stack.len() > 1 && h.level < *stack.last().unwrap() {
                    stack.pop();
                    html.push_str("</ul></li>");
                }
            }
        }
        html.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            h.anchor,
            escape_text(&h.title)
        ));
    }

    html.push_str("</li>");
    while stack.len() > 1 {
        stack.pop();
        html.push_str("</ul></li>");
    }
    html.push_str("</ul></div>");

    Some(html)
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_headings_and_injects_anchors() {
        let body = "# Intro\ntext\n## Details\nmore\n";
        let (rewritten, headings) = inject_anchors(body);
        assert_eq!(
            headings,
            vec![
                Heading { level: 1, title: "Intro".to_string(), anchor: "intro".to_string() },
                Heading { level: 2, title: "Details".to_string(), anchor: "details".to_string() },
            ]
        );
        assert!(rewritten.contains("<a id=\"intro\"></a>\n# Intro"));
        assert!(rewritten.contains("<a id=\"details\"></a>\n## Details"));
    }

    #[test]
    fn test_skips_headings_inside_code_fences() {
        let body = "```\n# not a heading\n```\n# Real\n";
        let (_, headings) = inject_anchors(body);
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].title, "Real");
    }

    #[test]
    fn test_duplicate_titles_get_distinct_anchors() {
        let body = "# Setup\n## Setup\n";
        let (_, headings) = inject_anchors(body);
        assert_eq!(headings[0].anchor, "setup");
        assert_eq!(headings[1].anchor, "setup-1");
    }

    #[test]
    fn test_nested_toc_fragment() {
        let headings = vec![
            Heading { level: 1, title: "A".to_string(), anchor: "a".to_string() },
            Heading { level: 2, title: "B".to_string(), anchor: "b".to_string() },
            Heading { level: 2, title: "B2".to_string(), anchor: "b2".to_string() },
            Heading { level: 1, title: "C".to_string(), anchor: "c".to_string() },
        ];
        let html = toc_html(&headings).unwrap();
        assert_eq!(
            html,
            "<div class=\"toc\"><ul>\
             <li><a href=\"#a\">A</a><ul>\
             <li><a href=\"#b\">B</a></li>\
             <li><a href=\"#b2\">B2</a></li>\
             </ul></li>\
             <li><a href=\"#c\">C</a></li>\
             </ul></div>"
        );
    }

    #[test]
    fn test_no_headings_no_toc() {
        assert_eq!(toc_html(&[]), None);
    }

    #[test]
    fn test_title_is_escaped() {
        let headings = vec![Heading {
            level: 1,
            title: "Tips & <tricks>".to_string(),
            anchor: "tips-tricks".to_string(),
        }];
        let html = toc_html(&headings).unwrap();
        assert!(html.contains("Tips &amp; &lt;tricks&gt;"));
    }
}
