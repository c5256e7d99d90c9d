use std::io;
use std::io::ErrorKind;

use ramhorns::Template;

use crate::content::PostEntry;

#[derive(ramhorns::Content)]
struct ViewTag<'a> {
    tag: &'a str,
}

#[derive(ramhorns::Content)]
struct PostPage<'a> {
    title: &'a str,
    name: &'a str,
    content: &'a str,
    date: &'a str,
    tags: Vec<ViewTag<'a>>,
    author: &'a str,
    category: &'a str,
    toc: &'a str,
}

#[derive(ramhorns::Content)]
struct FragmentPage<'a> {
    title: &'a str,
    content: &'a str,
}

/// Renders the single-post layout. The same layout also carries the
/// tag/category/author/search pages, which only fill the content slot.
pub struct PostPageRenderer<'a> {
    pub template: Template<'a>,
}

impl PostPageRenderer<'_> {
    pub fn new(tpl_src: &str) -> io::Result<PostPageRenderer> {
        let template = match Template::new(tpl_src) {
            Ok(x) => x,
            Err(e) => {
                return Err(io::Error::new(
                    ErrorKind::InvalidInput,
                    format!("Error parsing post template: {}", e),
                ));
            }
        };

        Ok(PostPageRenderer { template })
    }

    pub fn render(&self, site_title: &str, entry: &PostEntry) -> String {
        let tags: Vec<ViewTag> = entry.tags.iter().map(|t| ViewTag { tag: t.as_str() }).collect();
        self.template.render(&PostPage {
            title: site_title,
            name: entry.name.as_str(),
            content: entry.content.as_str(),
            date: entry.date.as_deref().unwrap_or(""),
            tags,
            author: entry.author.as_deref().unwrap_or(""),
            category: entry.category.as_deref().unwrap_or(""),
            toc: entry.toc.as_deref().unwrap_or(""),
        })
    }

    pub fn render_fragment(&self, site_title: &str, fragment: &str) -> String {
        self.template.render(&FragmentPage {
            title: site_title,
            content: fragment,
        })
    }
}
