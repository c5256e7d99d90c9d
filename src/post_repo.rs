use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use spdlog::debug;

use crate::content::entry_renderer::EntryRenderer;
use crate::content::front_matter::{self, FrontMatter};
use crate::content::{IndexAggregate, PostEntry, PostSummary, RenderMode, INDEX_PAGE_KIND};
use crate::error::BlogError;
use crate::paginator::Paginator;

/// Reserved file with site-wide metadata; never listed as a post.
pub const INFO_NAME: &str = "info";
const MD_EXT: &str = "md";

pub struct ListFilter {
    /// Posts must carry every requested tag.
    pub tags: Vec<String>,
    /// Post names skipped before rendering.
    pub exclusions: Vec<String>,
    /// Substring match against the rendered HTML.
    pub search: String,
    pub category: String,
    pub author: String,
}

impl Default for ListFilter {
    fn default() -> Self {
        ListFilter {
            tags: vec![],
            exclusions: vec!["404".to_string()],
            search: String::new(),
            category: String::new(),
            author: String::new(),
        }
    }
}

pub struct RecentPage {
    pub names: Vec<String>,
    pub page_count: u32,
}

/// Scans the post directory and answers filtered and paginated queries.
/// Holds no mutable state; every call re-reads the filesystem.
pub struct PostRepo {
    post_dir: PathBuf,
    page_size: u32,
    renderer: EntryRenderer,
}

impl PostRepo {
    pub fn new(post_dir: PathBuf, page_size: u32) -> Self {
        PostRepo {
            post_dir,
            page_size,
            renderer: EntryRenderer::new(),
        }
    }

    /// Renders `<post_dir>/<name>.md`. A missing file is the recoverable
    /// `PageNotExist`.
    pub fn render_post(&self, name: &str, mode: RenderMode) -> Result<PostEntry, BlogError> {
        let path = self.post_dir.join(format!("{}.{}", name, MD_EXT));
        if !path.exists() {
            return Err(BlogError::PageNotExist {
                name: name.to_string(),
            });
        }
        let raw = fs::read_to_string(&path)?;
        self.renderer.render(name, &raw, mode)
    }

    /// Renders every post except the exclusions, then filters conjunctively:
    /// tags, category, author, content search. Empty parameters are no-ops.
    /// Results come back sorted by name.
    pub fn list_posts(&self, filter: &ListFilter) -> Result<Vec<PostEntry>, BlogError> {
        let mut names = self.post_names()?;
        names.sort();

        let mut entries = vec![];
        for name in names {
            if filter.exclusions.contains(&name) {
                continue;
            }
            entries.push(self.render_post(&name, RenderMode::FullContent)?);
        }

        for tag in &filter.tags {
            entries.retain(|e| e.tags.iter().any(|t| t == tag));
        }
        if !filter.category.is_empty() {
            entries.retain(|e| e.category.as_deref() == Some(filter.category.as_str()));
        }
        if !filter.author.is_empty() {
            entries.retain(|e| e.author.as_deref() == Some(filter.author.as_str()));
        }
        if !filter.search.is_empty() {
            entries.retain(|e| e.content.contains(filter.search.as_str()));
        }

        debug!("list_posts returned {} entries", entries.len());
        Ok(entries)
    }

    /// Names of the posts on the requested 1-based page, most recently
    /// modified first, plus the total page count. A page past the end is an
    /// empty list.
    pub fn recent_posts(&self, page: u32) -> Result<RecentPage, BlogError> {
        let mut files: Vec<(String, SystemTime)> = vec![];
        for entry in fs::read_dir(&self.post_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(MD_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem == INFO_NAME {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            files.push((stem.to_string(), modified));
        }

        // Most recent first; same-mtime files order by name so repeated
        // scans agree.
        files.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));
        let names: Vec<String> = files.into_iter().map(|(name, _)| name).collect();

        let paginator = Paginator::from(&names, self.page_size);
        Ok(RecentPage {
            page_count: paginator.page_count(),
            names: paginator.page(page).to_vec(),
        })
    }

    /// Assembles the home page aggregate: the `info.md` intro rendered as an
    /// abstract, one summary per listed name, the known tag vocabulary and
    /// the page-number sequence.
    pub fn build_abstracts(&self, recent: &RecentPage, active_page: u32) -> Result<IndexAggregate, BlogError> {
        let intro = self.render_post(INFO_NAME, RenderMode::Abstract)?;

        let mut summaries = vec![];
        for name in &recent.names {
            let entry = self.render_post(name, RenderMode::Abstract)?;
            summaries.push(PostSummary {
                name: entry.name,
                content: entry.content,
                date: entry.date.unwrap_or_default(),
            });
        }

        let tags = match self.info_values("tags") {
            Ok(tags) => tags,
            Err(BlogError::MetaKeyMissing { .. }) => vec![],
            Err(e) => return Err(e),
        };

        Ok(IndexAggregate {
            intro,
            summaries,
            tags,
            active_page,
            page_count: recent.page_count,
            pages: (1..=recent.page_count).collect(),
            kind: INDEX_PAGE_KIND,
        })
    }

    /// Looks up one metadata key in `info.md` and splits its comma-separated
    /// value. An absent key is an explicit error, not an empty result.
    pub fn info_values(&self, key: &str) -> Result<Vec<String>, BlogError> {
        let file = format!("{}.{}", INFO_NAME, MD_EXT);
        let raw = fs::read_to_string(self.post_dir.join(&file))?;
        let (meta, _) = front_matter::split(&raw);

        match meta_value(&meta, key) {
            Some(value) => Ok(front_matter::split_values(value)),
            None => Err(BlogError::MetaKeyMissing {
                key: key.to_string(),
                file,
            }),
        }
    }

    fn post_names(&self) -> Result<Vec<String>, BlogError> {
        let mut names = vec![];
        for entry in fs::read_dir(&self.post_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(MD_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        Ok(names)
    }
}

fn meta_value<'a>(meta: &'a FrontMatter, key: &str) -> Option<&'a str> {
    match key {
        "date" => meta.date.as_deref(),
        "tags" => meta.tags.as_deref(),
        "template" => meta.template.as_deref(),
        "category" => meta.category.as_deref(),
        "author" => meta.author.as_deref(),
        "type" => meta.kind.as_deref(),
        _ => None,
    }
}

/// Link list for the tag/category/author/search pages. Pure entries-to-markup
/// glue.
pub fn render_post_list(entries: &[PostEntry]) -> String {
    if entries.is_empty() {
        return "<h1>        Oops! seems like you get a bug.</h1>".to_string();
    }

    let mut content = String::from("<h2>Search Result:</h2><ul>");
    for entry in entries {
        content.push_str(&format!(
            "<li><a href=\"/{}\">{}</a></li>",
            entry.name, entry.name
        ));
    }
    content.push_str("</ul>");
    content
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    fn write_post(dir: &std::path::Path, name: &str, text: &str) {
        fs::write(dir.join(format!("{}.md", name)), text).unwrap();
        // Keeps modification times strictly ordered across writes
        thread::sleep(Duration::from_millis(15));
    }

    fn seeded_repo(dir: &std::path::Path) -> PostRepo {
        write_post(dir, "info", "---\ntags: rust,web,life\n---\nWelcome to the blog.\n");
        write_post(dir, "alpha", "---\ndate: 2024-01-01\ntags: rust,web\nauthor: ines\ncategory: tech\n---\nAlpha body with needle.\n");
        write_post(dir, "bravo", "---\ndate: 2024-01-02\ntags: rust\nauthor: noel\ncategory: tech\n---\nBravo body.\n");
        write_post(dir, "charlie", "---\ndate: 2024-01-03\ntags: life\nauthor: ines\ncategory: misc\n---\nCharlie body.\n");
        write_post(dir, "404", "Not found page.\n");
        PostRepo::new(dir.to_path_buf(), 5)
    }

    #[test]
    fn test_names_derive_from_file_stems() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = seeded_repo(tmp.path());

        let entries = repo.list_posts(&ListFilter::default()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["alpha", "bravo", "charlie", "info"]);
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = seeded_repo(tmp.path());

        let filter = ListFilter {
            tags: vec!["rust".to_string()],
            category: "tech".to_string(),
            ..Default::default()
        };
        let entries = repo.list_posts(&filter).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["alpha", "bravo"]);

        let filter = ListFilter {
            tags: vec!["rust".to_string()],
            category: "misc".to_string(),
            ..Default::default()
        };
        assert!(repo.list_posts(&filter).unwrap().is_empty());
    }

    #[test]
    fn test_author_and_search_filters() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = seeded_repo(tmp.path());

        let filter = ListFilter {
            author: "ines".to_string(),
            search: "needle".to_string(),
            ..Default::default()
        };
        let entries = repo.list_posts(&filter).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "alpha");
    }

    #[test]
    fn test_recent_pagination() {
        let tmp = tempfile::tempdir().unwrap();
        write_post(tmp.path(), "info", "---\ntags: t\n---\nIntro.\n");
        for i in 0..12 {
            write_post(tmp.path(), &format!("post{:02}", i), "Body.\n");
        }
        let repo = PostRepo::new(tmp.path().to_path_buf(), 5);

        let page1 = repo.recent_posts(1).unwrap();
        assert_eq!(page1.page_count, 3);
        assert_eq!(
            page1.names,
            ["post11", "post10", "post09", "post08", "post07"]
        );

        let page3 = repo.recent_posts(3).unwrap();
        assert_eq!(page3.names, ["post01", "post00"]);

        let page4 = repo.recent_posts(4).unwrap();
        assert!(page4.names.is_empty());
        assert_eq!(page4.page_count, 3);
    }

    #[test]
    fn test_missing_post_is_page_not_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = PostRepo::new(tmp.path().to_path_buf(), 5);
        let err = repo.render_post("nope", RenderMode::FullContent).unwrap_err();
        assert!(matches!(err, BlogError::PageNotExist { ref name } if name == "nope"));
    }

    #[test]
    fn test_build_abstracts() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = seeded_repo(tmp.path());

        let recent = repo.recent_posts(1).unwrap();
        let aggregate = repo.build_abstracts(&recent, 1).unwrap();

        assert_eq!(aggregate.kind, "index");
        assert_eq!(aggregate.active_page, 1);
        assert_eq!(aggregate.page_count, 1);
        assert_eq!(aggregate.pages, [1]);
        assert_eq!(aggregate.tags, ["rust", "web", "life"]);
        assert!(aggregate.intro.content.contains("Welcome"));

        // Parallel sequences, most recent first; 404.md was written last
        let names: Vec<&str> = aggregate.summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["404", "charlie", "bravo", "alpha"]);
        assert_eq!(aggregate.summaries[1].date, "2024-01-03");
        assert!(aggregate.summaries[1].content.contains("Charlie"));
    }

    #[test]
    fn test_info_values() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = seeded_repo(tmp.path());

        assert_eq!(repo.info_values("tags").unwrap(), ["rust", "web", "life"]);
        let err = repo.info_values("author").unwrap_err();
        assert!(matches!(err, BlogError::MetaKeyMissing { ref key, .. } if key == "author"));
    }

    #[test]
    fn test_render_post_list_empty() {
        assert_eq!(
            render_post_list(&[]),
            "<h1>        Oops! seems like you get a bug.</h1>"
        );
    }

    #[test]
    fn test_render_post_list_links() {
        let entry = PostEntry {
            name: "p1".to_string(),
            content: String::new(),
            date: None,
            tags: vec![],
            author: None,
            category: None,
            template: None,
            kind: None,
            toc: None,
        };
        let html = render_post_list(&[entry]);
        assert_eq!(
            html,
            "<h2>Search Result:</h2><ul><li><a href=\"/p1\">p1</a></li></ul>"
        );
    }
}
