use std::io;
use std::io::ErrorKind;

use ramhorns::Template;

use crate::content::IndexAggregate;

#[derive(ramhorns::Content)]
struct HomePage<'a> {
    title: &'a str,
    kind: &'a str,
    intro: &'a str,
    summaries: Vec<SummaryItem<'a>>,
    tags: Vec<ViewTag<'a>>,
    page_list: Vec<PageLink>,
    active_page: u32,
    page_count: u32,
    show_pagination: bool,
}

#[derive(ramhorns::Content)]
struct SummaryItem<'a> {
    name: &'a str,
    link: String,
    date: &'a str,
    summary: &'a str,
}

#[derive(ramhorns::Content)]
struct ViewTag<'a> {
    tag: &'a str,
}

#[derive(ramhorns::Content)]
struct PageLink {
    number: u32,
    current: bool,
}

pub struct HomePageRenderer<'a> {
    pub template: Template<'a>,
}

impl HomePageRenderer<'_> {
    pub fn new(tpl_src: &str) -> io::Result<HomePageRenderer> {
        let template = match Template::new(tpl_src) {
            Ok(x) => x,
            Err(e) => {
                return Err(io::Error::new(
                    ErrorKind::InvalidInput,
                    format!("Error parsing home template: {}", e),
                ));
            }
        };

        Ok(HomePageRenderer { template })
    }

    pub fn render(&self, site_title: &str, aggregate: &IndexAggregate) -> String {
        let summaries: Vec<SummaryItem> = aggregate
            .summaries
            .iter()
            .map(|s| SummaryItem {
                name: s.name.as_str(),
                link: format!("/{}", s.name),
                date: s.date.as_str(),
                summary: s.content.as_str(),
            })
            .collect();

        let tags: Vec<ViewTag> = aggregate.tags.iter().map(|t| ViewTag { tag: t.as_str() }).collect();

        let page_list: Vec<PageLink> = aggregate
            .pages
            .iter()
            .map(|p| PageLink {
                number: *p,
                current: *p == aggregate.active_page,
            })
            .collect();

        self.template.render(&HomePage {
            title: site_title,
            kind: aggregate.kind,
            intro: aggregate.intro.content.as_str(),
            summaries,
            tags,
            page_list,
            active_page: aggregate.active_page,
            page_count: aggregate.page_count,
            show_pagination: aggregate.page_count > 1,
        })
    }
}
