use serde::Deserialize;
use spdlog::warn;

/// Front-matter keys recognized at the top of a post. All values are plain
/// strings; `tags` is a comma-separated list.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct FrontMatter {
    pub date: Option<String>,
    pub tags: Option<String>,
    pub template: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl FrontMatter {
    /// Splits the value of the `tags` key. An absent or empty key yields an
    /// empty list, never an error. A non-empty value is split on `,`
    /// verbatim.
    pub fn tag_list(&self) -> Vec<String> {
        split_values(self.tags.as_deref().unwrap_or(""))
    }
}

pub fn split_values(buf: &str) -> Vec<String> {
    if buf.is_empty() {
        return vec![];
    }
    buf.split(',').map(|s| s.to_string()).collect()
}

/// Splits a leading `---` ... `---` YAML block from the body. Text without a
/// complete block, or with a block that does not deserialize, is treated as
/// all body.
pub fn split(text: &str) -> (FrontMatter, &str) {
    let trimmed = text.trim_start_matches(['\n', '\r']);
    let Some(rest) = trimmed.strip_prefix("---") else {
        return (FrontMatter::default(), text);
    };
    let rest = rest.trim_start_matches(['\n', '\r']);

    let Some(end) = rest.find("\n---") else {
        return (FrontMatter::default(), text);
    };

    let yaml_block = &rest[..end];
    let body = rest[end + 4..].trim_start_matches(['\n', '\r']);

    match serde_yaml::from_str::<FrontMatter>(yaml_block) {
        Ok(meta) => (meta, body),
        Err(e) => {
            warn!("Ignoring malformed front-matter block: {}", e);
            (FrontMatter::default(), text)
        }
    }
}
