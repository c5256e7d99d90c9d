use std::collections::HashMap;

use crate::error::BlogError;

#[derive(PartialEq, Debug)]
pub struct QueryString {
    items: HashMap<String, String>,
}

impl QueryString {
    pub fn from(buf: &str) -> Self {
        let vs: Vec<(String, String)> = serde_urlencoded::from_str(buf).unwrap_or_else(|_| vec![]);
        let items: HashMap<String, String> = vs.into_iter().collect();

        QueryString { items }
    }

    /// Strictly parsed `page` parameter: absent means page 1, anything that
    /// is not a positive integer is rejected. User input is never evaluated,
    /// only parsed.
    pub fn page(&self) -> Result<u32, BlogError> {
        let Some(val) = self.items.get("page") else {
            return Ok(1);
        };
        match val.parse::<u32>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(BlogError::InvalidPageParam { value: val.clone() }),
        }
    }
}
