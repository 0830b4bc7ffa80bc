//! Cache Key Module
//!
//! Typed identity for cached thread-list pages: which list endpoint the page
//! came from, plus the query parameters it was fetched with.

use std::fmt;

use serde::{Deserialize, Serialize};

// == List Key ==
/// The list endpoint a cached page belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListKey {
    /// `/threads`
    Global,
    /// `/channels/{channel_id}/threads`
    Channel { channel_id: String },
}

impl ListKey {
    /// Creates a channel-scoped list key.
    pub fn channel(channel_id: impl Into<String>) -> Self {
        ListKey::Channel {
            channel_id: channel_id.into(),
        }
    }

    /// Returns the request path of this list endpoint.
    pub fn path(&self) -> String {
        match self {
            ListKey::Global => "/threads".to_string(),
            ListKey::Channel { channel_id } => format!("/channels/{}/threads", channel_id),
        }
    }

    /// Parses a request path into a list key.
    ///
    /// Accepts `/threads` and `/channels/{id}/threads` where `{id}` is a single
    /// non-empty segment. Any other path is not a thread list.
    pub fn parse(path: &str) -> Option<Self> {
        if path == "/threads" {
            return Some(ListKey::Global);
        }

        let rest = path.strip_prefix("/channels/")?;
        let channel_id = rest.strip_suffix("/threads")?;
        if channel_id.is_empty() || channel_id.contains('/') {
            return None;
        }

        Some(ListKey::channel(channel_id))
    }
}

// == List Params ==
/// Query parameters a thread-list page was requested with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number; absent means the first page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Category slug filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl ListParams {
    /// Creates params for a page with no category filter.
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            categories: None,
        }
    }

    /// Sets the category filter.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    /// Drops an explicit first page so `page=1` and no page name the same list.
    pub fn canonical(mut self) -> Self {
        if self.page == Some(1) {
            self.page = None;
        }
        self
    }

    /// Page number with the first page as default.
    pub fn page_or_default(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    /// Query pairs in the upstream encoding (`categories` repeated per value).
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(categories) = &self.categories {
            for category in categories {
                pairs.push(("categories", category.clone()));
            }
        }
        pairs
    }
}

// == Cache Key ==
/// Key of one cached thread-list page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub list: ListKey,
    #[serde(default)]
    pub params: ListParams,
}

impl CacheKey {
    pub fn new(list: ListKey, params: ListParams) -> Self {
        Self {
            list,
            params: params.canonical(),
        }
    }

    /// Key for a page of the global thread list.
    pub fn global(params: ListParams) -> Self {
        Self::new(ListKey::Global, params)
    }

    /// Key for a page of a channel's thread list.
    pub fn channel(channel_id: impl Into<String>, params: ListParams) -> Self {
        Self::new(ListKey::channel(channel_id), params)
    }

    /// Builds a key from a raw path, if the path is a thread list.
    pub fn parse(path: &str, params: ListParams) -> Option<Self> {
        ListKey::parse(path).map(|list| Self::new(list, params))
    }

    pub fn path(&self) -> String {
        self.list.path()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())?;
        let pairs = self.params.query_pairs();
        for (i, (name, value)) in pairs.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, name, value)?;
        }
        Ok(())
    }
}
