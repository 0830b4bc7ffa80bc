//! Request DTOs for the feed service API
//!
//! Defines the structure of incoming query strings and request bodies.

use serde::Deserialize;

use crate::cache::ListParams;
use crate::feed::{Account, LinkReference, ThreadInitialProps, ThreadMutableProps};

/// Maximum accepted title length in characters
pub const MAX_TITLE_LENGTH: usize = 256;

/// Highest page number a list request may ask for
pub const MAX_PAGE: u32 = 100_000;

/// Query string of list endpoints and of the view a mutation runs in.
///
/// `categories` is a comma separated list of category slugs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub categories: Option<String>,
}

impl ListQuery {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match self.page {
            Some(0) => Some("Page numbers start at 1".to_string()),
            Some(page) if page > MAX_PAGE => {
                Some(format!("Page exceeds maximum of {}", MAX_PAGE))
            }
            _ => None,
        }
    }

    /// Parameters named by the query, or None when it names none.
    pub fn params(&self) -> Option<ListParams> {
        let categories = self.categories.as_deref().map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

        if self.page.is_none() && categories.is_none() {
            return None;
        }

        Some(ListParams {
            page: self.page,
            categories,
        })
    }
}

/// Request body for POST /threads
#[derive(Debug, Clone, Deserialize)]
pub struct CreateThreadRequest {
    #[serde(flatten)]
    pub thread: ThreadInitialProps,
    /// Channel to create the thread in
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Session account; without it no optimistic entry is written
    #[serde(default)]
    pub author: Option<Account>,
    /// List view the request was issued from
    #[serde(default)]
    pub scope: Option<ListParams>,
    /// Pre-hydrated link preview for the optimistic entry
    #[serde(default)]
    pub link: Option<LinkReference>,
}

impl CreateThreadRequest {
    pub fn validate(&self) -> Option<String> {
        validate_title(Some(&self.thread.title))
    }
}

/// Request body for PATCH /threads/:id
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateThreadRequest {
    #[serde(flatten)]
    pub props: ThreadMutableProps,
    #[serde(default)]
    pub scope: Option<ListParams>,
}

impl UpdateThreadRequest {
    pub fn validate(&self) -> Option<String> {
        validate_title(self.props.title.as_deref())
    }
}

/// Query string of POST /threads/:id/accept
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AcceptQuery {
    #[serde(default)]
    pub author_id: Option<String>,
}

fn validate_title(title: Option<&str>) -> Option<String> {
    match title {
        Some(title) if title.trim().is_empty() => Some("Title cannot be empty".to_string()),
        Some(title) if title.chars().count() > MAX_TITLE_LENGTH => Some(format!(
            "Title exceeds maximum length of {} characters",
            MAX_TITLE_LENGTH
        )),
        _ => None,
    }
}
