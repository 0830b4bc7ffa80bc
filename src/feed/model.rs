//! Thread feed data model as exchanged with the upstream API.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Identifier = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Identifier,
    pub handle: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Draft,
    Unlisted,
    Review,
    Published,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReference {
    pub id: Identifier,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub colour: String,
    #[serde(default)]
    pub sort: i32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl CategoryReference {
    /// A reference carrying only the id, used when no cached entry knows the
    /// category yet.
    pub fn placeholder(id: impl Into<Identifier>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: String::new(),
            slug: String::new(),
            description: String::new(),
            colour: String::new(),
            sort: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Likes {
    pub likes: u32,
    pub liked: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyStatus {
    pub replies: u32,
    pub replied: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStatus {
    pub has_collected: bool,
    pub in_collections: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkReference {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A thread as it appears in a list page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadReference {
    pub id: Identifier,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub body: String,
    pub author: Account,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryReference>,
    #[serde(default)]
    pub likes: Likes,
    #[serde(default)]
    pub reply_status: ReplyStatus,
    #[serde(default)]
    pub collections: CollectionStatus,
    #[serde(default)]
    pub pinned: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkReference>,
    #[serde(default)]
    pub channel_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// One page of a thread list.
///
/// Threads are shared so an optimistic rewrite can keep untouched entries
/// by identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadListResponse {
    pub threads: Vec<Arc<ThreadReference>>,
    pub current_page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub results: u32,
}

impl ThreadListResponse {
    pub fn thread_ids(&self) -> Vec<&str> {
        self.threads.iter().map(|t| t.id.as_str()).collect()
    }
}

/// Fields accepted when creating a thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadInitialProps {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Fields accepted when updating a thread. Absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadMutableProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

/// The user action a mutation carries out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationIntent {
    Create,
    Update { id: Identifier },
    Delete { id: Identifier },
    Like { id: Identifier },
    Unlike { id: Identifier },
}

impl fmt::Display for MutationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationIntent::Create => write!(f, "create"),
            MutationIntent::Update { id } => write!(f, "update {}", id),
            MutationIntent::Delete { id } => write!(f, "delete {}", id),
            MutationIntent::Like { id } => write!(f, "like {}", id),
            MutationIntent::Unlike { id } => write!(f, "unlike {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_list_deserialize_with_defaults() {
        let json = r#"{
            "threads": [{
                "id": "t1",
                "slug": "hello",
                "title": "Hello",
                "author": {"id": "a1", "handle": "ann"},
                "visibility": "published",
                "createdAt": "2024-01-01T00:00:00Z",
                "updatedAt": "2024-01-01T00:00:00Z"
            }],
            "current_page": 1,
            "total_pages": 1,
            "page_size": 50,
            "results": 1
        }"#;

        let page: ThreadListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(page.thread_ids(), vec!["t1"]);
        let thread = &page.threads[0];
        assert_eq!(thread.visibility, Visibility::Published);
        assert_eq!(thread.likes, Likes::default());
        assert!(thread.category.is_none());
    }

    #[test]
    fn test_mutable_props_skip_absent_fields() {
        let props = ThreadMutableProps {
            visibility: Some(Visibility::Published),
            ..Default::default()
        };
        let json = serde_json::to_string(&props).unwrap();
        assert_eq!(json, r#"{"visibility":"published"}"#);
    }

    #[test]
    fn test_intent_display() {
        assert_eq!(MutationIntent::Create.to_string(), "create");
        assert_eq!(
            MutationIntent::Like { id: "t1".into() }.to_string(),
            "like t1"
        );
    }
}
