//! Process-local upstream used when no API URL is configured.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use slug::slugify;
use tokio::sync::RwLock;

use crate::cache::{CacheKey, ListKey};
use crate::error::{FeedError, Result};
use crate::feed::optimistic::html_to_text;
use crate::feed::{
    Account, CategoryReference, CollectionStatus, Likes, ReplyStatus, ThreadInitialProps,
    ThreadListResponse, ThreadMutableProps, ThreadReference, Visibility,
};
use crate::upstream::ThreadApi;

pub const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Default)]
struct Inner {
    /// Newest first
    threads: Vec<ThreadReference>,
    categories: HashMap<String, CategoryReference>,
}

/// Thread API backed by memory. Every call acts on behalf of one account.
#[derive(Debug)]
pub struct InMemoryThreadApi {
    inner: RwLock<Inner>,
    account: Account,
    page_size: u32,
    seq: AtomicU64,
}

impl InMemoryThreadApi {
    pub fn new(account: Account) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            account,
            page_size: DEFAULT_PAGE_SIZE,
            seq: AtomicU64::new(1),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Registers a category so created threads get its full reference.
    pub async fn add_category(&self, category: CategoryReference) {
        let mut inner = self.inner.write().await;
        inner.categories.insert(category.id.clone(), category);
    }

    /// Inserts a thread as the newest one.
    pub async fn insert(&self, thread: ThreadReference) {
        self.inner.write().await.threads.insert(0, thread);
    }

    pub async fn thread_ids(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        inner.threads.iter().map(|t| t.id.clone()).collect()
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn category(inner: &Inner, id: &str) -> CategoryReference {
        inner
            .categories
            .get(id)
            .cloned()
            .unwrap_or_else(|| CategoryReference {
                slug: id.to_string(),
                ..CategoryReference::placeholder(id)
            })
    }

    async fn create(
        &self,
        channel_id: Option<&str>,
        initial: &ThreadInitialProps,
    ) -> Result<ThreadReference> {
        if initial.title.trim().is_empty() {
            return Err(FeedError::Upstream {
                status: 400,
                message: "title is required".to_string(),
            });
        }

        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        let id = format!("th_{}", n);
        let now = Utc::now();
        let body = initial.body.clone().unwrap_or_default();

        let mut inner = self.inner.write().await;
        let thread = ThreadReference {
            slug: format!("{}-{}", slugify(&initial.title), n),
            id,
            title: initial.title.clone(),
            description: html_to_text(&body),
            body,
            author: self.account.clone(),
            category: initial
                .category
                .as_deref()
                .map(|category_id| Self::category(&inner, category_id)),
            likes: Likes::default(),
            reply_status: ReplyStatus::default(),
            collections: CollectionStatus::default(),
            pinned: initial.pinned.unwrap_or(0),
            tags: initial.tags.clone().unwrap_or_default(),
            visibility: initial.visibility.unwrap_or(Visibility::Published),
            link: None,
            channel_id: channel_id.unwrap_or_default().to_string(),
            created_at: now,
            updated_at: now,
        };
        inner.threads.insert(0, thread.clone());

        Ok(thread)
    }

    async fn with_thread<F>(&self, id: &str, f: F) -> Result<ThreadReference>
    where
        F: FnOnce(&mut ThreadReference, &HashMap<String, CategoryReference>),
    {
        let mut inner = self.inner.write().await;
        let Inner {
            threads,
            categories,
        } = &mut *inner;
        let thread = threads
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| FeedError::NotFound(id.to_string()))?;
        f(thread, categories);
        Ok(thread.clone())
    }
}

#[async_trait]
impl ThreadApi for InMemoryThreadApi {
    async fn list_threads(&self, key: &CacheKey) -> Result<ThreadListResponse> {
        let inner = self.inner.read().await;
        let matching: Vec<&ThreadReference> = inner
            .threads
            .iter()
            .filter(|t| match &key.list {
                ListKey::Global => true,
                ListKey::Channel { channel_id } => &t.channel_id == channel_id,
            })
            .filter(|t| match &key.params.categories {
                Some(wanted) => t
                    .category
                    .as_ref()
                    .map(|c| wanted.iter().any(|w| w == &c.slug || w == &c.id))
                    .unwrap_or(false),
                None => true,
            })
            .collect();

        let results = matching.len() as u32;
        let total_pages = results.div_ceil(self.page_size).max(1);
        let current_page = key.params.page_or_default();
        let pages_before = (current_page as usize).saturating_sub(1);
        let threads = match pages_before.checked_mul(self.page_size as usize) {
            Some(skip) => matching
                .into_iter()
                .skip(skip)
                .take(self.page_size as usize)
                .cloned()
                .map(Arc::new)
                .collect(),
            None => Vec::new(),
        };

        Ok(ThreadListResponse {
            threads,
            current_page,
            total_pages,
            page_size: self.page_size,
            results,
        })
    }

    async fn create_thread(&self, initial: &ThreadInitialProps) -> Result<ThreadReference> {
        self.create(None, initial).await
    }

    async fn create_channel_thread(
        &self,
        channel_id: &str,
        initial: &ThreadInitialProps,
    ) -> Result<ThreadReference> {
        self.create(Some(channel_id), initial).await
    }

    async fn update_thread(
        &self,
        id: &str,
        props: &ThreadMutableProps,
    ) -> Result<ThreadReference> {
        self.with_thread(id, |thread, categories| {
            if let Some(title) = &props.title {
                thread.title = title.clone();
            }
            if let Some(body) = &props.body {
                thread.body = body.clone();
                thread.description = html_to_text(body);
            }
            if let Some(category_id) = &props.category {
                thread.category = Some(categories.get(category_id).cloned().unwrap_or_else(
                    || CategoryReference {
                        slug: category_id.clone(),
                        ..CategoryReference::placeholder(category_id.as_str())
                    },
                ));
            }
            if let Some(pinned) = props.pinned {
                thread.pinned = pinned;
            }
            if let Some(tags) = &props.tags {
                thread.tags = tags.clone();
            }
            if let Some(visibility) = props.visibility {
                thread.visibility = visibility;
            }
            thread.updated_at = Utc::now();
        })
        .await
    }

    async fn delete_thread(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let before = inner.threads.len();
        inner.threads.retain(|t| t.id != id);
        if inner.threads.len() == before {
            return Err(FeedError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn like_post(&self, id: &str) -> Result<()> {
        self.with_thread(id, |thread, _| {
            if !thread.likes.liked {
                thread.likes.likes += 1;
                thread.likes.liked = true;
            }
        })
        .await
        .map(|_| ())
    }

    async fn unlike_post(&self, id: &str) -> Result<()> {
        self.with_thread(id, |thread, _| {
            if thread.likes.liked {
                thread.likes.likes = thread.likes.likes.saturating_sub(1);
                thread.likes.liked = false;
            }
        })
        .await
        .map(|_| ())
    }
}
