//! Optimistic rewrites of cached thread-list pages.
//!
//! Every function here is pure: it takes the current page and returns a new
//! page, or `None` when the page is not affected. Threads that are not
//! touched are carried over by `Arc`, so readers can compare by identity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use html_escape::decode_html_entities;
use lol_html::html_content::ContentType;
use lol_html::{comments, element, rewrite_str, RewriteStrSettings};
use tracing::warn;

use crate::feed::model::{
    Account, CategoryReference, CollectionStatus, LinkReference, Likes, ReplyStatus,
    ThreadInitialProps, ThreadListResponse, ThreadMutableProps, ThreadReference, Visibility,
};

pub const TEMPORARY_ID_PREFIX: &str = "optimistic_thread_id_";
pub const TEMPORARY_SLUG_PREFIX: &str = "optimistic_thread_slug_";

static TEMPORARY_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_temporary(prefix: &str) -> String {
    format!("{}{}", prefix, TEMPORARY_SEQ.fetch_add(1, Ordering::Relaxed))
}

/// Returns whether `id` was minted for an optimistic entry.
pub fn is_temporary_id(id: &str) -> bool {
    id.starts_with(TEMPORARY_ID_PREFIX)
}

/// Builds the speculative thread shown until the created one is fetched.
pub fn draft_thread(
    initial: &ThreadInitialProps,
    author: &Account,
    channel_id: Option<&str>,
    link: Option<&LinkReference>,
) -> ThreadReference {
    let now = Utc::now();
    let body = initial.body.clone().unwrap_or_default();

    ThreadReference {
        id: next_temporary(TEMPORARY_ID_PREFIX),
        slug: next_temporary(TEMPORARY_SLUG_PREFIX),
        title: initial.title.clone(),
        description: html_to_text(&body),
        body,
        author: author.clone(),
        category: initial.category.as_deref().map(CategoryReference::placeholder),
        likes: Likes::default(),
        reply_status: ReplyStatus::default(),
        collections: CollectionStatus::default(),
        pinned: initial.pinned.unwrap_or(0),
        tags: Vec::new(),
        visibility: Visibility::Draft,
        link: link.cloned(),
        channel_id: channel_id.unwrap_or_default().to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// Prepends `draft` to a first page. Later pages are never touched.
///
/// A placeholder category on the draft is swapped for the full reference
/// when another thread on the page already carries that category.
pub fn prepend_created(
    page: &ThreadListResponse,
    draft: &Arc<ThreadReference>,
) -> Option<ThreadListResponse> {
    if page.current_page != 1 {
        return None;
    }

    let entry = match draft
        .category
        .as_ref()
        .and_then(|c| resolve_category(page, &c.id))
    {
        Some(category) => Arc::new(ThreadReference {
            category: Some(category),
            ..(**draft).clone()
        }),
        None => Arc::clone(draft),
    };

    let mut threads = Vec::with_capacity(page.threads.len() + 1);
    threads.push(entry);
    threads.extend(page.threads.iter().cloned());

    Some(ThreadListResponse {
        threads,
        ..page.clone()
    })
}

/// Applies `props` to the thread with `id`.
///
/// Tags are left as they are until the server answers. A category id delta
/// is resolved against the categories already on the page.
pub fn apply_update(
    page: &ThreadListResponse,
    id: &str,
    props: &ThreadMutableProps,
) -> Option<ThreadListResponse> {
    let resolved = props
        .category
        .as_deref()
        .and_then(|category_id| resolve_category(page, category_id));

    map_thread(page, id, |thread| {
        let category = match (&props.category, &thread.category) {
            (None, current) => current.clone(),
            (Some(_), _) if resolved.is_some() => resolved.clone(),
            (Some(category_id), Some(current)) => Some(CategoryReference {
                id: category_id.clone(),
                ..current.clone()
            }),
            (Some(category_id), None) => Some(CategoryReference::placeholder(category_id.as_str())),
        };

        let (body, description) = match &props.body {
            Some(body) => (body.clone(), html_to_text(body)),
            None => (thread.body.clone(), thread.description.clone()),
        };

        ThreadReference {
            title: props.title.clone().unwrap_or_else(|| thread.title.clone()),
            body,
            description,
            category,
            pinned: props.pinned.unwrap_or(thread.pinned),
            visibility: props.visibility.unwrap_or(thread.visibility),
            updated_at: Utc::now(),
            ..thread.clone()
        }
    })
}

/// Counts a like from the current account on the thread with `id`.
pub fn apply_like(page: &ThreadListResponse, id: &str) -> Option<ThreadListResponse> {
    map_thread(page, id, |thread| ThreadReference {
        likes: Likes {
            likes: thread.likes.likes.saturating_add(1),
            liked: true,
        },
        ..thread.clone()
    })
}

/// Withdraws the current account's like from the thread with `id`.
pub fn apply_unlike(page: &ThreadListResponse, id: &str) -> Option<ThreadListResponse> {
    map_thread(page, id, |thread| ThreadReference {
        likes: Likes {
            likes: thread.likes.likes.saturating_sub(1),
            liked: false,
        },
        ..thread.clone()
    })
}

fn map_thread<F>(page: &ThreadListResponse, id: &str, f: F) -> Option<ThreadListResponse>
where
    F: Fn(&ThreadReference) -> ThreadReference,
{
    if !page.threads.iter().any(|t| t.id == id) {
        return None;
    }

    let threads = page
        .threads
        .iter()
        .map(|thread| {
            if thread.id == id {
                Arc::new(f(thread))
            } else {
                Arc::clone(thread)
            }
        })
        .collect();

    Some(ThreadListResponse {
        threads,
        ..page.clone()
    })
}

fn resolve_category(page: &ThreadListResponse, category_id: &str) -> Option<CategoryReference> {
    page.threads
        .iter()
        .filter_map(|t| t.category.as_ref())
        .find(|c| c.id == category_id)
        .cloned()
}

/// Text content of an HTML fragment.
///
/// Markup is stripped with `lol_html`: script, style and template elements go
/// with their content, every other element keeps its content. Entities are
/// decoded afterwards and whitespace is collapsed.
pub fn html_to_text(html: &str) -> String {
    let stripped = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("*", |el| {
                    match el.tag_name().as_str() {
                        "script" | "style" | "template" | "noscript" => el.remove(),
                        name => {
                            if is_block(name) {
                                el.after(" ", ContentType::Text);
                            }
                            el.remove_and_keep_content();
                        }
                    }
                    Ok(())
                }),
                comments!("*", |c| {
                    c.remove();
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    );

    match stripped {
        Ok(stripped) => decode_html_entities(&stripped)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
        Err(err) => {
            warn!(error = %err, "could not extract text from thread body");
            String::new()
        }
    }
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "br" | "div" | "li" | "ul" | "ol" | "blockquote" | "pre" | "tr" | "td" | "th"
            | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}
