//! Fixtures shared by the feed unit tests.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use crate::feed::model::{
    Account, CollectionStatus, Likes, ReplyStatus, ThreadListResponse, ThreadReference, Visibility,
};

pub fn thread(id: &str) -> ThreadReference {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    ThreadReference {
        id: id.to_string(),
        slug: format!("{}-slug", id),
        title: format!("Thread {}", id),
        description: String::new(),
        body: String::new(),
        author: Account {
            id: "author".into(),
            handle: "author".into(),
            name: "Author".into(),
        },
        category: None,
        likes: Likes::default(),
        reply_status: ReplyStatus::default(),
        collections: CollectionStatus::default(),
        pinned: 0,
        tags: Vec::new(),
        visibility: Visibility::Published,
        link: None,
        channel_id: String::new(),
        created_at: at,
        updated_at: at,
    }
}

pub fn page_of(current_page: u32, threads: Vec<ThreadReference>) -> ThreadListResponse {
    let results = threads.len() as u32;
    ThreadListResponse {
        threads: threads.into_iter().map(Arc::new).collect(),
        current_page,
        total_pages: current_page.max(1),
        page_size: 50,
        results,
    }
}
