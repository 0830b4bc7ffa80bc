//! Feed Module
//!
//! Thread-list caching for the forum feed: which cached pages a mutation
//! affects, the speculative pages written before the API answers, and the
//! revalidation that follows.

mod matcher;
mod model;
mod moderation;
mod mutations;
pub mod optimistic;
mod reader;
mod refresh;

#[cfg(test)]
pub(crate) mod testing;

pub use matcher::InvalidationScope;
pub use model::{
    Account, CategoryReference, CollectionStatus, Identifier, Likes, LinkReference,
    MutationIntent, ReplyStatus, ThreadInitialProps, ThreadListResponse, ThreadMutableProps,
    ThreadReference, Visibility,
};
pub use moderation::{settle, ModerationWorkflow, PendingDelete};
pub use mutations::FeedMutations;
pub use reader::FeedReader;
pub use refresh::{BroadcastRefresher, RouteRefresh, RouteRefresher};
