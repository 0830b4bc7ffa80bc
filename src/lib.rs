//! feedsync - Thread-feed cache for forum front-ends
//!
//! Caches pages of thread lists fetched from the forum API, applies
//! optimistic updates for user actions and revalidates the affected pages
//! once the API has answered.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod tasks;
pub mod upstream;

pub use api::AppState;
pub use config::Config;
pub use error::{FeedError, Result};
pub use tasks::spawn_cleanup_task;
