//! Property-Based Tests for the thread-list cache
//!
//! Uses proptest to check the store, the invalidation matcher and the
//! optimistic page rewrites against arbitrary inputs.

use proptest::prelude::*;
use std::sync::Arc;

use crate::cache::{CacheKey, CacheStore, ListParams};
use crate::feed::optimistic::{apply_like, apply_unlike, apply_update, prepend_created};
use crate::feed::testing::{page_of, thread};
use crate::feed::{InvalidationScope, ThreadListResponse, ThreadMutableProps};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const TEST_DEFAULT_TTL: u64 = 300;

// == Strategies ==
fn categories_strategy() -> impl Strategy<Value = Option<Vec<String>>> {
    prop::option::of(prop::collection::vec("[a-z]{1,8}", 0..3))
}

fn params_strategy() -> impl Strategy<Value = ListParams> {
    (prop::option::of(1u32..5), categories_strategy())
        .prop_map(|(page, categories)| ListParams { page, categories })
}

fn key_strategy() -> impl Strategy<Value = CacheKey> {
    (prop::option::of("[a-z0-9]{1,6}"), params_strategy()).prop_map(|(channel, params)| {
        match channel {
            Some(channel_id) => CacheKey::channel(channel_id, params),
            None => CacheKey::global(params),
        }
    })
}

/// A page of 1..12 threads with distinct ids, plus the index of one of them.
fn page_strategy() -> impl Strategy<Value = (ThreadListResponse, usize)> {
    (1u32..4, 1usize..12).prop_flat_map(|(current_page, len)| {
        let threads = (0..len).map(|i| thread(&format!("t{}", i))).collect();
        (Just(page_of(current_page, threads)), 0..len)
    })
}

fn same_arcs_except(before: &ThreadListResponse, after: &ThreadListResponse, id: &str) -> bool {
    before
        .threads
        .iter()
        .zip(after.threads.iter())
        .all(|(a, b)| a.id == id || Arc::ptr_eq(a, b))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // The scope derived from a view always matches that view's own key.
    #[test]
    fn prop_scope_matches_own_view(key in key_strategy()) {
        let scope = InvalidationScope::from_params(Some(&key.params));
        prop_assert!(scope.matches(&key));
        prop_assert!(InvalidationScope::Broad.matches(&key));
    }

    // A scope with a category filter rejects keys carrying a different filter.
    #[test]
    fn prop_scope_rejects_other_categories(
        params in params_strategy(),
        wanted in prop::collection::vec("[a-z]{1,8}", 1..3),
    ) {
        prop_assume!(params.categories.as_ref() != Some(&wanted));
        let scope = InvalidationScope::from_params(Some(
            &ListParams::page(params.page_or_default()).with_categories(wanted),
        ));
        prop_assert!(!scope.matches(&CacheKey::global(params)));
    }

    // The store never holds more pages than its capacity.
    #[test]
    fn prop_capacity_enforcement(keys in prop::collection::vec(key_strategy(), 1..200)) {
        let max_entries = 20;
        let mut store = CacheStore::new(max_entries, TEST_DEFAULT_TTL);

        for key in keys {
            let _ = store.set(key, 0u32, None);
            prop_assert!(
                store.len() <= max_entries,
                "Cache size {} exceeds max {}",
                store.len(),
                max_entries
            );
        }
    }

    // Invalidating twice marks the same keys and leaves every value in place.
    #[test]
    fn prop_invalidation_idempotent(
        keys in prop::collection::vec(key_strategy(), 1..30),
        params in prop::option::of(params_strategy()),
    ) {
        let mut store = CacheStore::new(TEST_MAX_ENTRIES, TEST_DEFAULT_TTL);
        for (i, key) in keys.iter().enumerate() {
            store.set(key.clone(), i, None).unwrap();
        }

        let scope = InvalidationScope::from_params(params.as_ref());
        let mut first = store.invalidate(|key| scope.matches(key));
        let mut second = store.invalidate(|key| scope.matches(key));
        first.sort_by_key(|k| k.to_string());
        second.sort_by_key(|k| k.to_string());

        prop_assert_eq!(first, second);
        for key in &keys {
            let entry = store.peek_entry(key).unwrap();
            prop_assert_eq!(entry.stale, scope.matches(key));
        }
    }

    // A created thread lands on top of a first page and nowhere else.
    #[test]
    fn prop_create_only_touches_first_page((page, _) in page_strategy()) {
        let draft = Arc::new(thread("draft"));
        match prepend_created(&page, &draft) {
            Some(next) => {
                prop_assert_eq!(page.current_page, 1);
                prop_assert_eq!(next.threads.len(), page.threads.len() + 1);
                prop_assert_eq!(next.threads[0].id.as_str(), "draft");
            }
            None => prop_assert_ne!(page.current_page, 1),
        }
    }

    // An update rewrites one thread and keeps every other one by identity.
    #[test]
    fn prop_update_keeps_other_threads(
        (page, index) in page_strategy(),
        title in "[A-Za-z ]{1,20}",
    ) {
        let id = page.threads[index].id.clone();
        let props = ThreadMutableProps {
            title: Some(title.clone()),
            ..Default::default()
        };

        let next = apply_update(&page, &id, &props).unwrap();
        prop_assert_eq!(next.threads.len(), page.threads.len());
        prop_assert_eq!(&next.threads[index].title, &title);
        prop_assert!(same_arcs_except(&page, &next, &id));
    }

    // Like followed by unlike restores the original count.
    #[test]
    fn prop_like_unlike_restores_count((page, index) in page_strategy()) {
        let id = page.threads[index].id.clone();

        let liked = apply_like(&page, &id).unwrap();
        prop_assert_eq!(liked.threads[index].likes.likes, page.threads[index].likes.likes + 1);
        prop_assert!(liked.threads[index].likes.liked);

        let unliked = apply_unlike(&liked, &id).unwrap();
        prop_assert_eq!(unliked.threads[index].likes.likes, page.threads[index].likes.likes);
        prop_assert!(!unliked.threads[index].likes.liked);
        prop_assert!(same_arcs_except(&page, &unliked, &id));
    }

    // Rewrites for an id that is not on the page leave the page alone.
    #[test]
    fn prop_absent_thread_is_noop((page, _) in page_strategy()) {
        prop_assert!(apply_like(&page, "absent").is_none());
        prop_assert!(apply_unlike(&page, "absent").is_none());
        prop_assert!(apply_update(&page, "absent", &ThreadMutableProps::default()).is_none());
    }
}
