//! Cache-key matching for thread-list invalidation.
//!
//! A mutation names the view it was issued from (page and category filter).
//! Keys outside that view are left alone unless the mutation asks for broad
//! invalidation, which takes every cached thread list, global or per channel.

use crate::cache::{CacheKey, ListParams};

/// Which cached thread lists a mutation treats as affected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationScope {
    /// Every thread list, whatever its page or filter.
    ///
    /// Over-invalidates filtered views that could not contain the thread.
    /// That costs a re-fetch, never correctness.
    Broad,
    /// Thread lists on `page` whose category filter equals `categories`.
    /// A `None` filter accepts any category filter.
    Scoped {
        page: u32,
        categories: Option<Vec<String>>,
    },
}

impl InvalidationScope {
    /// Derives the scope from the parameters of the view a mutation runs in.
    ///
    /// No parameters means broad. Any parameters, even empty ones, scope the
    /// match to their page (first page when unset).
    pub fn from_params(params: Option<&ListParams>) -> Self {
        match params {
            None => InvalidationScope::Broad,
            Some(params) => InvalidationScope::Scoped {
                page: params.page_or_default(),
                categories: params.categories.clone(),
            },
        }
    }

    pub fn is_broad(&self) -> bool {
        matches!(self, InvalidationScope::Broad)
    }

    /// Returns whether the cached page under `key` is affected.
    pub fn matches(&self, key: &CacheKey) -> bool {
        match self {
            InvalidationScope::Broad => true,
            InvalidationScope::Scoped { page, categories } => {
                let page_match = key.params.page_or_default() == *page;
                let category_match = match categories {
                    Some(wanted) => key.params.categories.as_ref() == Some(wanted),
                    None => true,
                };
                page_match && category_match
            }
        }
    }

    /// Same as [`matches`](Self::matches) for an untyped path plus params.
    /// Paths that are not thread lists never match.
    pub fn matches_path(&self, path: &str, params: &ListParams) -> bool {
        CacheKey::parse(path, params.clone())
            .map(|key| self.matches(&key))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scoped(page: u32, categories: Option<&[&str]>) -> InvalidationScope {
        InvalidationScope::Scoped {
            page,
            categories: categories.map(|c| c.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn test_no_params_is_broad() {
        assert_eq!(InvalidationScope::from_params(None), InvalidationScope::Broad);
    }

    #[test]
    fn test_empty_params_scope_to_first_page() {
        let scope = InvalidationScope::from_params(Some(&ListParams::default()));
        assert_eq!(scope, scoped(1, None));
    }

    #[test]
    fn test_broad_matches_global_and_channel_lists() {
        let scope = InvalidationScope::Broad;
        assert!(scope.matches(&CacheKey::global(ListParams::page(7))));
        assert!(scope.matches(&CacheKey::channel(
            "c1",
            ListParams::default().with_categories(["news"])
        )));
    }

    #[test]
    fn test_scoped_page_defaults_to_one() {
        let scope = scoped(1, None);
        assert!(scope.matches(&CacheKey::global(ListParams::default())));
        assert!(scope.matches(&CacheKey::global(ListParams::page(1))));
        assert!(!scope.matches(&CacheKey::global(ListParams::page(2))));
    }

    #[test]
    fn test_scoped_rejects_mismatched_categories() {
        let scope = scoped(1, Some(&["announcements"]));
        assert!(scope.matches(&CacheKey::global(
            ListParams::default().with_categories(["announcements"])
        )));
        assert!(!scope.matches(&CacheKey::global(
            ListParams::default().with_categories(["general"])
        )));
        assert!(!scope.matches(&CacheKey::global(ListParams::default())));
    }

    #[test]
    fn test_scoped_category_order_is_significant() {
        let scope = scoped(1, Some(&["a", "b"]));
        assert!(!scope.matches(&CacheKey::global(
            ListParams::default().with_categories(["b", "a"])
        )));
    }

    #[test]
    fn test_scoped_without_categories_accepts_any_filter() {
        let scope = scoped(2, None);
        assert!(scope.matches(&CacheKey::channel(
            "c9",
            ListParams::page(2).with_categories(["x"])
        )));
    }

    #[test]
    fn test_matches_path_rejects_non_thread_lists() {
        let scope = InvalidationScope::Broad;
        assert!(scope.matches_path("/threads", &ListParams::default()));
        assert!(scope.matches_path("/channels/abc/threads", &ListParams::default()));
        assert!(!scope.matches_path("/categories", &ListParams::default()));
        assert!(!scope.matches_path("/channels/abc/threads/t1", &ListParams::default()));
    }
}
