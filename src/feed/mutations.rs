//! Thread mutations with optimistic cache updates.
//!
//! Create, update, like and unlike write a speculative page into every
//! matching cache entry before the API call is issued, then invalidate the
//! same entries once the call settles, whatever its outcome. Delete writes
//! nothing up front: it waits for the API to confirm and then re-fetches
//! every thread list.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{CacheKey, ListKey, ListParams, SharedStore};
use crate::error::Result;
use crate::feed::optimistic::{apply_like, apply_unlike, apply_update, draft_thread, prepend_created};
use crate::feed::{
    Account, FeedReader, InvalidationScope, LinkReference, MutationIntent,
    RouteRefresher, ThreadInitialProps, ThreadListResponse, ThreadMutableProps, ThreadReference,
};
use crate::upstream::ThreadApi;

/// Mutations issued from one view of the feed.
///
/// The view is described by the session account, the list parameters it
/// shows and the channel it lives in; these decide which cached pages the
/// optimistic writes and the invalidation touch.
#[derive(Clone)]
pub struct FeedMutations {
    reader: FeedReader,
    session: Option<Account>,
    scope: InvalidationScope,
    channel_id: Option<String>,
    router: Option<Arc<dyn RouteRefresher>>,
    /// Revalidate when a call settles; off when the caller does it
    revalidate_on_settle: bool,
}

impl FeedMutations {
    pub fn new(store: SharedStore<ThreadListResponse>, api: Arc<dyn ThreadApi>) -> Self {
        Self::from_reader(FeedReader::new(store, api))
    }

    pub fn from_reader(reader: FeedReader) -> Self {
        Self {
            reader,
            session: None,
            scope: InvalidationScope::Broad,
            channel_id: None,
            router: None,
            revalidate_on_settle: true,
        }
    }

    /// Account shown as author of optimistic threads. Without one, creation
    /// skips the optimistic entry.
    pub fn with_session(mut self, session: Option<Account>) -> Self {
        self.session = session;
        self
    }

    /// Parameters of the list the view shows; see [`InvalidationScope::from_params`].
    pub fn with_params(mut self, params: Option<&ListParams>) -> Self {
        self.scope = InvalidationScope::from_params(params);
        self
    }

    /// Channel the view lives in. New threads are created inside it.
    pub fn in_channel(mut self, channel_id: Option<String>) -> Self {
        self.channel_id = channel_id;
        self
    }

    pub fn with_router(mut self, router: Option<Arc<dyn RouteRefresher>>) -> Self {
        self.router = router;
        self
    }

    /// Leaves revalidation after a settled call to the caller, which then
    /// owns exactly one [`revalidate`](Self::revalidate) per mutation.
    pub fn deferring_revalidation(mut self) -> Self {
        self.revalidate_on_settle = false;
        self
    }

    pub fn scope(&self) -> &InvalidationScope {
        &self.scope
    }

    fn store(&self) -> &SharedStore<ThreadListResponse> {
        self.reader.store()
    }

    fn api(&self) -> &Arc<dyn ThreadApi> {
        self.reader.api()
    }

    // == Revalidate ==
    /// Marks every page in scope stale and refreshes route caches.
    ///
    /// Returns the number of pages marked.
    pub async fn revalidate(&self) -> usize {
        let marked = {
            let scope = &self.scope;
            self.store().write().await.invalidate(|key| scope.matches(key))
        };
        debug!(count = marked.len(), "invalidated thread lists");
        self.refresh_routes();
        marked.len()
    }

    fn refresh_routes(&self) {
        if let Some(router) = &self.router {
            router.refresh();
        }
    }

    async fn write_optimistic<M>(&self, intent: &MutationIntent, mutator: M) -> usize
    where
        M: FnMut(&ThreadListResponse) -> Option<ThreadListResponse>,
    {
        let scope = &self.scope;
        let channel_id = self.channel_id.as_deref();
        let written = self.store().write().await.mutate(
            |key| scope.matches(key) && Self::shows_channel(key, channel_id, intent),
            mutator,
        );
        debug!(intent = %intent, pages = written, "optimistic write applied");
        written
    }

    /// A new thread only belongs in the global list and its own channel's list.
    fn shows_channel(key: &CacheKey, channel_id: Option<&str>, intent: &MutationIntent) -> bool {
        match (intent, &key.list) {
            (MutationIntent::Create, ListKey::Channel { channel_id: listed }) => {
                channel_id == Some(listed.as_str())
            }
            _ => true,
        }
    }

    /// Runs after the API call settles: log the outcome, then revalidate
    /// unless the caller defers it.
    async fn settle<T>(&self, intent: &MutationIntent, result: &Result<T>) {
        match result {
            Ok(_) => info!(intent = %intent, "mutation confirmed"),
            Err(e) => warn!(intent = %intent, error = %e, "mutation failed"),
        }
        if self.revalidate_on_settle {
            self.revalidate().await;
        }
    }

    // == Create ==
    pub async fn create_thread(
        &self,
        initial: ThreadInitialProps,
        link: Option<LinkReference>,
    ) -> Result<ThreadReference> {
        let intent = MutationIntent::Create;

        match &self.session {
            Some(author) => {
                let draft = Arc::new(draft_thread(
                    &initial,
                    author,
                    self.channel_id.as_deref(),
                    link.as_ref(),
                ));
                self.write_optimistic(&intent, |page| prepend_created(page, &draft))
                    .await;
            }
            None => debug!("no session, skipping optimistic thread"),
        }

        let result = match &self.channel_id {
            Some(channel_id) => self.api().create_channel_thread(channel_id, &initial).await,
            None => self.api().create_thread(&initial).await,
        };

        self.settle(&intent, &result).await;
        result
    }

    // == Update ==
    pub async fn update_thread(
        &self,
        id: &str,
        props: ThreadMutableProps,
    ) -> Result<ThreadReference> {
        let intent = MutationIntent::Update { id: id.to_string() };

        self.write_optimistic(&intent, |page| apply_update(page, id, &props))
            .await;

        let result = self.api().update_thread(id, &props).await;

        self.settle(&intent, &result).await;
        result
    }

    // == Delete ==
    /// Deletes a thread once the API confirms, then re-fetches every thread
    /// list. Nothing is removed from the cache before confirmation, so a
    /// failed delete leaves the cache as it was.
    pub async fn delete_thread(&self, id: &str) -> Result<()> {
        let intent = MutationIntent::Delete { id: id.to_string() };

        if let Err(e) = self.api().delete_thread(id).await {
            warn!(intent = %intent, error = %e, "delete rejected, cache untouched");
            return Err(e);
        }
        info!(intent = %intent, "mutation confirmed");

        let replaced = self.reader.refetch_matching(&InvalidationScope::Broad).await;
        debug!(pages = replaced, "re-fetched thread lists after delete");
        self.refresh_routes();

        Ok(())
    }

    // == Like / Unlike ==
    pub async fn like_post(&self, id: &str) -> Result<()> {
        let intent = MutationIntent::Like { id: id.to_string() };

        self.write_optimistic(&intent, |page| apply_like(page, id))
            .await;

        let result = self.api().like_post(id).await;

        self.settle(&intent, &result).await;
        result
    }

    pub async fn unlike_post(&self, id: &str) -> Result<()> {
        let intent = MutationIntent::Unlike { id: id.to_string() };

        self.write_optimistic(&intent, |page| apply_unlike(page, id))
            .await;

        let result = self.api().unlike_post(id).await;

        self.settle(&intent, &result).await;
        result
    }
}
