//! Moderation actions on queued threads.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::{FeedError, Result};
use crate::feed::{FeedMutations, ThreadMutableProps, ThreadReference, Visibility};

/// Runs `op`, then `cleanup` whether `op` succeeded or not.
pub async fn settle<T, Op, C, CFut>(op: Op, cleanup: C) -> Result<T>
where
    Op: Future<Output = Result<T>>,
    C: FnOnce() -> CFut,
    CFut: Future<Output = ()>,
{
    let result = op.await;
    if let Err(e) = &result {
        warn!(error = %e, "operation failed");
    }
    cleanup().await;
    result
}

/// Moderator actions. Mutations run with broad scope: a moderated thread may
/// sit on any cached page. Each action revalidates once, from its own
/// cleanup.
#[derive(Clone)]
pub struct ModerationWorkflow {
    mutations: FeedMutations,
}

impl ModerationWorkflow {
    pub fn new(mutations: FeedMutations) -> Self {
        Self {
            mutations: mutations.with_params(None).deferring_revalidation(),
        }
    }

    /// Publishes a thread waiting in review.
    pub async fn accept_thread(
        &self,
        id: &str,
        author_id: Option<&str>,
    ) -> Result<ThreadReference> {
        info!(thread_id = id, author_id, "admin approved thread");

        let props = ThreadMutableProps {
            visibility: Some(Visibility::Published),
            ..Default::default()
        };

        settle(self.mutations.update_thread(id, props), || async {
            self.mutations.revalidate().await;
        })
        .await
    }

    /// Deletes a thread after `window` unless the returned handle is undone
    /// first.
    pub fn delete_with_undo(&self, id: impl Into<String>, window: Duration) -> PendingDelete {
        let id = id.into();
        let mutations = self.mutations.clone();
        let (cancel, mut undone) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                Ok(()) = &mut undone => {
                    info!(thread_id = %id, "delete undone");
                    return Ok(false);
                }
                _ = tokio::time::sleep(window) => {}
            }
            drop(undone);

            mutations.delete_thread(&id).await.map(|()| true)
        });

        PendingDelete {
            cancel: Some(cancel),
            handle,
        }
    }
}

/// A scheduled delete that can still be undone.
#[derive(Debug)]
pub struct PendingDelete {
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<bool>>,
}

impl PendingDelete {
    /// Cancels the delete. Returns false once the window has closed.
    pub fn undo(&mut self) -> bool {
        self.cancel
            .take()
            .map(|cancel| cancel.send(()).is_ok())
            .unwrap_or(false)
    }

    /// Waits for the window to close; true when the delete ran.
    pub async fn outcome(self) -> Result<bool> {
        self.handle
            .await
            .map_err(|e| FeedError::Internal(format!("delete task failed: {}", e)))?
    }
}
