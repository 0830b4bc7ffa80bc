//! API Handlers
//!
//! HTTP request handlers for each feed service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::cache::{shared, CacheKey, CacheStore, ListParams, SharedStore};
use crate::config::Config;
use crate::error::{FeedError, Result};
use crate::feed::{
    BroadcastRefresher, FeedMutations, FeedReader, ModerationWorkflow, RouteRefresher,
    ThreadListResponse, ThreadReference,
};
use crate::models::{
    AcceptQuery, CreateThreadRequest, DeleteResponse, HealthResponse, LikeResponse, ListQuery,
    StatsResponse, UpdateThreadRequest,
};
use crate::upstream::ThreadApi;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Thread-list cache
    pub cache: SharedStore<ThreadListResponse>,
    /// Read path over the cache
    pub reader: FeedReader,
    /// Route refresh notifications
    pub router: Arc<BroadcastRefresher>,
}

impl AppState {
    /// Creates a new AppState over the given store and upstream API.
    pub fn new(cache: CacheStore<ThreadListResponse>, upstream: Arc<dyn ThreadApi>) -> Self {
        let cache = shared(cache);
        Self {
            reader: FeedReader::new(cache.clone(), upstream),
            cache,
            router: Arc::new(BroadcastRefresher::default()),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config, upstream: Arc<dyn ThreadApi>) -> Self {
        Self::new(
            CacheStore::new(config.max_entries, config.default_ttl),
            upstream,
        )
    }

    /// Mutations issued from the list view described by `params`.
    pub fn mutations(&self, params: Option<&ListParams>) -> FeedMutations {
        FeedMutations::from_reader(self.reader.clone())
            .with_params(params)
            .with_router(Some(self.router.clone() as Arc<dyn RouteRefresher>))
    }
}

fn list_params(query: &ListQuery) -> Result<Option<ListParams>> {
    if let Some(error_msg) = query.validate() {
        return Err(FeedError::InvalidRequest(error_msg));
    }
    Ok(query.params())
}

/// Handler for GET /threads
pub async fn list_threads_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ThreadListResponse>> {
    let params = list_params(&query)?.unwrap_or_default();
    let page = state.reader.list_threads(&CacheKey::global(params)).await?;
    Ok(Json(page))
}

/// Handler for GET /channels/:id/threads
pub async fn channel_threads_handler(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ThreadListResponse>> {
    let params = list_params(&query)?.unwrap_or_default();
    let page = state
        .reader
        .list_threads(&CacheKey::channel(channel_id, params))
        .await?;
    Ok(Json(page))
}

/// Handler for POST /threads
pub async fn create_thread_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateThreadRequest>,
) -> Result<(StatusCode, Json<ThreadReference>)> {
    if let Some(error_msg) = req.validate() {
        return Err(FeedError::InvalidRequest(error_msg));
    }

    let thread = state
        .mutations(req.scope.as_ref())
        .with_session(req.author)
        .in_channel(req.channel_id)
        .create_thread(req.thread, req.link)
        .await?;

    Ok((StatusCode::CREATED, Json(thread)))
}

/// Handler for PATCH /threads/:id
pub async fn update_thread_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateThreadRequest>,
) -> Result<Json<ThreadReference>> {
    if let Some(error_msg) = req.validate() {
        return Err(FeedError::InvalidRequest(error_msg));
    }

    let thread = state
        .mutations(req.scope.as_ref())
        .update_thread(&id, req.props)
        .await?;

    Ok(Json(thread))
}

/// Handler for DELETE /threads/:id
pub async fn delete_thread_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.mutations(None).delete_thread(&id).await?;
    Ok(Json(DeleteResponse::new(id)))
}

/// Handler for PUT /threads/:id/like
pub async fn like_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<LikeResponse>> {
    let params = list_params(&query)?;
    state.mutations(params.as_ref()).like_post(&id).await?;
    Ok(Json(LikeResponse::new(id, true)))
}

/// Handler for DELETE /threads/:id/like
pub async fn unlike_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<LikeResponse>> {
    let params = list_params(&query)?;
    state.mutations(params.as_ref()).unlike_post(&id).await?;
    Ok(Json(LikeResponse::new(id, false)))
}

/// Handler for POST /threads/:id/accept
pub async fn accept_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<AcceptQuery>,
) -> Result<Json<ThreadReference>> {
    let workflow = ModerationWorkflow::new(state.mutations(None));
    let thread = workflow
        .accept_thread(&id, query.author_id.as_deref())
        .await?;
    Ok(Json(thread))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    Json(StatsResponse::from(cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
