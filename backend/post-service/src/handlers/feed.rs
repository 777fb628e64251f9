use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{FeedScope, FeedSort, PostSummary};
use crate::services::FeedService;

#[derive(Debug, Deserialize)]
pub struct FeedQueryParams {
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_sort() -> String {
    "new".to_string()
}

fn default_limit() -> i64 {
    10
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub data: Vec<PostSummary>,
    pub page: u32,
    pub limit: u32,
}

pub struct FeedHandlerState {
    pub feed: Arc<FeedService>,
    /// Answer an empty page with 404, as older clients expect.
    pub empty_as_not_found: bool,
}

fn to_u32(name: &str, value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| AppError::Validation(format!("{} out of range: {}", name, value)))
}

async fn serve_feed(
    state: &FeedHandlerState,
    scope: FeedScope,
    params: FeedQueryParams,
) -> Result<HttpResponse> {
    let sort: FeedSort = params.sort.parse()?;
    let limit = to_u32("limit", params.limit)?;
    let page = to_u32("page", params.page)?;

    let posts = state.feed.query(scope, sort, limit, page).await?;

    if posts.is_empty() && state.empty_as_not_found {
        return Err(AppError::NotFound("No posts found".to_string()));
    }

    Ok(HttpResponse::Ok().json(FeedResponse {
        data: posts,
        page,
        limit,
    }))
}

/// GET /api/v1/communities/{community_id}/posts?sort=new|top|comments&limit=1..50&page=1..
pub async fn get_community_feed(
    state: web::Data<FeedHandlerState>,
    community_id: web::Path<Uuid>,
    query: web::Query<FeedQueryParams>,
) -> Result<HttpResponse> {
    serve_feed(
        &state,
        FeedScope::Community(community_id.into_inner()),
        query.into_inner(),
    )
    .await
}

/// GET /api/v1/posts?sort=new|top|comments&limit=1..50&page=1..
pub async fn get_global_feed(
    state: web::Data<FeedHandlerState>,
    query: web::Query<FeedQueryParams>,
) -> Result<HttpResponse> {
    serve_feed(&state, FeedScope::Global, query.into_inner()).await
}
