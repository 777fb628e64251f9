/// Post handlers - HTTP endpoints for post operations
use crate::error::{AppError, Result};
use crate::handlers::form::read_post_form;
use crate::middleware::UserId;
use crate::models::PostType;
use crate::services::PostService;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub struct PostHandlerState {
    pub posts: Arc<PostService>,
    /// Base URL for `links.self`, without trailing slash
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

impl PostHandlerState {
    fn post_url(&self, post_id: Uuid) -> String {
        format!("{}/api/v1/posts/{}", self.public_base_url, post_id)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePostQuery {
    #[serde(rename = "type")]
    pub post_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPostData {
    pub post_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SelfLink {
    #[serde(rename = "self")]
    pub self_link: String,
}

#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    pub data: CreatedPostData,
    pub links: SelfLink,
}

/// Create a new post
/// POST /api/v1/communities/{community_id}/posts?type=text|link|image
pub async fn create_post(
    state: web::Data<PostHandlerState>,
    user_id: UserId,
    community_id: web::Path<Uuid>,
    query: web::Query<CreatePostQuery>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse> {
    let form = read_post_form(&req, payload, state.max_upload_bytes).await?;

    let post_type: PostType = query
        .into_inner()
        .post_type
        .or(form.post_type)
        .ok_or_else(|| AppError::Validation("type is required".to_string()))?
        .parse()?;

    let post = state
        .posts
        .create_post(
            post_type,
            form.title.as_deref().unwrap_or_default(),
            form.content,
            community_id.into_inner(),
            user_id.0,
        )
        .await?;

    Ok(HttpResponse::Ok().json(CreatePostResponse {
        links: SelfLink {
            self_link: state.post_url(post.id),
        },
        data: CreatedPostData { post_id: post.id },
    }))
}

/// Get a post by ID
/// GET /api/v1/posts/{post_id}
pub async fn get_post(
    state: web::Data<PostHandlerState>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = state.posts.get_post(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "data": post })))
}

/// Edit a post's title and content
/// PATCH /api/v1/posts/{post_id}
pub async fn edit_post(
    state: web::Data<PostHandlerState>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse> {
    let form = read_post_form(&req, payload, state.max_upload_bytes).await?;

    state
        .posts
        .edit_post(
            post_id.into_inner(),
            user_id.0,
            form.title.as_deref().unwrap_or_default(),
            form.content,
        )
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Delete a post
/// DELETE /api/v1/posts/{post_id}
pub async fn delete_post(
    state: web::Data<PostHandlerState>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state.posts.delete_post(post_id.into_inner(), user_id.0).await?;
    Ok(HttpResponse::NoContent().finish())
}
