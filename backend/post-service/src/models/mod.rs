/// Data models for post-service
///
/// This module defines structures for:
/// - Post: a community post whose content is text, a link, or an image
/// - PostContent: the type-specific content, one variant per post type
/// - FeedQuery: scope, sort order and page of a feed listing
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Largest page size a feed request may ask for.
pub const MAX_FEED_LIMIT: u32 = 50;

/// Declared kind of a post. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Text,
    Link,
    Image,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Text => "text",
            PostType::Link => "link",
            PostType::Image => "image",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(PostType::Text),
            "link" => Ok(PostType::Link),
            "image" => Ok(PostType::Image),
            other => Err(AppError::Validation(format!(
                "Unknown post type '{}'. Must be one of: text, link, image",
                other
            ))),
        }
    }
}

/// Reference to a file held by the file storage, e.g. `images/<uuid>.png`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRef(pub String);

impl FileRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolved content of a post. The variant always matches the post type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PostContent {
    Text { body: String },
    Link { url: String },
    Image { file: FileRef },
}

impl PostContent {
    pub fn post_type(&self) -> PostType {
        match self {
            PostContent::Text { .. } => PostType::Text,
            PostContent::Link { .. } => PostType::Link,
            PostContent::Image { .. } => PostType::Image,
        }
    }

    /// Stored file backing this content, if any.
    pub fn file(&self) -> Option<&FileRef> {
        match self {
            PostContent::Image { file } => Some(file),
            _ => None,
        }
    }

    /// Splits the content into the `(body, link_url, image_ref)` storage columns.
    pub fn into_columns(self) -> (Option<String>, Option<String>, Option<String>) {
        match self {
            PostContent::Text { body } => (Some(body), None, None),
            PostContent::Link { url } => (None, Some(url), None),
            PostContent::Image { file } => (None, None, Some(file.0)),
        }
    }

    /// Rebuilds content from storage columns, requiring exactly the slot
    /// that belongs to `post_type`.
    pub fn from_columns(
        post_type: PostType,
        body: Option<String>,
        link_url: Option<String>,
        image_ref: Option<String>,
    ) -> Result<Self, AppError> {
        match (post_type, body, link_url, image_ref) {
            (PostType::Text, Some(body), None, None) => Ok(PostContent::Text { body }),
            (PostType::Link, None, Some(url), None) => Ok(PostContent::Link { url }),
            (PostType::Image, None, None, Some(file)) => Ok(PostContent::Image {
                file: FileRef(file),
            }),
            (post_type, ..) => Err(AppError::Internal(format!(
                "stored {} post has inconsistent content columns",
                post_type
            ))),
        }
    }
}

/// A community post
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: PostContent,
    pub author_id: Uuid,
    pub community_id: Uuid,
    pub comment_count: i64,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn post_type(&self) -> PostType {
        self.content.post_type()
    }
}

/// Raw `posts` row as read from PostgreSQL.
#[derive(Debug, sqlx::FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub post_type: String,
    pub title: String,
    pub body: Option<String>,
    pub link_url: Option<String>,
    pub image_ref: Option<String>,
    pub author_id: Uuid,
    pub community_id: Uuid,
    pub comment_count: i64,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = AppError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let post_type = row
            .post_type
            .parse::<PostType>()
            .map_err(|_| AppError::Internal(format!("unknown stored post type '{}'", row.post_type)))?;

        Ok(Post {
            id: row.id,
            title: row.title,
            content: PostContent::from_columns(post_type, row.body, row.link_url, row.image_ref)?,
            author_id: row.author_id,
            community_id: row.community_id,
            comment_count: row.comment_count,
            score: row.score,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Values for a post about to be inserted.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: PostContent,
    pub author_id: Uuid,
    pub community_id: Uuid,
}

/// Replacement title and content for an existing post.
#[derive(Debug, Clone)]
pub struct PostUpdate {
    pub title: String,
    pub content: PostContent,
}

/// Feed entry returned by listing endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub content: PostContent,
    pub author_id: Uuid,
    pub community_id: Uuid,
    pub comment_count: i64,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Post> for PostSummary {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author_id: post.author_id,
            community_id: post.community_id,
            comment_count: post.comment_count,
            score: post.score,
            created_at: post.created_at,
        }
    }
}

/// An uploaded file as received at the HTTP boundary.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Untyped content fields of a create or edit request.
#[derive(Debug, Clone, Default)]
pub struct ContentPayload {
    pub text: Option<String>,
    pub link_url: Option<String>,
    pub images: Vec<ImageUpload>,
}

/// Which posts a feed covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    Community(Uuid),
    Global,
}

/// Feed ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSort {
    New,
    Top,
    Comments,
}

impl FeedSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedSort::New => "new",
            FeedSort::Top => "top",
            FeedSort::Comments => "comments",
        }
    }
}

impl FromStr for FeedSort {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(FeedSort::New),
            "top" => Ok(FeedSort::Top),
            "comments" => Ok(FeedSort::Comments),
            other => Err(AppError::Validation(format!(
                "Invalid sort '{}'. Must be one of: new, top, comments",
                other
            ))),
        }
    }
}

/// A validated feed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedQuery {
    pub scope: FeedScope,
    pub sort: FeedSort,
    pub limit: u32,
    pub page: u32,
}

impl FeedQuery {
    /// Validates `limit` and `page`. Out-of-range values are rejected, not clamped.
    pub fn new(scope: FeedScope, sort: FeedSort, limit: u32, page: u32) -> Result<Self, AppError> {
        if limit < 1 || limit > MAX_FEED_LIMIT {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {}, got {}",
                MAX_FEED_LIMIT, limit
            )));
        }
        if page < 1 {
            return Err(AppError::Validation("page must be 1 or greater".to_string()));
        }

        Ok(Self {
            scope,
            sort,
            limit,
            page,
        })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}
