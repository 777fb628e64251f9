use crate::error::Result;
use crate::models::{FeedQuery, FeedScope, FeedSort, NewPost, Post, PostRow, PostUpdate};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const POST_COLUMNS: &str = "id, post_type, title, body, link_url, image_ref, author_id, \
     community_id, comment_count, score, created_at, updated_at";

/// Persistence boundary for posts.
///
/// Implementations own the storage representation and enforce no business
/// rules beyond the row-level conditions spelled out per method.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a new post with zero score and comment count.
    async fn insert(&self, post: NewPost) -> Result<Post>;

    /// Find a post by ID (excluding removed posts)
    async fn find_by_id(&self, post_id: Uuid) -> Result<Option<Post>>;

    /// Replace title and content if the post exists, is owned by `author_id`
    /// and keeps its type. Returns `None` when no row matched.
    async fn update_owned(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        update: PostUpdate,
    ) -> Result<Option<Post>>;

    /// Remove the post if it exists and is owned by `author_id`.
    /// Returns the removed post, or `None` when no row matched.
    async fn delete_owned(&self, post_id: Uuid, author_id: Uuid) -> Result<Option<Post>>;

    /// One page of a feed, ordered per `query.sort`.
    async fn list(&self, query: &FeedQuery) -> Result<Vec<Post>>;
}

/// PostgreSQL-backed post repository
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn order_clause(sort: FeedSort) -> &'static str {
    match sort {
        FeedSort::New => "created_at DESC, id DESC",
        FeedSort::Top => "score DESC, created_at DESC, id DESC",
        FeedSort::Comments => "comment_count DESC, created_at DESC, id DESC",
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn insert(&self, post: NewPost) -> Result<Post> {
        let post_type = post.content.post_type();
        let (body, link_url, image_ref) = post.content.into_columns();

        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            INSERT INTO posts (post_type, title, body, link_url, image_ref, author_id, community_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post_type.as_str())
        .bind(&post.title)
        .bind(body)
        .bind(link_url)
        .bind(image_ref)
        .bind(post.author_id)
        .bind(post.community_id)
        .fetch_one(&self.pool)
        .await?;

        Post::try_from(row)
    }

    async fn find_by_id(&self, post_id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE id = $1 AND deleted_at IS NULL
            "#
        ))
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Post::try_from).transpose()
    }

    async fn update_owned(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        update: PostUpdate,
    ) -> Result<Option<Post>> {
        let post_type = update.content.post_type();
        let (body, link_url, image_ref) = update.content.into_columns();

        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            UPDATE posts
            SET title = $3, body = $4, link_url = $5, image_ref = $6, updated_at = NOW()
            WHERE id = $1 AND author_id = $2 AND post_type = $7 AND deleted_at IS NULL
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post_id)
        .bind(author_id)
        .bind(&update.title)
        .bind(body)
        .bind(link_url)
        .bind(image_ref)
        .bind(post_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Post::try_from).transpose()
    }

    async fn delete_owned(&self, post_id: Uuid, author_id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            UPDATE posts
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND author_id = $2 AND deleted_at IS NULL
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post_id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Post::try_from).transpose()
    }

    async fn list(&self, query: &FeedQuery) -> Result<Vec<Post>> {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE deleted_at IS NULL"
        ));

        if let FeedScope::Community(community_id) = query.scope {
            builder.push(" AND community_id = ").push_bind(community_id);
        }

        builder
            .push(" ORDER BY ")
            .push(order_clause(query.sort))
            .push(" LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(query.offset() as i64);

        let rows = builder
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Post::try_from).collect()
    }
}
