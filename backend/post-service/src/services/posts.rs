/// Post service - handles post creation, edits and removal
use crate::db::{CommunityDirectory, PostRepository};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::middleware::check_post_ownership;
use crate::models::{ContentPayload, FileRef, NewPost, Post, PostType, PostUpdate};
use crate::services::content::ContentResolver;
use std::sync::Arc;
use uuid::Uuid;

/// Longest accepted title, in characters.
pub const MAX_TITLE_CHARS: usize = 300;

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    communities: Arc<dyn CommunityDirectory>,
    content: ContentResolver,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        communities: Arc<dyn CommunityDirectory>,
        content: ContentResolver,
    ) -> Self {
        Self {
            posts,
            communities,
            content,
        }
    }

    /// Get a post by ID
    pub async fn get_post(&self, post_id: Uuid) -> Result<Post> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| post_not_found(post_id))
    }

    /// Create a new post in a community
    pub async fn create_post(
        &self,
        post_type: PostType,
        title: &str,
        payload: ContentPayload,
        community_id: Uuid,
        author_id: Uuid,
    ) -> Result<Post> {
        let result = self
            .create_post_inner(post_type, title, payload, community_id, author_id)
            .await;
        observe("create", &result);
        result
    }

    async fn create_post_inner(
        &self,
        post_type: PostType,
        title: &str,
        payload: ContentPayload,
        community_id: Uuid,
        author_id: Uuid,
    ) -> Result<Post> {
        let title = validate_title(title)?;

        if !self.communities.community_exists(community_id).await? {
            return Err(AppError::NotFound(format!("Community {} not found", community_id)));
        }

        let content = self.content.resolve(post_type, payload).await?;
        let stored_file = content.file().cloned();

        let new_post = NewPost {
            title,
            content,
            author_id,
            community_id,
        };

        match self.posts.insert(new_post).await {
            Ok(post) => {
                tracing::info!(post_id = %post.id, %community_id, post_type = %post_type, "post created");
                Ok(post)
            }
            Err(err) => {
                // The record never existed; the file written for it is orphaned.
                if let Some(file) = stored_file {
                    self.remove_file(file, "create_rollback").await;
                }
                Err(err)
            }
        }
    }

    /// Replace the title and content of a post owned by `acting_user_id`.
    ///
    /// The post type never changes. For image posts, the previous file is
    /// removed only once the updated record has been committed.
    pub async fn edit_post(
        &self,
        post_id: Uuid,
        acting_user_id: Uuid,
        title: &str,
        payload: ContentPayload,
    ) -> Result<Post> {
        let result = self
            .edit_post_inner(post_id, acting_user_id, title, payload)
            .await;
        observe("edit", &result);
        result
    }

    async fn edit_post_inner(
        &self,
        post_id: Uuid,
        acting_user_id: Uuid,
        title: &str,
        payload: ContentPayload,
    ) -> Result<Post> {
        let post = self.get_post(post_id).await?;
        check_post_ownership(acting_user_id, &post)?;
        let title = validate_title(title)?;

        let previous_file = post.content.file().cloned();
        let content = self.content.resolve(post.post_type(), payload).await?;
        let new_file = content.file().cloned();

        let committed = self
            .posts
            .update_owned(post_id, acting_user_id, PostUpdate { title, content })
            .await;

        let updated = match committed {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                if let Some(file) = new_file {
                    self.remove_file(file, "edit_rollback").await;
                }
                return Err(self.explain_missed_write(post_id, acting_user_id).await);
            }
            Err(err) => {
                if let Some(file) = new_file {
                    self.remove_file(file, "edit_rollback").await;
                }
                return Err(err);
            }
        };

        tracing::info!(%post_id, "post edited");

        if let Some(old) = previous_file {
            if updated.content.file() != Some(&old) {
                self.remove_file(old, "edit").await;
            }
        }

        Ok(updated)
    }

    /// Remove a post owned by `acting_user_id`, then its image file if any.
    pub async fn delete_post(&self, post_id: Uuid, acting_user_id: Uuid) -> Result<()> {
        let result = self.delete_post_inner(post_id, acting_user_id).await;
        observe("delete", &result);
        result
    }

    async fn delete_post_inner(&self, post_id: Uuid, acting_user_id: Uuid) -> Result<()> {
        let post = self.get_post(post_id).await?;
        check_post_ownership(acting_user_id, &post)?;

        let removed = match self.posts.delete_owned(post_id, acting_user_id).await? {
            Some(removed) => removed,
            None => return Err(self.explain_missed_write(post_id, acting_user_id).await),
        };

        tracing::info!(%post_id, "post deleted");

        if let Some(file) = removed.content.file().cloned() {
            self.remove_file(file, "delete").await;
        }

        Ok(())
    }

    /// A conditional write matched no row although the checks passed: the
    /// post was removed or changed hands in between.
    async fn explain_missed_write(&self, post_id: Uuid, acting_user_id: Uuid) -> AppError {
        match self.posts.find_by_id(post_id).await {
            Ok(Some(current)) => match check_post_ownership(acting_user_id, &current) {
                Err(forbidden) => forbidden,
                Ok(()) => AppError::Internal(format!("post {} update matched no row", post_id)),
            },
            Ok(None) => post_not_found(post_id),
            Err(err) => err,
        }
    }

    /// Best-effort file removal. Runs on its own task so that a dropped
    /// request does not cancel it; failures are logged and counted only.
    async fn remove_file(&self, file: FileRef, reason: &'static str) {
        let storage = self.content.storage().clone();

        let task = tokio::spawn(async move {
            match storage.delete(&file).await {
                Ok(()) => {
                    metrics::record_file_cleanup("ok");
                    tracing::debug!(file = %file, reason, "removed stale file");
                }
                Err(err) => {
                    metrics::record_file_cleanup("error");
                    tracing::warn!(file = %file, reason, error = %err, "stale file cleanup failed");
                }
            }
        });

        if let Err(err) = task.await {
            tracing::warn!(reason, "file cleanup task did not complete: {}", err);
        }
    }
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::Validation(format!(
            "title must be at most {} characters",
            MAX_TITLE_CHARS
        )));
    }
    Ok(title.to_string())
}

fn post_not_found(post_id: Uuid) -> AppError {
    AppError::NotFound(format!("Post {} not found", post_id))
}

fn observe<T>(operation: &str, result: &Result<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(err) => err.code(),
    };
    metrics::record_post_operation(operation, outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::community_repo::MockCommunityDirectory;
    use crate::models::FeedQuery;
    use crate::storage::LocalFileStorage;
    use async_trait::async_trait;

    /// Repository that must never be reached.
    struct UnreachableRepository;

    #[async_trait]
    impl PostRepository for UnreachableRepository {
        async fn insert(&self, _post: NewPost) -> Result<Post> {
            panic!("insert should not be called")
        }
        async fn find_by_id(&self, _post_id: Uuid) -> Result<Option<Post>> {
            panic!("find_by_id should not be called")
        }
        async fn update_owned(&self, _: Uuid, _: Uuid, _: PostUpdate) -> Result<Option<Post>> {
            panic!("update_owned should not be called")
        }
        async fn delete_owned(&self, _: Uuid, _: Uuid) -> Result<Option<Post>> {
            panic!("delete_owned should not be called")
        }
        async fn list(&self, _query: &FeedQuery) -> Result<Vec<Post>> {
            panic!("list should not be called")
        }
    }

    /// Repository whose inserts always fail.
    struct FailingInsertRepository;

    #[async_trait]
    impl PostRepository for FailingInsertRepository {
        async fn insert(&self, _post: NewPost) -> Result<Post> {
            Err(AppError::Internal("connection reset".to_string()))
        }
        async fn find_by_id(&self, _post_id: Uuid) -> Result<Option<Post>> {
            Ok(None)
        }
        async fn update_owned(&self, _: Uuid, _: Uuid, _: PostUpdate) -> Result<Option<Post>> {
            Ok(None)
        }
        async fn delete_owned(&self, _: Uuid, _: Uuid) -> Result<Option<Post>> {
            Ok(None)
        }
        async fn list(&self, _query: &FeedQuery) -> Result<Vec<Post>> {
            Ok(Vec::new())
        }
    }

    fn image_payload() -> ContentPayload {
        ContentPayload {
            images: vec![crate::models::ImageUpload {
                file_name: Some("test.jpg".to_string()),
                content_type: "image/jpeg".to_string(),
                bytes: vec![8, 6, 7, 5, 3, 0, 9],
            }],
            ..Default::default()
        }
    }

    fn service(
        repo: Arc<dyn PostRepository>,
        communities: MockCommunityDirectory,
        dir: &tempfile::TempDir,
    ) -> PostService {
        let storage = Arc::new(LocalFileStorage::new(dir.path()));
        PostService::new(repo, Arc::new(communities), ContentResolver::new(storage, 1024))
    }

    fn image_count(dir: &tempfile::TempDir) -> usize {
        std::fs::read_dir(dir.path().join("images"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[test]
    fn titles_are_trimmed_and_bounded() {
        assert_eq!(validate_title("  hello ").unwrap(), "hello");
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_CHARS + 1)).is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_CHARS)).is_ok());
    }

    #[tokio::test]
    async fn unknown_community_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut communities = MockCommunityDirectory::new();
        communities
            .expect_community_exists()
            .times(1)
            .returning(|_| Ok(false));

        let service = service(Arc::new(UnreachableRepository), communities, &dir);
        let err = service
            .create_post(PostType::Image, "title", image_payload(), Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(image_count(&dir), 0);
    }

    #[tokio::test]
    async fn empty_title_fails_before_any_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let mut communities = MockCommunityDirectory::new();
        communities.expect_community_exists().never();

        let service = service(Arc::new(UnreachableRepository), communities, &dir);
        let err = service
            .create_post(PostType::Image, "", image_payload(), Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(image_count(&dir), 0);
    }

    #[tokio::test]
    async fn failed_insert_removes_the_stored_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut communities = MockCommunityDirectory::new();
        communities
            .expect_community_exists()
            .returning(|_| Ok(true));

        let service = service(Arc::new(FailingInsertRepository), communities, &dir);
        let err = service
            .create_post(PostType::Image, "title", image_payload(), Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(image_count(&dir), 0);
    }

    #[tokio::test]
    async fn missed_write_on_vanished_post_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(
            Arc::new(FailingInsertRepository),
            MockCommunityDirectory::new(),
            &dir,
        );
        let err = service
            .explain_missed_write(Uuid::new_v4(), Uuid::new_v4())
            .await;
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
