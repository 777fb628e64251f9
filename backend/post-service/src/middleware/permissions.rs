/// Authorization module for post-service
///
/// Provides ownership-based permission checks for posts. Users can only
/// modify content they own.
use crate::error::{AppError, Result};
use crate::models::Post;
use uuid::Uuid;

/// Fails with `Forbidden` unless the acting user owns the resource.
pub fn authorize(resource_owner_id: Uuid, acting_user_id: Uuid) -> Result<()> {
    if resource_owner_id == acting_user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to modify this resource".to_string(),
        ))
    }
}

/// Check if a user owns a post
pub fn check_post_ownership(user_id: Uuid, post: &Post) -> Result<()> {
    authorize(post.author_id, user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_authorized() {
        let owner = Uuid::new_v4();
        assert!(authorize(owner, owner).is_ok());
    }

    #[test]
    fn other_user_is_forbidden() {
        let err = authorize(Uuid::new_v4(), Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
