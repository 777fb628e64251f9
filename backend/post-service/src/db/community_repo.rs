use crate::error::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Read-only view of the community service used to validate post targets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommunityDirectory: Send + Sync {
    async fn community_exists(&self, community_id: Uuid) -> Result<bool>;
}

/// Looks communities up in the shared `communities` table.
#[derive(Clone)]
pub struct PgCommunityDirectory {
    pool: PgPool,
}

impl PgCommunityDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommunityDirectory for PgCommunityDirectory {
    async fn community_exists(&self, community_id: Uuid) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM communities WHERE id = $1)")
                .bind(community_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}
