/// Feed service - sorted, paginated post listings
use crate::db::PostRepository;
use crate::error::Result;
use crate::metrics;
use crate::models::{FeedQuery, FeedScope, FeedSort, PostSummary};
use std::sync::Arc;
use std::time::Instant;

/// Read-only listings over posts, either for one community or across all
/// communities. An empty page is a normal result.
pub struct FeedService {
    posts: Arc<dyn PostRepository>,
}

impl FeedService {
    pub fn new(posts: Arc<dyn PostRepository>) -> Self {
        Self { posts }
    }

    pub async fn query(
        &self,
        scope: FeedScope,
        sort: FeedSort,
        limit: u32,
        page: u32,
    ) -> Result<Vec<PostSummary>> {
        let query = FeedQuery::new(scope, sort, limit, page)?;
        self.run(&query).await
    }

    pub async fn run(&self, query: &FeedQuery) -> Result<Vec<PostSummary>> {
        let start = Instant::now();
        let posts = self.posts.list(query).await?;
        metrics::record_feed_query(query.sort.as_str(), start.elapsed());

        tracing::debug!(
            scope = ?query.scope,
            sort = query.sort.as_str(),
            limit = query.limit,
            page = query.page,
            returned = posts.len(),
            "feed query"
        );

        Ok(posts.into_iter().map(PostSummary::from).collect())
    }
}
