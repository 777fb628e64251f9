/// Database access layer for post-service
///
/// - `post_repo`: post persistence and feed listing
/// - `community_repo`: community existence checks
pub mod community_repo;
pub mod post_repo;

pub use community_repo::{CommunityDirectory, PgCommunityDirectory};
pub use post_repo::{PgPostRepository, PostRepository};
