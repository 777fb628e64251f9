/// Business logic layer for post-service
///
/// This module provides high-level operations:
/// - Content resolution: typed content from raw request fields
/// - Post service: post creation, edits and removal
/// - Feed service: sorted, paginated listings
pub mod content;
pub mod feed;
pub mod posts;

// Re-export commonly used services
pub use content::ContentResolver;
pub use feed::FeedService;
pub use posts::PostService;
