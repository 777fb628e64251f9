/// HTTP handlers for post-related endpoints
///
/// This module contains handlers for:
/// - Posts: create, read, edit and delete text, link and image posts
/// - Feed: community and global listings
pub mod feed;
pub mod form;
pub mod posts;

use actix_web::web;

// Re-export handler functions at module level
pub use feed::{get_community_feed, get_global_feed, FeedHandlerState};
pub use posts::{create_post, delete_post, edit_post, get_post, PostHandlerState};

/// Registers the post and feed routes. Mount under `/api/v1` behind
/// `JwtAuthMiddleware`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/communities/{community_id}/posts")
            .route(web::get().to(get_community_feed))
            .route(web::post().to(create_post)),
    )
    .service(web::resource("/posts").route(web::get().to(get_global_feed)))
    .service(
        web::resource("/posts/{post_id}")
            .route(web::get().to(get_post))
            .route(web::patch().to(edit_post))
            .route(web::delete().to(delete_post)),
    );
}
