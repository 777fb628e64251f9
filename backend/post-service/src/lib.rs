/// Post Service Library
///
/// Handles community posts and feeds for the forum backend: creating,
/// editing and deleting text, link and image posts, and listing them
/// sorted by recency, score or comment count.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route registration
/// - `models`: Post, content and feed query types
/// - `services`: Content resolution, post lifecycle, feed queries
/// - `db`: Repository traits and their PostgreSQL implementations
/// - `storage`: Image file storage
/// - `middleware`: JWT authentication, ownership checks, request metrics
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;
pub mod storage;

pub use config::Config;
pub use error::{AppError, Result};
