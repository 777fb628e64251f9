//! In-memory collaborators for integration tests.
//!
//! The repository and file storage share one event log so tests can check
//! the order in which record mutations and file removals happened.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use post_service::db::{CommunityDirectory, PostRepository};
use post_service::error::{AppError, Result};
use post_service::models::{
    ContentPayload, FeedQuery, FeedScope, FeedSort, FileRef, ImageUpload, NewPost, Post,
    PostContent, PostUpdate,
};
use post_service::services::{ContentResolver, FeedService, PostService};
use post_service::storage::FileStorage;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Inserted(Uuid),
    Updated { post_id: Uuid, file: Option<FileRef> },
    Removed(Uuid),
    FileStored(FileRef),
    FileDeleted(FileRef),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

struct StoredPost {
    post: Post,
    removed: bool,
}

/// Post repository backed by a vector, with a clock that advances one
/// second per insert so creation order is strict.
pub struct InMemoryPostRepository {
    posts: Mutex<Vec<StoredPost>>,
    clock: Mutex<DateTime<Utc>>,
    events: EventLog,
}

impl InMemoryPostRepository {
    pub fn new(events: EventLog) -> Self {
        Self {
            posts: Mutex::new(Vec::new()),
            clock: Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            events,
        }
    }

    /// Store a post as-is, bypassing the service.
    pub fn seed(&self, post: Post) {
        self.posts.lock().unwrap().push(StoredPost {
            post,
            removed: false,
        });
    }

    /// Raw stored record, including removed ones.
    pub fn raw(&self, post_id: Uuid) -> Option<Post> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .find(|stored| stored.post.id == post_id)
            .map(|stored| stored.post.clone())
    }

    fn tick(&self) -> DateTime<Utc> {
        let mut clock = self.clock.lock().unwrap();
        *clock = *clock + Duration::seconds(1);
        *clock
    }

    fn log(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn insert(&self, new_post: NewPost) -> Result<Post> {
        let now = self.tick();
        let post = Post {
            id: Uuid::new_v4(),
            title: new_post.title,
            content: new_post.content,
            author_id: new_post.author_id,
            community_id: new_post.community_id,
            comment_count: 0,
            score: 0,
            created_at: now,
            updated_at: now,
        };
        self.seed(post.clone());
        self.log(Event::Inserted(post.id));
        Ok(post)
    }

    async fn find_by_id(&self, post_id: Uuid) -> Result<Option<Post>> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|stored| stored.post.id == post_id && !stored.removed)
            .map(|stored| stored.post.clone()))
    }

    async fn update_owned(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        update: PostUpdate,
    ) -> Result<Option<Post>> {
        let updated = {
            let mut posts = self.posts.lock().unwrap();
            let stored = posts.iter_mut().find(|stored| {
                stored.post.id == post_id
                    && stored.post.author_id == author_id
                    && stored.post.post_type() == update.content.post_type()
                    && !stored.removed
            });
            match stored {
                Some(stored) => {
                    stored.post.title = update.title;
                    stored.post.content = update.content;
                    stored.post.updated_at = Utc::now();
                    Some(stored.post.clone())
                }
                None => None,
            }
        };

        if let Some(post) = &updated {
            self.log(Event::Updated {
                post_id,
                file: post.content.file().cloned(),
            });
        }
        Ok(updated)
    }

    async fn delete_owned(&self, post_id: Uuid, author_id: Uuid) -> Result<Option<Post>> {
        let removed = {
            let mut posts = self.posts.lock().unwrap();
            let stored = posts.iter_mut().find(|stored| {
                stored.post.id == post_id && stored.post.author_id == author_id && !stored.removed
            });
            match stored {
                Some(stored) => {
                    stored.removed = true;
                    Some(stored.post.clone())
                }
                None => None,
            }
        };

        if removed.is_some() {
            self.log(Event::Removed(post_id));
        }
        Ok(removed)
    }

    async fn list(&self, query: &FeedQuery) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|stored| !stored.removed)
            .filter(|stored| match query.scope {
                FeedScope::Community(id) => stored.post.community_id == id,
                FeedScope::Global => true,
            })
            .map(|stored| stored.post.clone())
            .collect();

        posts.sort_by(|a, b| {
            let primary = match query.sort {
                FeedSort::New => std::cmp::Ordering::Equal,
                FeedSort::Top => b.score.cmp(&a.score),
                FeedSort::Comments => b.comment_count.cmp(&a.comment_count),
            };
            primary
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });

        Ok(posts
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect())
    }
}

/// File storage backed by a map. Deletes can be made to fail.
pub struct InMemoryFileStorage {
    files: Mutex<HashMap<FileRef, Vec<u8>>>,
    fail_deletes: Mutex<bool>,
    events: EventLog,
}

impl InMemoryFileStorage {
    pub fn new(events: EventLog) -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            fail_deletes: Mutex::new(false),
            events,
        }
    }

    pub fn fail_deletes(&self, fail: bool) {
        *self.fail_deletes.lock().unwrap() = fail;
    }

    pub fn contains(&self, file: &FileRef) -> bool {
        self.files.lock().unwrap().contains_key(file)
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    async fn store(&self, bytes: &[u8], content_type: &mime::Mime) -> Result<FileRef> {
        let file = FileRef(format!("images/{}.{}", Uuid::new_v4(), content_type.subtype()));
        self.files
            .lock()
            .unwrap()
            .insert(file.clone(), bytes.to_vec());
        self.events
            .lock()
            .unwrap()
            .push(Event::FileStored(file.clone()));
        Ok(file)
    }

    async fn read(&self, file: &FileRef) -> Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(file)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("file {}", file)))
    }

    async fn delete(&self, file: &FileRef) -> Result<()> {
        if *self.fail_deletes.lock().unwrap() {
            return Err(AppError::Storage(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only volume",
            )));
        }
        self.files.lock().unwrap().remove(file);
        self.events
            .lock()
            .unwrap()
            .push(Event::FileDeleted(file.clone()));
        Ok(())
    }
}

/// Community directory with a fixed set of communities.
pub struct StaticCommunityDirectory {
    ids: HashSet<Uuid>,
}

impl StaticCommunityDirectory {
    pub fn new(ids: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }
}

#[async_trait]
impl CommunityDirectory for StaticCommunityDirectory {
    async fn community_exists(&self, community_id: Uuid) -> Result<bool> {
        Ok(self.ids.contains(&community_id))
    }
}

/// Fully wired services over in-memory collaborators.
pub struct Harness {
    pub community_id: Uuid,
    pub events: EventLog,
    pub repo: Arc<InMemoryPostRepository>,
    pub storage: Arc<InMemoryFileStorage>,
    pub posts: Arc<PostService>,
    pub feed: Arc<FeedService>,
}

impl Harness {
    pub fn new() -> Self {
        let community_id = Uuid::new_v4();
        let events: EventLog = Arc::new(Mutex::new(Vec::new()));
        let repo = Arc::new(InMemoryPostRepository::new(events.clone()));
        let storage = Arc::new(InMemoryFileStorage::new(events.clone()));
        let communities = Arc::new(StaticCommunityDirectory::new([community_id]));

        let resolver = ContentResolver::new(storage.clone(), 1024 * 1024);
        let posts = Arc::new(PostService::new(repo.clone(), communities, resolver));
        let feed = Arc::new(FeedService::new(repo.clone()));

        Self {
            community_id,
            events,
            repo,
            storage,
            posts,
            feed,
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

pub fn text(body: &str) -> ContentPayload {
    ContentPayload {
        text: Some(body.to_string()),
        ..Default::default()
    }
}

pub fn link(url: &str) -> ContentPayload {
    ContentPayload {
        link_url: Some(url.to_string()),
        ..Default::default()
    }
}

pub fn jpeg(bytes: &[u8]) -> ContentPayload {
    ContentPayload {
        images: vec![ImageUpload {
            file_name: Some("test.jpg".to_string()),
            content_type: "image/jpeg".to_string(),
            bytes: bytes.to_vec(),
        }],
        ..Default::default()
    }
}

/// A text post with explicit counters and timestamp, for feed ordering tests.
pub fn seeded_post(
    community_id: Uuid,
    title: &str,
    score: i64,
    comment_count: i64,
    created_at: DateTime<Utc>,
) -> Post {
    Post {
        id: Uuid::new_v4(),
        title: title.to_string(),
        content: PostContent::Text {
            body: format!("{} body", title),
        },
        author_id: Uuid::new_v4(),
        community_id,
        comment_count,
        score,
        created_at,
        updated_at: created_at,
    }
}
