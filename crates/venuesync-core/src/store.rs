//! Storage seam for the importer: posts looked up by title plus a key/value
//! metadata table, as laid out by the CMS.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{ImportError, Result};

pub type PostId = u64;
pub type MetaId = u64;

#[async_trait]
pub trait VenueStore: Send + Sync {
    /// Resolves the post whose title matches exactly.
    async fn find_post_id(&self, title: &str) -> Result<Option<PostId>>;

    async fn find_meta(&self, post_id: PostId, key: &str) -> Result<Option<MetaId>>;
    async fn update_meta(&self, meta_id: MetaId, value: &str) -> Result<()>;
    async fn insert_meta(&self, post_id: PostId, key: &str, value: &str) -> Result<MetaId>;

    async fn fetch_post_content(&self, post_id: PostId) -> Result<Option<String>>;
    async fn update_post_content(&self, post_id: PostId, content: &str) -> Result<()>;

    /// Releases the underlying connection. Called once per run.
    async fn close(&self);
}

#[derive(Debug, Clone)]
struct MemoryPost {
    title: String,
    content: String,
}

#[derive(Debug, Clone)]
struct MemoryMeta {
    post_id: PostId,
    key: String,
    value: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    posts: BTreeMap<PostId, MemoryPost>,
    meta: BTreeMap<MetaId, MemoryMeta>,
    next_post_id: PostId,
    next_meta_id: MetaId,
    failing: bool,
    closed: bool,
}

/// Process-local store used by tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_post(&self, title: &str, content: &str) -> PostId {
        let mut state = self.lock();
        state.next_post_id += 1;
        let id = state.next_post_id;
        state.posts.insert(
            id,
            MemoryPost {
                title: title.to_string(),
                content: content.to_string(),
            },
        );
        id
    }

    /// Makes every subsequent write fail, to exercise error propagation.
    pub fn fail_writes(&self, failing: bool) {
        self.lock().failing = failing;
    }

    pub fn meta_value(&self, post_id: PostId, key: &str) -> Option<String> {
        self.lock()
            .meta
            .values()
            .find(|meta| meta.post_id == post_id && meta.key == key)
            .map(|meta| meta.value.clone())
    }

    pub fn meta_count(&self) -> usize {
        self.lock().meta.len()
    }

    pub fn content(&self, post_id: PostId) -> Option<String> {
        self.lock().posts.get(&post_id).map(|post| post.content.clone())
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test panicked mid-write; the data is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn writable(&self) -> Result<MutexGuard<'_, MemoryState>> {
        let state = self.lock();
        if state.failing {
            return Err(ImportError::Store("in-memory store rejected write".to_string()));
        }
        Ok(state)
    }
}

#[async_trait]
impl VenueStore for InMemoryStore {
    async fn find_post_id(&self, title: &str) -> Result<Option<PostId>> {
        Ok(self
            .lock()
            .posts
            .iter()
            .find(|(_, post)| post.title == title)
            .map(|(id, _)| *id))
    }

    async fn find_meta(&self, post_id: PostId, key: &str) -> Result<Option<MetaId>> {
        Ok(self
            .lock()
            .meta
            .iter()
            .find(|(_, meta)| meta.post_id == post_id && meta.key == key)
            .map(|(id, _)| *id))
    }

    async fn update_meta(&self, meta_id: MetaId, value: &str) -> Result<()> {
        let mut state = self.writable()?;
        let meta = state
            .meta
            .get_mut(&meta_id)
            .ok_or_else(|| ImportError::Store(format!("meta row {meta_id} does not exist")))?;
        meta.value = value.to_string();
        Ok(())
    }

    async fn insert_meta(&self, post_id: PostId, key: &str, value: &str) -> Result<MetaId> {
        let mut state = self.writable()?;
        state.next_meta_id += 1;
        let id = state.next_meta_id;
        state.meta.insert(
            id,
            MemoryMeta {
                post_id,
                key: key.to_string(),
                value: value.to_string(),
            },
        );
        Ok(id)
    }

    async fn fetch_post_content(&self, post_id: PostId) -> Result<Option<String>> {
        Ok(self.content(post_id))
    }

    async fn update_post_content(&self, post_id: PostId, content: &str) -> Result<()> {
        let mut state = self.writable()?;
        let post = state
            .posts
            .get_mut(&post_id)
            .ok_or_else(|| ImportError::Store(format!("post {post_id} does not exist")))?;
        post.content = content.to_string();
        Ok(())
    }

    async fn close(&self) {
        self.lock().closed = true;
    }
}
