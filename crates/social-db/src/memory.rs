use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::models::{FeedRow, PostRow, UserRow};
use crate::{Store, StoreError};

/// In-process store for tests and throwaway instances.
///
/// All state sits behind one `RwLock`: every mutation holds the write lock
/// for its whole duration, readers share the read lock and clone what they
/// return before releasing it.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    users: BTreeMap<i64, UserRow>,
    by_name: HashMap<String, i64>,
    posts: Vec<PostRow>,
    last_user_id: i64,
    last_post_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Store for MemoryStore {
    fn list_users(&self) -> Result<Vec<UserRow>, StoreError> {
        let mut users: Vec<UserRow> = self.read()?.users.values().cloned().collect();
        users.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(users)
    }

    fn create_user(&self, username: &str, password_hash: &str) -> Result<i64, StoreError> {
        let mut state = self.write()?;
        if state.by_name.contains_key(username) {
            return Err(StoreError::DuplicateUsername);
        }

        state.last_user_id += 1;
        let id = state.last_user_id;
        state.by_name.insert(username.to_string(), id);
        state.users.insert(
            id,
            UserRow {
                id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    fn get_user_by_name(&self, username: &str) -> Result<UserRow, StoreError> {
        let state = self.read()?;
        state
            .by_name
            .get(username)
            .and_then(|id| state.users.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn get_user_by_id(&self, id: i64) -> Result<UserRow, StoreError> {
        self.read()?
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn delete_user(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let user = state.users.remove(&id).ok_or(StoreError::NotFound)?;
        state.by_name.remove(&user.username);
        state.posts.retain(|p| p.author_id != id);
        Ok(())
    }

    fn create_post(&self, author_id: i64, content: &str) -> Result<i64, StoreError> {
        let mut state = self.write()?;
        if !state.users.contains_key(&author_id) {
            return Err(StoreError::NotFound);
        }

        state.last_post_id += 1;
        let id = state.last_post_id;
        state.posts.push(PostRow {
            id,
            content: content.to_string(),
            author_id,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    fn posts_by_author(&self, author_id: i64) -> Result<Vec<PostRow>, StoreError> {
        let mut posts: Vec<PostRow> = self
            .read()?
            .posts
            .iter()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(posts)
    }

    fn latest_posts(&self, limit: u32) -> Result<Vec<FeedRow>, StoreError> {
        let state = self.read()?;
        let mut posts: Vec<&PostRow> = state.posts.iter().collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let rows = posts
            .into_iter()
            .filter_map(|p| {
                let author = state.users.get(&p.author_id)?;
                Some(FeedRow {
                    id: p.id,
                    content: p.content.clone(),
                    author_id: p.author_id,
                    author_username: author.username.clone(),
                    created_at: p.created_at,
                })
            })
            .take(limit as usize)
            .collect();
        Ok(rows)
    }

    fn delete_post(&self, post_id: i64, author_id: i64) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let idx = state
            .posts
            .iter()
            .position(|p| p.id == post_id && p.author_id == author_id)
            .ok_or(StoreError::NotFound)?;
        state.posts.remove(idx);
        Ok(())
    }
}
