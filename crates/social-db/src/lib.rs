pub mod error;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod queries;

#[cfg(test)]
mod store_tests;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use models::{FeedRow, PostRow, UserRow};

use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Persistence boundary for users and posts.
///
/// Every call commits on its own; nothing spans two calls, so a workflow
/// like "create a user, then post as them" is not atomic.
pub trait Store: Send + Sync {
    // -- Users --

    /// All users, newest first.
    fn list_users(&self) -> Result<Vec<UserRow>, StoreError>;

    /// Inserts a user and returns its id. Fails with `DuplicateUsername`
    /// when the name is already registered.
    fn create_user(&self, username: &str, password_hash: &str) -> Result<i64, StoreError>;

    /// Exact, case-sensitive match.
    fn get_user_by_name(&self, username: &str) -> Result<UserRow, StoreError>;

    fn get_user_by_id(&self, id: i64) -> Result<UserRow, StoreError>;

    /// Removes the user and all of their posts. `NotFound` when no row was removed.
    fn delete_user(&self, id: i64) -> Result<(), StoreError>;

    // -- Posts --

    /// `NotFound` when the author does not exist.
    fn create_post(&self, author_id: i64, content: &str) -> Result<i64, StoreError>;

    /// Posts by one author, newest first.
    fn posts_by_author(&self, author_id: i64) -> Result<Vec<PostRow>, StoreError>;

    /// Newest posts across all authors, joined with the author's username.
    fn latest_posts(&self, limit: u32) -> Result<Vec<FeedRow>, StoreError>;

    /// Deletes a post only if `author_id` wrote it; otherwise `NotFound`.
    fn delete_post(&self, post_id: i64, author_id: i64) -> Result<(), StoreError>;
}

/// SQLite-backed store with a reader/writer split: one writer connection and
/// a fixed pool of read-only connections, picked round-robin.
pub struct Database {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
}

impl Database {
    /// Opens (or creates) the database file and runs migrations. `readers`
    /// read-only connections are opened next to the writer; with zero,
    /// reads share the writer connection.
    pub fn open(path: &Path, readers: usize) -> Result<Self, StoreError> {
        let writer = Connection::open(path)?;

        // WAL mode for concurrent reads
        writer.pragma_update(None, "journal_mode", "WAL")?;
        writer.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&writer)?;

        let mut pool = Vec::with_capacity(readers);
        for _ in 0..readers {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            pool.push(Mutex::new(conn));
        }

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            readers
        );
        Ok(Self {
            writer: Mutex::new(writer),
            readers: pool,
            reader_idx: AtomicUsize::new(0),
        })
    }

    /// Private in-memory database; all access goes through the writer.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let writer = Connection::open_in_memory()?;
        writer.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            reader_idx: AtomicUsize::new(0),
        })
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        if self.readers.is_empty() {
            return self.with_conn_mut(f);
        }

        let idx = self.reader_idx.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[idx]
            .lock()
            .map_err(|_| StoreError::Poisoned)?;
        f(&conn)
    }

    pub(crate) fn with_conn_mut<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.writer.lock().map_err(|_| StoreError::Poisoned)?;
        f(&conn)
    }
}
