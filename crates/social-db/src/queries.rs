use std::ffi::c_int;

use chrono::Utc;
use rusqlite::{Row, ffi, params};

use crate::models::{FeedRow, PostRow, UserRow};
use crate::{Database, Store, StoreError};

impl Store for Database {
    // -- Users --

    fn list_users(&self) -> Result<Vec<UserRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, password_hash, created_at
                 FROM users
                 ORDER BY created_at DESC, id DESC",
            )?;

            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    fn create_user(&self, username: &str, password_hash: &str) -> Result<i64, StoreError> {
        let now = Utc::now();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
                params![username, password_hash, now],
            )
            .map_err(|e| {
                if violates(&e, ffi::SQLITE_CONSTRAINT_UNIQUE) {
                    StoreError::DuplicateUsername
                } else {
                    e.into()
                }
            })?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn get_user_by_name(&self, username: &str) -> Result<UserRow, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, password_hash, created_at FROM users WHERE username = ?1",
                [username],
                user_from_row,
            )
            .or_not_found()
        })
    }

    fn get_user_by_id(&self, id: i64) -> Result<UserRow, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, password_hash, created_at FROM users WHERE id = ?1",
                [id],
                user_from_row,
            )
            .or_not_found()
        })
    }

    fn delete_user(&self, id: i64) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            // posts go with the user via ON DELETE CASCADE
            let removed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            if removed == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
    }

    // -- Posts --

    fn create_post(&self, author_id: i64, content: &str) -> Result<i64, StoreError> {
        let now = Utc::now();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO posts (content, author_id, created_at) VALUES (?1, ?2, ?3)",
                params![content, author_id, now],
            )
            .map_err(|e| {
                if violates(&e, ffi::SQLITE_CONSTRAINT_FOREIGNKEY) {
                    StoreError::NotFound
                } else {
                    e.into()
                }
            })?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn posts_by_author(&self, author_id: i64) -> Result<Vec<PostRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, content, author_id, created_at
                 FROM posts
                 WHERE author_id = ?1
                 ORDER BY created_at DESC, id DESC",
            )?;

            let rows = stmt
                .query_map([author_id], |row| {
                    Ok(PostRow {
                        id: row.get(0)?,
                        content: row.get(1)?,
                        author_id: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    fn latest_posts(&self, limit: u32) -> Result<Vec<FeedRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.content, p.author_id, u.username, p.created_at
                 FROM posts p
                 JOIN users u ON p.author_id = u.id
                 ORDER BY p.created_at DESC, p.id DESC
                 LIMIT ?1",
            )?;

            let rows = stmt
                .query_map([limit], |row| {
                    Ok(FeedRow {
                        id: row.get(0)?,
                        content: row.get(1)?,
                        author_id: row.get(2)?,
                        author_username: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    fn delete_post(&self, post_id: i64, author_id: i64) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM posts WHERE id = ?1 AND author_id = ?2",
                [post_id, author_id],
            )?;
            if removed == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// True when `err` is a constraint failure with the given extended code.
fn violates(err: &rusqlite::Error, extended_code: c_int) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.extended_code == extended_code)
}

/// Maps an empty single-row result to `StoreError::NotFound`.
trait NotFoundExt<T> {
    fn or_not_found(self) -> Result<T, StoreError>;
}

impl<T> NotFoundExt<T> for std::result::Result<T, rusqlite::Error> {
    fn or_not_found(self) -> Result<T, StoreError> {
        match self {
            Ok(val) => Ok(val),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}
