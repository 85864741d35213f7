//! Row types as stored. Distinct from the `social-types` API models so the
//! password hash stays inside the store layer unless asked for.

use chrono::{DateTime, Utc};
use social_types::models::{FeedEntry, Post, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRow {
    pub id: i64,
    pub content: String,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRow {
    pub id: i64,
    pub content: String,
    pub author_id: i64,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            created_at: row.created_at,
        }
    }
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            author_id: row.author_id,
            created_at: row.created_at,
        }
    }
}

impl From<FeedRow> for FeedEntry {
    fn from(row: FeedRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            author_id: row.author_id,
            author: row.author_username,
            created_at: row.created_at,
        }
    }
}
