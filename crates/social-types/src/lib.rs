pub mod api;
pub mod models;

/// Longest username accepted at registration and login, in characters.
pub const USERNAME_MAX_LEN: usize = 50;
