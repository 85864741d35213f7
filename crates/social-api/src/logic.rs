use std::sync::Arc;

use tracing::{info, warn};

use social_auth::{HashError, Hasher, IssuedToken, TokenService};
use social_db::{Store, StoreError};
use social_types::USERNAME_MAX_LEN;
use social_types::api::Identity;
use social_types::models::{FeedEntry, Post, Profile, User};

use crate::error::AppError;

/// How many posts the front page shows.
pub const LATEST_POSTS_LIMIT: u32 = 5;

/// Registration, login and the post/profile workflows on top of a store,
/// a password hasher and the session token service.
///
/// All methods block (SQLite, argon2); handlers call them from
/// `spawn_blocking`.
pub struct Logic {
    store: Arc<dyn Store>,
    hasher: Hasher,
    tokens: TokenService,
    dummy_hash: String,
}

impl Logic {
    /// Hashes a throwaway password up front so logins for unknown users
    /// have a real hash to verify against.
    pub fn new(
        store: Arc<dyn Store>,
        hasher: Hasher,
        tokens: TokenService,
    ) -> Result<Self, HashError> {
        let dummy_hash = hasher.hash("dummy-password")?;
        Ok(Self {
            store,
            hasher,
            tokens,
            dummy_hash,
        })
    }

    // -- Accounts --

    pub fn register(&self, username: &str, password: &str) -> Result<i64, AppError> {
        check_credentials(username, password)?;

        let password_hash = self
            .hasher
            .hash(password)
            .map_err(|e| AppError::internal("hash password", e))?;

        match self.store.create_user(username, &password_hash) {
            Ok(id) => {
                info!("Registered {} ({})", username, id);
                Ok(id)
            }
            Err(StoreError::DuplicateUsername) => Err(AppError::DuplicateUsername),
            Err(e) => Err(AppError::internal("create user", e)),
        }
    }

    /// Unknown usernames and wrong passwords both come back as
    /// `InvalidCredentials`, and both pay for one hash verification.
    pub fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AppError> {
        check_credentials(username, password)?;

        let user = match self.store.get_user_by_name(username) {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                self.verify_against_dummy(password);
                warn!("Login rejected");
                return Err(AppError::InvalidCredentials);
            }
            Err(e) => return Err(AppError::internal("look up user", e)),
        };

        if !self.hasher.verify(&user.password_hash, password) {
            warn!("Login rejected");
            return Err(AppError::InvalidCredentials);
        }

        let issued = self
            .tokens
            .issue(user.id, &user.username)
            .map_err(|e| AppError::internal("issue token", e))?;

        info!("{} ({}) logged in", user.username, user.id);
        Ok(issued)
    }

    /// Resolves a session token to the caller's identity.
    pub fn authenticate(&self, token: &str) -> Result<Identity, AppError> {
        self.tokens
            .validate(token)
            .map(Identity::from)
            .map_err(|_| AppError::InvalidToken)
    }

    pub fn users(&self) -> Result<Vec<User>, AppError> {
        let rows = self.store.list_users()?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Removes the caller's account together with their posts. Their
    /// session token stays valid until expiry but resolves to nobody.
    pub fn delete_account(&self, who: &Identity) -> Result<(), AppError> {
        self.store.delete_user(who.id)?;
        info!("Deleted account {} ({})", who.username, who.id);
        Ok(())
    }

    // -- Posts --

    /// `NotFound` if the account was deleted while the session lived on.
    pub fn create_post(&self, who: &Identity, content: &str) -> Result<i64, AppError> {
        let id = self.store.create_post(who.id, content)?;
        info!("{} posted {}", who.username, id);
        Ok(id)
    }

    pub fn delete_post(&self, who: &Identity, post_id: i64) -> Result<(), AppError> {
        self.store.delete_post(post_id, who.id)?;
        Ok(())
    }

    /// The caller's own posts, newest first. `NotFound` once the account
    /// is gone.
    pub fn feed(&self, who: &Identity) -> Result<Vec<Post>, AppError> {
        let user = self.store.get_user_by_id(who.id)?;
        let rows = self.store.posts_by_author(user.id)?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    pub fn profile(&self, username: &str) -> Result<Profile, AppError> {
        let user = self.store.get_user_by_name(username)?;
        let posts = self.store.posts_by_author(user.id)?;
        Ok(Profile {
            user: user.into(),
            posts: posts.into_iter().map(Post::from).collect(),
        })
    }

    pub fn latest_posts(&self) -> Result<Vec<FeedEntry>, AppError> {
        let rows = self.store.latest_posts(LATEST_POSTS_LIMIT)?;
        Ok(rows.into_iter().map(FeedEntry::from).collect())
    }

    fn verify_against_dummy(&self, password: &str) {
        let _ = self.hasher.verify(&self.dummy_hash, password);
    }
}

fn check_credentials(username: &str, password: &str) -> Result<(), AppError> {
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(AppError::Validation(format!(
            "username must be at most {} characters",
            USERNAME_MAX_LEN
        )));
    }
    if password.is_empty() {
        return Err(AppError::Validation("password must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use social_db::{Database, MemoryStore};

    fn logic_with(store: Arc<dyn Store>) -> Logic {
        Logic::new(
            store,
            Hasher::with_params(1024, 1, 1).unwrap(),
            TokenService::new("test-secret"),
        )
        .unwrap()
    }

    fn stores() -> Vec<(&'static str, Arc<dyn Store>)> {
        vec![
            ("memory", Arc::new(MemoryStore::new()) as Arc<dyn Store>),
            (
                "sqlite",
                Arc::new(Database::open_in_memory().unwrap()) as Arc<dyn Store>,
            ),
        ]
    }

    #[test]
    fn alice_scenario() {
        for (name, store) in stores() {
            let logic = logic_with(store.clone());

            logic.register("alice", "secret1").unwrap();
            let issued = logic.login("alice", "secret1").unwrap();
            let who = logic.authenticate(&issued.token).unwrap();
            assert_eq!(who.username, "alice", "{name}");

            assert!(
                matches!(
                    logic.login("alice", "wrong"),
                    Err(AppError::InvalidCredentials)
                ),
                "{name}"
            );
            assert!(
                matches!(
                    logic.register("alice", "anything"),
                    Err(AppError::DuplicateUsername)
                ),
                "{name}"
            );
            assert_eq!(store.list_users().unwrap().len(), 1, "{name}");
        }
    }

    #[test]
    fn register_then_login_for_edge_usernames() {
        let logic = logic_with(Arc::new(MemoryStore::new()));
        let fifty = "é".repeat(USERNAME_MAX_LEN);
        for username in ["", "a", "with space", "Ünïcödé", fifty.as_str()] {
            logic.register(username, "pw").unwrap();
            let issued = logic.login(username, "pw").unwrap();
            assert_eq!(
                logic.authenticate(&issued.token).unwrap().username,
                username
            );
        }
    }

    #[test]
    fn unknown_user_and_wrong_password_look_the_same() {
        let logic = logic_with(Arc::new(MemoryStore::new()));
        logic.register("alice", "secret1").unwrap();

        let unknown = logic.login("mallory", "secret1").unwrap_err();
        let wrong = logic.login("alice", "nope").unwrap_err();
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.status(), wrong.status());
    }

    #[test]
    fn rejects_bad_input_shape() {
        let logic = logic_with(Arc::new(MemoryStore::new()));
        let long = "x".repeat(USERNAME_MAX_LEN + 1);

        assert!(matches!(
            logic.register(&long, "pw"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            logic.register("alice", ""),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            logic.login(&long, "pw"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            logic.login("alice", ""),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn unknown_user_login_verifies_against_a_real_hash() {
        let logic = logic_with(Arc::new(MemoryStore::new()));
        assert!(logic.dummy_hash.starts_with("$argon2id$"));
        assert!(logic.hasher.verify(&logic.dummy_hash, "dummy-password"));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let logic = logic_with(Arc::new(MemoryStore::new()));
        assert!(matches!(
            logic.authenticate("not.a.token"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn posts_feed_and_profile() {
        let logic = logic_with(Arc::new(Database::open_in_memory().unwrap()));
        let alice_id = logic.register("alice", "pw").unwrap();
        logic.register("bob", "pw").unwrap();
        let alice = logic
            .authenticate(&logic.login("alice", "pw").unwrap().token)
            .unwrap();
        let bob = logic
            .authenticate(&logic.login("bob", "pw").unwrap().token)
            .unwrap();
        assert_eq!(alice.id, alice_id);

        logic.create_post(&alice, "first").unwrap();
        let second = logic.create_post(&alice, "second").unwrap();
        logic.create_post(&bob, "hi from bob").unwrap();

        let feed = logic.feed(&alice).unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].content, "second");

        let profile = logic.profile("alice").unwrap();
        assert_eq!(profile.user.username, "alice");
        assert_eq!(profile.posts, feed);

        let latest = logic.latest_posts().unwrap();
        assert_eq!(latest[0].author, "bob");
        assert_eq!(latest.len(), 3);

        assert!(matches!(
            logic.delete_post(&bob, second),
            Err(AppError::NotFound)
        ));
        logic.delete_post(&alice, second).unwrap();
        assert_eq!(logic.feed(&alice).unwrap().len(), 1);

        assert!(matches!(logic.profile("carol"), Err(AppError::NotFound)));
    }

    #[test]
    fn deleted_account_cannot_post_or_log_in() {
        let logic = logic_with(Arc::new(MemoryStore::new()));
        logic.register("alice", "pw").unwrap();
        let alice = logic
            .authenticate(&logic.login("alice", "pw").unwrap().token)
            .unwrap();

        logic.delete_account(&alice).unwrap();
        assert!(matches!(
            logic.delete_account(&alice),
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            logic.create_post(&alice, "ghost"),
            Err(AppError::NotFound)
        ));
        assert!(matches!(logic.feed(&alice), Err(AppError::NotFound)));
        assert!(matches!(
            logic.login("alice", "pw"),
            Err(AppError::InvalidCredentials)
        ));
        assert!(logic.users().unwrap().is_empty());
    }
}
