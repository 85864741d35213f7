//! Behaviour shared by every `Store` implementation, run against each.

use crate::{Database, MemoryStore, Store, StoreError};

fn creates_and_looks_up_users(store: &dyn Store) {
    let id = store.create_user("alice", "hash-a").unwrap();
    let user = store.get_user_by_name("alice").unwrap();
    assert_eq!(user.id, id);
    assert_eq!(user.username, "alice");
    assert_eq!(user.password_hash, "hash-a");
    assert_eq!(store.get_user_by_id(id).unwrap(), user);
}

fn rejects_duplicate_usernames(store: &dyn Store) {
    store.create_user("alice", "hash-a").unwrap();
    let err = store.create_user("alice", "hash-b").unwrap_err();
    assert!(matches!(err, StoreError::DuplicateUsername));

    let users = store.list_users().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].password_hash, "hash-a");
}

fn lookups_are_case_sensitive(store: &dyn Store) {
    store.create_user("Alice", "hash").unwrap();
    assert!(matches!(
        store.get_user_by_name("alice"),
        Err(StoreError::NotFound)
    ));
    // a different case is a different user
    store.create_user("alice", "hash").unwrap();
}

fn missing_user_is_not_found(store: &dyn Store) {
    assert!(matches!(
        store.get_user_by_name("nobody"),
        Err(StoreError::NotFound)
    ));
    assert!(matches!(store.get_user_by_id(42), Err(StoreError::NotFound)));
}

fn lists_users_newest_first(store: &dyn Store) {
    let a = store.create_user("a", "h").unwrap();
    let b = store.create_user("b", "h").unwrap();
    let c = store.create_user("c", "h").unwrap();

    let ids: Vec<i64> = store.list_users().unwrap().iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![c, b, a]);
}

fn deletes_exactly_once(store: &dyn Store) {
    let id = store.create_user("alice", "hash").unwrap();
    store.delete_user(id).unwrap();
    assert!(matches!(store.delete_user(id), Err(StoreError::NotFound)));
    assert!(matches!(
        store.get_user_by_name("alice"),
        Err(StoreError::NotFound)
    ));
    // the name is free again
    store.create_user("alice", "hash").unwrap();
}

fn deleting_a_user_removes_their_posts(store: &dyn Store) {
    let alice = store.create_user("alice", "h").unwrap();
    let bob = store.create_user("bob", "h").unwrap();
    store.create_post(alice, "from alice").unwrap();
    store.create_post(bob, "from bob").unwrap();

    store.delete_user(alice).unwrap();

    assert!(store.posts_by_author(alice).unwrap().is_empty());
    let latest = store.latest_posts(10).unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].author_username, "bob");
}

fn posts_come_back_newest_first(store: &dyn Store) {
    let alice = store.create_user("alice", "h").unwrap();
    let first = store.create_post(alice, "first").unwrap();
    let second = store.create_post(alice, "second").unwrap();

    let posts = store.posts_by_author(alice).unwrap();
    assert_eq!(
        posts.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![second, first]
    );
    assert_eq!(posts[0].content, "second");
    assert_eq!(posts[0].author_id, alice);
}

fn post_for_missing_author_is_not_found(store: &dyn Store) {
    assert!(matches!(
        store.create_post(99, "orphan"),
        Err(StoreError::NotFound)
    ));
}

fn latest_posts_joins_authors_and_limits(store: &dyn Store) {
    let alice = store.create_user("alice", "h").unwrap();
    let bob = store.create_user("bob", "h").unwrap();
    for i in 0..4 {
        store.create_post(alice, &format!("a{i}")).unwrap();
        store.create_post(bob, &format!("b{i}")).unwrap();
    }

    let latest = store.latest_posts(5).unwrap();
    assert_eq!(latest.len(), 5);
    assert_eq!(latest[0].content, "b3");
    assert_eq!(latest[0].author_username, "bob");
    assert_eq!(latest[1].content, "a3");
    assert_eq!(latest[1].author_username, "alice");
}

fn only_the_author_deletes_a_post(store: &dyn Store) {
    let alice = store.create_user("alice", "h").unwrap();
    let bob = store.create_user("bob", "h").unwrap();
    let post = store.create_post(alice, "mine").unwrap();

    assert!(matches!(
        store.delete_post(post, bob),
        Err(StoreError::NotFound)
    ));
    store.delete_post(post, alice).unwrap();
    assert!(matches!(
        store.delete_post(post, alice),
        Err(StoreError::NotFound)
    ));
}

const CASES: &[(&str, fn(&dyn Store))] = &[
    ("creates_and_looks_up_users", creates_and_looks_up_users),
    ("rejects_duplicate_usernames", rejects_duplicate_usernames),
    ("lookups_are_case_sensitive", lookups_are_case_sensitive),
    ("missing_user_is_not_found", missing_user_is_not_found),
    ("lists_users_newest_first", lists_users_newest_first),
    ("deletes_exactly_once", deletes_exactly_once),
    (
        "deleting_a_user_removes_their_posts",
        deleting_a_user_removes_their_posts,
    ),
    ("posts_come_back_newest_first", posts_come_back_newest_first),
    (
        "post_for_missing_author_is_not_found",
        post_for_missing_author_is_not_found,
    ),
    (
        "latest_posts_joins_authors_and_limits",
        latest_posts_joins_authors_and_limits,
    ),
    ("only_the_author_deletes_a_post", only_the_author_deletes_a_post),
];

#[test]
fn sqlite_store() {
    for &(name, case) in CASES {
        let db = Database::open_in_memory().unwrap();
        eprintln!("sqlite: {name}");
        case(&db);
    }
}

#[test]
fn memory_store() {
    for &(name, case) in CASES {
        let store = MemoryStore::new();
        eprintln!("memory: {name}");
        case(&store);
    }
}

#[test]
fn file_database_reads_through_reader_pool() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("social.db");

    let db = Database::open(&path, 2).unwrap();
    let id = db.create_user("alice", "hash").unwrap();
    db.create_post(id, "hello").unwrap();

    // round-robin across both readers
    for _ in 0..4 {
        assert_eq!(db.get_user_by_name("alice").unwrap().id, id);
        assert_eq!(db.posts_by_author(id).unwrap().len(), 1);
    }
    drop(db);

    let reopened = Database::open(&path, 1).unwrap();
    assert_eq!(reopened.list_users().unwrap().len(), 1);
}

#[test]
fn file_database_handles_concurrent_writers_and_readers() {
    use std::sync::Arc;
    use std::thread;

    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(Database::open(&dir.path().join("social.db"), 4).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                let name = format!("user{i}");
                let id = db.create_user(&name, "h").unwrap();
                for round in 0..10 {
                    db.create_post(id, &format!("post {round}")).unwrap();
                    assert_eq!(db.get_user_by_name(&name).unwrap().id, id);
                    assert!(!db.latest_posts(5).unwrap().is_empty());
                }
                id
            })
        })
        .collect();
    let ids: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(db.list_users().unwrap().len(), 8);
    for id in ids {
        let posts = db.posts_by_author(id).unwrap();
        assert_eq!(posts.len(), 10);
        assert_eq!(posts[0].content, "post 9");
    }
    assert_eq!(db.latest_posts(100).unwrap().len(), 80);
}

#[test]
fn memory_store_is_shareable_across_threads() {
    use std::sync::Arc;
    use std::thread;

    let store = Arc::new(MemoryStore::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let id = store.create_user(&format!("user{i}"), "h").unwrap();
                store.create_post(id, "hi").unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(store.list_users().unwrap().len(), 8);
    assert_eq!(store.latest_posts(100).unwrap().len(), 8);
}
