//! Behavioral contract shared by every backend's tests.
//!
//! Callers seed the default roles/permissions and one application (id 1,
//! secret "test-secret") before running.

use sigil_core::{CredentialStore, StorageError};

pub(crate) async fn run_all(store: &dyn CredentialStore) {
    save_and_find_user(store).await;
    duplicate_email_conflicts(store).await;
    missing_user_is_not_found(store).await;
    application_lookup(store).await;
    role_resolution(store).await;
    scope_resolution(store).await;
    list_users_filters(store).await;
}

async fn save_and_find_user(store: &dyn CredentialStore) {
    let id = store
        .save_user("find@x.com", "phc-hash", "First", "Last", "Middle")
        .await
        .unwrap();
    assert!(id > 0);

    let user = store.user_by_email("find@x.com").await.unwrap();
    assert_eq!(user.id, id);
    assert_eq!(user.email, "find@x.com");
    assert_eq!(user.pass_hash, "phc-hash");
    assert_eq!(user.middle_name, "Middle");

    assert!(store.user_exists(id).await.unwrap());
    assert!(!store.user_exists(id + 1000).await.unwrap());
}

async fn duplicate_email_conflicts(store: &dyn CredentialStore) {
    let first = store
        .save_user("dup@x.com", "h1", "A", "B", "C")
        .await
        .unwrap();

    let err = store
        .save_user("dup@x.com", "h2", "X", "Y", "Z")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::UserAlreadyExists));

    // The winning row is untouched.
    let user = store.user_by_email("dup@x.com").await.unwrap();
    assert_eq!(user.id, first);
    assert_eq!(user.pass_hash, "h1");
}

async fn missing_user_is_not_found(store: &dyn CredentialStore) {
    let err = store.user_by_email("ghost@x.com").await.unwrap_err();
    assert!(matches!(err, StorageError::UserNotFound));
}

async fn application_lookup(store: &dyn CredentialStore) {
    let app = store.application(1).await.unwrap();
    assert_eq!(app.id, 1);
    assert_eq!(app.secret, "test-secret");

    let err = store.application(999).await.unwrap_err();
    assert!(matches!(err, StorageError::ApplicationNotFound));
}

async fn role_resolution(store: &dyn CredentialStore) {
    let student = store.role_id("student").await.unwrap();
    assert!(student > 0);

    let err = store.role_id("janitor").await.unwrap_err();
    assert!(matches!(err, StorageError::RoleNotFound));

    let uid = store
        .save_user("role@x.com", "h", "A", "B", "C")
        .await
        .unwrap();

    // No link yet.
    let err = store.user_role(uid).await.unwrap_err();
    assert!(matches!(err, StorageError::RoleNotFound));

    store.link_user_role(uid, student).await.unwrap();
    assert_eq!(store.user_role(uid).await.unwrap(), "student");
}

async fn scope_resolution(store: &dyn CredentialStore) {
    let teacher = store.role_id("teacher").await.unwrap();
    let uid = store
        .save_user("scope@x.com", "h", "A", "B", "C")
        .await
        .unwrap();
    store.link_user_role(uid, teacher).await.unwrap();

    let scope = store.scope(uid).await.unwrap();
    assert_eq!(scope, vec!["tasks:read", "tasks:write", "tasks:delete"]);

    // A user with no role resolves to an empty scope, not an error.
    let bare = store
        .save_user("bare@x.com", "h", "A", "B", "C")
        .await
        .unwrap();
    assert!(store.scope(bare).await.unwrap().is_empty());
}

async fn list_users_filters(store: &dyn CredentialStore) {
    let student = store.role_id("student").await.unwrap();
    let uid = store
        .save_user("list@x.com", "h", "Lina", "Larsen", "")
        .await
        .unwrap();
    store.link_user_role(uid, student).await.unwrap();

    let hits = store.list_users("student", "Larsen").await.unwrap();
    assert!(hits.iter().any(|u| u.id == uid));

    let misses = store.list_users("student", "no-such-name").await.unwrap();
    assert!(!misses.iter().any(|u| u.id == uid));

    // Role filter applies even when the search matches.
    let wrong_role = store.list_users("teacher", "Larsen").await.unwrap();
    assert!(!wrong_role.iter().any(|u| u.id == uid));
}
