/// Property-based tests for session persistence using proptest
///
/// Random sequences of save/clear/load must always read back the last
/// write, over both the in-memory and the file-backed storage.
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::sync::Arc;
use stockroom::auth::{Role, User};
use stockroom::session::{
    FileStorage, MemoryStorage, Session, SessionStore, Storage, TOKEN_KEY, USER_KEY,
};

#[derive(Debug, Clone)]
enum Op {
    Save(String, User),
    Clear,
    Load,
}

// Strategy for a plausible user record
fn user_strategy() -> impl Strategy<Value = User> {
    (
        1i64..10_000,
        "[A-Za-z]{1,12}",
        "[A-Za-z' -]{1,16}",
        "[a-z]{1,8}@[a-z]{1,8}\\.com",
        prop::collection::vec("[a-z]{3,10}", 0..3),
        0i64..2_000_000_000,
    )
        .prop_map(|(id, first_name, last_name, email, roles, secs)| {
            let stamp = Utc.timestamp_opt(secs, 0).unwrap();
            User {
                id,
                first_name,
                last_name,
                email,
                roles: roles
                    .into_iter()
                    .enumerate()
                    .map(|(i, name)| Role {
                        id: i as i64 + 1,
                        name,
                        description: None,
                    })
                    .collect(),
                department: None,
                created_at: stamp,
                updated_at: stamp,
            }
        })
}

// Strategy for one store operation; tokens are never empty
fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => ("[A-Za-z0-9._-]{1,40}", user_strategy()).prop_map(|(t, u)| Op::Save(t, u)),
        1 => Just(Op::Clear),
        2 => Just(Op::Load),
    ]
}

// Replay `ops` against `store`, checking each load against a model
fn check_against_model(store: &SessionStore, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut model: Option<Session> = None;
    for op in ops {
        match op {
            Op::Save(token, user) => {
                store.save(&token, &user);
                model = Some(Session { token, user });
            }
            Op::Clear => {
                store.clear();
                model = None;
            }
            Op::Load => prop_assert_eq!(store.load(), model.clone()),
        }
    }
    prop_assert_eq!(store.load(), model);
    Ok(())
}

proptest! {
    #[test]
    fn prop_memory_store_reads_back_last_write(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        check_against_model(&store, ops)?;
    }

    #[test]
    fn prop_file_store_reads_back_last_write(ops in prop::collection::vec(op_strategy(), 1..12)) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(Arc::new(FileStorage::new(dir.path())));
        check_against_model(&store, ops)?;
    }

    #[test]
    fn prop_garbage_user_is_discarded(garbage in "[^{\\[\"0-9tfn ]{1,40}") {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(TOKEN_KEY, "tok").unwrap();
        storage.set_item(USER_KEY, &garbage).unwrap();

        let store = SessionStore::new(storage.clone());
        prop_assert_eq!(store.load(), None);
        prop_assert!(storage.is_empty());
    }
}

#[test]
fn test_corrupt_file_session_self_heals() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path()));
    storage.set_item(TOKEN_KEY, "tok").unwrap();
    storage.set_item(USER_KEY, "definitely not json").unwrap();

    let store = SessionStore::new(storage.clone());
    assert!(store.load().is_none());
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get_item(USER_KEY).unwrap(), None);

    // A fresh store over the same directory starts clean
    let reopened = SessionStore::new(Arc::new(FileStorage::new(dir.path())));
    assert!(reopened.load().is_none());
}
