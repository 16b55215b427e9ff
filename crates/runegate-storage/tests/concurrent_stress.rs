//! Concurrent access tests for `MemoryStorage`.
//!
//! Many tasks hammer the same records at once; the store must never let
//! two of them win the same compare-and-set or create the same username.

use std::collections::HashSet;

use runegate_storage::{MemoryStorage, NewUser, Storage, StorageError, UserState};
use tokio::task::JoinSet;

/// Number of concurrent tasks per round.
const CONCURRENCY: usize = 32;

/// Number of rounds for the exactly-one-winner test.
const ROUNDS: usize = 20;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_transition_state_exactly_one_winner_per_round() {
    let store = MemoryStorage::new();

    for round in 0..ROUNDS {
        let user = store
            .user_create(NewUser::offline(format!("player{round}"), "pw"))
            .await
            .expect("create should succeed");

        let mut set = JoinSet::new();
        for _ in 0..CONCURRENCY {
            let store = store.clone();
            let user_id = user.user_id;
            set.spawn(async move {
                store
                    .user_transition_state(
                        user_id,
                        UserState::Offline,
                        UserState::Online,
                    )
                    .await
                    .expect("transition should not error")
            });
        }

        let mut winners = 0;
        while let Some(result) = set.join_next().await {
            if result.expect("task should not panic") {
                winners += 1;
            }
        }

        assert_eq!(winners, 1, "round {round}: exactly one task may win");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_user_create_same_username_exactly_one_created() {
    let store = MemoryStorage::new();

    let mut set = JoinSet::new();
    for i in 0..CONCURRENCY {
        let store = store.clone();
        set.spawn(async move {
            store
                .user_create(NewUser::offline("contested", format!("pw{i}")))
                .await
        });
    }

    let mut created = 0;
    let mut conflicts = 0;
    while let Some(result) = set.join_next().await {
        match result.expect("task should not panic") {
            Ok(_) => created += 1,
            Err(StorageError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, CONCURRENCY - 1);
    assert_eq!(store.users().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_user_create_distinct_usernames_get_distinct_ids() {
    let store = MemoryStorage::new();

    let mut set = JoinSet::new();
    for i in 0..CONCURRENCY {
        let store = store.clone();
        set.spawn(async move {
            store
                .user_create(NewUser::offline(format!("user{i}"), "pw"))
                .await
                .expect("distinct usernames never conflict")
                .user_id
        });
    }

    let mut ids = HashSet::new();
    while let Some(result) = set.join_next().await {
        ids.insert(result.expect("task should not panic"));
    }

    assert_eq!(ids.len(), CONCURRENCY, "every user needs a unique id");
}
