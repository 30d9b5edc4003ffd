//! Lock manager behaviour against the in-memory store

use cairn::adapters::database::MemoryStore;
use cairn::core::locks::LockManager;
use cairn::domain::{DatasetId, LockFilter, LockReason, RepositoryError, UserId};
use std::sync::Arc;

fn manager() -> Arc<LockManager> {
    Arc::new(LockManager::new(Arc::new(MemoryStore::new())))
}

#[tokio::test]
async fn test_concurrent_acquisition_yields_one_lock() {
    let locks = manager();
    let ds = DatasetId::new();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                locks
                    .add_lock(ds, LockReason::EditInProgress, Some(UserId::new()), None)
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(locks.locks_for_dataset(ds).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_locks_by_user_follow_reassignment() {
    let locks = manager();
    let alice = UserId::new();
    let bob = UserId::new();
    let ds = DatasetId::new();

    let mut lock = locks
        .add_lock(ds, LockReason::Workflow, Some(alice), Some("step 1".into()))
        .await
        .unwrap();
    locks.add_lock(DatasetId::new(), LockReason::Ingest, Some(alice), None).await.unwrap();
    assert_eq!(locks.locks_by_user(alice).await.unwrap().len(), 2);

    lock.user_id = Some(bob);
    lock.info = Some("step 2".into());
    locks.update_lock(&lock).await.unwrap();

    assert_eq!(locks.locks_by_user(alice).await.unwrap().len(), 1);
    let bobs = locks.locks_by_user(bob).await.unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].info.as_deref(), Some("step 2"));
}

#[tokio::test]
async fn test_list_filters_combine() {
    let locks = manager();
    let user = UserId::new();
    let first = DatasetId::new();
    let second = DatasetId::new();

    locks.add_lock(first, LockReason::Ingest, Some(user), None).await.unwrap();
    locks.add_lock(first, LockReason::InReview, None, None).await.unwrap();
    locks.add_lock(second, LockReason::Ingest, None, None).await.unwrap();

    let all = locks.list_locks(LockFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    let ingest = locks
        .list_locks(LockFilter {
            reason: Some(LockReason::Ingest),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(ingest.len(), 2);

    let users_ingest_on_first = locks
        .list_locks(LockFilter {
            dataset_id: Some(first),
            reason: Some(LockReason::Ingest),
            user_id: Some(user),
        })
        .await
        .unwrap();
    assert_eq!(users_ingest_on_first.len(), 1);
    assert_eq!(users_ingest_on_first[0].dataset_id, first);
}

#[tokio::test]
async fn test_remove_only_drops_requested_reason() {
    let locks = manager();
    let ds = DatasetId::new();
    locks.add_lock(ds, LockReason::Ingest, None, None).await.unwrap();
    locks.add_lock(ds, LockReason::Workflow, None, None).await.unwrap();

    let removed = locks.remove_locks(ds, LockReason::Ingest).await.unwrap();
    assert_eq!(removed.len(), 1);
    assert!(locks.remove_locks(ds, LockReason::Ingest).await.unwrap().is_empty());

    let left = locks.locks_for_dataset(ds).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].reason, LockReason::Workflow);
}

#[tokio::test]
async fn test_with_lock_holds_lock_during_operation() {
    let locks = manager();
    let ds = DatasetId::new();

    let inner = Arc::clone(&locks);
    let (held, blocked) = locks
        .with_lock(ds, LockReason::FinalizePublication, None, None, || async move {
            let held = inner.locks_for_dataset(ds).await?.len();
            let blocked = matches!(
                inner.check_edit_lock(ds, true).await,
                Err(RepositoryError::LockConflict(_))
            );
            Ok((held, blocked))
        })
        .await
        .unwrap();

    assert_eq!(held, 1);
    assert!(blocked);
    assert!(!locks.check_dataset_lock(ds).await.unwrap());
}
