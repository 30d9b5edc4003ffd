//! Lock manager
//!
//! Thin policy layer over a [`LockStore`]: idempotent acquisition, edit
//! conflict rules and scoped locking.

use crate::adapters::database::traits::LockStore;
use crate::domain::{
    DatasetId, DatasetLock, LockFilter, LockReason, RepositoryError, Result, UserId,
};
use crate::log_lock_acquired;
use std::future::Future;
use std::sync::Arc;

/// Per-dataset locks keyed by reason
///
/// Locks never expire; they are removed explicitly or by [`LockManager::with_lock`].
pub struct LockManager {
    store: Arc<dyn LockStore + Send + Sync>,
}

impl LockManager {
    pub fn new(store: Arc<dyn LockStore + Send + Sync>) -> Self {
        Self { store }
    }

    /// Takes a lock, or returns the one already held for (dataset, reason)
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn add_lock(
        &self,
        dataset: DatasetId,
        reason: LockReason,
        user: Option<UserId>,
        info: Option<String>,
    ) -> Result<DatasetLock> {
        let candidate = DatasetLock::new(dataset, reason, user, info);
        let candidate_id = candidate.id;
        let lock = self.store.add_lock_if_absent(candidate).await?;
        if lock.id == candidate_id {
            log_lock_acquired!(dataset, reason);
        } else {
            tracing::debug!(dataset_id = %dataset, reason = %reason, "Lock already held, reusing");
        }
        Ok(lock)
    }

    /// Removes every lock of `reason` on the dataset
    pub async fn remove_locks(&self, dataset: DatasetId, reason: LockReason) -> Result<Vec<DatasetLock>> {
        let removed = self.store.remove_locks(&dataset, reason).await?;
        if !removed.is_empty() {
            tracing::info!(dataset_id = %dataset, reason = %reason, count = removed.len(), "Dataset lock released");
        }
        Ok(removed)
    }

    /// True when the dataset holds any lock
    pub async fn check_dataset_lock(&self, dataset: DatasetId) -> Result<bool> {
        Ok(!self.locks_for_dataset(dataset).await?.is_empty())
    }

    pub async fn locks_for_dataset(&self, dataset: DatasetId) -> Result<Vec<DatasetLock>> {
        self.list_locks(LockFilter {
            dataset_id: Some(dataset),
            ..Default::default()
        })
        .await
    }

    pub async fn locks_by_user(&self, user: UserId) -> Result<Vec<DatasetLock>> {
        self.list_locks(LockFilter {
            user_id: Some(user),
            ..Default::default()
        })
        .await
    }

    pub async fn list_locks(&self, filter: LockFilter) -> Result<Vec<DatasetLock>> {
        self.store.list_locks(&filter).await
    }

    /// Changes holder or info of an existing lock
    pub async fn update_lock(&self, lock: &DatasetLock) -> Result<()> {
        self.store.update_lock(lock).await
    }

    /// Fails when a held lock forbids editing the dataset
    ///
    /// An `InReview` lock only blocks callers without publish permission.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::LockConflict`] naming the blocking reasons.
    pub async fn check_edit_lock(&self, dataset: DatasetId, caller_can_publish: bool) -> Result<()> {
        let blocking: Vec<String> = self
            .locks_for_dataset(dataset)
            .await?
            .into_iter()
            .filter(|l| l.reason.blocks_edit(caller_can_publish))
            .map(|l| l.reason.to_string())
            .collect();

        if blocking.is_empty() {
            Ok(())
        } else {
            Err(RepositoryError::LockConflict(format!(
                "dataset {dataset} is locked: {}",
                blocking.join(", ")
            )))
        }
    }

    /// Runs `op` while holding a lock, releasing it on every exit path
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::LockConflict`] if the lock is already held,
    /// otherwise the result of `op`.
    pub async fn with_lock<T, F, Fut>(
        &self,
        dataset: DatasetId,
        reason: LockReason,
        user: Option<UserId>,
        info: Option<String>,
        op: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let candidate = DatasetLock::new(dataset, reason, user, info);
        let candidate_id = candidate.id;
        let lock = self.store.add_lock_if_absent(candidate).await?;
        if lock.id != candidate_id {
            return Err(RepositoryError::LockConflict(format!(
                "dataset {dataset} already holds a {reason} lock"
            )));
        }
        log_lock_acquired!(dataset, reason);

        let result = op().await;

        if let Err(e) = self.remove_locks(dataset, reason).await {
            crate::log_error_with_context!(e, "Failed to release scoped lock");
        }
        result
    }
}
