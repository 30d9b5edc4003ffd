//! Persistence store abstraction
//!
//! This module defines the traits that storage backends implement. The
//! dataset aggregate is written through a [`UnitOfWork`]: every change of one
//! update is staged on a detached copy and made durable and visible by a
//! single [`DatasetStore::commit`] call.

use crate::domain::{
    AuthenticatedUser, DataFile, DataFileId, Dataset, DatasetId, DatasetLock, GlobalId, LockFilter,
    LockReason, NotificationId, PersistenceError, Permission, Result, RoleAssignment, UserId,
    UserNotification, VersionId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Writes staged by one operation, committed together
#[derive(Debug, Clone)]
pub struct UnitOfWork {
    /// Merged state of the dataset aggregate
    pub dataset: Dataset,

    /// Data files removed from the aggregate that must be hard-deleted
    pub deleted_files: Vec<DataFileId>,
}

impl UnitOfWork {
    /// Stages a dataset without deletions
    pub fn merge(dataset: Dataset) -> Self {
        Self {
            dataset,
            deleted_files: Vec::new(),
        }
    }

    /// Stages a hard delete of a data file
    pub fn delete_file(&mut self, id: DataFileId) {
        if !self.deleted_files.contains(&id) {
            self.deleted_files.push(id);
        }
    }

    /// Checks the staged aggregate against the stored one
    ///
    /// Released and deaccessioned versions may change state but never
    /// content, deleted files must be gone from the aggregate, and a released
    /// file is never hard-deleted.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::ConstraintViolation`] describing the first
    /// broken rule.
    pub fn check_against(&self, stored: Option<&Dataset>) -> std::result::Result<(), PersistenceError> {
        let staged = &self.dataset;

        if staged.versions.iter().filter(|v| v.is_draft()).count() > 1 {
            return Err(PersistenceError::ConstraintViolation(format!(
                "dataset {} has more than one draft version",
                staged.id
            )));
        }

        for id in &self.deleted_files {
            if staged.file(id).is_some() {
                return Err(PersistenceError::ConstraintViolation(format!(
                    "data file {id} is staged for deletion but still attached"
                )));
            }
        }

        let Some(stored) = stored else {
            return Ok(());
        };

        for id in &self.deleted_files {
            if stored.file(id).map(|f| f.is_released()).unwrap_or(false) {
                return Err(PersistenceError::ConstraintViolation(format!(
                    "released data file {id} cannot be deleted"
                )));
            }
        }

        for old in stored.versions.iter().filter(|v| !v.is_draft()) {
            let Some(new) = staged.versions.iter().find(|v| v.id == old.id) else {
                return Err(PersistenceError::ConstraintViolation(format!(
                    "released version {} was dropped",
                    old.id
                )));
            };
            if new.fields != old.fields || new.file_metadatas != old.file_metadatas {
                return Err(PersistenceError::ConstraintViolation(format!(
                    "released version {} of dataset {} is frozen",
                    old.friendly_number(),
                    staged.id
                )));
            }
        }

        Ok(())
    }
}

/// Dataset, file, user and role storage
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Checks that the backend is reachable
    async fn test_connection(&self) -> Result<()>;

    /// Creates tables or other structures the backend needs
    async fn ensure_schema(&self) -> Result<()>;

    async fn find_dataset(&self, id: &DatasetId) -> Result<Option<Dataset>>;

    async fn find_dataset_by_global_id(&self, global_id: &GlobalId) -> Result<Option<Dataset>>;

    /// Finds a data file and the dataset owning it
    async fn find_data_file(&self, id: &DataFileId) -> Result<Option<(DatasetId, DataFile)>>;

    /// Merges and flushes a unit of work in one transaction
    ///
    /// Returns the dataset as stored.
    async fn commit(&self, work: UnitOfWork) -> Result<Dataset>;

    /// True when no dataset or data file uses this identifier
    async fn is_identifier_locally_unique(&self, global_id: &GlobalId) -> Result<bool>;

    /// Next value of the identifier sequence, `None` if the backend has none
    async fn next_identifier_sequence(&self) -> Result<Option<i64>>;

    /// Permissions granted to a user on a dataset through role assignments
    async fn permissions_for(&self, user: &UserId, dataset: &DatasetId) -> Result<BTreeSet<Permission>>;

    async fn assign_role(&self, assignment: RoleAssignment) -> Result<()>;

    /// Records that a user last worked on a version at `at`
    async fn touch_version_user(&self, version: &VersionId, user: &UserId, at: DateTime<Utc>) -> Result<()>;

    /// Ids of every dataset deposited locally (harvested ones excluded)
    async fn find_all_local_dataset_ids(&self) -> Result<Vec<DatasetId>>;

    async fn set_last_export_time(&self, id: &DatasetId, at: DateTime<Utc>) -> Result<()>;

    async fn find_user(&self, id: &UserId) -> Result<Option<AuthenticatedUser>>;

    async fn save_user(&self, user: AuthenticatedUser) -> Result<()>;
}

/// Lock table keyed by (dataset, reason)
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Inserts the lock unless one exists for its (dataset, reason)
    ///
    /// Atomic: concurrent callers all receive the same stored lock.
    async fn add_lock_if_absent(&self, lock: DatasetLock) -> Result<DatasetLock>;

    /// Removes every lock of `reason` on the dataset, returning them
    async fn remove_locks(&self, dataset: &DatasetId, reason: LockReason) -> Result<Vec<DatasetLock>>;

    /// Locks matching the filter, oldest first
    async fn list_locks(&self, filter: &LockFilter) -> Result<Vec<DatasetLock>>;

    /// Replaces holder and info of an existing lock
    async fn update_lock(&self, lock: &DatasetLock) -> Result<()>;
}

/// Selection of notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationQuery {
    ByUser(UserId),
    ByRequestor(UserId),
    ByObject(String),
    UnreadByUser(UserId),
    /// Not yet e-mailed, any user
    Unemailed,
}

impl NotificationQuery {
    pub fn matches(&self, n: &UserNotification) -> bool {
        match self {
            NotificationQuery::ByUser(u) => n.user_id == *u,
            NotificationQuery::ByRequestor(u) => n.requestor_id == Some(*u),
            NotificationQuery::ByObject(o) => n.object_id == *o,
            NotificationQuery::UnreadByUser(u) => n.user_id == *u && !n.read,
            NotificationQuery::Unemailed => !n.emailed,
        }
    }
}

/// User notification table
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Inserts or replaces a notification
    async fn save_notification(&self, notification: UserNotification) -> Result<UserNotification>;

    async fn find_notification(&self, id: &NotificationId) -> Result<Option<UserNotification>>;

    /// Notifications matching the query, newest first
    async fn find_notifications(&self, query: &NotificationQuery) -> Result<Vec<UserNotification>>;

    async fn unread_count(&self, user: &UserId) -> Result<u64>;

    async fn mark_read(&self, id: &NotificationId) -> Result<()>;

    async fn delete_notification(&self, id: &NotificationId) -> Result<()>;
}
