//! In-process store
//!
//! Implements every store trait over a single [`StoreState`] behind a tokio
//! `RwLock`. A commit is one write section, so it is atomic with respect to
//! every other store call. Used by tests and for local trials.

use crate::adapters::database::traits::{
    DatasetStore, LockStore, NotificationQuery, NotificationStore, UnitOfWork,
};
use crate::domain::user::permissions_of;
use crate::domain::{
    AuthenticatedUser, DataFile, DataFileId, Dataset, DatasetId, DatasetLock, GlobalId, LockFilter,
    LockReason, NotificationId, PersistenceError, Permission, Result, Role, RoleAssignment, UserId,
    UserNotification, VersionId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Everything the memory store holds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub datasets: BTreeMap<DatasetId, Dataset>,
    pub locks: BTreeMap<(DatasetId, LockReason), DatasetLock>,
    /// Secondary index: holder → locked (dataset, reason) keys
    pub locks_by_user: BTreeMap<UserId, BTreeSet<(DatasetId, LockReason)>>,
    pub users: BTreeMap<UserId, AuthenticatedUser>,
    pub roles: Vec<RoleAssignment>,
    pub version_users: BTreeMap<(VersionId, UserId), DateTime<Utc>>,
    pub notifications: BTreeMap<NotificationId, UserNotification>,
    /// Last value handed out by the identifier sequence
    pub identifier_sequence: i64,
    /// Data files removed by commits, in order
    pub hard_deleted_files: Vec<DataFileId>,
}

impl StoreState {
    fn global_id_in_use(&self, global_id: &GlobalId, except: Option<&DatasetId>) -> bool {
        self.datasets.values().any(|ds| {
            if Some(&ds.id) == except {
                return false;
            }
            ds.global_id.as_ref() == Some(global_id)
                || ds.files.iter().any(|f| f.global_id.as_ref() == Some(global_id))
        })
    }

    fn unindex_lock(&mut self, lock: &DatasetLock) {
        if let Some(user) = lock.user_id {
            if let Some(keys) = self.locks_by_user.get_mut(&user) {
                keys.remove(&(lock.dataset_id, lock.reason));
                if keys.is_empty() {
                    self.locks_by_user.remove(&user);
                }
            }
        }
    }

    fn index_lock(&mut self, lock: &DatasetLock) {
        if let Some(user) = lock.user_id {
            self.locks_by_user
                .entry(user)
                .or_default()
                .insert((lock.dataset_id, lock.reason));
        }
    }
}

/// Store backed by process memory
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
    commits: AtomicUsize,
    sequence_enabled: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            commits: AtomicUsize::new(0),
            sequence_enabled: true,
        }
    }

    /// A store whose identifier sequence yields no values
    pub fn without_identifier_sequence() -> Self {
        Self {
            sequence_enabled: false,
            ..Self::new()
        }
    }

    /// Copy of the full state
    pub async fn snapshot(&self) -> StoreState {
        self.state.read().await.clone()
    }

    /// Number of successful commits so far
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Inserts a dataset as-is, bypassing commit checks
    pub async fn seed_dataset(&self, dataset: Dataset) {
        self.state.write().await.datasets.insert(dataset.id, dataset);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatasetStore for MemoryStore {
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn find_dataset(&self, id: &DatasetId) -> Result<Option<Dataset>> {
        Ok(self.state.read().await.datasets.get(id).cloned())
    }

    async fn find_dataset_by_global_id(&self, global_id: &GlobalId) -> Result<Option<Dataset>> {
        let state = self.state.read().await;
        Ok(state
            .datasets
            .values()
            .find(|ds| ds.global_id.as_ref() == Some(global_id))
            .cloned())
    }

    async fn find_data_file(&self, id: &DataFileId) -> Result<Option<(DatasetId, DataFile)>> {
        let state = self.state.read().await;
        Ok(state
            .datasets
            .values()
            .find_map(|ds| ds.file(id).map(|f| (ds.id, f.clone()))))
    }

    async fn commit(&self, work: UnitOfWork) -> Result<Dataset> {
        let mut state = self.state.write().await;

        work.check_against(state.datasets.get(&work.dataset.id))?;

        if let Some(ref gid) = work.dataset.global_id {
            if state.global_id_in_use(gid, Some(&work.dataset.id)) {
                return Err(PersistenceError::ConstraintViolation(format!(
                    "global id {gid} already belongs to another dataset"
                ))
                .into());
            }
        }

        let UnitOfWork {
            dataset,
            deleted_files,
        } = work;
        state.hard_deleted_files.extend(deleted_files);
        state.datasets.insert(dataset.id, dataset.clone());
        self.commits.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(dataset_id = %dataset.id, "Committed dataset to memory store");
        Ok(dataset)
    }

    async fn is_identifier_locally_unique(&self, global_id: &GlobalId) -> Result<bool> {
        Ok(!self.state.read().await.global_id_in_use(global_id, None))
    }

    async fn next_identifier_sequence(&self) -> Result<Option<i64>> {
        if !self.sequence_enabled {
            return Ok(None);
        }
        let mut state = self.state.write().await;
        state.identifier_sequence += 1;
        Ok(Some(state.identifier_sequence))
    }

    async fn permissions_for(&self, user: &UserId, dataset: &DatasetId) -> Result<BTreeSet<Permission>> {
        let state = self.state.read().await;
        let roles: Vec<Role> = state
            .roles
            .iter()
            .filter(|a| a.user_id == *user && a.dataset_id == *dataset)
            .map(|a| a.role)
            .collect();
        Ok(permissions_of(&roles))
    }

    async fn assign_role(&self, assignment: RoleAssignment) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.roles.contains(&assignment) {
            state.roles.push(assignment);
        }
        Ok(())
    }

    async fn touch_version_user(&self, version: &VersionId, user: &UserId, at: DateTime<Utc>) -> Result<()> {
        self.state
            .write()
            .await
            .version_users
            .insert((*version, *user), at);
        Ok(())
    }

    async fn find_all_local_dataset_ids(&self) -> Result<Vec<DatasetId>> {
        let state = self.state.read().await;
        Ok(state
            .datasets
            .values()
            .filter(|ds| !ds.harvested)
            .map(|ds| ds.id)
            .collect())
    }

    async fn set_last_export_time(&self, id: &DatasetId, at: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.write().await;
        let ds = state
            .datasets
            .get_mut(id)
            .ok_or_else(|| PersistenceError::NotFound(format!("dataset {id}")))?;
        ds.last_export_time = Some(at);
        Ok(())
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<AuthenticatedUser>> {
        Ok(self.state.read().await.users.get(id).cloned())
    }

    async fn save_user(&self, user: AuthenticatedUser) -> Result<()> {
        self.state.write().await.users.insert(user.id, user);
        Ok(())
    }
}

#[async_trait]
impl LockStore for MemoryStore {
    async fn add_lock_if_absent(&self, lock: DatasetLock) -> Result<DatasetLock> {
        let mut state = self.state.write().await;
        let key = (lock.dataset_id, lock.reason);
        if let Some(existing) = state.locks.get(&key) {
            return Ok(existing.clone());
        }
        state.index_lock(&lock);
        state.locks.insert(key, lock.clone());
        Ok(lock)
    }

    async fn remove_locks(&self, dataset: &DatasetId, reason: LockReason) -> Result<Vec<DatasetLock>> {
        let mut state = self.state.write().await;
        match state.locks.remove(&(*dataset, reason)) {
            Some(lock) => {
                state.unindex_lock(&lock);
                Ok(vec![lock])
            }
            None => Ok(Vec::new()),
        }
    }

    async fn list_locks(&self, filter: &LockFilter) -> Result<Vec<DatasetLock>> {
        let state = self.state.read().await;
        let mut locks: Vec<DatasetLock> = match (filter.user_id, filter.dataset_id) {
            (Some(user), _) => state
                .locks_by_user
                .get(&user)
                .into_iter()
                .flatten()
                .filter_map(|key| state.locks.get(key))
                .filter(|l| filter.matches(l))
                .cloned()
                .collect(),
            (None, Some(dataset)) => state
                .locks
                .range((dataset, LockReason::ALL[0])..)
                .take_while(|((d, _), _)| *d == dataset)
                .map(|(_, l)| l)
                .filter(|l| filter.matches(l))
                .cloned()
                .collect(),
            (None, None) => state
                .locks
                .values()
                .filter(|l| filter.matches(l))
                .cloned()
                .collect(),
        };
        locks.sort_by_key(|l| l.start_time);
        Ok(locks)
    }

    async fn update_lock(&self, lock: &DatasetLock) -> Result<()> {
        let mut state = self.state.write().await;
        let key = (lock.dataset_id, lock.reason);
        let Some(previous) = state.locks.get(&key).cloned() else {
            return Err(PersistenceError::NotFound(format!(
                "lock {} on dataset {}",
                lock.reason, lock.dataset_id
            ))
            .into());
        };
        state.unindex_lock(&previous);
        state.index_lock(lock);
        state.locks.insert(key, lock.clone());
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn save_notification(&self, notification: UserNotification) -> Result<UserNotification> {
        self.state
            .write()
            .await
            .notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn find_notification(&self, id: &NotificationId) -> Result<Option<UserNotification>> {
        Ok(self.state.read().await.notifications.get(id).cloned())
    }

    async fn find_notifications(&self, query: &NotificationQuery) -> Result<Vec<UserNotification>> {
        let state = self.state.read().await;
        let mut found: Vec<UserNotification> = state
            .notifications
            .values()
            .filter(|n| query.matches(n))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.send_date.cmp(&a.send_date));
        Ok(found)
    }

    async fn unread_count(&self, user: &UserId) -> Result<u64> {
        let query = NotificationQuery::UnreadByUser(*user);
        let state = self.state.read().await;
        Ok(state.notifications.values().filter(|n| query.matches(n)).count() as u64)
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<()> {
        let mut state = self.state.write().await;
        let n = state
            .notifications
            .get_mut(id)
            .ok_or_else(|| PersistenceError::NotFound(format!("notification {id}")))?;
        n.read = true;
        Ok(())
    }

    async fn delete_notification(&self, id: &NotificationId) -> Result<()> {
        self.state.write().await.notifications.remove(id);
        Ok(())
    }
}
