//! PostgreSQL adapter implementing the store traits
//!
//! A unit of work is written in one transaction: the stored aggregate is read
//! `FOR UPDATE`, checked, replaced, and the file rows are synced before the
//! commit. Lock insertion relies on the `(dataset_id, reason)` unique key.

use crate::adapters::database::traits::{
    DatasetStore, LockStore, NotificationQuery, NotificationStore, UnitOfWork,
};
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::{
    column, lock_from_row, notification_document, notification_from_row, user_document,
    user_from_row, PostgreSQLDataFile, PostgreSQLDataset,
};
use crate::domain::user::permissions_of;
use crate::domain::{
    AuthenticatedUser, DataFile, DataFileId, Dataset, DatasetId, DatasetLock, GlobalId, LockFilter,
    LockReason, NotificationId, PersistenceError, Permission, Result, Role, RoleAssignment, UserId,
    UserNotification, VersionId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_postgres::error::SqlState;
use uuid::Uuid;

/// Maps a driver error, singling out unique key violations
fn query_error(context: &str, e: tokio_postgres::Error) -> PersistenceError {
    if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        PersistenceError::ConstraintViolation(format!("{context}: {e}"))
    } else {
        PersistenceError::QueryFailed(format!("{context}: {e}"))
    }
}

/// PostgreSQL implementation of the store traits
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Create a new PostgreSQL adapter with an Arc-wrapped client
    pub fn new_with_arc(client: Arc<PostgreSQLClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }
}

#[async_trait]
impl DatasetStore for PostgreSQLAdapter {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.client.ensure_schema().await
    }

    async fn find_dataset(&self, id: &DatasetId) -> Result<Option<Dataset>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt(
                "SELECT document, last_export_time FROM datasets WHERE id = $1",
                &[id.as_uuid()],
            )
            .await
            .map_err(|e| query_error("find dataset", e))?;
        Ok(row.map(|r| PostgreSQLDataset::dataset_from_row(&r)).transpose()?)
    }

    async fn find_dataset_by_global_id(&self, global_id: &GlobalId) -> Result<Option<Dataset>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt(
                "SELECT document, last_export_time FROM datasets WHERE global_id = $1",
                &[&global_id.to_string()],
            )
            .await
            .map_err(|e| query_error("find dataset by global id", e))?;
        Ok(row.map(|r| PostgreSQLDataset::dataset_from_row(&r)).transpose()?)
    }

    async fn find_data_file(&self, id: &DataFileId) -> Result<Option<(DatasetId, DataFile)>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt(
                "SELECT d.document, d.last_export_time FROM datasets d \
                 JOIN datafiles f ON f.dataset_id = d.id WHERE f.id = $1",
                &[id.as_uuid()],
            )
            .await
            .map_err(|e| query_error("find data file", e))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let dataset = PostgreSQLDataset::dataset_from_row(&row)?;
        Ok(dataset.file(id).cloned().map(|f| (dataset.id, f)))
    }

    async fn commit(&self, work: UnitOfWork) -> Result<Dataset> {
        let mut conn = self.client.get_connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| PersistenceError::CommitFailed(e.to_string()))?;

        let stored = tx
            .query_opt(
                "SELECT document, last_export_time FROM datasets WHERE id = $1 FOR UPDATE",
                &[work.dataset.id.as_uuid()],
            )
            .await
            .map_err(|e| query_error("load stored dataset", e))?
            .map(|r| PostgreSQLDataset::dataset_from_row(&r))
            .transpose()?;

        work.check_against(stored.as_ref())?;

        let row = PostgreSQLDataset::from_domain(&work.dataset)?;
        tx.execute(
            "INSERT INTO datasets (id, owner, global_id, harvested, document, modification_time, last_export_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET \
                owner = EXCLUDED.owner, \
                global_id = EXCLUDED.global_id, \
                harvested = EXCLUDED.harvested, \
                document = EXCLUDED.document, \
                modification_time = EXCLUDED.modification_time, \
                updated_at = NOW()",
            &[
                &row.id,
                &row.owner,
                &row.global_id,
                &row.harvested,
                &row.document,
                &row.modification_time,
                &row.last_export_time,
            ],
        )
        .await
        .map_err(|e| query_error("write dataset", e))?;

        for id in &work.deleted_files {
            tx.execute(
                "DELETE FROM datafiles WHERE id = $1 AND dataset_id = $2",
                &[id.as_uuid(), &row.id],
            )
            .await
            .map_err(|e| query_error("delete data file", e))?;
        }

        for file in PostgreSQLDataFile::rows_for(&work.dataset) {
            tx.execute(
                "INSERT INTO datafiles (id, dataset_id, global_id, released) VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (id) DO UPDATE SET global_id = EXCLUDED.global_id, released = EXCLUDED.released",
                &[&file.id, &file.dataset_id, &file.global_id, &file.released],
            )
            .await
            .map_err(|e| query_error("write data file", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| PersistenceError::CommitFailed(e.to_string()))?;

        tracing::debug!(
            dataset_id = %work.dataset.id,
            deleted_files = work.deleted_files.len(),
            "Committed dataset to PostgreSQL"
        );
        Ok(work.dataset)
    }

    async fn is_identifier_locally_unique(&self, global_id: &GlobalId) -> Result<bool> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM datasets WHERE global_id = $1) \
                     OR EXISTS (SELECT 1 FROM datafiles WHERE global_id = $1) AS taken",
                &[&global_id.to_string()],
            )
            .await
            .map_err(|e| query_error("check identifier", e))?;
        let taken: bool = column(&row, "taken")?;
        Ok(!taken)
    }

    async fn next_identifier_sequence(&self) -> Result<Option<i64>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_one("SELECT nextval('dataset_identifier_seq') AS value", &[])
            .await
            .map_err(|e| query_error("advance identifier sequence", e))?;
        Ok(Some(column(&row, "value")?))
    }

    async fn permissions_for(&self, user: &UserId, dataset: &DatasetId) -> Result<BTreeSet<Permission>> {
        let conn = self.client.get_connection().await?;
        let rows = conn
            .query(
                "SELECT role FROM role_assignments WHERE user_id = $1 AND dataset_id = $2",
                &[user.as_uuid(), dataset.as_uuid()],
            )
            .await
            .map_err(|e| query_error("load role assignments", e))?;

        let mut roles = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = column(row, "role")?;
            let role: Role = name.parse().map_err(PersistenceError::CorruptRecord)?;
            roles.push(role);
        }
        Ok(permissions_of(&roles))
    }

    async fn assign_role(&self, assignment: RoleAssignment) -> Result<()> {
        let conn = self.client.get_connection().await?;
        conn.execute(
            "INSERT INTO role_assignments (dataset_id, user_id, role) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
            &[
                assignment.dataset_id.as_uuid(),
                assignment.user_id.as_uuid(),
                &assignment.role.as_str(),
            ],
        )
        .await
        .map_err(|e| query_error("assign role", e))?;
        Ok(())
    }

    async fn touch_version_user(&self, version: &VersionId, user: &UserId, at: DateTime<Utc>) -> Result<()> {
        let conn = self.client.get_connection().await?;
        conn.execute(
            "INSERT INTO dataset_version_users (version_id, user_id, last_update_time) VALUES ($1, $2, $3) \
             ON CONFLICT (version_id, user_id) DO UPDATE SET last_update_time = EXCLUDED.last_update_time",
            &[version.as_uuid(), user.as_uuid(), &at],
        )
        .await
        .map_err(|e| query_error("record version contributor", e))?;
        Ok(())
    }

    async fn find_all_local_dataset_ids(&self) -> Result<Vec<DatasetId>> {
        let conn = self.client.get_connection().await?;
        let rows = conn
            .query("SELECT id FROM datasets WHERE NOT harvested ORDER BY id", &[])
            .await
            .map_err(|e| query_error("list local datasets", e))?;
        let ids = rows
            .iter()
            .map(|r| column::<Uuid>(r, "id").map(DatasetId::from_uuid))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    async fn set_last_export_time(&self, id: &DatasetId, at: DateTime<Utc>) -> Result<()> {
        let conn = self.client.get_connection().await?;
        let updated = conn
            .execute(
                "UPDATE datasets SET last_export_time = $2 WHERE id = $1",
                &[id.as_uuid(), &at],
            )
            .await
            .map_err(|e| query_error("stamp export time", e))?;
        if updated == 0 {
            return Err(PersistenceError::NotFound(format!("dataset {id}")).into());
        }
        Ok(())
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<AuthenticatedUser>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt("SELECT document FROM users WHERE id = $1", &[id.as_uuid()])
            .await
            .map_err(|e| query_error("find user", e))?;
        Ok(row.map(|r| user_from_row(&r)).transpose()?)
    }

    async fn save_user(&self, user: AuthenticatedUser) -> Result<()> {
        let conn = self.client.get_connection().await?;
        let document = user_document(&user)?;
        conn.execute(
            "INSERT INTO users (id, identifier, document) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET identifier = EXCLUDED.identifier, document = EXCLUDED.document",
            &[user.id.as_uuid(), &user.identifier, &document],
        )
        .await
        .map_err(|e| query_error("save user", e))?;
        Ok(())
    }
}

#[async_trait]
impl LockStore for PostgreSQLAdapter {
    async fn add_lock_if_absent(&self, lock: DatasetLock) -> Result<DatasetLock> {
        let conn = self.client.get_connection().await?;
        let user = lock.user_id.map(|u| *u.as_uuid());
        let inserted = conn
            .query_opt(
                "INSERT INTO dataset_locks (id, dataset_id, reason, user_id, start_time, info) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (dataset_id, reason) DO NOTHING \
                 RETURNING id, dataset_id, reason, user_id, start_time, info",
                &[
                    lock.id.as_uuid(),
                    lock.dataset_id.as_uuid(),
                    &lock.reason.as_str(),
                    &user,
                    &lock.start_time,
                    &lock.info,
                ],
            )
            .await
            .map_err(|e| query_error("add lock", e))?;

        if let Some(row) = inserted {
            return Ok(lock_from_row(&row)?);
        }

        let existing = conn
            .query_one(
                "SELECT id, dataset_id, reason, user_id, start_time, info FROM dataset_locks \
                 WHERE dataset_id = $1 AND reason = $2",
                &[lock.dataset_id.as_uuid(), &lock.reason.as_str()],
            )
            .await
            .map_err(|e| query_error("load existing lock", e))?;
        Ok(lock_from_row(&existing)?)
    }

    async fn remove_locks(&self, dataset: &DatasetId, reason: LockReason) -> Result<Vec<DatasetLock>> {
        let conn = self.client.get_connection().await?;
        let rows = conn
            .query(
                "DELETE FROM dataset_locks WHERE dataset_id = $1 AND reason = $2 \
                 RETURNING id, dataset_id, reason, user_id, start_time, info",
                &[dataset.as_uuid(), &reason.as_str()],
            )
            .await
            .map_err(|e| query_error("remove locks", e))?;
        Ok(rows.iter().map(lock_from_row).collect::<std::result::Result<_, _>>()?)
    }

    async fn list_locks(&self, filter: &LockFilter) -> Result<Vec<DatasetLock>> {
        let conn = self.client.get_connection().await?;
        let dataset = filter.dataset_id.map(|d| *d.as_uuid());
        let reason = filter.reason.map(|r| r.as_str().to_string());
        let user = filter.user_id.map(|u| *u.as_uuid());
        let rows = conn
            .query(
                "SELECT id, dataset_id, reason, user_id, start_time, info FROM dataset_locks \
                 WHERE ($1::uuid IS NULL OR dataset_id = $1) \
                   AND ($2::text IS NULL OR reason = $2) \
                   AND ($3::uuid IS NULL OR user_id = $3) \
                 ORDER BY start_time",
                &[&dataset, &reason, &user],
            )
            .await
            .map_err(|e| query_error("list locks", e))?;
        Ok(rows.iter().map(lock_from_row).collect::<std::result::Result<_, _>>()?)
    }

    async fn update_lock(&self, lock: &DatasetLock) -> Result<()> {
        let conn = self.client.get_connection().await?;
        let user = lock.user_id.map(|u| *u.as_uuid());
        let updated = conn
            .execute(
                "UPDATE dataset_locks SET user_id = $3, info = $4 WHERE dataset_id = $1 AND reason = $2",
                &[lock.dataset_id.as_uuid(), &lock.reason.as_str(), &user, &lock.info],
            )
            .await
            .map_err(|e| query_error("update lock", e))?;
        if updated == 0 {
            return Err(PersistenceError::NotFound(format!(
                "lock {} on dataset {}",
                lock.reason, lock.dataset_id
            ))
            .into());
        }
        Ok(())
    }
}

/// WHERE clause and single parameter for a notification query
fn notification_clause(query: &NotificationQuery) -> (&'static str, Option<Uuid>, Option<String>) {
    match query {
        NotificationQuery::ByUser(u) => ("user_id = $1", Some(*u.as_uuid()), None),
        NotificationQuery::ByRequestor(u) => ("requestor_id = $1", Some(*u.as_uuid()), None),
        NotificationQuery::UnreadByUser(u) => ("user_id = $1 AND NOT read", Some(*u.as_uuid()), None),
        NotificationQuery::ByObject(o) => ("object_id = $1", None, Some(o.clone())),
        NotificationQuery::Unemailed => ("NOT emailed", None, None),
    }
}

#[async_trait]
impl NotificationStore for PostgreSQLAdapter {
    async fn save_notification(&self, notification: UserNotification) -> Result<UserNotification> {
        let conn = self.client.get_connection().await?;
        let document = notification_document(&notification)?;
        let requestor = notification.requestor_id.map(|u| *u.as_uuid());
        conn.execute(
            "INSERT INTO user_notifications (id, user_id, requestor_id, object_id, send_date, read, emailed, document) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (id) DO UPDATE SET read = EXCLUDED.read, emailed = EXCLUDED.emailed, document = EXCLUDED.document",
            &[
                notification.id.as_uuid(),
                notification.user_id.as_uuid(),
                &requestor,
                &notification.object_id,
                &notification.send_date,
                &notification.read,
                &notification.emailed,
                &document,
            ],
        )
        .await
        .map_err(|e| query_error("save notification", e))?;
        Ok(notification)
    }

    async fn find_notification(&self, id: &NotificationId) -> Result<Option<UserNotification>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt(
                "SELECT document, read, emailed FROM user_notifications WHERE id = $1",
                &[id.as_uuid()],
            )
            .await
            .map_err(|e| query_error("find notification", e))?;
        Ok(row.map(|r| notification_from_row(&r)).transpose()?)
    }

    async fn find_notifications(&self, query: &NotificationQuery) -> Result<Vec<UserNotification>> {
        let conn = self.client.get_connection().await?;
        let (clause, uuid_param, text_param) = notification_clause(query);
        let sql = format!(
            "SELECT document, read, emailed FROM user_notifications WHERE {clause} ORDER BY send_date DESC"
        );
        let rows = match (uuid_param, text_param) {
            (Some(u), _) => conn.query(&sql, &[&u]).await,
            (None, Some(t)) => conn.query(&sql, &[&t]).await,
            (None, None) => conn.query(&sql, &[]).await,
        }
        .map_err(|e| query_error("find notifications", e))?;
        Ok(rows.iter().map(notification_from_row).collect::<std::result::Result<_, _>>()?)
    }

    async fn unread_count(&self, user: &UserId) -> Result<u64> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_one(
                "SELECT COUNT(*) AS unread FROM user_notifications WHERE user_id = $1 AND NOT read",
                &[user.as_uuid()],
            )
            .await
            .map_err(|e| query_error("count unread notifications", e))?;
        let count: i64 = column(&row, "unread")?;
        Ok(count.max(0) as u64)
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<()> {
        let conn = self.client.get_connection().await?;
        let updated = conn
            .execute(
                "UPDATE user_notifications SET read = TRUE, \
                 document = jsonb_set(document, '{read}', 'true'::jsonb) WHERE id = $1",
                &[id.as_uuid()],
            )
            .await
            .map_err(|e| query_error("mark notification read", e))?;
        if updated == 0 {
            return Err(PersistenceError::NotFound(format!("notification {id}")).into());
        }
        Ok(())
    }

    async fn delete_notification(&self, id: &NotificationId) -> Result<()> {
        let conn = self.client.get_connection().await?;
        conn.execute("DELETE FROM user_notifications WHERE id = $1", &[id.as_uuid()])
            .await
            .map_err(|e| query_error("delete notification", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_clause() {
        let user = UserId::new();
        let (clause, uuid, text) = notification_clause(&NotificationQuery::UnreadByUser(user));
        assert!(clause.contains("NOT read"));
        assert_eq!(uuid, Some(*user.as_uuid()));
        assert!(text.is_none());

        let (clause, uuid, text) = notification_clause(&NotificationQuery::ByObject("ds-7".into()));
        assert_eq!(clause, "object_id = $1");
        assert!(uuid.is_none());
        assert_eq!(text.as_deref(), Some("ds-7"));

        let (clause, uuid, text) = notification_clause(&NotificationQuery::Unemailed);
        assert_eq!(clause, "NOT emailed");
        assert!(uuid.is_none() && text.is_none());
    }
}
