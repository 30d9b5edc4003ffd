//! PostgreSQL row models
//!
//! Mapping between table rows and domain types. Aggregates travel as JSONB
//! documents; the plain columns beside them exist for constraints and lookups.

use crate::domain::{
    AuthenticatedUser, Dataset, DatasetId, DatasetLock, LockId, LockReason, PersistenceError,
    UserId, UserNotification,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_postgres::Row;
use uuid::Uuid;

type RowResult<T> = std::result::Result<T, PersistenceError>;

/// Reads a column, turning type mismatches into [`PersistenceError::CorruptRecord`]
pub(crate) fn column<'a, T>(row: &'a Row, name: &str) -> RowResult<T>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(name)
        .map_err(|e| PersistenceError::CorruptRecord(format!("column {name}: {e}")))
}

fn decode<T: DeserializeOwned>(row: &Row, name: &str) -> RowResult<T> {
    let document: Value = column(row, name)?;
    serde_json::from_value(document)
        .map_err(|e| PersistenceError::CorruptRecord(format!("{name} document: {e}")))
}

fn encode<T: serde::Serialize>(value: &T) -> RowResult<Value> {
    serde_json::to_value(value).map_err(|e| PersistenceError::QueryFailed(e.to_string()))
}

/// A row of the `datasets` table
#[derive(Debug, Clone)]
pub struct PostgreSQLDataset {
    pub id: Uuid,
    pub owner: String,
    pub global_id: Option<String>,
    pub harvested: bool,
    pub document: Value,
    pub modification_time: Option<DateTime<Utc>>,
    pub last_export_time: Option<DateTime<Utc>>,
}

impl PostgreSQLDataset {
    pub fn from_domain(dataset: &Dataset) -> RowResult<Self> {
        Ok(Self {
            id: *dataset.id.as_uuid(),
            owner: dataset.owner.clone(),
            global_id: dataset.global_id.as_ref().map(ToString::to_string),
            harvested: dataset.harvested,
            document: encode(dataset)?,
            modification_time: dataset.modification_time,
            last_export_time: dataset.last_export_time,
        })
    }

    /// Decodes the aggregate; the `last_export_time` column wins over the document
    pub fn dataset_from_row(row: &Row) -> RowResult<Dataset> {
        let mut dataset: Dataset = decode(row, "document")?;
        dataset.last_export_time = column(row, "last_export_time")?;
        Ok(dataset)
    }
}

/// A row of the `datafiles` table
#[derive(Debug, Clone, PartialEq)]
pub struct PostgreSQLDataFile {
    pub id: Uuid,
    pub dataset_id: Uuid,
    pub global_id: Option<String>,
    pub released: bool,
}

impl PostgreSQLDataFile {
    /// One row per file owned by the dataset
    pub fn rows_for(dataset: &Dataset) -> Vec<Self> {
        dataset
            .files
            .iter()
            .map(|f| Self {
                id: *f.id.as_uuid(),
                dataset_id: *dataset.id.as_uuid(),
                global_id: f.global_id.as_ref().map(ToString::to_string),
                released: f.is_released(),
            })
            .collect()
    }
}

pub fn lock_from_row(row: &Row) -> RowResult<DatasetLock> {
    let reason: String = column(row, "reason")?;
    let reason: LockReason = reason
        .parse()
        .map_err(|e: String| PersistenceError::CorruptRecord(e))?;
    let user: Option<Uuid> = column(row, "user_id")?;
    Ok(DatasetLock {
        id: LockId::from_uuid(column(row, "id")?),
        dataset_id: DatasetId::from_uuid(column(row, "dataset_id")?),
        reason,
        user_id: user.map(UserId::from_uuid),
        start_time: column(row, "start_time")?,
        info: column(row, "info")?,
    })
}

pub fn user_from_row(row: &Row) -> RowResult<AuthenticatedUser> {
    decode(row, "document")
}

pub fn user_document(user: &AuthenticatedUser) -> RowResult<Value> {
    encode(user)
}

/// Decodes a notification; the `read` and `emailed` columns win over the document
pub fn notification_from_row(row: &Row) -> RowResult<UserNotification> {
    let mut n: UserNotification = decode(row, "document")?;
    n.read = column(row, "read")?;
    n.emailed = column(row, "emailed")?;
    Ok(n)
}

pub fn notification_document(n: &UserNotification) -> RowResult<Value> {
    encode(n)
}
