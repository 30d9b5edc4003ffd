//! Dataset locks

use super::ids::{DatasetId, LockId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why a dataset is locked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LockReason {
    /// Tabular ingest running
    Ingest,
    /// External workflow step pending
    Workflow,
    /// Submitted for review
    InReview,
    /// Data capture module upload
    DcmUpload,
    /// Another edit is being saved
    EditInProgress,
    /// Publication is being finalized
    FinalizePublication,
    /// Globus transfer running
    GlobusUpload,
    /// Uploaded files failed validation
    FileValidationFailed,
}

impl LockReason {
    pub const ALL: [LockReason; 8] = [
        LockReason::Ingest,
        LockReason::Workflow,
        LockReason::InReview,
        LockReason::DcmUpload,
        LockReason::EditInProgress,
        LockReason::FinalizePublication,
        LockReason::GlobusUpload,
        LockReason::FileValidationFailed,
    ];

    /// Whether this lock prevents an edit by a caller
    ///
    /// `InReview` only blocks callers that cannot publish;
    /// `FileValidationFailed` never blocks.
    pub fn blocks_edit(&self, caller_can_publish: bool) -> bool {
        match self {
            LockReason::Ingest
            | LockReason::Workflow
            | LockReason::DcmUpload
            | LockReason::EditInProgress
            | LockReason::FinalizePublication
            | LockReason::GlobusUpload => true,
            LockReason::InReview => !caller_can_publish,
            LockReason::FileValidationFailed => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LockReason::Ingest => "Ingest",
            LockReason::Workflow => "Workflow",
            LockReason::InReview => "InReview",
            LockReason::DcmUpload => "DcmUpload",
            LockReason::EditInProgress => "EditInProgress",
            LockReason::FinalizePublication => "finalizePublication",
            LockReason::GlobusUpload => "GlobusUpload",
            LockReason::FileValidationFailed => "FileValidationFailed",
        }
    }
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LockReason::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown lock reason: {s}"))
    }
}

/// A lock held on a dataset for one reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetLock {
    pub id: LockId,
    pub dataset_id: DatasetId,
    pub reason: LockReason,
    pub user_id: Option<UserId>,
    pub start_time: DateTime<Utc>,
    pub info: Option<String>,
}

impl DatasetLock {
    pub fn new(
        dataset_id: DatasetId,
        reason: LockReason,
        user_id: Option<UserId>,
        info: Option<String>,
    ) -> Self {
        Self {
            id: LockId::new(),
            dataset_id,
            reason,
            user_id,
            start_time: Utc::now(),
            info,
        }
    }
}

/// Criteria for listing locks; empty filter matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockFilter {
    pub dataset_id: Option<DatasetId>,
    pub reason: Option<LockReason>,
    pub user_id: Option<UserId>,
}

impl LockFilter {
    pub fn matches(&self, lock: &DatasetLock) -> bool {
        self.dataset_id.map_or(true, |d| d == lock.dataset_id)
            && self.reason.map_or(true, |r| r == lock.reason)
            && self.user_id.map_or(true, |u| Some(u) == lock.user_id)
    }
}
