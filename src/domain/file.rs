//! Data files, their per-version metadata, and file categories

use crate::domain::ids::{DataFileId, FileMetadataId, GlobalId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Checksum algorithm recorded for stored content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChecksumAlgorithm {
    #[serde(rename = "MD5")]
    Md5,
    #[serde(rename = "SHA-1")]
    Sha1,
    #[serde(rename = "SHA-256")]
    Sha256,
    #[serde(rename = "SHA-512")]
    Sha512,
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChecksumAlgorithm::Md5 => "MD5",
            ChecksumAlgorithm::Sha1 => "SHA-1",
            ChecksumAlgorithm::Sha256 => "SHA-256",
            ChecksumAlgorithm::Sha512 => "SHA-512",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('_', "-").as_str() {
            "MD5" => Ok(ChecksumAlgorithm::Md5),
            "SHA-1" | "SHA1" => Ok(ChecksumAlgorithm::Sha1),
            "SHA-256" | "SHA256" => Ok(ChecksumAlgorithm::Sha256),
            "SHA-512" | "SHA512" => Ok(ChecksumAlgorithm::Sha512),
            other => Err(format!("Unknown checksum algorithm: {other}")),
        }
    }
}

/// Stored content of a dataset
///
/// A file that has been part of a released version is never hard-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFile {
    pub id: DataFileId,
    pub content_type: String,
    pub size: u64,
    pub checksum_value: String,
    pub checksum_type: ChecksumAlgorithm,
    /// Universal numerical fingerprint, present for ingested tabular files
    pub unf: Option<String>,
    pub storage_identifier: String,
    /// Set when a version containing the file was released
    pub publication_date: Option<DateTime<Utc>>,
    /// `None` until the file has been persisted once
    pub create_date: Option<DateTime<Utc>>,
    pub creator: Option<UserId>,
    pub modification_time: Option<DateTime<Utc>>,
    pub global_id: Option<GlobalId>,
    pub global_id_create_time: Option<DateTime<Utc>>,
    pub identifier_registered: bool,
}

impl DataFile {
    pub fn new(content_type: impl Into<String>, size: u64, checksum_value: impl Into<String>) -> Self {
        let id = DataFileId::new();
        Self {
            id,
            content_type: content_type.into(),
            size,
            checksum_value: checksum_value.into(),
            checksum_type: ChecksumAlgorithm::Md5,
            unf: None,
            storage_identifier: format!("file://{id}"),
            publication_date: None,
            create_date: None,
            creator: None,
            modification_time: None,
            global_id: None,
            global_id_create_time: None,
            identifier_registered: false,
        }
    }

    pub fn with_unf(mut self, unf: impl Into<String>) -> Self {
        self.unf = Some(unf.into());
        self
    }

    pub fn with_checksum_type(mut self, checksum_type: ChecksumAlgorithm) -> Self {
        self.checksum_type = checksum_type;
        self
    }

    pub fn released_at(mut self, when: DateTime<Utc>) -> Self {
        self.publication_date = Some(when);
        self
    }

    pub fn is_released(&self) -> bool {
        self.publication_date.is_some()
    }

    pub fn is_tabular(&self) -> bool {
        self.unf.is_some()
    }
}

/// Version-specific attributes of a data file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub id: FileMetadataId,
    pub data_file_id: DataFileId,
    pub label: String,
    pub description: Option<String>,
    pub directory_label: Option<String>,
    pub restricted: bool,
}

impl FileMetadata {
    pub fn new(data_file_id: DataFileId, label: impl Into<String>) -> Self {
        Self {
            id: FileMetadataId::new(),
            data_file_id,
            label: label.into(),
            description: None,
            directory_label: None,
            restricted: false,
        }
    }

    /// Copy for a new draft version, with a fresh id
    pub fn copy_for_draft(&self) -> Self {
        Self {
            id: FileMetadataId::new(),
            ..self.clone()
        }
    }
}

/// Named tag grouping file metadata records of one dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFileCategory {
    pub name: String,
    pub file_metadata_ids: Vec<FileMetadataId>,
}

impl DataFileCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_metadata_ids: Vec::new(),
        }
    }

    pub fn contains(&self, id: &FileMetadataId) -> bool {
        self.file_metadata_ids.contains(id)
    }
}
