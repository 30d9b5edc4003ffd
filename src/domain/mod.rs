//! Domain models and types for Cairn.
//!
//! This module contains the entities of the repository core and the rules
//! that hold regardless of storage or transport.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`DatasetId`], [`DataFileId`], [`GlobalId`], ...)
//! - **The dataset aggregate** ([`Dataset`], [`DatasetVersion`], [`DataFile`], [`FileMetadata`])
//! - **Locks, users and notifications** ([`DatasetLock`], [`Principal`], [`UserNotification`])
//! - **Metadata schema validation** ([`MetadataSchema`])
//! - **Error types** ([`RepositoryError`], [`PersistenceError`], [`IdentifierError`])
//! - **Result type alias** ([`Result`])
//!
//! # Ownership
//!
//! A [`Dataset`] owns its versions, their file metadata, its data files and its
//! categories. References between those entities are ids, never pointers:
//!
//! ```rust
//! use cairn::domain::{DataFile, Dataset};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut dataset = Dataset::builder().owner("root").build()?;
//! let file = DataFile::new("text/csv", 2048, "5d41402abc4b2a76b9719d911017c592");
//! let file_id = file.id;
//! let fm_id = dataset.add_file(file, "samples.csv");
//!
//! let draft = dataset.edit_version().ok_or("no draft")?;
//! assert_eq!(draft.file_metadata(&fm_id).map(|fm| fm.data_file_id), Some(file_id));
//! # Ok(())
//! # }
//! ```

pub mod dataset;
pub mod errors;
pub mod file;
pub mod ids;
pub mod lock;
pub mod notification;
pub mod result;
pub mod schema;
pub mod user;

// Re-export commonly used types for convenience
pub use dataset::{Dataset, DatasetBuilder, DatasetVersion, VersionState};
pub use errors::{IdentifierError, PersistenceError, RepositoryError};
pub use file::{ChecksumAlgorithm, DataFile, DataFileCategory, FileMetadata};
pub use ids::{
    DataFileId, DatasetId, FileMetadataId, GlobalId, LockId, NotificationId, UserId, VersionId,
};
pub use lock::{DatasetLock, LockFilter, LockReason};
pub use notification::{NotificationType, UserNotification};
pub use result::Result;
pub use schema::{DatasetField, FieldKind, FieldType, FieldViolation, MetadataSchema};
pub use user::{AuthenticatedUser, Permission, Principal, Role, RoleAssignment};
