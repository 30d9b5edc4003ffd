//! Core business logic for Cairn.
//!
//! # Modules
//!
//! - [`update`] - The dataset update workflow
//! - [`identifiers`] - Identifier generation and registration with bounded retry
//! - [`locks`] - Dataset locks
//! - [`notifications`] - User notifications and mute rules
//! - [`export`] - Metadata export and reindexing
//! - [`fingerprint`] - Version UNF recalculation
//!
//! # Update Workflow
//!
//! 1. **Authorize**: caller must be authenticated and hold `EditDataset`
//! 2. **Check locks**: an edit-blocking lock aborts the update
//! 3. **Validate**: strict or lenient field validation of the draft
//! 4. **Stage**: timestamps, file deletions and UNF recalculation
//! 5. **Register** (optional): identifier registration with bounded retry
//! 6. **Commit**: one unit of work
//! 7. **After commit**: version-user tracking and reindexing, failures logged only

pub mod export;
pub mod fingerprint;
pub mod identifiers;
pub mod locks;
pub mod notifications;
pub mod update;
