//! Dataset update workflow
//!
//! [`UpdateDatasetCommand`] runs against a [`CommandContext`] holding the
//! stores, lock manager, identifier provider, index and ingest service.
//!
//! ```rust,no_run
//! use cairn::core::update::{CommandContext, UpdateDatasetCommand};
//! use cairn::domain::{Dataset, Principal};
//!
//! # async fn example(ctx: &CommandContext, caller: Principal, dataset: Dataset) -> cairn::domain::Result<()> {
//! let saved = UpdateDatasetCommand::new(caller, dataset)
//!     .lenient(true)
//!     .execute(ctx)
//!     .await?;
//! println!("modified at {:?}", saved.modification_time);
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod context;
pub mod thumbnail;
pub mod validation;

pub use command::{UpdateDatasetCommand, UpdateOutcome};
pub use context::{CommandContext, CommandContextBuilder};
pub use thumbnail::{remove_dataset_thumbnail, set_dataset_file_as_thumbnail};
pub use validation::validate_version;
