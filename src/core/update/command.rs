//! The dataset update command
//!
//! Saves the draft of a dataset: authorizes the caller, checks locks,
//! validates fields, stamps timestamps, deletes requested files, refreshes
//! the version UNF, registers the identifier when configured to, and commits
//! everything in one unit of work. Index refresh and version-user tracking
//! run after the commit and never fail the command.

use crate::adapters::database::traits::UnitOfWork;
use crate::core::identifiers::RegistrationReport;
use crate::core::update::context::CommandContext;
use crate::core::update::validation::validate_version;
use crate::domain::schema::tidy_fields;
use crate::domain::{
    AuthenticatedUser, DataFileId, Dataset, FileMetadataId, Permission, Principal, RepositoryError, Result,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// What an update produced
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// The dataset as committed
    pub dataset: Dataset,
    /// Set when registration was attempted during this update
    pub registration: Option<RegistrationReport>,
}

/// Saves changes to a dataset's draft version
#[derive(Debug, Clone)]
pub struct UpdateDatasetCommand {
    principal: Principal,
    dataset: Dataset,
    files_to_delete: Vec<FileMetadataId>,
    data_file_to_delete: Option<DataFileId>,
    lenient: bool,
}

impl UpdateDatasetCommand {
    pub fn new(principal: Principal, dataset: Dataset) -> Self {
        Self {
            principal,
            dataset,
            files_to_delete: Vec::new(),
            data_file_to_delete: None,
            lenient: false,
        }
    }

    /// Deletes the files behind these draft file metadata records
    pub fn with_files_to_delete(mut self, files: Vec<FileMetadataId>) -> Self {
        self.files_to_delete = files;
        self
    }

    /// Deletes one data file, resolved to its file metadata in the draft
    ///
    /// Resolution happens once the draft exists; a file absent from the
    /// draft deletes nothing.
    pub fn with_data_file_to_delete(mut self, data_file: DataFileId) -> Self {
        self.data_file_to_delete = Some(data_file);
        self
    }

    /// Replaces invalid values with placeholders instead of failing
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Runs the update, returning the committed dataset
    ///
    /// # Errors
    ///
    /// Authorization, lock, validation and commit failures. Nothing is
    /// written when an error is returned.
    pub async fn execute(self, ctx: &CommandContext) -> Result<Dataset> {
        Ok(self.execute_with_report(ctx).await?.dataset)
    }

    /// Like [`execute`](Self::execute), also reporting the registration
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn execute_with_report(self, ctx: &CommandContext) -> Result<UpdateOutcome> {
        let Self {
            principal,
            mut dataset,
            mut files_to_delete,
            data_file_to_delete,
            lenient,
        } = self;
        let now = Utc::now();

        let user = principal
            .user()
            .ok_or_else(|| RepositoryError::Authorization("Only authenticated users can update datasets".into()))?
            .clone();

        let permissions = permissions_of(ctx, &user, &dataset).await?;
        if !permissions.contains(&Permission::EditDataset) {
            return Err(RepositoryError::Authorization(format!(
                "{} may not edit dataset {}",
                user.identifier, dataset.id
            )));
        }
        ctx.locks
            .check_edit_lock(dataset.id, permissions.contains(&Permission::PublishDataset))
            .await?;

        {
            let draft = dataset.edit_version_mut();
            ctx.schema.initialize(&mut draft.fields);
            validate_version(&ctx.schema, draft, lenient)?;

            if let Some(data_file) = data_file_to_delete {
                match draft.file_metadata_for(&data_file) {
                    Some(fm) => files_to_delete.push(fm.id),
                    None => tracing::debug!(data_file_id = %data_file, "Data file not in draft, nothing to delete"),
                }
            }

            if let Some(unknown) = files_to_delete
                .iter()
                .find(|id| draft.file_metadata(id).is_none())
            {
                return Err(RepositoryError::validation(format!(
                    "file metadata {unknown} is not part of the draft"
                )));
            }
        }

        tracing::info!(
            dataset_id = %dataset.id,
            user = %user.identifier,
            files_to_delete = files_to_delete.len(),
            lenient,
            "Updating dataset"
        );

        stamp(&mut dataset, &user, now);

        let mut recalculate_unf = false;
        let mut targets = Vec::with_capacity(files_to_delete.len());
        for fm_id in &files_to_delete {
            let Some(file_id) = dataset
                .edit_version()
                .and_then(|d| d.file_metadata(fm_id))
                .map(|fm| fm.data_file_id)
            else {
                continue;
            };
            if dataset.thumbnail_file == Some(file_id) {
                dataset.remove_thumbnail();
            }
            if dataset.file(&file_id).and_then(|f| f.unf.as_ref()).is_some() {
                recalculate_unf = true;
            }
            targets.push((*fm_id, file_id));
        }

        let mut work = UnitOfWork::merge(dataset);
        for (fm_id, file_id) in targets {
            let released = work.dataset.file(&file_id).map(|f| f.is_released()).unwrap_or(false);
            if released {
                work.dataset.remove_draft_file_metadata(&fm_id);
                tracing::debug!(data_file_id = %file_id, "Released file removed from draft only");
            } else {
                work.dataset.remove_data_file(&file_id);
                work.delete_file(file_id);
                tracing::debug!(data_file_id = %file_id, "Unreleased file deleted");
            }
        }

        if recalculate_unf {
            let files = work.dataset.files.clone();
            ctx.ingest
                .recalculate_version_unf(work.dataset.edit_version_mut(), &files)
                .await?;
        }

        let mut registration = None;
        if ctx.identifiers.config().register_immediately() && work.dataset.global_id_create_time.is_none() {
            match ctx.identifiers.register_dataset(&mut work.dataset).await {
                Ok(report) => {
                    if !report.is_registered() {
                        tracing::warn!(
                            dataset_id = %work.dataset.id,
                            identifier = %report.identifier,
                            attempts = report.attempts,
                            status = %report.status,
                            "Identifier not registered, dataset saved without registration"
                        );
                    }
                    registration = Some(report);
                }
                Err(e) => {
                    tracing::warn!(dataset_id = %work.dataset.id, error = %e, "Identifier registration failed");
                }
            }
        }

        work.dataset.edit_version_mut().last_update_time = Some(now);
        work.dataset.modification_time = Some(now);

        let saved = ctx.datasets.commit(work).await?;

        if let Some(version) = saved.edit_version() {
            if let Err(e) = ctx.datasets.touch_version_user(&version.id, &user.id, now).await {
                tracing::warn!(dataset_id = %saved.id, error = %e, "Failed to record version user");
            }
        }
        if let Err(e) = ctx.index.index_dataset(&saved, true).await {
            tracing::warn!(dataset_id = %saved.id, error = %e, "Failed to index dataset after update");
        }

        tracing::info!(dataset_id = %saved.id, "Dataset updated");
        Ok(UpdateOutcome {
            dataset: saved,
            registration,
        })
    }
}

/// Permissions of the caller, superusers holding all of them
async fn permissions_of(
    ctx: &CommandContext,
    user: &AuthenticatedUser,
    dataset: &Dataset,
) -> Result<BTreeSet<Permission>> {
    if user.superuser {
        return Ok([
            Permission::EditDataset,
            Permission::PublishDataset,
            Permission::ViewUnpublishedDataset,
            Permission::DownloadFile,
        ]
        .into_iter()
        .collect());
    }
    ctx.datasets.permissions_for(&user.id, &dataset.id).await
}

/// Tidies the draft and fills in create and modification stamps
fn stamp(dataset: &mut Dataset, user: &AuthenticatedUser, now: DateTime<Utc>) {
    let draft = dataset.edit_version_mut();
    tidy_fields(&mut draft.fields);
    if draft.create_time.is_none() {
        draft.create_time = Some(now);
    }

    for file in dataset.files.iter_mut() {
        if file.create_date.is_none() {
            file.create_date = Some(now);
            file.creator = Some(user.id);
        }
        file.modification_time = Some(now);
    }
}
