//! Identifier registration with bounded retry
//!
//! A registration makes at most `max_registration_attempts` registry calls.
//! Each collision regenerates the candidate; a failure or transport error
//! stops immediately. Nothing here is fatal to the caller: the report says
//! how it ended and the dataset is left unregistered on anything but success.

use crate::adapters::database::traits::DatasetStore;
use crate::adapters::registry::{
    IdentifierRegistry, RegistrationStatus, RegistrationTarget,
};
use crate::config::{ApplicationConfig, IdentifierConfig};
use crate::core::identifiers::generator::IdentifierGenerator;
use crate::domain::{DataFileId, Dataset, GlobalId, PersistenceError, Result};
use crate::log_registration_attempt;
use chrono::{Datelike, Utc};
use serde::Serialize;
use std::sync::Arc;

/// How one registration ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationReport {
    /// Registry calls made
    pub attempts: usize,
    pub status: RegistrationStatus,
    /// The identifier the subject carries afterwards
    pub identifier: GlobalId,
}

impl RegistrationReport {
    pub fn is_registered(&self) -> bool {
        self.status == RegistrationStatus::Registered
    }
}

/// What is being registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subject {
    Dataset,
    File(DataFileId),
}

/// Allocates and registers persistent identifiers
pub struct IdentifierProvider {
    registry: Arc<dyn IdentifierRegistry>,
    generator: IdentifierGenerator,
    store: Arc<dyn DatasetStore + Send + Sync>,
    config: IdentifierConfig,
    application: ApplicationConfig,
}

impl IdentifierProvider {
    pub fn new(
        registry: Arc<dyn IdentifierRegistry>,
        store: Arc<dyn DatasetStore + Send + Sync>,
        config: IdentifierConfig,
        application: ApplicationConfig,
    ) -> Self {
        Self {
            registry,
            generator: IdentifierGenerator::new(config.clone(), store.clone()),
            store,
            config,
            application,
        }
    }

    pub fn config(&self) -> &IdentifierConfig {
        &self.config
    }

    pub fn generator(&self) -> &IdentifierGenerator {
        &self.generator
    }

    /// Total registry calls allowed per registration
    pub fn max_attempts(&self) -> usize {
        self.config.max_registration_attempts
    }

    /// Unused locally and unknown to the registry
    ///
    /// A registry that cannot be asked counts as "not found remotely".
    pub async fn is_identifier_unique(&self, global_id: &GlobalId, dataset: &Dataset) -> Result<bool> {
        if !self.store.is_identifier_locally_unique(global_id).await? {
            return Ok(false);
        }
        match self.registry.already_exists(global_id).await {
            Ok(exists) => Ok(!exists),
            Err(e) => {
                tracing::warn!(
                    dataset_id = %dataset.id,
                    identifier = %global_id,
                    error = %e,
                    "Registry lookup failed, assuming identifier is free remotely"
                );
                Ok(true)
            }
        }
    }

    /// Registers the dataset identifier, generating one first if missing
    ///
    /// On success the dataset gets its registration timestamp and
    /// `identifier_registered`. After a permanent collision the dataset keeps
    /// the last candidate without a timestamp.
    ///
    /// # Errors
    ///
    /// Only when no candidate can be generated.
    pub async fn register_dataset(&self, dataset: &mut Dataset) -> Result<RegistrationReport> {
        if dataset.global_id.is_none() {
            let gid = self.generator.generate_dataset_identifier(None).await?;
            dataset.global_id = Some(gid);
        }
        self.register(dataset, Subject::Dataset).await
    }

    /// Registers a data file identifier, generating one first if missing
    ///
    /// # Errors
    ///
    /// When the file is not part of the dataset or no candidate can be
    /// generated.
    pub async fn register_file(&self, dataset: &mut Dataset, file_id: DataFileId) -> Result<RegistrationReport> {
        let has_id = dataset
            .file(&file_id)
            .ok_or_else(|| PersistenceError::NotFound(format!("data file {file_id}")))?
            .global_id
            .is_some();
        if !has_id {
            let gid = self.generator.generate_file_identifier(dataset).await?;
            if let Some(file) = dataset.file_mut(&file_id) {
                file.global_id = Some(gid);
            }
        }
        self.register(dataset, Subject::File(file_id)).await
    }

    fn current_identifier(dataset: &Dataset, subject: Subject) -> Option<GlobalId> {
        match subject {
            Subject::Dataset => dataset.global_id.clone(),
            Subject::File(id) => dataset.file(&id).and_then(|f| f.global_id.clone()),
        }
    }

    fn set_identifier(dataset: &mut Dataset, subject: Subject, gid: GlobalId) {
        match subject {
            Subject::Dataset => dataset.global_id = Some(gid),
            Subject::File(id) => {
                if let Some(file) = dataset.file_mut(&id) {
                    file.global_id = Some(gid);
                }
            }
        }
    }

    fn mark_registered(dataset: &mut Dataset, subject: Subject) {
        let now = Utc::now();
        match subject {
            Subject::Dataset => {
                dataset.global_id_create_time = Some(now);
                dataset.identifier_registered = true;
            }
            Subject::File(id) => {
                if let Some(file) = dataset.file_mut(&id) {
                    file.global_id_create_time = Some(now);
                    file.identifier_registered = true;
                }
            }
        }
    }

    async fn regenerate(&self, dataset: &Dataset, subject: Subject, current: &GlobalId) -> Result<GlobalId> {
        match subject {
            Subject::Dataset => self.generator.generate_dataset_identifier(Some(current)).await,
            Subject::File(_) => self.generator.generate_file_identifier(dataset).await,
        }
    }

    fn target(&self, dataset: &Dataset, subject: Subject, gid: &GlobalId) -> RegistrationTarget {
        let version = dataset.latest_version();
        let dataset_title = version.and_then(|v| v.title()).unwrap_or("Untitled").to_string();
        let creators = version
            .and_then(|v| v.field_values("author"))
            .map(|values| values.to_vec())
            .unwrap_or_default();
        let publication_year = dataset.release_time().unwrap_or_else(Utc::now).year();

        let (url, title) = match subject {
            Subject::Dataset => (self.application.landing_page(&gid.to_string()), dataset_title),
            Subject::File(id) => {
                let label = version
                    .and_then(|v| v.file_metadata_for(&id))
                    .map(|fm| fm.label.clone())
                    .unwrap_or_else(|| dataset_title.clone());
                (
                    format!(
                        "{}/file.xhtml?persistentId={}",
                        self.application.site_url.trim_end_matches('/'),
                        gid
                    ),
                    label,
                )
            }
        };

        RegistrationTarget {
            global_id: gid.clone(),
            url,
            title,
            creators,
            publisher: self.application.publisher.clone(),
            publication_year,
        }
    }

    async fn register(&self, dataset: &mut Dataset, subject: Subject) -> Result<RegistrationReport> {
        let ceiling = self.max_attempts();
        let mut gid = Self::current_identifier(dataset, subject).ok_or_else(|| {
            PersistenceError::NotFound(format!("no identifier to register on dataset {}", dataset.id))
        })?;
        let mut attempts = 0;

        let status = loop {
            attempts += 1;
            log_registration_attempt!(attempts, ceiling, gid);

            let target = self.target(dataset, subject, &gid);
            let outcome = match self.registry.create_identifier(&target).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(identifier = %gid, error = %e, "Registry call failed");
                    break RegistrationStatus::Failed;
                }
            };

            match outcome.status {
                RegistrationStatus::Registered => {
                    Self::mark_registered(dataset, subject);
                    break RegistrationStatus::Registered;
                }
                RegistrationStatus::Failed => {
                    tracing::warn!(
                        identifier = %gid,
                        message = outcome.message.as_deref().unwrap_or(""),
                        "Identifier registration failed"
                    );
                    break RegistrationStatus::Failed;
                }
                RegistrationStatus::Collision if attempts >= ceiling => {
                    tracing::warn!(identifier = %gid, attempts, "Identifier still colliding at attempt ceiling");
                    break RegistrationStatus::Collision;
                }
                RegistrationStatus::Collision => {
                    tracing::info!(identifier = %gid, "Identifier already exists at registry, regenerating");
                    match self.regenerate(dataset, subject, &gid).await {
                        Ok(next) => {
                            gid = next;
                            Self::set_identifier(dataset, subject, gid.clone());
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Could not regenerate identifier");
                            break RegistrationStatus::Collision;
                        }
                    }
                }
            }
        };

        tracing::info!(
            dataset_id = %dataset.id,
            identifier = %gid,
            attempts,
            status = %status,
            "Identifier registration finished"
        );
        Ok(RegistrationReport {
            attempts,
            status,
            identifier: gid,
        })
    }
}
