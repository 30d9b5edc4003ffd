//! Candidate identifier generation
//!
//! Candidates are checked against the store until one is unused by any
//! dataset or data file.

use crate::adapters::database::traits::DatasetStore;
use crate::config::{IdentifierConfig, IdentifierStyle};
use crate::domain::{Dataset, GlobalId, IdentifierError, Result};
use rand::Rng;
use std::sync::Arc;

const RANDOM_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const RANDOM_LENGTH: usize = 6;

/// Six random uppercase alphanumerics
pub fn random_local_part() -> String {
    let mut rng = rand::thread_rng();
    (0..RANDOM_LENGTH)
        .map(|_| RANDOM_ALPHABET[rng.gen_range(0..RANDOM_ALPHABET.len())] as char)
        .collect()
}

/// Highest numeric suffix among the dataset's dependent file identifiers
fn max_dependent_suffix(dataset: &Dataset, prefix: &str) -> u64 {
    dataset
        .files
        .iter()
        .filter_map(|f| f.global_id.as_ref())
        .filter_map(|gid| gid.identifier.strip_prefix(prefix))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

pub struct IdentifierGenerator {
    config: IdentifierConfig,
    store: Arc<dyn DatasetStore + Send + Sync>,
}

impl IdentifierGenerator {
    pub fn new(config: IdentifierConfig, store: Arc<dyn DatasetStore + Send + Sync>) -> Self {
        Self { config, store }
    }

    /// A new locally unique dataset identifier
    ///
    /// Protocol and authority come from `existing` when given, else from the
    /// configuration.
    ///
    /// # Errors
    ///
    /// [`IdentifierError::GenerationFailed`] when the sequence yields nothing
    /// or every candidate is taken.
    pub async fn generate_dataset_identifier(&self, existing: Option<&GlobalId>) -> Result<GlobalId> {
        let (protocol, authority) = match existing {
            Some(gid) => (gid.protocol.clone(), gid.authority.clone()),
            None => (self.config.protocol.clone(), self.config.authority.clone()),
        };
        let style = self.config.identifier_style();

        for _ in 0..self.config.max_generation_attempts {
            let local = match style {
                IdentifierStyle::RandomString => format!("{}{}", self.config.shoulder, random_local_part()),
                IdentifierStyle::StoredProcGenerated => match self.store.next_identifier_sequence().await? {
                    Some(n) => format!("{}{}", self.config.shoulder, n),
                    None => {
                        return Err(IdentifierError::GenerationFailed(
                            "identifier sequence returned no value".to_string(),
                        )
                        .into())
                    }
                },
            };
            let candidate = GlobalId::new(protocol.as_str(), authority.as_str(), local)?;
            if self.store.is_identifier_locally_unique(&candidate).await? {
                return Ok(candidate);
            }
            tracing::debug!(candidate = %candidate, "Identifier candidate already in use");
        }

        Err(IdentifierError::GenerationFailed(format!(
            "no unique identifier after {} candidates",
            self.config.max_generation_attempts
        ))
        .into())
    }

    /// A new locally unique identifier for a file of `dataset`
    ///
    /// Dependent identifiers extend the dataset identifier with the next
    /// free number (`FK2ABCDEF/3`); independent ones are generated like
    /// dataset identifiers.
    ///
    /// # Errors
    ///
    /// Dependent identifiers need the dataset to have one.
    pub async fn generate_file_identifier(&self, dataset: &Dataset) -> Result<GlobalId> {
        if !self.config.dependent_file_pids() {
            return self.generate_dataset_identifier(dataset.global_id.as_ref()).await;
        }

        let parent = dataset.global_id.as_ref().ok_or_else(|| {
            IdentifierError::GenerationFailed(format!(
                "dataset {} has no identifier to derive file identifiers from",
                dataset.id
            ))
        })?;
        let prefix = format!("{}/", parent.identifier);
        let mut next = max_dependent_suffix(dataset, &prefix) + 1;

        for _ in 0..self.config.max_generation_attempts {
            let candidate = parent.with_identifier(format!("{prefix}{next}"));
            if self.store.is_identifier_locally_unique(&candidate).await? {
                return Ok(candidate);
            }
            next += 1;
        }

        Err(IdentifierError::GenerationFailed(format!(
            "no free file identifier below {parent}"
        ))
        .into())
    }
}
