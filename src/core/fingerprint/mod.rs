//! Version fingerprints (UNF)
//!
//! A version UNF summarizes the UNFs of its tabular files. It must be
//! recomputed whenever a fingerprinted file leaves the version.

use crate::domain::{DataFile, DatasetVersion, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};

const UNF_PREFIX: &str = "UNF:6:";

/// Ingest side of the repository
#[async_trait]
pub trait IngestService: Send + Sync {
    /// Recomputes `version.unf` from the files the version still references
    async fn recalculate_version_unf(&self, version: &mut DatasetVersion, files: &[DataFile]) -> Result<()>;
}

/// Computes version UNFs locally
#[derive(Debug, Default, Clone, Copy)]
pub struct UnfCalculator;

impl UnfCalculator {
    /// UNF over the sorted file UNFs, `None` when no file carries one
    pub fn version_unf(version: &DatasetVersion, files: &[DataFile]) -> Option<String> {
        let mut unfs: Vec<&str> = version
            .file_metadatas
            .iter()
            .filter_map(|fm| files.iter().find(|f| f.id == fm.data_file_id))
            .filter_map(|f| f.unf.as_deref())
            .collect();
        if unfs.is_empty() {
            return None;
        }
        unfs.sort_unstable();

        let mut hasher = Sha256::new();
        for unf in unfs {
            hasher.update(unf.as_bytes());
            hasher.update([0u8]);
        }
        Some(format!("{UNF_PREFIX}{}", general_purpose::STANDARD.encode(hasher.finalize())))
    }
}

#[async_trait]
impl IngestService for UnfCalculator {
    async fn recalculate_version_unf(&self, version: &mut DatasetVersion, files: &[DataFile]) -> Result<()> {
        version.unf = Self::version_unf(version, files);
        tracing::debug!(version_id = %version.id, unf = ?version.unf, "Version UNF recalculated");
        Ok(())
    }
}
