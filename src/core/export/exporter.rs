//! Metadata exporters
//!
//! Cached exports live at `{directory}/{dataset id}/export_{format}.json`.

use crate::config::ExportConfig;
use crate::domain::{Dataset, DatasetVersion, RepositoryError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Produces every configured export format for a dataset
#[async_trait]
pub trait MetadataExporter: Send + Sync {
    async fn export_all_formats(&self, dataset: &Dataset) -> Result<()>;
}

/// Renders one export format for the released version
pub fn render(format: &str, dataset: &Dataset, version: &DatasetVersion) -> Result<Value> {
    match format {
        "dataverse_json" => Ok(json!({
            "id": dataset.id,
            "identifier": dataset.global_id.as_ref().map(ToString::to_string),
            "persistentUrl": dataset.global_id.as_ref().map(|g| format!("https://doi.org/{}", g.authority_and_identifier())),
            "publicationDate": dataset.release_time(),
            "datasetVersion": version,
            "files": dataset.files.iter().filter(|f| version.file_metadata_for(&f.id).is_some()).collect::<Vec<_>>(),
        })),
        "datacite" => {
            let creators: Vec<Value> = version
                .field_values("author")
                .unwrap_or_default()
                .iter()
                .map(|name| json!({ "name": name }))
                .collect();
            Ok(json!({
                "doi": dataset.global_id.as_ref().map(|g| g.authority_and_identifier()),
                "titles": [{ "title": version.title().unwrap_or("Untitled") }],
                "creators": creators,
                "descriptions": version.field_values("dsDescription").unwrap_or_default(),
                "subjects": version.field_values("subject").unwrap_or_default(),
                "version": version.friendly_number(),
                "publicationYear": version.release_time.map(|t| t.format("%Y").to_string()),
                "types": { "resourceTypeGeneral": "Dataset" },
            }))
        }
        other => Err(RepositoryError::Export(format!("unsupported export format '{other}'"))),
    }
}

/// Writes exports as JSON files
pub struct FileSystemExporter {
    directory: PathBuf,
    formats: Vec<String>,
}

impl FileSystemExporter {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            directory: PathBuf::from(&config.directory),
            formats: config.formats.clone(),
        }
    }

    pub fn export_path(&self, dataset: &Dataset, format: &str) -> PathBuf {
        self.directory
            .join(dataset.id.to_string())
            .join(format!("export_{format}.json"))
    }

    async fn write(path: &Path, value: &Value) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl MetadataExporter for FileSystemExporter {
    async fn export_all_formats(&self, dataset: &Dataset) -> Result<()> {
        let version = dataset.released_version().ok_or_else(|| {
            RepositoryError::Export(format!("dataset {} has no released version", dataset.id))
        })?;

        for format in &self.formats {
            let value = render(format, dataset, version)?;
            let path = self.export_path(dataset, format);
            Self::write(&path, &value).await?;
            tracing::debug!(dataset_id = %dataset.id, format = %format, path = %path.display(), "Export written");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatasetField, GlobalId};
    use chrono::Utc;

    fn released() -> Dataset {
        let mut ds = Dataset::builder()
            .owner("root")
            .field(DatasetField::single("title", "Tide Gauges"))
            .field(DatasetField::new("author", vec!["Lovelace, Ada".into()]))
            .build()
            .unwrap();
        ds.global_id = Some(GlobalId::new("doi", "10.5072", "FK2ABC").unwrap());
        ds.release_draft(Utc::now(), false);
        ds
    }

    #[test]
    fn test_render_datacite() {
        let ds = released();
        let value = render("datacite", &ds, ds.released_version().unwrap()).unwrap();
        assert_eq!(value["doi"], "10.5072/FK2ABC");
        assert_eq!(value["titles"][0]["title"], "Tide Gauges");
        assert_eq!(value["creators"][0]["name"], "Lovelace, Ada");
        assert_eq!(value["version"], "1.0");
    }

    #[test]
    fn test_render_unknown_format() {
        let ds = released();
        assert!(render("ddi", &ds, ds.released_version().unwrap()).is_err());
    }

    #[tokio::test]
    async fn test_writes_each_format() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig {
            directory: dir.path().display().to_string(),
            formats: vec!["dataverse_json".into(), "datacite".into()],
        };
        let exporter = FileSystemExporter::new(&config);
        let ds = released();

        exporter.export_all_formats(&ds).await.unwrap();
        for format in ["dataverse_json", "datacite"] {
            assert!(exporter.export_path(&ds, format).exists());
        }
    }

    #[tokio::test]
    async fn test_draft_only_dataset_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig {
            directory: dir.path().display().to_string(),
            formats: vec!["datacite".into()],
        };
        let ds = Dataset::builder().owner("root").build().unwrap();
        assert!(FileSystemExporter::new(&config).export_all_formats(&ds).await.is_err());
    }
}
