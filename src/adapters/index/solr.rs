//! Solr index client
//!
//! Documents go to `{solr_url}/update?commit=true` as JSON.

use super::IndexService;
use crate::config::IndexConfig;
use crate::domain::{Dataset, RepositoryError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde_json::{json, Value};
use std::time::Duration;

pub struct SolrIndex {
    update_url: String,
    client: Client,
}

impl SolrIndex {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: IndexConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RepositoryError::Index(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            update_url: format!("{}/update?commit=true", config.solr_url.trim_end_matches('/')),
            client,
        })
    }

    /// Dataset document followed by one document per file of the latest version
    pub fn documents(dataset: &Dataset) -> Vec<Value> {
        let Some(version) = dataset.latest_version() else {
            return Vec::new();
        };
        let state = format!("{:?}", version.state).to_uppercase();
        let parent = format!("dataset_{}", dataset.id);

        let mut docs = vec![json!({
            "id": parent,
            "entityId": dataset.id.to_string(),
            "dvObjectType": "datasets",
            "identifier": dataset.global_id.as_ref().map(ToString::to_string),
            "title": version.title(),
            "versionState": state,
            "versionNumber": version.friendly_number(),
            "parentId": dataset.owner,
            "harvested": dataset.harvested,
        })];

        for fm in &version.file_metadatas {
            let file = dataset.file(&fm.data_file_id);
            docs.push(json!({
                "id": format!("datafile_{}_{}", fm.data_file_id, state.to_lowercase()),
                "entityId": fm.data_file_id.to_string(),
                "dvObjectType": "files",
                "name": fm.label,
                "description": fm.description,
                "fileContentType": file.map(|f| f.content_type.clone()),
                "fileSizeInBytes": file.map(|f| f.size),
                "fileChecksumValue": file.map(|f| f.checksum_value.clone()),
                "unf": file.and_then(|f| f.unf.clone()),
                "fileTag": dataset.categories_of(&fm.id),
                "restricted": fm.restricted,
                "parentId": parent,
            }));
        }
        docs
    }

    async fn post(&self, body: &Value) -> Result<()> {
        let response = self
            .client
            .post(&self.update_url)
            .json(body)
            .send()
            .await
            .map_err(|e| RepositoryError::Index(format!("POST {}: {e}", self.update_url)))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RepositoryError::Index(format!("Solr returned HTTP {status}: {text}")));
        }
        Ok(())
    }
}

#[async_trait]
impl IndexService for SolrIndex {
    async fn index_dataset(&self, dataset: &Dataset, minor_update: bool) -> Result<()> {
        if !minor_update {
            let query = format!("parentId:\"dataset_{}\"", dataset.id);
            self.post(&json!({ "delete": { "query": query } })).await?;
        }
        let docs = Self::documents(dataset);
        self.post(&Value::Array(docs)).await?;
        tracing::debug!(dataset_id = %dataset.id, minor_update, "Dataset indexed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DataFile, DatasetField};

    #[test]
    fn test_documents_cover_dataset_and_files() {
        let mut ds = Dataset::builder()
            .owner("ocean")
            .field(DatasetField::single("title", "Tide Gauges"))
            .build()
            .unwrap();
        let fm = ds.add_file(DataFile::new("text/csv", 10, "abc"), "gauges.csv");
        ds.add_to_category(fm, "Data");

        let docs = SolrIndex::documents(&ds);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["title"], "Tide Gauges");
        assert_eq!(docs[0]["versionState"], "DRAFT");
        assert_eq!(docs[1]["name"], "gauges.csv");
        assert_eq!(docs[1]["fileTag"][0], "Data");
        assert_eq!(docs[1]["parentId"], docs[0]["id"]);
    }
}
