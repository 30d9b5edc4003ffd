//! Dataset thumbnail selection

use crate::adapters::database::traits::{DatasetStore, UnitOfWork};
use crate::domain::{DataFileId, Dataset, DatasetId, PersistenceError, RepositoryError, Result};

async fn load(store: &(dyn DatasetStore + Send + Sync), id: &DatasetId) -> Result<Dataset> {
    store
        .find_dataset(id)
        .await?
        .ok_or_else(|| PersistenceError::NotFound(format!("dataset {id}")).into())
}

/// Uses one of the dataset's own files as its thumbnail
///
/// # Errors
///
/// Unknown dataset, a file that belongs elsewhere, or a commit failure.
pub async fn set_dataset_file_as_thumbnail(
    store: &(dyn DatasetStore + Send + Sync),
    dataset_id: &DatasetId,
    file_id: DataFileId,
) -> Result<Dataset> {
    let mut dataset = load(store, dataset_id).await?;
    if !dataset.set_thumbnail(file_id) {
        return Err(RepositoryError::validation(format!(
            "data file {file_id} does not belong to dataset {dataset_id}"
        )));
    }
    tracing::debug!(dataset_id = %dataset_id, data_file_id = %file_id, "Thumbnail set");
    store.commit(UnitOfWork::merge(dataset)).await
}

/// Clears the dataset thumbnail
///
/// # Errors
///
/// Unknown dataset or a commit failure.
pub async fn remove_dataset_thumbnail(
    store: &(dyn DatasetStore + Send + Sync),
    dataset_id: &DatasetId,
) -> Result<Dataset> {
    let mut dataset = load(store, dataset_id).await?;
    if dataset.remove_thumbnail().is_none() {
        return Ok(dataset);
    }
    store.commit(UnitOfWork::merge(dataset)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::MemoryStore;
    use crate::domain::DataFile;

    #[tokio::test]
    async fn test_set_and_remove_thumbnail() {
        let store = MemoryStore::new();
        let mut ds = Dataset::builder().owner("root").build().unwrap();
        let file = DataFile::new("image/png", 10, "abc");
        let file_id = file.id;
        ds.add_file(file, "cover.png");
        let id = ds.id;
        store.seed_dataset(ds).await;

        let saved = set_dataset_file_as_thumbnail(&store, &id, file_id).await.unwrap();
        assert_eq!(saved.thumbnail_file, Some(file_id));

        let cleared = remove_dataset_thumbnail(&store, &id).await.unwrap();
        assert_eq!(cleared.thumbnail_file, None);
        assert_eq!(store.commit_count(), 2);
    }

    #[tokio::test]
    async fn test_foreign_file_rejected() {
        let store = MemoryStore::new();
        let ds = Dataset::builder().owner("root").build().unwrap();
        let id = ds.id;
        store.seed_dataset(ds).await;

        let err = set_dataset_file_as_thumbnail(&store, &id, DataFileId::new()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Validation { .. }));
        assert_eq!(store.commit_count(), 0);
    }
}
