//! Bulk export and reindex over the in-memory store

mod common;

use cairn::adapters::database::{DatasetStore, MemoryStore};
use cairn::config::ExportConfig;
use cairn::core::export::{ExportService, FileSystemExporter};
use cairn::domain::{Dataset, GlobalId, VersionState};
use chrono::{Duration, Utc};
use common::{draft_dataset, RecordingIndex};
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    store: Arc<MemoryStore>,
    index: Arc<RecordingIndex>,
    exporter: Arc<FileSystemExporter>,
    service: ExportService,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let config = ExportConfig {
        directory: dir.path().to_string_lossy().into_owned(),
        formats: vec!["dataverse_json".into(), "datacite".into()],
    };
    let store = Arc::new(MemoryStore::new());
    let index = Arc::new(RecordingIndex::default());
    let exporter = Arc::new(FileSystemExporter::new(&config));
    let service = ExportService::new(store.clone(), exporter.clone(), index.clone());
    Fixture {
        _dir: dir,
        store,
        index,
        exporter,
        service,
    }
}

fn released(suffix: &str) -> Dataset {
    let mut ds = draft_dataset();
    ds.global_id = Some(GlobalId::new("doi", "10.5072", format!("FK2{suffix}")).unwrap());
    ds.release_draft(Utc::now() - Duration::hours(1), false);
    ds
}

#[tokio::test]
async fn test_export_all_writes_released_datasets_only() {
    let fx = fixture();
    let published = released("AAA");
    let draft = draft_dataset();
    let mut harvested = released("BBB");
    harvested.harvested = true;
    let mut withdrawn = released("CCC");
    withdrawn.versions[0].state = VersionState::Deaccessioned;

    for ds in [published.clone(), draft, harvested.clone(), withdrawn] {
        fx.store.seed_dataset(ds).await;
    }

    let summary = fx.service.export_all_datasets(false).await.unwrap();

    // harvested datasets are not local and never listed
    assert_eq!(summary.total_datasets, 3);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.skipped, 2);
    assert!(summary.is_successful());

    for format in ["dataverse_json", "datacite"] {
        assert!(fx.exporter.export_path(&published, format).exists());
        assert!(!fx.exporter.export_path(&harvested, format).exists());
    }

    let stored = fx.store.find_dataset(&published.id).await.unwrap().unwrap();
    assert!(stored.last_export_time.is_some());
}

#[tokio::test]
async fn test_datacite_export_content() {
    let fx = fixture();
    let published = released("DDD");
    fx.store.seed_dataset(published.clone()).await;

    fx.service.export_all_datasets(false).await.unwrap();

    let path = fx.exporter.export_path(&published, "datacite");
    let value: serde_json::Value = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
    assert_eq!(value["doi"], "10.5072/FK2DDD");
    assert_eq!(value["titles"][0]["title"], "Tide Gauge Readings 1990-2020");
    assert_eq!(value["creators"][0]["name"], "Lovelace, Ada");
    assert_eq!(value["version"], "1.0");
}

#[tokio::test]
async fn test_second_export_skips_current_datasets_unless_forced() {
    let fx = fixture();
    fx.store.seed_dataset(released("EEE")).await;

    let first = fx.service.export_all_datasets(false).await.unwrap();
    assert_eq!(first.succeeded, 1);

    let second = fx.service.export_all_datasets(false).await.unwrap();
    assert_eq!(second.succeeded, 0);
    assert_eq!(second.skipped, 1);

    let forced = fx.service.export_all_datasets(true).await.unwrap();
    assert_eq!(forced.succeeded, 1);
}

#[tokio::test]
async fn test_reindex_uses_full_updates() {
    let fx = fixture();
    let a = released("FFF");
    let b = draft_dataset();
    fx.store.seed_dataset(a.clone()).await;
    fx.store.seed_dataset(b.clone()).await;

    let summary = fx.service.index_all_datasets().await.unwrap();

    assert_eq!(summary.succeeded, 2);
    let mut calls = fx.index.calls();
    calls.sort_by_key(|(id, _)| id.to_string());
    let mut expected = vec![(a.id, false), (b.id, false)];
    expected.sort_by_key(|(id, _)| id.to_string());
    assert_eq!(calls, expected);
}

#[tokio::test]
async fn test_spawned_export_reports_summary() {
    let fx = fixture();
    fx.store.seed_dataset(released("GGG")).await;

    let summary = fx.service.spawn_export_all(false).await.unwrap().unwrap();
    assert_eq!(summary.succeeded, 1);
}

#[tokio::test]
async fn test_spawned_reindex_reports_summary() {
    let fx = fixture();
    fx.store.seed_dataset(draft_dataset()).await;

    let summary = fx.service.spawn_index_all().await.unwrap().unwrap();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(fx.index.calls().len(), 1);
}
