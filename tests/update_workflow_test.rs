//! End-to-end tests of the dataset update workflow against the memory store

mod common;

use chrono::Utc;
use common::*;
use cairn::adapters::registry::RegistrationStatus;
use cairn::config::IdentifierConfig;
use cairn::core::update::UpdateDatasetCommand;
use cairn::domain::{
    DataFile, DatasetField, FileMetadataId, LockReason, Principal, RepositoryError, Role,
};

#[tokio::test]
async fn test_update_registers_identifier_and_reindexes() {
    let h = harness(ScriptedRegistry::always(RegistrationStatus::Registered), default_identifiers());
    let dataset = draft_dataset();
    let id = dataset.id;
    h.store.seed_dataset(dataset.clone()).await;
    let caller = user_with_role(&h.store, id, Role::Curator).await;

    let outcome = UpdateDatasetCommand::new(caller, dataset)
        .execute_with_report(&h.ctx)
        .await
        .unwrap();
    let saved = outcome.dataset;

    let report = outcome.registration.expect("registration attempted");
    assert!(report.is_registered());
    assert_eq!(report.attempts, 1);
    assert_eq!(h.registry.call_count(), 1);

    let gid = saved.global_id.clone().expect("identifier assigned");
    assert_eq!(gid.protocol, "doi");
    assert_eq!(gid.authority, "10.5072");
    assert!(gid.identifier.starts_with("FK2"));
    assert!(saved.global_id_create_time.is_some());
    assert!(saved.identifier_registered);

    let draft = saved.edit_version().unwrap();
    assert!(draft.create_time.is_some());
    assert_eq!(draft.last_update_time, saved.modification_time);

    assert_eq!(h.store.commit_count(), 1);
    assert_eq!(h.index.calls(), vec![(id, true)]);
    assert_eq!(h.store.snapshot().await.version_users.len(), 1);
    assert_eq!(h.store.snapshot().await.datasets.get(&id), Some(&saved));
}

#[tokio::test]
async fn test_permanent_collision_saves_without_registration() {
    let h = harness(ScriptedRegistry::always(RegistrationStatus::Collision), default_identifiers());
    let dataset = draft_dataset();
    let id = dataset.id;
    h.store.seed_dataset(dataset.clone()).await;
    let caller = user_with_role(&h.store, id, Role::Curator).await;

    let outcome = UpdateDatasetCommand::new(caller, dataset)
        .execute_with_report(&h.ctx)
        .await
        .unwrap();

    assert_eq!(h.registry.call_count(), 10);
    let report = outcome.registration.unwrap();
    assert_eq!(report.status, RegistrationStatus::Collision);
    assert_eq!(report.attempts, 10);

    let saved = outcome.dataset;
    assert_eq!(saved.global_id.as_ref(), Some(&report.identifier));
    assert_eq!(h.registry.submitted().last(), Some(&report.identifier));
    assert!(saved.global_id_create_time.is_none());
    assert!(!saved.identifier_registered);

    assert_eq!(h.store.commit_count(), 1);
    assert_eq!(h.index.calls(), vec![(id, true)]);
}

#[tokio::test]
async fn test_collisions_then_success() {
    let registry = ScriptedRegistry::new(
        vec![RegistrationStatus::Collision; 3],
        RegistrationStatus::Registered,
    );
    let h = harness(registry, default_identifiers());
    let dataset = draft_dataset();
    let id = dataset.id;
    h.store.seed_dataset(dataset.clone()).await;
    let caller = user_with_role(&h.store, id, Role::Contributor).await;

    let saved = UpdateDatasetCommand::new(caller, dataset).execute(&h.ctx).await.unwrap();

    assert_eq!(h.registry.call_count(), 4);
    assert!(saved.global_id_create_time.is_some());

    let submitted = h.registry.submitted();
    let distinct: std::collections::BTreeSet<String> = submitted.iter().map(ToString::to_string).collect();
    assert_eq!(distinct.len(), submitted.len());
    let final_id = saved.global_id.clone().unwrap();
    assert!(!submitted[..3].contains(&final_id));
    assert_eq!(submitted.last(), Some(&final_id));
}

#[tokio::test]
async fn test_guest_update_writes_nothing() {
    let h = harness(ScriptedRegistry::always(RegistrationStatus::Registered), default_identifiers());
    let dataset = draft_dataset();
    h.store.seed_dataset(dataset.clone()).await;
    let before = h.store.snapshot().await;

    let err = UpdateDatasetCommand::new(Principal::Guest, dataset)
        .execute(&h.ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, RepositoryError::Authorization(_)));
    assert_eq!(h.store.snapshot().await, before);
    assert_eq!(h.store.commit_count(), 0);
    assert_eq!(h.registry.call_count(), 0);
    assert!(h.index.calls().is_empty());
}

#[tokio::test]
async fn test_member_without_edit_permission_is_rejected() {
    let h = harness(ScriptedRegistry::always(RegistrationStatus::Registered), default_identifiers());
    let dataset = draft_dataset();
    let id = dataset.id;
    h.store.seed_dataset(dataset.clone()).await;
    let caller = user_with_role(&h.store, id, Role::Member).await;
    let before = h.store.snapshot().await;

    let err = UpdateDatasetCommand::new(caller, dataset).execute(&h.ctx).await.unwrap_err();

    assert!(matches!(err, RepositoryError::Authorization(_)));
    assert_eq!(h.store.snapshot().await, before);
}

#[tokio::test]
async fn test_ingest_lock_blocks_update() {
    let h = harness(ScriptedRegistry::always(RegistrationStatus::Registered), default_identifiers());
    let dataset = draft_dataset();
    let id = dataset.id;
    h.store.seed_dataset(dataset.clone()).await;
    let caller = user_with_role(&h.store, id, Role::Curator).await;
    h.ctx.locks.add_lock(id, LockReason::Ingest, None, None).await.unwrap();

    let err = UpdateDatasetCommand::new(caller, dataset).execute(&h.ctx).await.unwrap_err();

    assert!(matches!(err, RepositoryError::LockConflict(_)));
    assert_eq!(h.store.commit_count(), 0);
}

#[tokio::test]
async fn test_in_review_lock_blocks_only_non_publishers() {
    let h = harness(ScriptedRegistry::always(RegistrationStatus::Registered), default_identifiers());
    let dataset = draft_dataset();
    let id = dataset.id;
    h.store.seed_dataset(dataset.clone()).await;
    h.ctx.locks.add_lock(id, LockReason::InReview, None, None).await.unwrap();

    let contributor = user_with_role(&h.store, id, Role::Contributor).await;
    let err = UpdateDatasetCommand::new(contributor, dataset.clone())
        .execute(&h.ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::LockConflict(_)));

    let curator = user_with_role(&h.store, id, Role::Curator).await;
    UpdateDatasetCommand::new(curator, dataset).execute(&h.ctx).await.unwrap();
    assert_eq!(h.store.commit_count(), 1);
}

#[tokio::test]
async fn test_failed_file_validation_lock_does_not_block() {
    let h = harness(ScriptedRegistry::always(RegistrationStatus::Registered), default_identifiers());
    let dataset = draft_dataset();
    let id = dataset.id;
    h.store.seed_dataset(dataset.clone()).await;
    h.ctx.locks.add_lock(id, LockReason::FileValidationFailed, None, None).await.unwrap();

    let contributor = user_with_role(&h.store, id, Role::Contributor).await;
    UpdateDatasetCommand::new(contributor, dataset).execute(&h.ctx).await.unwrap();

    assert_eq!(h.store.commit_count(), 1);
}

#[tokio::test]
async fn test_strict_validation_rejects_and_lenient_repairs() {
    let h = harness(ScriptedRegistry::always(RegistrationStatus::Registered), default_identifiers());
    let mut dataset = draft_dataset();
    dataset
        .edit_version_mut()
        .fields
        .retain(|f| f.type_name != "datasetContactEmail");
    dataset
        .edit_version_mut()
        .fields
        .push(DatasetField::single("datasetContactEmail", "not an email"));
    let id = dataset.id;
    h.store.seed_dataset(dataset.clone()).await;
    let caller = user_with_role(&h.store, id, Role::Curator).await;

    let err = UpdateDatasetCommand::new(caller.clone(), dataset.clone())
        .execute(&h.ctx)
        .await
        .unwrap_err();
    match err {
        RepositoryError::Validation { violations, .. } => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].field_type, "datasetContactEmail");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.store.commit_count(), 0);

    let saved = UpdateDatasetCommand::new(caller, dataset)
        .lenient(true)
        .execute(&h.ctx)
        .await
        .unwrap();
    let draft = saved.edit_version().unwrap();
    assert_eq!(draft.first_value("datasetContactEmail"), Some("N/A"));
    assert_eq!(draft.validation_problems.len(), 1);
}

#[tokio::test]
async fn test_unreleased_file_is_deleted_and_unf_recalculated_once() {
    let h = harness(ScriptedRegistry::always(RegistrationStatus::Registered), default_identifiers());
    let mut dataset = draft_dataset();
    let tabular = DataFile::new("text/tab-separated-values", 512, "aa").with_unf("UNF:6:tabular");
    let tabular_id = tabular.id;
    let fm_id = dataset.add_file(tabular, "readings.tab");
    let other = DataFile::new("text/tab-separated-values", 256, "bb").with_unf("UNF:6:other");
    dataset.add_file(other, "stations.tab");
    dataset.set_thumbnail(tabular_id);
    let id = dataset.id;
    h.store.seed_dataset(dataset.clone()).await;
    let caller = user_with_role(&h.store, id, Role::Curator).await;

    let saved = UpdateDatasetCommand::new(caller, dataset)
        .with_files_to_delete(vec![fm_id])
        .execute(&h.ctx)
        .await
        .unwrap();

    assert!(saved.file(&tabular_id).is_none());
    assert_eq!(saved.files.len(), 1);
    assert_eq!(saved.thumbnail_file, None);
    assert_eq!(h.ingest.count(), 1);
    let draft = saved.edit_version().unwrap();
    assert_eq!(draft.file_metadatas.len(), 1);
    assert!(draft.unf.is_some());
    assert_eq!(h.store.snapshot().await.hard_deleted_files, vec![tabular_id]);
}

#[tokio::test]
async fn test_released_file_only_leaves_the_draft() {
    let h = harness(ScriptedRegistry::always(RegistrationStatus::Registered), default_identifiers());
    let mut dataset = draft_dataset();
    let file = DataFile::new("text/csv", 100, "cc");
    let file_id = file.id;
    dataset.add_file(file, "readings.csv");
    dataset.release_draft(Utc::now(), false);
    let id = dataset.id;
    h.store.seed_dataset(dataset.clone()).await;
    let caller = user_with_role(&h.store, id, Role::Curator).await;

    let saved = UpdateDatasetCommand::new(caller, dataset)
        .with_data_file_to_delete(file_id)
        .execute(&h.ctx)
        .await
        .unwrap();

    assert!(saved.file(&file_id).is_some());
    assert!(saved.edit_version().unwrap().file_metadata_for(&file_id).is_none());
    assert!(saved.released_version().unwrap().file_metadata_for(&file_id).is_some());
    assert!(h.store.snapshot().await.hard_deleted_files.is_empty());
    assert_eq!(h.ingest.count(), 0);
}

#[tokio::test]
async fn test_unknown_file_metadata_is_rejected_before_writing() {
    let h = harness(ScriptedRegistry::always(RegistrationStatus::Registered), default_identifiers());
    let dataset = draft_dataset();
    let id = dataset.id;
    h.store.seed_dataset(dataset.clone()).await;
    let caller = user_with_role(&h.store, id, Role::Curator).await;

    let err = UpdateDatasetCommand::new(caller, dataset)
        .with_files_to_delete(vec![FileMetadataId::new()])
        .execute(&h.ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, RepositoryError::Validation { .. }));
    assert_eq!(h.store.commit_count(), 0);
    assert_eq!(h.registry.call_count(), 0);
}

#[tokio::test]
async fn test_new_files_get_create_date_and_creator() {
    let h = harness(ScriptedRegistry::always(RegistrationStatus::Registered), default_identifiers());
    let mut dataset = draft_dataset();
    let file = DataFile::new("text/csv", 100, "dd");
    let file_id = file.id;
    dataset.add_file(file, "new.csv");
    let id = dataset.id;
    h.store.seed_dataset(dataset.clone()).await;
    let caller = user_with_role(&h.store, id, Role::Curator).await;
    let user_id = caller.user().unwrap().id;

    let saved = UpdateDatasetCommand::new(caller, dataset).execute(&h.ctx).await.unwrap();

    let stored = saved.file(&file_id).unwrap();
    assert!(stored.create_date.is_some());
    assert_eq!(stored.creator, Some(user_id));
    assert_eq!(stored.modification_time, saved.modification_time);
}

#[tokio::test]
async fn test_files_outside_the_draft_are_stamped_too() {
    let h = harness(ScriptedRegistry::always(RegistrationStatus::Registered), default_identifiers());
    let mut dataset = draft_dataset();
    let retired = DataFile::new("text/csv", 100, "ee");
    let retired_id = retired.id;
    dataset.add_file(retired, "retired.csv");
    dataset.release_draft(Utc::now(), false);
    let draft_fm = dataset
        .edit_version_mut()
        .file_metadata_for(&retired_id)
        .map(|fm| fm.id)
        .unwrap();
    dataset.remove_draft_file_metadata(&draft_fm);
    let id = dataset.id;
    h.store.seed_dataset(dataset.clone()).await;
    let caller = user_with_role(&h.store, id, Role::Curator).await;

    let saved = UpdateDatasetCommand::new(caller, dataset).execute(&h.ctx).await.unwrap();

    assert!(saved.edit_version().unwrap().file_metadata_for(&retired_id).is_none());
    let stored = saved.file(&retired_id).unwrap();
    assert!(stored.modification_time.is_some());
    assert_eq!(stored.modification_time, saved.modification_time);
}

#[tokio::test]
async fn test_registration_deferred_to_publication() {
    let identifiers = IdentifierConfig {
        register_when_published: true,
        ..IdentifierConfig::default()
    };
    let h = harness(ScriptedRegistry::always(RegistrationStatus::Registered), identifiers);
    let dataset = draft_dataset();
    let id = dataset.id;
    h.store.seed_dataset(dataset.clone()).await;
    let caller = user_with_role(&h.store, id, Role::Curator).await;

    let outcome = UpdateDatasetCommand::new(caller, dataset)
        .execute_with_report(&h.ctx)
        .await
        .unwrap();

    assert!(outcome.registration.is_none());
    assert_eq!(h.registry.call_count(), 0);
    assert!(outcome.dataset.global_id_create_time.is_none());
    assert_eq!(h.index.calls().len(), 1);
}

#[tokio::test]
async fn test_registered_dataset_is_not_registered_again() {
    let h = harness(ScriptedRegistry::always(RegistrationStatus::Registered), default_identifiers());
    let mut dataset = draft_dataset();
    dataset.global_id = Some(cairn::domain::GlobalId::new("doi", "10.5072", "FK2DONE01").unwrap());
    dataset.global_id_create_time = Some(Utc::now());
    dataset.identifier_registered = true;
    let id = dataset.id;
    h.store.seed_dataset(dataset.clone()).await;
    let caller = user_with_role(&h.store, id, Role::Curator).await;

    let saved = UpdateDatasetCommand::new(caller, dataset).execute(&h.ctx).await.unwrap();

    assert_eq!(h.registry.call_count(), 0);
    assert_eq!(saved.global_id.unwrap().identifier, "FK2DONE01");
}
