//! Recording fakes shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use cairn::adapters::database::{MemoryStore, Stores};
use cairn::adapters::index::IndexService;
use cairn::adapters::registry::{
    IdentifierRegistry, ProviderInfo, RegistrationOutcome, RegistrationStatus, RegistrationTarget,
};
use cairn::adapters::database::DatasetStore;
use cairn::config::{ApplicationConfig, IdentifierConfig};
use cairn::core::fingerprint::{IngestService, UnfCalculator};
use cairn::core::update::CommandContext;
use cairn::domain::{
    AuthenticatedUser, DataFile, Dataset, DatasetField, DatasetId, DatasetVersion, GlobalId, Principal, Result,
    Role, RoleAssignment,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Registry answering from a script, then with a fixed status
pub struct ScriptedRegistry {
    script: Mutex<VecDeque<RegistrationStatus>>,
    fallback: RegistrationStatus,
    calls: Mutex<Vec<GlobalId>>,
}

impl ScriptedRegistry {
    pub fn new(script: Vec<RegistrationStatus>, fallback: RegistrationStatus) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn always(status: RegistrationStatus) -> Arc<Self> {
        Self::new(Vec::new(), status)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn submitted(&self) -> Vec<GlobalId> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentifierRegistry for ScriptedRegistry {
    async fn create_identifier(&self, target: &RegistrationTarget) -> Result<RegistrationOutcome> {
        self.calls.lock().unwrap().push(target.global_id.clone());
        let status = self.script.lock().unwrap().pop_front().unwrap_or(self.fallback);
        let gid = target.global_id.clone();
        Ok(match status {
            RegistrationStatus::Registered => RegistrationOutcome::registered(gid),
            RegistrationStatus::Collision => RegistrationOutcome::collision(gid, "identifier already exists"),
            RegistrationStatus::Failed => RegistrationOutcome::failed(gid, "bad request"),
        })
    }

    async fn already_exists(&self, _global_id: &GlobalId) -> Result<bool> {
        Ok(false)
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "scripted",
            base_url: "memory://registry".to_string(),
        }
    }
}

/// Index that records every call
#[derive(Default)]
pub struct RecordingIndex {
    calls: Mutex<Vec<(DatasetId, bool)>>,
}

impl RecordingIndex {
    pub fn calls(&self) -> Vec<(DatasetId, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IndexService for RecordingIndex {
    async fn index_dataset(&self, dataset: &Dataset, minor_update: bool) -> Result<()> {
        self.calls.lock().unwrap().push((dataset.id, minor_update));
        Ok(())
    }
}

/// Ingest service counting UNF recalculations
#[derive(Default)]
pub struct CountingIngest {
    calls: AtomicUsize,
}

impl CountingIngest {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IngestService for CountingIngest {
    async fn recalculate_version_unf(&self, version: &mut DatasetVersion, files: &[DataFile]) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        UnfCalculator.recalculate_version_unf(version, files).await
    }
}

/// Everything a workflow test needs to inspect afterwards
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub registry: Arc<ScriptedRegistry>,
    pub index: Arc<RecordingIndex>,
    pub ingest: Arc<CountingIngest>,
    pub ctx: CommandContext,
}

pub fn harness(registry: Arc<ScriptedRegistry>, identifiers: IdentifierConfig) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let index = Arc::new(RecordingIndex::default());
    let ingest = Arc::new(CountingIngest::default());
    let ctx = CommandContext::builder()
        .stores(Stores::in_memory(store.clone()))
        .registry(registry.clone())
        .index(index.clone())
        .ingest(ingest.clone())
        .identifier_config(identifiers)
        .application_config(ApplicationConfig {
            site_url: "https://data.example.org".to_string(),
            ..ApplicationConfig::default()
        })
        .build()
        .unwrap();
    Harness {
        store,
        registry,
        index,
        ingest,
        ctx,
    }
}

/// Citation fields that pass strict validation
pub fn valid_fields() -> Vec<DatasetField> {
    vec![
        DatasetField::single("title", "Tide Gauge Readings 1990-2020"),
        DatasetField::single("author", "Lovelace, Ada"),
        DatasetField::single("datasetContactEmail", "ada@example.org"),
        DatasetField::single("dsDescription", "Hourly sea level readings."),
        DatasetField::single("subject", "Earth and Environmental Sciences"),
    ]
}

pub fn draft_dataset() -> Dataset {
    let mut builder = Dataset::builder().owner("root");
    for field in valid_fields() {
        builder = builder.field(field);
    }
    builder.build().unwrap()
}

/// A user holding `role` on the dataset
pub async fn user_with_role(store: &MemoryStore, dataset: DatasetId, role: Role) -> Principal {
    let user = AuthenticatedUser::new("@jdoe", "jdoe@example.org");
    store.save_user(user.clone()).await.unwrap();
    store
        .assign_role(RoleAssignment {
            dataset_id: dataset,
            user_id: user.id,
            role,
        })
        .await
        .unwrap();
    Principal::Authenticated(user)
}

pub fn default_identifiers() -> IdentifierConfig {
    IdentifierConfig::default()
}
