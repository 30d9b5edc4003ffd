//! Dataset aggregate
//!
//! A [`Dataset`] owns its versions, the file metadata of each version, its
//! data files and its file categories. Entities refer to each other by id.
//! At most one version is a draft, and it is always the last one.

use super::file::{DataFile, DataFileCategory, FileMetadata};
use super::ids::{DataFileId, DatasetId, FileMetadataId, GlobalId, UserId, VersionId};
use super::schema::{DatasetField, FieldViolation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a dataset version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionState {
    Draft,
    Released,
    Deaccessioned,
}

/// One version of a dataset
///
/// Released versions are frozen; only the draft is edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetVersion {
    pub id: VersionId,
    pub state: VersionState,
    pub version_number: Option<u32>,
    pub minor_version_number: Option<u32>,
    pub fields: Vec<DatasetField>,
    pub file_metadatas: Vec<FileMetadata>,
    pub create_time: Option<DateTime<Utc>>,
    pub last_update_time: Option<DateTime<Utc>>,
    pub release_time: Option<DateTime<Utc>>,
    /// Version-level UNF computed over the tabular files
    pub unf: Option<String>,
    /// Problems replaced by placeholders during lenient validation
    pub validation_problems: Vec<FieldViolation>,
}

impl DatasetVersion {
    pub fn new_draft() -> Self {
        Self {
            id: VersionId::new(),
            state: VersionState::Draft,
            version_number: None,
            minor_version_number: None,
            fields: Vec::new(),
            file_metadatas: Vec::new(),
            create_time: None,
            last_update_time: None,
            release_time: None,
            unf: None,
            validation_problems: Vec::new(),
        }
    }

    pub fn is_draft(&self) -> bool {
        self.state == VersionState::Draft
    }

    pub fn is_released(&self) -> bool {
        self.state == VersionState::Released
    }

    /// `1.2`, or `DRAFT` for the edit version
    pub fn friendly_number(&self) -> String {
        match (self.version_number, self.minor_version_number) {
            (Some(major), Some(minor)) => format!("{major}.{minor}"),
            (Some(major), None) => format!("{major}.0"),
            _ => "DRAFT".to_string(),
        }
    }

    pub fn field_values(&self, type_name: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|f| f.type_name == type_name)
            .map(|f| f.values.as_slice())
    }

    pub fn first_value(&self, type_name: &str) -> Option<&str> {
        self.field_values(type_name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.first_value("title")
    }

    pub fn file_metadata(&self, id: &FileMetadataId) -> Option<&FileMetadata> {
        self.file_metadatas.iter().find(|fm| fm.id == *id)
    }

    pub fn file_metadata_for(&self, data_file_id: &DataFileId) -> Option<&FileMetadata> {
        self.file_metadatas
            .iter()
            .find(|fm| fm.data_file_id == *data_file_id)
    }

    /// Copy of this version as a fresh draft with new file metadata ids
    ///
    /// Returns the mapping from old to new file metadata ids so category
    /// membership can be carried over.
    fn derive_draft(&self) -> (Self, Vec<(FileMetadataId, FileMetadataId)>) {
        let mut mapping = Vec::with_capacity(self.file_metadatas.len());
        let file_metadatas = self
            .file_metadatas
            .iter()
            .map(|fm| {
                let copy = fm.copy_for_draft();
                mapping.push((fm.id, copy.id));
                copy
            })
            .collect();

        let draft = Self {
            fields: self.fields.clone(),
            file_metadatas,
            unf: self.unf.clone(),
            ..Self::new_draft()
        };
        (draft, mapping)
    }
}

/// A research dataset and everything it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    /// Alias of the owning collection
    pub owner: String,
    pub creator: Option<UserId>,
    pub global_id: Option<GlobalId>,
    /// Set once the identifier is registered; never regenerated afterwards
    pub global_id_create_time: Option<DateTime<Utc>>,
    pub identifier_registered: bool,
    /// Harvested from a remote archive rather than deposited locally
    pub harvested: bool,
    /// Oldest first; a draft, if any, is last
    pub versions: Vec<DatasetVersion>,
    pub files: Vec<DataFile>,
    pub categories: Vec<DataFileCategory>,
    pub thumbnail_file: Option<DataFileId>,
    pub create_time: DateTime<Utc>,
    pub modification_time: Option<DateTime<Utc>>,
    pub last_export_time: Option<DateTime<Utc>>,
}

impl Dataset {
    /// Creates a builder for constructing a Dataset
    pub fn builder() -> DatasetBuilder {
        DatasetBuilder::default()
    }

    pub fn latest_version(&self) -> Option<&DatasetVersion> {
        self.versions.last()
    }

    /// The draft version, if one exists
    pub fn edit_version(&self) -> Option<&DatasetVersion> {
        self.versions.last().filter(|v| v.is_draft())
    }

    /// The draft version, created from the latest version when missing
    pub fn edit_version_mut(&mut self) -> &mut DatasetVersion {
        if self.edit_version().is_none() {
            let (draft, mapping) = match self.versions.last() {
                Some(latest) => latest.derive_draft(),
                None => (DatasetVersion::new_draft(), Vec::new()),
            };
            for category in &mut self.categories {
                let copied: Vec<FileMetadataId> = mapping
                    .iter()
                    .filter(|(old, _)| category.contains(old))
                    .map(|(_, new)| *new)
                    .collect();
                category.file_metadata_ids.extend(copied);
            }
            self.versions.push(draft);
        }
        let last = self.versions.len() - 1;
        &mut self.versions[last]
    }

    /// Latest version in the `Released` state
    pub fn released_version(&self) -> Option<&DatasetVersion> {
        self.versions.iter().rev().find(|v| v.is_released())
    }

    pub fn is_released(&self) -> bool {
        self.released_version().is_some()
    }

    /// True when the newest non-draft version has been deaccessioned
    pub fn is_deaccessioned(&self) -> bool {
        self.versions
            .iter()
            .rev()
            .find(|v| !v.is_draft())
            .map(|v| v.state == VersionState::Deaccessioned)
            .unwrap_or(false)
    }

    pub fn release_time(&self) -> Option<DateTime<Utc>> {
        self.released_version().and_then(|v| v.release_time)
    }

    pub fn file(&self, id: &DataFileId) -> Option<&DataFile> {
        self.files.iter().find(|f| f.id == *id)
    }

    pub fn file_mut(&mut self, id: &DataFileId) -> Option<&mut DataFile> {
        self.files.iter_mut().find(|f| f.id == *id)
    }

    /// Adds a new file to the draft, returning its file metadata id
    pub fn add_file(&mut self, file: DataFile, label: impl Into<String>) -> FileMetadataId {
        let fm = FileMetadata::new(file.id, label);
        let fm_id = fm.id;
        self.files.push(file);
        self.edit_version_mut().file_metadatas.push(fm);
        fm_id
    }

    /// Tags a file metadata record, creating the category on first use
    pub fn add_to_category(&mut self, fm_id: FileMetadataId, name: &str) {
        let idx = match self.categories.iter().position(|c| c.name == name) {
            Some(idx) => idx,
            None => {
                self.categories.push(DataFileCategory::new(name));
                self.categories.len() - 1
            }
        };
        let category = &mut self.categories[idx];
        if !category.contains(&fm_id) {
            category.file_metadata_ids.push(fm_id);
        }
    }

    pub fn categories_of(&self, fm_id: &FileMetadataId) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|c| c.contains(fm_id))
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Removes a file metadata record from the draft along with its category links
    pub fn remove_draft_file_metadata(&mut self, fm_id: &FileMetadataId) -> Option<FileMetadata> {
        let draft = self.versions.last_mut().filter(|v| v.is_draft())?;
        let idx = draft.file_metadatas.iter().position(|fm| fm.id == *fm_id)?;
        let removed = draft.file_metadatas.remove(idx);
        self.unlink_categories(&[removed.id]);
        Some(removed)
    }

    /// Removes a data file and every file metadata record pointing at it
    pub fn remove_data_file(&mut self, id: &DataFileId) -> Option<DataFile> {
        let idx = self.files.iter().position(|f| f.id == *id)?;
        let removed = self.files.remove(idx);

        let mut orphaned = Vec::new();
        for version in &mut self.versions {
            version.file_metadatas.retain(|fm| {
                if fm.data_file_id == *id {
                    orphaned.push(fm.id);
                    false
                } else {
                    true
                }
            });
        }
        self.unlink_categories(&orphaned);
        if self.thumbnail_file == Some(*id) {
            self.thumbnail_file = None;
        }
        Some(removed)
    }

    fn unlink_categories(&mut self, ids: &[FileMetadataId]) {
        for category in &mut self.categories {
            category.file_metadata_ids.retain(|id| !ids.contains(id));
        }
    }

    /// Uses a file as the dataset thumbnail; false if the file is not ours
    pub fn set_thumbnail(&mut self, id: DataFileId) -> bool {
        if self.file(&id).is_some() {
            self.thumbnail_file = Some(id);
            true
        } else {
            false
        }
    }

    pub fn remove_thumbnail(&mut self) -> Option<DataFileId> {
        self.thumbnail_file.take()
    }

    /// Promotes the draft to a released version
    ///
    /// Files present in the draft are marked released. Returns `false` when
    /// there is no draft.
    pub fn release_draft(&mut self, at: DateTime<Utc>, minor: bool) -> bool {
        let (major, minor_no) = match self.released_version() {
            Some(prev) => {
                let major = prev.version_number.unwrap_or(0);
                let minor_no = prev.minor_version_number.unwrap_or(0);
                if minor {
                    (major, minor_no + 1)
                } else {
                    (major + 1, 0)
                }
            }
            None => (1, 0),
        };

        let Some(draft) = self.versions.last_mut().filter(|v| v.is_draft()) else {
            return false;
        };
        draft.state = VersionState::Released;
        draft.version_number = Some(major);
        draft.minor_version_number = Some(minor_no);
        draft.release_time = Some(at);

        let released: Vec<DataFileId> = draft.file_metadatas.iter().map(|fm| fm.data_file_id).collect();
        for file in self.files.iter_mut().filter(|f| released.contains(&f.id)) {
            if file.publication_date.is_none() {
                file.publication_date = Some(at);
            }
        }
        true
    }
}

/// Builder for constructing Dataset instances
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    id: Option<DatasetId>,
    owner: Option<String>,
    creator: Option<UserId>,
    global_id: Option<GlobalId>,
    harvested: bool,
    fields: Vec<DatasetField>,
    create_time: Option<DateTime<Utc>>,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: DatasetId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn creator(mut self, creator: UserId) -> Self {
        self.creator = Some(creator);
        self
    }

    pub fn global_id(mut self, global_id: GlobalId) -> Self {
        self.global_id = Some(global_id);
        self
    }

    pub fn harvested(mut self, harvested: bool) -> Self {
        self.harvested = harvested;
        self
    }

    pub fn field(mut self, field: DatasetField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn create_time(mut self, create_time: DateTime<Utc>) -> Self {
        self.create_time = Some(create_time);
        self
    }

    /// Builds the Dataset with an initial draft holding the given fields
    ///
    /// # Errors
    ///
    /// Returns an error if the owner is missing
    pub fn build(self) -> Result<Dataset, String> {
        let owner = self.owner.ok_or("owner is required")?;
        let draft = DatasetVersion {
            fields: self.fields,
            ..DatasetVersion::new_draft()
        };
        Ok(Dataset {
            id: self.id.unwrap_or_default(),
            owner,
            creator: self.creator,
            global_id: self.global_id,
            global_id_create_time: None,
            identifier_registered: false,
            harvested: self.harvested,
            versions: vec![draft],
            files: Vec::new(),
            categories: Vec::new(),
            thumbnail_file: None,
            create_time: self.create_time.unwrap_or_else(Utc::now),
            modification_time: None,
            last_export_time: None,
        })
    }
}
