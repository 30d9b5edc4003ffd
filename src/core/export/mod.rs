//! Metadata export and bulk reindexing

pub mod exporter;
pub mod service;
pub mod summary;

pub use exporter::{FileSystemExporter, MetadataExporter};
pub use service::{needs_export, ExportService};
pub use summary::{DatasetFailure, ExportSummary};
