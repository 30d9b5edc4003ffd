//! Persistent identifiers: generation, registration, file identifiers

pub mod files;
pub mod generator;
pub mod registration;

pub use files::{FilePidAssigner, FilePidSummary};
pub use generator::IdentifierGenerator;
pub use registration::{IdentifierProvider, RegistrationReport};
