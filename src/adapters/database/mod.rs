//! Persistence store layer
//!
//! Trait-based abstraction over the backends: PostgreSQL for deployments and
//! an in-process store for tests and local trials.

pub mod factory;
pub mod memory;
pub mod traits;

pub use factory::{create_stores, Stores};
pub use memory::{MemoryStore, StoreState};
pub use traits::{DatasetStore, LockStore, NotificationQuery, NotificationStore, UnitOfWork};
