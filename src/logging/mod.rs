//! Logging and observability
//!
//! Structured logging through `tracing`: a console layer plus optional JSON
//! files with rotation. The macros below give the recurring repository events
//! a consistent field layout.
//!
//! # Example
//!
//! ```no_run
//! use cairn::config::LoggingConfig;
//! use cairn::logging::init_logging;
//!
//! let _guard = init_logging("debug", &LoggingConfig::default()).expect("logging");
//! tracing::info!(dataset_id = "42", "Dataset saved");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a lock taken on a dataset
///
/// # Example
///
/// ```no_run
/// use cairn::log_lock_acquired;
/// use cairn::domain::{DatasetId, LockReason};
///
/// log_lock_acquired!(DatasetId::new(), LockReason::Ingest);
/// ```
#[macro_export]
macro_rules! log_lock_acquired {
    ($dataset_id:expr, $reason:expr) => {
        tracing::info!(
            dataset_id = %$dataset_id,
            reason = %$reason,
            "Dataset lock acquired"
        );
    };
}

/// Log one registry call of a registration attempt sequence
///
/// # Example
///
/// ```no_run
/// use cairn::log_registration_attempt;
///
/// log_registration_attempt!(3, 10, "doi:10.5072/FK2ABCDEF");
/// ```
#[macro_export]
macro_rules! log_registration_attempt {
    ($attempt:expr, $max_attempts:expr, $identifier:expr) => {
        tracing::debug!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            identifier = %$identifier,
            "Registering persistent identifier"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use cairn::log_error_with_context;
/// use cairn::domain::RepositoryError;
///
/// let error = RepositoryError::Index("connection refused".to_string());
/// log_error_with_context!(&error, "Post-save indexing failed");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
