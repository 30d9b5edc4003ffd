//! Crate-wide result alias

use super::errors::RepositoryError;

/// Result of a repository operation
///
/// ```
/// use cairn::domain::{RepositoryError, Result};
///
/// fn require_login(authenticated: bool) -> Result<()> {
///     if authenticated {
///         Ok(())
///     } else {
///         Err(RepositoryError::Authorization("guest caller".to_string()))
///     }
/// }
///
/// assert!(require_login(true).is_ok());
/// assert!(require_login(false).unwrap_err().is_precondition_failure());
/// ```
pub type Result<T> = std::result::Result<T, RepositoryError>;
