//! Field validation for the draft version
//!
//! Strict mode rejects any violation. Lenient mode first replaces offending
//! values with the `N/A` placeholder, records what it replaced on the
//! version, and rejects only what still fails afterwards.

use crate::domain::{DatasetVersion, MetadataSchema, RepositoryError, Result};

/// Validates `version` against `schema`, repairing it in lenient mode
///
/// # Errors
///
/// [`RepositoryError::Validation`] carrying every remaining violation.
pub fn validate_version(schema: &MetadataSchema, version: &mut DatasetVersion, lenient: bool) -> Result<()> {
    let violations = schema.validate(&version.fields);
    if violations.is_empty() {
        return Ok(());
    }

    if !lenient {
        return Err(RepositoryError::Validation {
            message: format!("{} field(s) failed validation", violations.len()),
            violations,
        });
    }

    schema.apply_placeholders(&mut version.fields, &violations);
    tracing::debug!(
        version_id = %version.id,
        replaced = violations.len(),
        "Lenient validation replaced invalid values"
    );
    version.validation_problems = violations;

    let remaining = schema.validate(&version.fields);
    if remaining.is_empty() {
        Ok(())
    } else {
        Err(RepositoryError::Validation {
            message: format!("{} field(s) failed validation after repair", remaining.len()),
            violations: remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatasetField, FieldKind, FieldType};

    fn schema() -> MetadataSchema {
        MetadataSchema::new(
            "test",
            vec![
                FieldType::new("title", FieldKind::Text).required(),
                FieldType::new("contactEmail", FieldKind::Email),
            ],
        )
    }

    fn version(fields: Vec<DatasetField>) -> DatasetVersion {
        let mut v = DatasetVersion::new_draft();
        v.fields = fields;
        v
    }

    #[test]
    fn test_valid_version_passes_untouched() {
        let mut v = version(vec![DatasetField::single("title", "Tides")]);
        validate_version(&schema(), &mut v, false).unwrap();
        assert!(v.validation_problems.is_empty());
    }

    #[test]
    fn test_strict_rejects_bad_email() {
        let mut v = version(vec![
            DatasetField::single("title", "Tides"),
            DatasetField::single("contactEmail", "not-an-email"),
        ]);
        let err = validate_version(&schema(), &mut v, false).unwrap_err();
        match err {
            RepositoryError::Validation { violations, .. } => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].field_type, "contactEmail");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(v.first_value("contactEmail"), Some("not-an-email"));
    }

    #[test]
    fn test_lenient_replaces_and_records() {
        let mut v = version(vec![DatasetField::single("contactEmail", "not-an-email")]);
        validate_version(&schema(), &mut v, true).unwrap();
        assert_eq!(v.first_value("contactEmail"), Some("N/A"));
        assert_eq!(v.first_value("title"), Some("N/A"));
        assert_eq!(v.validation_problems.len(), 2);
    }

    #[test]
    fn test_lenient_still_rejects_unknown_fields() {
        let mut v = version(vec![
            DatasetField::single("title", "Tides"),
            DatasetField::single("colour", "blue"),
        ]);
        assert!(validate_version(&schema(), &mut v, true).is_err());
    }
}
