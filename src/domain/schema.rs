//! Metadata schema and field validation
//!
//! A [`MetadataSchema`] is an ordered list of [`FieldType`]s. Draft versions
//! are initialized against it (missing field types are added in schema order)
//! and validated before every save.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder written over invalid values in lenient mode.
///
/// Accepted by every [`FieldKind`].
pub const NOT_APPLICABLE: &str = "N/A";

/// Kind of value a field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free text
    Text,
    /// E-mail address
    Email,
    /// Absolute http(s) URL
    Url,
    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
    Date,
    /// Signed integer
    Integer,
    /// Floating point number
    Float,
}

impl FieldKind {
    /// Checks a single non-blank value against this kind
    pub fn accepts(&self, value: &str) -> bool {
        let value = value.trim();
        if value == NOT_APPLICABLE {
            return true;
        }
        match self {
            FieldKind::Text => true,
            FieldKind::Email => is_email(value),
            FieldKind::Url => url::Url::parse(value)
                .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
                .unwrap_or(false),
            FieldKind::Date => is_partial_date(value),
            FieldKind::Integer => value.parse::<i64>().is_ok(),
            FieldKind::Float => value.parse::<f64>().is_ok(),
        }
    }
}

fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .map(|(host, tld)| !host.is_empty() && !tld.is_empty())
                    .unwrap_or(false)
        }
        None => false,
    }
}

fn is_partial_date(value: &str) -> bool {
    let parts: Vec<&str> = value.split('-').collect();
    match parts.as_slice() {
        [y] => y.len() == 4 && y.parse::<i32>().is_ok(),
        [y, m] => {
            y.len() == 4
                && y.parse::<i32>().is_ok()
                && m.parse::<u32>().map(|m| (1..=12).contains(&m)).unwrap_or(false)
        }
        [_, _, _] => chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        _ => false,
    }
}

/// Definition of one metadata field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldType {
    /// Machine name, e.g. `datasetContactEmail`
    pub name: String,
    /// Value kind
    pub kind: FieldKind,
    /// At least one non-blank value must be present
    pub required: bool,
    /// More than one value allowed
    pub multiple: bool,
}

impl FieldType {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            multiple: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }
}

/// Values of one field in a dataset version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetField {
    /// Name of the [`FieldType`]
    pub type_name: String,
    /// Raw values, in entry order
    pub values: Vec<String>,
}

impl DatasetField {
    pub fn new(type_name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            type_name: type_name.into(),
            values,
        }
    }

    pub fn single(type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(type_name, vec![value.into()])
    }

    /// True when no value carries content
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|v| v.trim().is_empty())
    }
}

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Field type name
    pub field_type: String,
    /// Offending value, `None` for a missing required field
    pub value: Option<String>,
    /// Human-readable reason
    pub message: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{} ('{}'): {}", self.field_type, v, self.message),
            None => write!(f, "{}: {}", self.field_type, self.message),
        }
    }
}

/// Ordered set of field types for a metadata block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSchema {
    pub name: String,
    pub fields: Vec<FieldType>,
}

impl MetadataSchema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldType>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// The citation block every dataset carries
    pub fn citation() -> Self {
        use FieldKind::*;
        Self::new(
            "citation",
            vec![
                FieldType::new("title", Text).required(),
                FieldType::new("subtitle", Text),
                FieldType::new("author", Text).required().multiple(),
                FieldType::new("datasetContactEmail", Email).required().multiple(),
                FieldType::new("dsDescription", Text).required().multiple(),
                FieldType::new("subject", Text).required().multiple(),
                FieldType::new("keyword", Text).multiple(),
                FieldType::new("productionDate", Date),
                FieldType::new("distributionDate", Date),
                FieldType::new("dateOfDeposit", Date),
                FieldType::new("alternativeURL", Url),
                FieldType::new("relatedMaterial", Text).multiple(),
                FieldType::new("sampleSize", Integer),
                FieldType::new("northLatitude", Float),
            ],
        )
    }

    pub fn field_type(&self, name: &str) -> Option<&FieldType> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Adds an empty field for every schema type the list lacks, then orders
    /// the list by schema position. Unknown fields keep their relative order
    /// at the end.
    pub fn initialize(&self, fields: &mut Vec<DatasetField>) {
        for ft in &self.fields {
            if !fields.iter().any(|f| f.type_name == ft.name) {
                fields.push(DatasetField::new(ft.name.clone(), Vec::new()));
            }
        }
        fields.sort_by_key(|f| {
            self.fields
                .iter()
                .position(|ft| ft.name == f.type_name)
                .unwrap_or(usize::MAX)
        });
    }

    /// Validates the field list, returning every violation found
    pub fn validate(&self, fields: &[DatasetField]) -> Vec<FieldViolation> {
        let mut violations = Vec::new();

        for field in fields {
            let Some(ft) = self.field_type(&field.type_name) else {
                violations.push(FieldViolation {
                    field_type: field.type_name.clone(),
                    value: None,
                    message: format!("not defined in the {} block", self.name),
                });
                continue;
            };

            let present: Vec<&String> =
                field.values.iter().filter(|v| !v.trim().is_empty()).collect();

            if ft.required && present.is_empty() {
                violations.push(FieldViolation {
                    field_type: ft.name.clone(),
                    value: None,
                    message: "required field has no value".to_string(),
                });
            }
            if !ft.multiple && present.len() > 1 {
                violations.push(FieldViolation {
                    field_type: ft.name.clone(),
                    value: None,
                    message: format!("accepts a single value, found {}", present.len()),
                });
            }
            for value in present {
                if !ft.kind.accepts(value) {
                    violations.push(FieldViolation {
                        field_type: ft.name.clone(),
                        value: Some(value.clone()),
                        message: format!("not a valid {:?} value", ft.kind).to_lowercase(),
                    });
                }
            }
        }

        // Required types absent from the list entirely
        for ft in self.fields.iter().filter(|ft| ft.required) {
            if !fields.iter().any(|f| f.type_name == ft.name) {
                violations.push(FieldViolation {
                    field_type: ft.name.clone(),
                    value: None,
                    message: "required field has no value".to_string(),
                });
            }
        }

        violations
    }

    /// Replaces every offending value with [`NOT_APPLICABLE`]
    ///
    /// Missing required fields receive a single placeholder value. Unknown
    /// fields and cardinality violations are left alone so revalidation still
    /// reports them.
    pub fn apply_placeholders(&self, fields: &mut Vec<DatasetField>, violations: &[FieldViolation]) {
        for violation in violations {
            let Some(ft) = self.field_type(&violation.field_type) else {
                continue;
            };
            match &violation.value {
                Some(bad) => {
                    if let Some(field) = fields.iter_mut().find(|f| f.type_name == ft.name) {
                        for value in field.values.iter_mut().filter(|v| *v == bad) {
                            *value = NOT_APPLICABLE.to_string();
                        }
                    }
                }
                None if ft.required => {
                    match fields.iter_mut().find(|f| f.type_name == ft.name) {
                        Some(field) if field.is_blank() => {
                            field.values = vec![NOT_APPLICABLE.to_string()];
                        }
                        Some(_) => {}
                        None => fields.push(DatasetField::single(ft.name.clone(), NOT_APPLICABLE)),
                    }
                }
                None => {}
            }
        }
    }
}

impl Default for MetadataSchema {
    fn default() -> Self {
        Self::citation()
    }
}

/// Drops blank values and fields left without any value
pub fn tidy_fields(fields: &mut Vec<DatasetField>) {
    for field in fields.iter_mut() {
        field.values.retain(|v| !v.trim().is_empty());
    }
    fields.retain(|f| !f.values.is_empty());
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn valid_fields() -> Vec<DatasetField> {
        vec![
            DatasetField::single("title", "Survey of Alpine Lakes"),
            DatasetField::single("author", "Finch, Robin"),
            DatasetField::single("datasetContactEmail", "robin@example.org"),
            DatasetField::single("dsDescription", "Water chemistry samples"),
            DatasetField::single("subject", "Earth and Environmental Sciences"),
        ]
    }

    #[test_case(FieldKind::Email, "someone@example.org", true ; "email ok")]
    #[test_case(FieldKind::Email, "not-an-email", false ; "email bad")]
    #[test_case(FieldKind::Url, "https://example.org/data", true ; "url ok")]
    #[test_case(FieldKind::Url, "ftp//broken", false ; "url bad")]
    #[test_case(FieldKind::Date, "2024", true ; "year")]
    #[test_case(FieldKind::Date, "2024-02", true ; "year month")]
    #[test_case(FieldKind::Date, "2024-02-30", false ; "impossible day")]
    #[test_case(FieldKind::Integer, "42", true ; "integer ok")]
    #[test_case(FieldKind::Integer, "4.2", false ; "integer bad")]
    #[test_case(FieldKind::Float, "4.2", true ; "float ok")]
    #[test_case(FieldKind::Date, NOT_APPLICABLE, true ; "placeholder accepted")]
    fn test_field_kind_accepts(kind: FieldKind, value: &str, expected: bool) {
        assert_eq!(kind.accepts(value), expected);
    }

    #[test]
    fn test_valid_citation_has_no_violations() {
        let schema = MetadataSchema::citation();
        assert!(schema.validate(&valid_fields()).is_empty());
    }

    #[test]
    fn test_initialize_adds_missing_types_in_order() {
        let schema = MetadataSchema::citation();
        let mut fields = vec![DatasetField::single("subject", "Physics")];
        schema.initialize(&mut fields);

        assert_eq!(fields.len(), schema.fields.len());
        assert_eq!(fields[0].type_name, "title");
        assert!(fields[0].values.is_empty());
    }

    #[test]
    fn test_missing_required_and_bad_email() {
        let schema = MetadataSchema::citation();
        let mut fields = valid_fields();
        fields.retain(|f| f.type_name != "title");
        fields[1].values = vec!["nobody-at-nowhere".to_string()];

        let violations = schema.validate(&fields);
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().any(|v| v.field_type == "title" && v.value.is_none()));
        assert!(violations
            .iter()
            .any(|v| v.value.as_deref() == Some("nobody-at-nowhere")));
    }

    #[test]
    fn test_placeholders_clear_value_violations() {
        let schema = MetadataSchema::citation();
        let mut fields = valid_fields();
        fields.push(DatasetField::single("productionDate", "last spring"));
        fields.retain(|f| f.type_name != "title");

        let violations = schema.validate(&fields);
        schema.apply_placeholders(&mut fields, &violations);

        assert!(schema.validate(&fields).is_empty());
        let date = fields.iter().find(|f| f.type_name == "productionDate").unwrap();
        assert_eq!(date.values, vec![NOT_APPLICABLE.to_string()]);
    }

    #[test]
    fn test_placeholders_leave_unknown_fields() {
        let schema = MetadataSchema::citation();
        let mut fields = valid_fields();
        fields.push(DatasetField::single("shoeSize", "44"));

        let violations = schema.validate(&fields);
        schema.apply_placeholders(&mut fields, &violations);
        assert_eq!(schema.validate(&fields).len(), 1);
    }

    #[test]
    fn test_tidy_drops_blank_values() {
        let mut fields = vec![
            DatasetField::new("keyword", vec!["lakes".into(), "  ".into()]),
            DatasetField::new("subtitle", vec![]),
        ];
        tidy_fields(&mut fields);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].values, vec!["lakes".to_string()]);
    }
}
