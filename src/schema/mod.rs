//! # Provenance Schema Validation
//!
//! Validates serialized provenance documents against the JSON schemas bundled
//! with the crate. A failed validation is a reportable outcome, not an error:
//! [`validate`] returns a [`ValidationResult`] listing one message per schema
//! violation. Only an unknown schema version or an unparseable document is an
//! `Err`.
//!
//! ## Examples
//!
//! ```
//! use provenance_sentinel::schema;
//!
//! let result = schema::validate("v1", r#"{"_type": "x"}"#).unwrap();
//! assert!(!result.is_valid());
//! assert!(result.errors().iter().any(|e| e.contains("\"subject\"")));
//! ```

use crate::error::{Error, Result};

use jsonschema::error::ValidationErrorKind;
use jsonschema::{JSONSchema, ValidationError};
use serde_json::Value;

const PROVENANCE_V1_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/schemas/provenance-v1.schema.json"
));

/// Schema versions bundled with the crate.
pub const SCHEMA_VERSIONS: &[&str] = &["v1"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    valid: bool,
    errors: Vec<String>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Human-readable violations, in the order the validator reported them.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

fn schema_source(schema_version: &str) -> Result<&'static str> {
    match schema_version {
        "v1" => Ok(PROVENANCE_V1_SCHEMA),
        other => Err(Error::Configuration(format!(
            "No provenance schema registered for version '{other}'"
        ))),
    }
}

fn compile(schema_version: &str) -> Result<JSONSchema> {
    let schema: Value = serde_json::from_str(schema_source(schema_version)?)?;
    JSONSchema::compile(&schema).map_err(|e| {
        Error::Configuration(format!(
            "Provenance schema '{schema_version}' does not compile: {e}"
        ))
    })
}

fn describe(error: &ValidationError<'_>) -> String {
    let detail = match &error.kind {
        ValidationErrorKind::MinItems { .. } => "Array has too few items".to_string(),
        ValidationErrorKind::Required { property } => {
            format!("Instance does not have required property {property}")
        }
        ValidationErrorKind::Contains => "Array does not contain item matching schema".to_string(),
        _ => error.to_string(),
    };
    format!(
        "Property \"{}\" does not match schema: {}",
        property_name(&error.instance_path.to_string()),
        detail
    )
}

/// Names the innermost object property of a JSON pointer, skipping array
/// indices: `/predicate/buildDefinition/resolvedDependencies/0` names
/// `resolvedDependencies`. The document root names nothing.
fn property_name(pointer: &str) -> String {
    pointer
        .split('/')
        .rev()
        .find(|segment| !segment.is_empty() && segment.parse::<usize>().is_err())
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .unwrap_or_default()
}

/// Validates `document` (JSON text) against the schema registered as
/// `schema_version`.
///
/// # Errors
///
/// - `Configuration` if no schema is registered for `schema_version`
/// - `Json` if `document` is not JSON at all
pub fn validate(schema_version: &str, document: &str) -> Result<ValidationResult> {
    let schema = compile(schema_version)?;
    let instance: Value = serde_json::from_str(document)?;

    let errors = match schema.validate(&instance) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.map(|e| describe(&e)).collect(),
    };

    if !errors.is_empty() {
        log::debug!(
            "Document failed schema '{}' validation with {} error(s)",
            schema_version,
            errors.len()
        );
    }

    Ok(ValidationResult::from_errors(errors))
}
