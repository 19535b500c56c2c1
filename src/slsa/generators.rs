use crate::config::ProvenanceSpec;
use crate::error::{Error, Result};
use crate::in_toto::ResourceDescriptor;
use crate::slsa::model::{BuildDefinition, BuildMetadata, Builder, Predicate, Provenance, RunDetails};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub fn make_build_definition_v1(
    build_type: &str,
    external_parameters: Map<String, Value>,
    internal_parameters: Option<Map<String, Value>>,
    resolved_dependencies: Option<Vec<ResourceDescriptor>>,
) -> BuildDefinition {
    BuildDefinition {
        build_type: build_type.to_string(),
        external_parameters,
        // this field is optional for all SLSA Build levels
        internal_parameters: internal_parameters.unwrap_or_default(),
        // this field is only required for SLSA Build L3
        resolved_dependencies: resolved_dependencies.unwrap_or_default(),
    }
}

pub fn make_builder_v1(id: &str, version: Option<&BTreeMap<String, String>>) -> Builder {
    Builder {
        id: id.to_string(),
        version: version.cloned().unwrap_or_default(),
    }
}

pub fn make_build_metadata_v1(
    invocation_id: &str,
    started_on: Option<DateTime<Utc>>,
    finished_on: Option<DateTime<Utc>>,
) -> BuildMetadata {
    BuildMetadata {
        invocation_id: invocation_id.to_string(),
        started_on,
        finished_on,
    }
}

pub fn make_run_details_v1(
    builder: Builder,
    metadata: BuildMetadata,
    byproducts: Option<Vec<ResourceDescriptor>>,
) -> RunDetails {
    RunDetails {
        builder_info: builder,
        metadata,
        // this field is optional for all SLSA Build levels
        byproducts: byproducts.unwrap_or_default(),
    }
}

/// Wraps the predicate into a statement typed by the registered `spec`.
///
/// # Errors
///
/// Returns `MissingData` when `subject` is empty: a statement about nothing
/// cannot be verified against any artifact.
pub fn generate_build_provenance_v1(
    spec: &ProvenanceSpec,
    subject: Vec<ResourceDescriptor>,
    build_definition: BuildDefinition,
    run_details: RunDetails,
) -> Result<Provenance> {
    if subject.is_empty() {
        return Err(Error::MissingData(
            "provenance requires at least one subject artifact".to_string(),
        ));
    }

    Ok(Provenance {
        statement_type: spec.statement_type.clone(),
        subject,
        predicate_type: spec.predicate_type.clone(),
        predicate: Predicate {
            build_definition,
            run_details,
        },
    })
}
