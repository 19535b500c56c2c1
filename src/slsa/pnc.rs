//! Maps PNC build records onto a SLSA v1 provenance document.
//!
//! The mapping is a pure function of the fetched records and the
//! configuration: assembling twice from the same inputs yields identical
//! documents.

use crate::config::{BuildSystem, ProvenanceConfig};
use crate::error::{Error, Result};
use crate::in_toto::{self, ResourceDescriptor, make_uri_resource_descriptor};
use crate::pnc::{Artifact, Build, BuildConfigurationRevision, BuildSystemClient};
use crate::slsa::fields::*;
use crate::slsa::generators;
use crate::slsa::model::Provenance;

use serde_json::{Map, Value};

/// Fetches everything needed for `build_id` and assembles its provenance.
///
/// Returns `Ok(None)` when the build, or the configuration revision it ran
/// with, does not exist upstream.
pub fn generate_pnc_build_provenance(
    client: &dyn BuildSystemClient,
    build_id: &str,
    config: &ProvenanceConfig,
) -> Result<Option<Provenance>> {
    let Some(build) = client.get_build(build_id)? else {
        return Ok(None);
    };

    let rev_ref = build
        .build_config_revision
        .as_ref()
        .ok_or_else(|| Error::missing("build.buildConfigRevision"))?;

    let Some(revision) = client.get_build_config_revision(&rev_ref.id, rev_ref.rev)? else {
        return Ok(None);
    };

    let built_artifacts = client.get_built_artifacts(build_id)?;
    let resolved_artifacts = client.get_dependencies(build_id)?;

    log::info!(
        "Assembling provenance for build '{}' ({} built, {} resolved artifacts)",
        build_id,
        built_artifacts.len(),
        resolved_artifacts.len()
    );

    create_full_pnc_build_provenance(
        &build,
        &revision,
        &built_artifacts,
        &resolved_artifacts,
        config,
    )
    .map(Some)
}

/// Assembles the provenance of one PNC build.
///
/// # Errors
///
/// - `Configuration` if the current SLSA spec version or the PNC build type
///   is not registered.
/// - `MissingData` if a required upstream field is absent or the build
///   produced no artifacts.
pub fn create_full_pnc_build_provenance(
    build: &Build,
    revision: &BuildConfigurationRevision,
    built_artifacts: &[Artifact],
    resolved_artifacts: &[Artifact],
    config: &ProvenanceConfig,
) -> Result<Provenance> {
    // Configuration lookups precede any record access.
    let spec = config.current_provenance_spec()?;
    let build_type = config.build_type(BuildSystem::Pnc)?;

    let subject = in_toto::generate_artifact_list_resource_descriptors(built_artifacts)?;
    let resolved_dependencies = create_resolved_dependencies(build, resolved_artifacts)?;

    let external_parameters = create_external_parameters(build, revision)?;
    let internal_parameters = create_internal_parameters(revision)?;

    let build_definition = generators::make_build_definition_v1(
        build_type,
        external_parameters,
        Some(internal_parameters),
        Some(resolved_dependencies),
    );

    let metadata =
        generators::make_build_metadata_v1(&build.id, build.submit_time, build.end_time);
    let builder =
        generators::make_builder_v1(BuildSystem::Pnc.name(), Some(config.component_versions()));
    let run_details = generators::make_run_details_v1(
        builder,
        metadata,
        Some(create_byproducts(build, config)),
    );

    generators::generate_build_provenance_v1(spec, subject, build_definition, run_details)
}

fn required<'a>(value: Option<&'a String>, field: &str) -> Result<&'a str> {
    value.map(String::as_str).ok_or_else(|| Error::missing(field))
}

fn build_scm_external_url(build: &Build) -> Result<&str> {
    let repository = build
        .scm_repository
        .as_ref()
        .ok_or_else(|| Error::missing("build.scmRepository"))?;
    required(
        repository.external_url.as_ref(),
        "build.scmRepository.externalUrl",
    )
}

/// Source repository, downstream mirror, build environment, then the
/// resolved artifacts, in that order.
fn create_resolved_dependencies(
    build: &Build,
    resolved_artifacts: &[Artifact],
) -> Result<Vec<ResourceDescriptor>> {
    let mut deps = Vec::with_capacity(3 + resolved_artifacts.len());

    deps.push(
        ResourceDescriptor::new(SCM_REPOSITORY)
            .with_digest(
                SCM_COMMIT,
                required(
                    build.scm_build_config_revision.as_ref(),
                    "build.scmBuildConfigRevision",
                )?,
            )
            .with_uri(build_scm_external_url(build)?),
    );

    deps.push(
        ResourceDescriptor::new(SCM_DOWNSTREAM_REPOSITORY)
            .with_digest(
                SCM_COMMIT,
                required(build.scm_revision.as_ref(), "build.scmRevision")?,
            )
            .with_uri(required(build.scm_url.as_ref(), "build.scmUrl")?)
            .with_annotation(SCM_TAG, required(build.scm_tag.as_ref(), "build.scmTag")?),
    );

    let environment = build
        .environment
        .as_ref()
        .ok_or_else(|| Error::missing("build.environment"))?;
    let image_uri = format!(
        "{}/{}",
        required(
            environment.system_image_repository_url.as_ref(),
            "build.environment.systemImageRepositoryUrl",
        )?,
        required(
            environment.system_image_id.as_ref(),
            "build.environment.systemImageId",
        )?
    );
    deps.push(make_uri_resource_descriptor(ENVIRONMENT, &image_uri));

    deps.extend(in_toto::generate_artifact_list_resource_descriptors(
        resolved_artifacts,
    )?);

    Ok(deps)
}

fn string_map<I, K, V>(entries: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

fn create_external_parameters(
    build: &Build,
    revision: &BuildConfigurationRevision,
) -> Result<Map<String, Value>> {
    // Build parameters plus the injected brew-pull flag
    let mut parameters: Map<String, Value> = revision
        .parameters
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    parameters.insert(
        BUILD_DETAILS_BREW_PULL_ACTIVE.to_string(),
        Value::String(revision.brew_pull_active.to_string()),
    );

    let mut build_details = string_map([
        (
            BUILD_DETAILS_TYPE,
            required(revision.build_type.as_ref(), "buildConfigRevision.buildType")?,
        ),
        (
            BUILD_DETAILS_TEMPORARY,
            build.temporary_build.to_string().as_str(),
        ),
        (
            BUILD_DETAILS_SCRIPT,
            required(
                revision.build_script.as_ref(),
                "buildConfigRevision.buildScript",
            )?,
        ),
        (
            BUILD_DETAILS_NAME,
            required(revision.name.as_ref(), "buildConfigRevision.name")?,
        ),
    ]);
    build_details.insert(
        BUILD_DETAILS_PARAMETERS.to_string(),
        Value::Object(parameters),
    );

    let pre_build_sync = revision
        .scm_repository
        .as_ref()
        .and_then(|repo| repo.pre_build_sync_enabled)
        .ok_or_else(|| Error::missing("buildConfigRevision.scmRepository.preBuildSyncEnabled"))?;

    let repository = string_map([
        (URI, build_scm_external_url(build)?),
        (
            REVISION,
            required(
                revision.scm_revision.as_ref(),
                "buildConfigRevision.scmRevision",
            )?,
        ),
        (PRE_BUILD_SYNC, pre_build_sync.to_string().as_str()),
    ]);

    let environment_name = build
        .environment
        .as_ref()
        .and_then(|env| env.name.as_ref());
    let environment = string_map([(NAME, required(environment_name, "build.environment.name")?)]);

    Ok(string_map([
        (BUILD, Value::Object(build_details)),
        (SCM_REPOSITORY, Value::Object(repository)),
        (ENVIRONMENT, Value::Object(environment)),
    ]))
}

fn create_internal_parameters(revision: &BuildConfigurationRevision) -> Result<Map<String, Value>> {
    Ok(string_map([(
        BUILD_DETAILS_DEFAULT_ALIGN_PARAMETERS,
        required(
            revision.default_alignment_params.as_ref(),
            "buildConfigRevision.defaultAlignmentParams",
        )?,
    )]))
}

fn create_byproducts(build: &Build, config: &ProvenanceConfig) -> Vec<ResourceDescriptor> {
    vec![
        make_uri_resource_descriptor(BY_PRODUCTS_BUILD_LOG, &config.build_log_endpoint(&build.id)),
        make_uri_resource_descriptor(
            BY_PRODUCTS_ALIGNMENT_LOG,
            &config.alignment_log_endpoint(&build.id),
        ),
    ]
}
