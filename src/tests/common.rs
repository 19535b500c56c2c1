use crate::config::{
    CosignConfig, DEFAULT_SCHEMA_VERSION, PncConfig, ProvenanceConfig, ProvenanceSpec, SlsaConfig,
};
use crate::error::{Error, Result};
use crate::in_toto::STATEMENT_TYPE_V1;
use crate::pnc::{
    Artifact, Build, BuildConfigRevisionRef, BuildConfigurationRevision, BuildSystemClient,
    Environment, ScmRepository,
};
use crate::slsa::BUILD_PROVENANCE_PREDICATE_TYPE_V1;

use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const SAMPLE_BUILD_ID: &str = "AX7Q";

fn utc(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 4, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub fn test_config() -> ProvenanceConfig {
    let spec = ProvenanceSpec {
        statement_type: STATEMENT_TYPE_V1.to_string(),
        predicate_type: BUILD_PROVENANCE_PREDICATE_TYPE_V1.to_string(),
        schema: DEFAULT_SCHEMA_VERSION.to_string(),
    };

    ProvenanceConfig {
        pnc: PncConfig {
            api_url: Some("https://pnc.example.com/pnc-rest/v2".to_string()),
            build_log_endpoint: "https://pnc.example.com/pnc-rest/v2/builds/{id}/logs/build"
                .to_string(),
            alignment_log_endpoint: "https://pnc.example.com/pnc-rest/v2/builds/{id}/logs/align"
                .to_string(),
            component_versions: BTreeMap::from([(
                "pnc-orchestrator".to_string(),
                "3.2.1".to_string(),
            )]),
        },
        build_types: BTreeMap::from([(
            "pnc".to_string(),
            "https://project-ncl.github.io/slsa-pnc-buildtypes/workflow/v1".to_string(),
        )]),
        slsa: SlsaConfig {
            spec_version: "1.1".to_string(),
            specs: BTreeMap::from([("1.1".to_string(), spec)]),
        },
        cosign: CosignConfig::default(),
    }
}

pub fn sample_build() -> Build {
    Build {
        id: SAMPLE_BUILD_ID.to_string(),
        submit_time: Some(utc(10, 0)),
        start_time: Some(utc(10, 2)),
        end_time: Some(utc(10, 20)),
        scm_url: Some("https://git.internal/org/lib.git".to_string()),
        scm_revision: Some("def456".to_string()),
        scm_tag: Some("1.0.0.redhat-00001".to_string()),
        scm_build_config_revision: Some("abc123".to_string()),
        scm_repository: Some(ScmRepository {
            id: Some("7".to_string()),
            internal_url: Some("git+ssh://git.internal/org/lib.git".to_string()),
            external_url: Some("https://github.com/org/lib.git".to_string()),
            pre_build_sync_enabled: Some(true),
        }),
        environment: Some(Environment {
            id: Some("12".to_string()),
            name: Some("OpenJDK 17.0; Maven 3.9".to_string()),
            system_image_repository_url: Some("quay.io/pnc/builder-images".to_string()),
            system_image_id: Some("jdk17-mvn39".to_string()),
        }),
        temporary_build: false,
        build_config_revision: Some(BuildConfigRevisionRef {
            id: "100".to_string(),
            rev: 3,
            name: Some("org-lib-1.0".to_string()),
        }),
    }
}

pub fn sample_build_config_revision() -> BuildConfigurationRevision {
    BuildConfigurationRevision {
        id: "100".to_string(),
        rev: 3,
        name: Some("org-lib-1.0".to_string()),
        build_script: Some("mvn deploy -DskipTests".to_string()),
        build_type: Some("MVN".to_string()),
        scm_revision: Some("v1.0.0".to_string()),
        scm_repository: Some(ScmRepository {
            id: Some("7".to_string()),
            internal_url: Some("git+ssh://git.internal/org/lib.git".to_string()),
            external_url: Some("https://github.com/org/lib.git".to_string()),
            pre_build_sync_enabled: Some(true),
        }),
        parameters: BTreeMap::from([(
            "ALIGNMENT_PARAMETERS".to_string(),
            "-DdependencySource=REST".to_string(),
        )]),
        default_alignment_params: Some("-DdependencySource=NONE".to_string()),
        brew_pull_active: true,
    }
}

/// A Maven artifact whose digest is derived from `id`, so every sample is
/// distinct and non-empty.
pub fn sample_artifact(id: &str, filename: &str) -> Artifact {
    let stem = filename.trim_end_matches(".jar");
    Artifact {
        id: id.to_string(),
        identifier: Some(format!("org.example:{stem}:jar:1.0.0")),
        purl: Some(format!("pkg:maven/org.example/{stem}@1.0.0?type=jar")),
        filename: Some(filename.to_string()),
        sha256: Some(format!("{:0>64}", hex::encode(id.as_bytes()))),
        public_url: Some(format!(
            "https://repo.example.com/org/example/{stem}/1.0.0/{filename}"
        )),
    }
}

pub fn sample_built_artifacts() -> Vec<Artifact> {
    vec![
        sample_artifact("501", "lib-1.0.0.redhat-00001.jar"),
        sample_artifact("502", "lib-1.0.0.redhat-00001-sources.jar"),
    ]
}

pub fn sample_dependencies() -> Vec<Artifact> {
    vec![
        sample_artifact("301", "commons-io-2.16.1.jar"),
        sample_artifact("302", "slf4j-api-2.0.13.jar"),
        sample_artifact("303", "jackson-core-2.17.1.jar"),
    ]
}

/// Lays the sample records out the way `FilesystemClient` expects them.
pub fn write_build_records(root: &Path) -> Result<()> {
    for dir in [
        "builds",
        "build-config-revisions",
        "built-artifacts",
        "dependencies",
    ] {
        fs::create_dir_all(root.join(dir))?;
    }

    fs::write(
        root.join("builds").join(format!("{SAMPLE_BUILD_ID}.json")),
        serde_json::to_string_pretty(&sample_build())?,
    )?;
    fs::write(
        root.join("build-config-revisions").join("100-3.json"),
        serde_json::to_string_pretty(&sample_build_config_revision())?,
    )?;
    fs::write(
        root.join("built-artifacts")
            .join(format!("{SAMPLE_BUILD_ID}.json")),
        serde_json::to_string_pretty(&sample_built_artifacts())?,
    )?;
    fs::write(
        root.join("dependencies").join(format!("{SAMPLE_BUILD_ID}.json")),
        serde_json::to_string_pretty(&sample_dependencies())?,
    )?;
    Ok(())
}

/// In-memory build system serving the sample records.
#[derive(Default)]
pub struct MockBuildSystemClient {
    pub builds: BTreeMap<String, Build>,
    pub revisions: BTreeMap<(String, i32), BuildConfigurationRevision>,
    pub built_artifacts: BTreeMap<String, Vec<Artifact>>,
    pub dependencies: BTreeMap<String, Vec<Artifact>>,
    /// Makes `get_built_artifacts` fail like an unreachable server.
    pub fail_artifacts: bool,
}

impl MockBuildSystemClient {
    pub fn with_sample_build() -> Self {
        let revision = sample_build_config_revision();
        Self {
            builds: BTreeMap::from([(SAMPLE_BUILD_ID.to_string(), sample_build())]),
            revisions: BTreeMap::from([((revision.id.clone(), revision.rev), revision)]),
            built_artifacts: BTreeMap::from([(
                SAMPLE_BUILD_ID.to_string(),
                sample_built_artifacts(),
            )]),
            dependencies: BTreeMap::from([(SAMPLE_BUILD_ID.to_string(), sample_dependencies())]),
            fail_artifacts: false,
        }
    }
}

impl BuildSystemClient for MockBuildSystemClient {
    fn get_build(&self, build_id: &str) -> Result<Option<Build>> {
        Ok(self.builds.get(build_id).cloned())
    }

    fn get_build_config_revision(
        &self,
        build_config_id: &str,
        revision: i32,
    ) -> Result<Option<BuildConfigurationRevision>> {
        Ok(self
            .revisions
            .get(&(build_config_id.to_string(), revision))
            .cloned())
    }

    fn get_built_artifacts(&self, build_id: &str) -> Result<Vec<Artifact>> {
        if self.fail_artifacts {
            return Err(Error::client(
                format!("Fetching built artifacts of {build_id}"),
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
            ));
        }
        Ok(self
            .built_artifacts
            .get(build_id)
            .cloned()
            .unwrap_or_default())
    }

    fn get_dependencies(&self, build_id: &str) -> Result<Vec<Artifact>> {
        Ok(self.dependencies.get(build_id).cloned().unwrap_or_default())
    }
}
