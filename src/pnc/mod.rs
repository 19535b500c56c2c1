//! # Build System Records
//!
//! Records fetched from the PNC build orchestrator, shaped like its REST JSON.
//! Optional upstream fields stay `Option` here; the assembler turns a missing
//! required field into [`crate::Error::MissingData`].

pub mod client;
pub mod filesystem;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use client::BuildSystemClient;
pub use filesystem::FilesystemClient;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: String,
    #[serde(default)]
    pub submit_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Downstream (internal mirror) repository URL.
    #[serde(default)]
    pub scm_url: Option<String>,
    /// Downstream commit the build ran from.
    #[serde(default)]
    pub scm_revision: Option<String>,
    #[serde(default)]
    pub scm_tag: Option<String>,
    /// Upstream commit the build configuration pointed at.
    #[serde(default)]
    pub scm_build_config_revision: Option<String>,
    #[serde(default)]
    pub scm_repository: Option<ScmRepository>,
    #[serde(default)]
    pub environment: Option<Environment>,
    #[serde(default)]
    pub temporary_build: bool,
    #[serde(default)]
    pub build_config_revision: Option<BuildConfigRevisionRef>,
}

/// Pointer from a build to the configuration revision it ran with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfigRevisionRef {
    pub id: String,
    pub rev: i32,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmRepository {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub internal_url: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub pre_build_sync_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub system_image_repository_url: Option<String>,
    #[serde(default)]
    pub system_image_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfigurationRevision {
    pub id: String,
    pub rev: i32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub build_script: Option<String>,
    /// e.g. `MVN`, `GRADLE`, `NPM`
    #[serde(default)]
    pub build_type: Option<String>,
    #[serde(default)]
    pub scm_revision: Option<String>,
    #[serde(default)]
    pub scm_repository: Option<ScmRepository>,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub default_alignment_params: Option<String>,
    #[serde(default)]
    pub brew_pull_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub purl: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub public_url: Option<String>,
}
