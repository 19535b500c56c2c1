//! # Provenance Configuration
//!
//! The configuration is loaded once at start-up (YAML or JSON) and passed by
//! reference into the assembler and the signer. Every lookup that depends on
//! a registered key (spec version, build system) fails with
//! [`Error::Configuration`] instead of substituting a default.
//!
//! ## Example
//!
//! ```yaml
//! pnc:
//!   build-log-endpoint: "https://pnc.example.com/pnc-rest/v2/builds/{id}/logs/build"
//!   alignment-log-endpoint: "https://pnc.example.com/pnc-rest/v2/builds/{id}/logs/align"
//!   component-versions:
//!     pnc-orchestrator: "3.2.1"
//! build-types:
//!   pnc: "https://project-ncl.github.io/slsa-pnc-buildtypes/workflow/v1"
//! slsa:
//!   spec-version: "1.1"
//!   specs:
//!     "1.1":
//!       type: "https://in-toto.io/Statement/v1"
//!       predicate-type: "https://slsa.dev/provenance/v1"
//! cosign:
//!   private-key: /etc/sentinel/cosign.key
//!   public-key: /etc/sentinel/cosign.pub
//! ```

use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Placeholder substituted with the build id in endpoint templates.
pub const BUILD_ID_PLACEHOLDER: &str = "{id}";

/// Environment variable read by the signing tool for the key passphrase.
pub const COSIGN_PASSWORD_ENV: &str = "COSIGN_PASSWORD";

pub const DEFAULT_COSIGN_BINARY: &str = "cosign";

pub const DEFAULT_SCHEMA_VERSION: &str = "v1";

/// Build systems that can produce provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildSystem {
    Pnc,
}

impl BuildSystem {
    /// Name used as the builder id and as the build-type lookup key.
    pub fn name(&self) -> &'static str {
        match self {
            BuildSystem::Pnc => "PNC",
        }
    }
}

impl fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProvenanceConfig {
    pub pnc: PncConfig,
    pub build_types: BTreeMap<String, String>,
    pub slsa: SlsaConfig,
    #[serde(default)]
    pub cosign: CosignConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PncConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    pub build_log_endpoint: String,
    pub alignment_log_endpoint: String,
    #[serde(default)]
    pub component_versions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SlsaConfig {
    pub spec_version: String,
    pub specs: BTreeMap<String, ProvenanceSpec>,
}

/// The `type` / `predicateType` pair registered for one SLSA spec version.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProvenanceSpec {
    #[serde(rename = "type")]
    pub statement_type: String,
    pub predicate_type: String,
    /// Schema version documents of this spec are validated against.
    #[serde(default = "default_schema_version")]
    pub schema: String,
}

fn default_schema_version() -> String {
    DEFAULT_SCHEMA_VERSION.to_string()
}

/// Signing key passphrase. Zeroized on drop and never printed.
#[derive(Clone, Default, Deserialize, Serialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct CosignPassword(String);

impl CosignPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// Reads the passphrase from `COSIGN_PASSWORD`, empty if unset.
    pub fn from_env() -> Self {
        Self(std::env::var(COSIGN_PASSWORD_ENV).unwrap_or_default())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CosignPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CosignPassword(***)")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CosignConfig {
    #[serde(default = "default_cosign_binary")]
    pub binary: PathBuf,
    #[serde(default)]
    pub private_key: Option<PathBuf>,
    #[serde(default)]
    pub public_key: Option<PathBuf>,
    #[serde(default, skip_serializing)]
    pub password: Option<CosignPassword>,
    /// Directory for per-call temporary files; the system default if unset.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    /// Bounded wait on the signing tool. Unset means wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_cosign_binary() -> PathBuf {
    PathBuf::from(DEFAULT_COSIGN_BINARY)
}

impl Default for CosignConfig {
    fn default() -> Self {
        Self {
            binary: default_cosign_binary(),
            private_key: None,
            public_key: None,
            password: None,
            temp_dir: None,
            timeout_secs: None,
        }
    }
}

impl CosignConfig {
    pub fn private_key_path(&self) -> Result<&Path> {
        self.private_key
            .as_deref()
            .ok_or_else(|| Error::Configuration("No cosign private key configured".to_string()))
    }

    pub fn public_key_path(&self) -> Result<&Path> {
        self.public_key
            .as_deref()
            .ok_or_else(|| Error::Configuration("No cosign public key configured".to_string()))
    }

    /// The configured passphrase, else `COSIGN_PASSWORD`, else empty.
    pub fn resolved_password(&self) -> CosignPassword {
        match &self.password {
            Some(password) => password.clone(),
            None => CosignPassword::from_env(),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl ProvenanceConfig {
    /// Load configuration from a YAML or JSON file (chosen by extension).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: ProvenanceConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        config.validate()?;
        log::debug!("Loaded provenance configuration from {}", path.display());
        Ok(config)
    }

    /// Validate configuration structure
    pub fn validate(&self) -> Result<()> {
        for (key, template) in [
            ("pnc.build-log-endpoint", &self.pnc.build_log_endpoint),
            ("pnc.alignment-log-endpoint", &self.pnc.alignment_log_endpoint),
        ] {
            if !template.contains(BUILD_ID_PLACEHOLDER) {
                return Err(Error::Configuration(format!(
                    "'{key}' must contain the {BUILD_ID_PLACEHOLDER} placeholder"
                )));
            }
        }

        self.current_provenance_spec()?;
        self.build_type(BuildSystem::Pnc)?;

        Ok(())
    }

    pub fn build_log_endpoint(&self, build_id: &str) -> String {
        self.pnc
            .build_log_endpoint
            .replace(BUILD_ID_PLACEHOLDER, build_id)
    }

    pub fn alignment_log_endpoint(&self, build_id: &str) -> String {
        self.pnc
            .alignment_log_endpoint
            .replace(BUILD_ID_PLACEHOLDER, build_id)
    }

    pub fn component_versions(&self) -> &BTreeMap<String, String> {
        &self.pnc.component_versions
    }

    pub fn provenance_spec(&self, version: &str) -> Result<&ProvenanceSpec> {
        self.slsa.specs.get(version).ok_or_else(|| {
            Error::Configuration(format!("No SLSA spec defined for '{version}'"))
        })
    }

    pub fn current_provenance_spec(&self) -> Result<&ProvenanceSpec> {
        self.provenance_spec(&self.slsa.spec_version)
    }

    /// Build-type URI registered for `build_system`; keys match case-insensitively.
    pub fn build_type(&self, build_system: BuildSystem) -> Result<&str> {
        let wanted = build_system.name().to_lowercase();
        self.build_types
            .iter()
            .find(|(name, _)| name.to_lowercase() == wanted)
            .map(|(_, build_type)| build_type.as_str())
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "No build type defined for build system '{build_system}'"
                ))
            })
    }
}
