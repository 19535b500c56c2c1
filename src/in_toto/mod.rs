//! # in-toto Resource Descriptors
//!
//! A resource descriptor is the uniform "named thing with a digest" shape used
//! for statement subjects, resolved dependencies and byproducts alike.
//!
//! ## Examples
//!
//! ```
//! use provenance_sentinel::in_toto::make_minimal_resource_descriptor;
//!
//! let rd = make_minimal_resource_descriptor("lib-1.0.jar", "sha256", "a1b2c3");
//! assert_eq!(rd.name, "lib-1.0.jar");
//! assert!(rd.digest.contains_key("sha256"));
//! assert!(rd.uri.is_none());
//! ```

use crate::error::{Error, Result};
use crate::pnc::Artifact;
use crate::slsa::fields::{ARTIFACT_IDENTIFIER, ARTIFACT_PURL, ARTIFACT_SHA256, ARTIFACT_URI};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The in-toto Statement v1 type URI.
pub const STATEMENT_TYPE_V1: &str = "https://in-toto.io/Statement/v1";

/// A named reference to a resource with optional URI, digests and annotations.
///
/// Maps are ordered so that serialization is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub digest: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_digest(mut self, alg: impl Into<String>, digest: impl Into<String>) -> Self {
        self.digest.insert(alg.into(), digest.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

/// Creates a resource descriptor carrying only a name and a single digest.
pub fn make_minimal_resource_descriptor(name: &str, alg: &str, digest: &str) -> ResourceDescriptor {
    ResourceDescriptor::new(name).with_digest(alg, digest)
}

/// Creates a digest-less resource descriptor pointing at `uri` (logs, images).
pub fn make_uri_resource_descriptor(name: &str, uri: &str) -> ResourceDescriptor {
    ResourceDescriptor::new(name).with_uri(uri)
}

/// Converts a build-system artifact into a resource descriptor.
///
/// The name is the artifact filename and the digest its sha256. The
/// `identifier`, `purl` and `uri` annotations are always present, empty when
/// the build system did not report them.
///
/// # Errors
///
/// Returns `MissingData` if the artifact has no filename or no sha256.
pub fn generate_artifact_resource_descriptor(artifact: &Artifact) -> Result<ResourceDescriptor> {
    let filename = artifact
        .filename
        .as_deref()
        .ok_or_else(|| Error::missing(&format!("artifact[{}].filename", artifact.id)))?;

    let sha256 = artifact
        .sha256
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::missing(&format!("artifact[{}].sha256", artifact.id)))?;

    Ok(make_minimal_resource_descriptor(filename, ARTIFACT_SHA256, sha256)
        .with_annotation(
            ARTIFACT_IDENTIFIER,
            artifact.identifier.clone().unwrap_or_default(),
        )
        .with_annotation(ARTIFACT_PURL, artifact.purl.clone().unwrap_or_default())
        .with_annotation(ARTIFACT_URI, artifact.public_url.clone().unwrap_or_default()))
}

pub fn generate_artifact_list_resource_descriptors(
    artifacts: &[Artifact],
) -> Result<Vec<ResourceDescriptor>> {
    artifacts
        .iter()
        .map(generate_artifact_resource_descriptor)
        .collect()
}
