//! # SLSA Build Provenance
//!
//! Generation of SLSA v1 build provenance attestations for builds run by the
//! PNC build orchestrator.
//!
//! ## Key Components
//!
//! - [`model`] - The attestation document: statement, predicate, build
//!   definition and run details
//! - [`generators`] - Constructors for the document parts
//! - [`pnc`] - Maps PNC build records onto the document
//! - [`fields`] - Fixed key names used in the document
//!
//! ## Examples
//!
//! ```no_run
//! use provenance_sentinel::config::ProvenanceConfig;
//! use provenance_sentinel::pnc::FilesystemClient;
//! use provenance_sentinel::slsa::pnc::generate_pnc_build_provenance;
//!
//! let config = ProvenanceConfig::from_file("sentinel.yaml").unwrap();
//! let client = FilesystemClient::new("records/").unwrap();
//!
//! if let Some(provenance) = generate_pnc_build_provenance(&client, "AX7Q", &config).unwrap() {
//!     println!("{}", provenance.to_json().unwrap());
//! }
//! ```
pub mod generators;
pub mod model;
pub mod pnc;

pub use model::{BuildDefinition, BuildMetadata, Builder, Predicate, Provenance, RunDetails};

/// The standard SLSA v1 build provenance in-toto predicate type URI.
///
/// ```
/// use provenance_sentinel::slsa::BUILD_PROVENANCE_PREDICATE_TYPE_V1;
///
/// assert_eq!(BUILD_PROVENANCE_PREDICATE_TYPE_V1, "https://slsa.dev/provenance/v1");
/// ```
pub const BUILD_PROVENANCE_PREDICATE_TYPE_V1: &str = "https://slsa.dev/provenance/v1";

/// Key names used inside the provenance document.
pub mod fields {
    // Common keys
    pub const BUILD: &str = "build";
    pub const ENVIRONMENT: &str = "environment";
    pub const URI: &str = "uri";
    pub const NAME: &str = "name";

    // SCM
    pub const SCM_REPOSITORY: &str = "repository";
    pub const SCM_DOWNSTREAM_REPOSITORY: &str = "downstreamRepository";
    pub const SCM_COMMIT: &str = "commit";
    pub const SCM_TAG: &str = "tag";
    pub const REVISION: &str = "revision";
    pub const PRE_BUILD_SYNC: &str = "preBuildSync";

    // Artifacts
    pub const ARTIFACT_IDENTIFIER: &str = "identifier";
    pub const ARTIFACT_PURL: &str = "purl";
    pub const ARTIFACT_URI: &str = "uri";
    pub const ARTIFACT_SHA256: &str = "sha256";

    // Build details
    pub const BUILD_DETAILS_TYPE: &str = "type";
    pub const BUILD_DETAILS_TEMPORARY: &str = "temporary";
    pub const BUILD_DETAILS_SCRIPT: &str = "script";
    pub const BUILD_DETAILS_NAME: &str = "name";
    pub const BUILD_DETAILS_BREW_PULL_ACTIVE: &str = "brewPullActive";
    pub const BUILD_DETAILS_PARAMETERS: &str = "parameters";
    pub const BUILD_DETAILS_DEFAULT_ALIGN_PARAMETERS: &str = "defaultAlignmentParameters";

    // Byproducts
    pub const BY_PRODUCTS_BUILD_LOG: &str = "buildLog";
    pub const BY_PRODUCTS_ALIGNMENT_LOG: &str = "alignmentLog";
}
