//! # Provenance Sentinel
//!
//! SLSA build provenance for the PNC build system.
//!
//! Gathers a finished build's records (the build, its configuration revision,
//! built artifacts and dependencies), assembles them into a SLSA v1 provenance
//! statement, validates the result against a bundled JSON schema, and signs or
//! verifies arbitrary payloads by driving the `cosign` tool.
//!
//! ## Quick Start
//!
//! Generate, validate and sign the provenance of build `AX7Q`:
//! ```bash
//! sentinel provenance generate \
//!     --config=sentinel.yaml \
//!     --data-dir=./pnc-export \
//!     --build-id=AX7Q \
//!     --output=AX7Q.provenance.json \
//!     --validate \
//!     --sign --signature=AX7Q.sig --bundle=AX7Q.bundle
//! ```
//!
//! Verify it later:
//! ```bash
//! sentinel blob verify \
//!     --config=sentinel.yaml \
//!     --payload=AX7Q.provenance.json \
//!     --bundle=AX7Q.bundle
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod in_toto;
pub mod pnc;
pub mod schema;
pub mod signing;
pub mod slsa;
#[cfg(test)]
mod tests;

// Re-export error types
pub use error::{Error, Result};

/// Initialize logging for the CLI
///
/// # Examples
///
/// ```
/// use provenance_sentinel::init_logging;
///
/// // Initialize with default settings
/// let result = init_logging();
/// // Note: This might fail if already initialized
/// assert!(result.is_ok() || result.is_err());
/// ```
pub fn init_logging() -> Result<()> {
    env_logger::try_init().map_err(|e| Error::InitializationError(e.to_string()))
}

// Re-export commonly used types and traits
pub use config::ProvenanceConfig;
pub use pnc::BuildSystemClient;
pub use signing::CosignSigner;
pub use slsa::Provenance;
