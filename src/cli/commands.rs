use clap::Subcommand;
use std::path::PathBuf;

#[derive(Debug, Subcommand)]
pub enum ProvenanceCommands {
    /// Generate SLSA provenance for a finished PNC build
    Generate {
        /// Path to the provenance configuration (YAML or JSON)
        #[arg(long = "config")]
        config: PathBuf,

        /// Directory holding the exported PNC build records
        #[arg(long = "data-dir")]
        data_dir: PathBuf,

        /// Id of the build to describe
        #[arg(long = "build-id")]
        build_id: String,

        /// Write the provenance here instead of standard output
        #[arg(long = "output")]
        output: Option<PathBuf>,

        /// Check the generated document against its registered schema
        #[arg(long = "validate")]
        validate: bool,

        /// Sign the generated document with cosign (needs --bundle)
        #[arg(long = "sign", requires = "bundle")]
        sign: bool,

        /// Where to keep the signature when signing
        #[arg(long = "signature", requires = "sign")]
        signature: Option<PathBuf>,

        /// Where to keep the bundle when signing
        #[arg(long = "bundle", requires = "sign")]
        bundle: Option<PathBuf>,
    },
    /// Validate a provenance document against a bundled schema
    Validate {
        /// Schema version to validate against
        #[arg(long = "schema", default_value = "v1")]
        schema: String,

        /// Provenance document (JSON)
        file: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum BlobCommands {
    /// Sign an arbitrary file with cosign
    Sign {
        /// Path to the configuration holding the cosign settings
        #[arg(long = "config")]
        config: PathBuf,

        /// File to sign
        #[arg(long = "payload")]
        payload: PathBuf,

        /// Where to keep the signature (printed to standard output otherwise)
        #[arg(long = "signature")]
        signature: Option<PathBuf>,

        /// Where to keep the bundle
        #[arg(long = "bundle")]
        bundle: Option<PathBuf>,
    },
    /// Verify a file against a signature and/or bundle
    Verify {
        /// Path to the configuration holding the cosign settings
        #[arg(long = "config")]
        config: PathBuf,

        /// File that was signed
        #[arg(long = "payload")]
        payload: PathBuf,

        /// Signature file
        #[arg(long = "signature", required_unless_present = "bundle")]
        signature: Option<PathBuf>,

        /// Bundle file
        #[arg(long = "bundle")]
        bundle: Option<PathBuf>,
    },
}
