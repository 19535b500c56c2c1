use super::commands::{BlobCommands, ProvenanceCommands};
use crate::config::ProvenanceConfig;
use crate::error::Result;
use crate::pnc::FilesystemClient;
use crate::schema;
use crate::signing::{CosignSigner, SigningOutputs};
use crate::slsa::pnc::generate_pnc_build_provenance;

use std::path::Path;

/// Runs a provenance subcommand. `Ok(false)` means the command completed but
/// the outcome was negative (build not found, document invalid).
pub async fn handle_provenance_command(cmd: ProvenanceCommands) -> Result<bool> {
    match cmd {
        ProvenanceCommands::Generate {
            config,
            data_dir,
            build_id,
            output,
            validate,
            sign,
            signature,
            bundle,
        } => {
            let config = ProvenanceConfig::from_file(&config)?;
            let client = FilesystemClient::new(&data_dir)?;

            let Some(provenance) = generate_pnc_build_provenance(&client, &build_id, &config)?
            else {
                eprintln!("Build {build_id} was not found");
                return Ok(false);
            };

            let json = provenance.to_json()?;
            match &output {
                Some(path) => {
                    std::fs::write(path, &json)?;
                    eprintln!("Provenance written to {}", path.display());
                }
                None => println!("{json}"),
            }

            if validate {
                let spec = config.current_provenance_spec()?;
                let result = schema::validate(&spec.schema, &json)?;
                if !result.is_valid() {
                    print_validation_errors(result.errors());
                    return Ok(false);
                }
                eprintln!("Provenance is valid against schema {}", spec.schema);
            }

            if sign {
                let signer = CosignSigner::new(&config.cosign);
                let outputs = SigningOutputs {
                    signature_path: signature,
                    bundle_path: bundle,
                    cleanup: true,
                };
                // Standard output may already carry the document itself.
                let signed = signer.sign_provenance(&provenance, &outputs).await?;
                match &signed.signature_path {
                    Some(path) => eprintln!("Signature written to {}", path.display()),
                    None => eprintln!("Signature: {}", String::from_utf8_lossy(&signed.signature)),
                }
                report_bundle(signed.bundle_path.as_deref());
            }

            Ok(true)
        }

        ProvenanceCommands::Validate { schema, file } => {
            let document = std::fs::read_to_string(&file)?;
            let result = schema::validate(&schema, &document)?;
            if result.is_valid() {
                println!("{} is valid against schema {schema}", file.display());
                Ok(true)
            } else {
                print_validation_errors(result.errors());
                Ok(false)
            }
        }
    }
}

/// Runs a blob subcommand. For `verify`, the return value is the verdict.
pub async fn handle_blob_command(cmd: BlobCommands) -> Result<bool> {
    match cmd {
        BlobCommands::Sign {
            config,
            payload,
            signature,
            bundle,
        } => {
            let config = ProvenanceConfig::from_file(&config)?;
            let signer = CosignSigner::new(&config.cosign);
            let outputs = SigningOutputs {
                signature_path: signature,
                bundle_path: bundle,
                cleanup: true,
            };

            let signed = signer.sign_blob_file(&payload, &outputs).await?;
            match &signed.signature_path {
                Some(path) => eprintln!("Signature written to {}", path.display()),
                None => println!("{}", String::from_utf8_lossy(&signed.signature)),
            }
            report_bundle(signed.bundle_path.as_deref());
            Ok(true)
        }

        BlobCommands::Verify {
            config,
            payload,
            signature,
            bundle,
        } => {
            let config = ProvenanceConfig::from_file(&config)?;
            let signer = CosignSigner::new(&config.cosign);

            let verified = signer
                .verify_blob_files(&payload, signature.as_deref(), bundle.as_deref())
                .await?;
            if verified {
                println!("Verified OK: {}", payload.display());
            } else {
                println!("Verification FAILED: {}", payload.display());
            }
            Ok(verified)
        }
    }
}

fn report_bundle(path: Option<&Path>) {
    if let Some(path) = path {
        eprintln!("Bundle written to {}", path.display());
    }
}

fn print_validation_errors(errors: &[String]) {
    eprintln!("Schema validation failed with {} error(s):", errors.len());
    for error in errors {
        eprintln!("  - {error}");
    }
}
