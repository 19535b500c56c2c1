//! # Blob Signing
//!
//! Signs and verifies arbitrary byte payloads by driving the external
//! `cosign` tool as a subprocess:
//!
//! ```text
//! cosign sign-blob --yes --key <private key> --output-signature <sig> --bundle <bundle> <blob>
//! cosign verify-blob --key <public key> [--signature <sig>] [--bundle <bundle>] <payload>
//! ```
//!
//! The key passphrase travels in the child's `COSIGN_PASSWORD` environment
//! variable. Payloads and outputs are staged in scoped temporary files that
//! are removed when the call returns, whatever its outcome, unless the caller
//! supplied its own output paths or turned cleanup off.

pub mod capture;

use crate::config::{COSIGN_PASSWORD_ENV, CosignConfig, CosignPassword};
use crate::error::{Error, Result};
use crate::slsa::Provenance;

use capture::StreamCapture;

use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tempfile::{NamedTempFile, TempPath};
use tokio::process::Command;
use tokio::time::Instant;

/// Where `sign-blob` should leave its outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningOutputs {
    /// Persistent signature file; a temporary one is used when `None`.
    pub signature_path: Option<PathBuf>,
    /// Persistent bundle file; a temporary one is used when `None`.
    pub bundle_path: Option<PathBuf>,
    /// Whether temporary outputs are deleted once their content is read.
    pub cleanup: bool,
}

impl Default for SigningOutputs {
    fn default() -> Self {
        Self {
            signature_path: None,
            bundle_path: None,
            cleanup: true,
        }
    }
}

/// Outcome of a successful `sign-blob` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBlobResult {
    pub signature: Vec<u8>,
    /// The bundle document, as text.
    pub bundle: String,
    /// Set only when the signature file still exists after the call.
    pub signature_path: Option<PathBuf>,
    /// Set only when the bundle file still exists after the call.
    pub bundle_path: Option<PathBuf>,
}

/// Exit status and captured diagnostics of one tool invocation.
struct ToolOutput {
    status: ExitStatus,
    stderr: String,
}

/// An output file that is either owned by the caller or scoped to the call.
enum OutputFile {
    Caller(PathBuf),
    Scoped(TempPath),
}

impl OutputFile {
    fn path(&self) -> &Path {
        match self {
            OutputFile::Caller(path) => path,
            OutputFile::Scoped(path) => path,
        }
    }

    /// Settles the file once its content has been read, returning its path
    /// if it is left on disk.
    fn settle(self, cleanup: bool) -> Result<Option<PathBuf>> {
        match self {
            OutputFile::Caller(path) => Ok(Some(path)),
            OutputFile::Scoped(path) if cleanup => {
                path.close()?;
                Ok(None)
            }
            OutputFile::Scoped(path) => {
                let kept = path.keep().map_err(|e| Error::Io(e.error))?;
                Ok(Some(kept))
            }
        }
    }
}

pub struct CosignSigner {
    config: CosignConfig,
    password: CosignPassword,
}

impl CosignSigner {
    /// Creates a signer; the passphrase is resolved once, here.
    pub fn new(config: &CosignConfig) -> Self {
        Self {
            password: config.resolved_password(),
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &CosignConfig {
        &self.config
    }

    /// Signs `payload`, returning the signature and bundle content. No files
    /// remain afterwards.
    pub async fn sign_blob(&self, payload: &[u8]) -> Result<SignedBlobResult> {
        self.sign_blob_with(payload, &SigningOutputs::default()).await
    }

    /// Signs the JSON serialization of `provenance`.
    pub async fn sign_provenance(
        &self,
        provenance: &Provenance,
        outputs: &SigningOutputs,
    ) -> Result<SignedBlobResult> {
        self.sign_blob_with(&provenance.to_json_bytes()?, outputs).await
    }

    pub async fn sign_blob_with(
        &self,
        payload: &[u8],
        outputs: &SigningOutputs,
    ) -> Result<SignedBlobResult> {
        log::debug!(
            "Signing {} byte payload (sha256:{})",
            payload.len(),
            hex::encode(Sha256::digest(payload))
        );

        let blob = self.write_temp_file(payload, "cosign-blob-", ".bin").await?;
        // The staged blob is removed when `blob` drops, on every path.
        self.sign_blob_file(&blob, outputs).await
    }

    /// Signs a blob that is already on disk. The blob itself is never
    /// modified or removed.
    pub async fn sign_blob_file(
        &self,
        blob: &Path,
        outputs: &SigningOutputs,
    ) -> Result<SignedBlobResult> {
        let private_key = self.config.private_key_path()?;

        let signature_file = self.output_file(
            outputs.signature_path.as_deref(),
            "cosign-sig-",
            ".sig",
        )?;
        let bundle_file = self.output_file(
            outputs.bundle_path.as_deref(),
            "cosign-bundle-",
            ".intoto.jsonl",
        )?;

        let args: Vec<OsString> = vec![
            "sign-blob".into(),
            "--yes".into(),
            "--key".into(),
            private_key.into(),
            "--output-signature".into(),
            signature_file.path().into(),
            "--bundle".into(),
            bundle_file.path().into(),
            blob.into(),
        ];

        let output = self.run_tool(args, Some(&self.password)).await?;
        if !output.status.success() {
            let detail = output.stderr.trim();
            log::error!("cosign sign-blob failed ({}): {}", output.status, detail);
            return Err(Error::Signing(format!(
                "cosign sign-blob failed ({}): {}",
                output.status, detail
            )));
        }

        let signature = tokio::fs::read(signature_file.path()).await?;
        let bundle = tokio::fs::read_to_string(bundle_file.path()).await?;

        let signature_path = signature_file.settle(outputs.cleanup)?;
        let bundle_path = bundle_file.settle(outputs.cleanup)?;

        log::info!("Signed blob {}", blob.display());

        Ok(SignedBlobResult {
            signature,
            bundle,
            signature_path,
            bundle_path,
        })
    }

    /// Verifies `payload` against a signature and/or bundle given as content.
    ///
    /// Empty or absent signature and bundle content omits the corresponding
    /// option. Returns `Ok(false)` when the tool rejects the payload.
    ///
    /// # Errors
    ///
    /// - `Configuration` if no public key is configured
    /// - `Tool` if the tool cannot be launched, is killed, or times out
    pub async fn verify_blob(
        &self,
        payload: &[u8],
        signature: Option<&[u8]>,
        bundle: Option<&[u8]>,
    ) -> Result<bool> {
        let payload_file = self
            .write_temp_file(payload, "cosign-verify-payload-", ".bin")
            .await?;
        let signature_file = self
            .optionally_write_temp_file(signature, "cosign-verify-sig-", ".sig")
            .await?;
        let bundle_file = self
            .optionally_write_temp_file(bundle, "cosign-verify-bundle-", ".intoto.jsonl")
            .await?;

        self.verify_blob_files(
            &payload_file,
            signature_file.as_deref(),
            bundle_file.as_deref(),
        )
        .await
    }

    /// Verifies in-memory `payload` against signature and bundle files on disk.
    pub async fn verify_blob_payload(
        &self,
        payload: &[u8],
        signature: Option<&Path>,
        bundle: Option<&Path>,
    ) -> Result<bool> {
        let payload_file = self
            .write_temp_file(payload, "cosign-verify-payload-", ".bin")
            .await?;
        self.verify_blob_files(&payload_file, signature, bundle).await
    }

    pub async fn verify_blob_files(
        &self,
        payload: &Path,
        signature: Option<&Path>,
        bundle: Option<&Path>,
    ) -> Result<bool> {
        let public_key = self.config.public_key_path()?;

        let mut args: Vec<OsString> = vec!["verify-blob".into(), "--key".into(), public_key.into()];
        if let Some(signature) = signature {
            args.push("--signature".into());
            args.push(signature.into());
        }
        if let Some(bundle) = bundle {
            args.push("--bundle".into());
            args.push(bundle.into());
        }
        args.push(payload.into());

        let output = self.run_tool(args, None).await?;
        match output.status.code() {
            Some(0) => {
                log::info!("Verified blob {}", payload.display());
                Ok(true)
            }
            Some(code) => {
                log::warn!(
                    "cosign verify-blob rejected {} (exit {}): {}",
                    payload.display(),
                    code,
                    output.stderr.trim()
                );
                Ok(false)
            }
            None => Err(Error::Tool(format!(
                "cosign verify-blob was terminated ({}): {}",
                output.status,
                output.stderr.trim()
            ))),
        }
    }

    /// Runs the tool to completion while both output streams are drained.
    async fn run_tool(
        &self,
        args: Vec<OsString>,
        password: Option<&CosignPassword>,
    ) -> Result<ToolOutput> {
        let binary = &self.config.binary;
        let temp_dir = self.config.temp_dir.as_deref();

        let mut command = Command::new(binary);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(password) = password {
            command.env(COSIGN_PASSWORD_ENV, password.expose());
        }

        log::debug!(
            "Running {} {}",
            binary.display(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let mut child = command
            .spawn()
            .map_err(|e| Error::Tool(format!("Failed to launch {}: {e}", binary.display())))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Tool("stdout of the tool was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Tool("stderr of the tool was not captured".to_string()))?;
        let out_capture = StreamCapture::spawn(stdout, "cosign-out-", temp_dir)?;
        let err_capture = StreamCapture::spawn(stderr, "cosign-err-", temp_dir)?;

        // One deadline covers the exit and the draining of both streams.
        let limit = self.config.timeout();
        let deadline = limit.map(|limit| Instant::now() + limit);
        let status = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        log::warn!("Could not kill {}: {e}", binary.display());
                    }
                    out_capture.abort();
                    err_capture.abort();
                    return Err(Error::Tool(format!(
                        "{} did not finish within {}s",
                        binary.display(),
                        limit.unwrap_or_default().as_secs()
                    )));
                }
            },
            None => child.wait().await?,
        };

        let stdout_text = out_capture.finish_by(deadline).await;
        let stderr_text = err_capture.finish_by(deadline).await;
        if !stdout_text.is_empty() {
            log::debug!("{} output: {}", binary.display(), stdout_text.trim_end());
        }

        Ok(ToolOutput {
            status,
            stderr: stderr_text,
        })
    }

    fn temp_file(&self, prefix: &str, suffix: &str) -> Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix).suffix(suffix);
        let file = match &self.config.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(file)
    }

    async fn write_temp_file(&self, content: &[u8], prefix: &str, suffix: &str) -> Result<TempPath> {
        let path = self.temp_file(prefix, suffix)?.into_temp_path();
        tokio::fs::write(&path, content).await?;
        Ok(path)
    }

    async fn optionally_write_temp_file(
        &self,
        content: Option<&[u8]>,
        prefix: &str,
        suffix: &str,
    ) -> Result<Option<TempPath>> {
        match content {
            Some(content) if !content.is_empty() => {
                Ok(Some(self.write_temp_file(content, prefix, suffix).await?))
            }
            _ => Ok(None),
        }
    }

    fn output_file(&self, requested: Option<&Path>, prefix: &str, suffix: &str) -> Result<OutputFile> {
        match requested {
            Some(path) => Ok(OutputFile::Caller(path.to_path_buf())),
            None => Ok(OutputFile::Scoped(
                self.temp_file(prefix, suffix)?.into_temp_path(),
            )),
        }
    }
}
