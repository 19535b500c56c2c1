//! Signer behaviour against a scripted stand-in for `cosign`.
//!
//! The stand-in honours the same command line as the real tool. Its
//! "signature" is a checksum over the key id and the blob, so tampering with
//! either the payload or the signature makes verification fail.
#![cfg(unix)]

use crate::config::{CosignConfig, CosignPassword};
use crate::error::{Error, Result};
use crate::signing::{CosignSigner, SigningOutputs};

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

const FAKE_COSIGN: &str = r#"#!/bin/sh
mode="$1"
shift
key=""; sig=""; bundle=""; yes=""
while [ $# -gt 1 ]; do
  case "$1" in
    --yes) yes=1; shift ;;
    --key) key="$2"; shift 2 ;;
    --output-signature|--signature) sig="$2"; shift 2 ;;
    --bundle) bundle="$2"; shift 2 ;;
    *) echo "Error: unknown flag: $1" >&2; exit 2 ;;
  esac
done
blob="$1"
if [ ! -f "$key" ]; then
  echo "Error: reading key: open $key: no such file or directory" >&2
  exit 1
fi
keyid=$(head -n 1 "$key")
expected=$(sed -n 2p "$key")
digest() { { printf '%s' "$keyid"; cat "$blob"; } | cksum | cut -d' ' -f1; }
case "$mode" in
  sign-blob)
    if [ -z "$yes" ]; then echo "Error: refusing to sign without --yes" >&2; exit 2; fi
    if [ "${COSIGN_PASSWORD+set}" != set ]; then echo "Error: COSIGN_PASSWORD is not set" >&2; exit 2; fi
    if [ -n "$expected" ] && [ "$expected" != "password=$COSIGN_PASSWORD" ]; then
      echo "Error: decrypt: encrypted: decryption failed" >&2
      exit 1
    fi
    s=$(digest)
    printf 'SIG-%s' "$s" > "$sig"
    printf '{"payloadType":"application/vnd.in-toto+json","signature":"SIG-%s"}\n' "$s" > "$bundle"
    echo "Using payload from: $blob" >&2
    echo "Wrote signature to file $sig"
    ;;
  verify-blob)
    if [ -z "$sig" ] && [ -z "$bundle" ]; then echo "Error: no signature or bundle" >&2; exit 1; fi
    s="SIG-$(digest)"
    if [ -n "$sig" ] && [ "$(cat "$sig")" != "$s" ]; then
      echo "Error: invalid signature when validating ASN.1 encoded signature" >&2
      exit 1
    fi
    if [ -n "$bundle" ] && ! grep -q "\"signature\":\"$s\"" "$bundle"; then
      echo "Error: bundle does not match" >&2
      exit 1
    fi
    echo "Verified OK" >&2
    ;;
  *) echo "Error: unknown command $mode" >&2; exit 2 ;;
esac
"#;

const PASSWORD: &str = "s3cret";

struct Fixture {
    _tools: TempDir,
    scratch: TempDir,
    config: CosignConfig,
}

impl Fixture {
    fn signer(&self) -> CosignSigner {
        CosignSigner::new(&self.config)
    }

    fn scratch_is_empty(&self) -> bool {
        fs::read_dir(self.scratch.path())
            .map(|entries| entries.count() == 0)
            .unwrap_or(false)
    }
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn fixture_with_tool(script: &str) -> Fixture {
    let tools = tempdir().unwrap();
    let scratch = tempdir().unwrap();

    let binary = write_script(tools.path(), "cosign", script);
    let private_key = tools.path().join("cosign.key");
    let public_key = tools.path().join("cosign.pub");
    fs::write(&private_key, format!("FAKE-KEY-1\npassword={PASSWORD}\n")).unwrap();
    fs::write(&public_key, "FAKE-KEY-1\n").unwrap();

    let config = CosignConfig {
        binary,
        private_key: Some(private_key),
        public_key: Some(public_key),
        password: Some(CosignPassword::new(PASSWORD)),
        temp_dir: Some(scratch.path().to_path_buf()),
        timeout_secs: Some(30),
    };

    Fixture {
        _tools: tools,
        scratch,
        config,
    }
}

fn fixture() -> Fixture {
    fixture_with_tool(FAKE_COSIGN)
}

#[tokio::test]
async fn test_sign_then_verify() -> Result<()> {
    let fx = fixture();
    let signer = fx.signer();
    let payload = br#"{"_type":"https://in-toto.io/Statement/v1"}"#;

    let signed = signer.sign_blob(payload).await?;
    assert!(signed.signature.starts_with(b"SIG-"));
    assert!(signed.bundle.starts_with('{'));
    assert!(signed.bundle.contains("\"signature\""));
    assert_eq!(signed.signature_path, None);
    assert_eq!(signed.bundle_path, None);

    assert!(
        signer
            .verify_blob(payload, Some(signed.signature.as_slice()), None)
            .await?
    );
    assert!(
        signer
            .verify_blob(payload, None, Some(signed.bundle.as_bytes()))
            .await?
    );
    assert!(
        signer
            .verify_blob(payload, Some(signed.signature.as_slice()), Some(signed.bundle.as_bytes()))
            .await?
    );
    assert!(fx.scratch_is_empty());
    Ok(())
}

#[tokio::test]
async fn test_corrupted_signature_is_rejected() -> Result<()> {
    let fx = fixture();
    let signer = fx.signer();
    let payload = b"payload";

    let mut signature = signer.sign_blob(payload).await?.signature;
    let last = signature.len() - 1;
    signature[last] ^= 0x01;

    assert!(!signer.verify_blob(payload, Some(signature.as_slice()), None).await?);
    assert!(fx.scratch_is_empty());
    Ok(())
}

#[tokio::test]
async fn test_tampered_payload_is_rejected() -> Result<()> {
    let fx = fixture();
    let signer = fx.signer();

    let signed = signer.sign_blob(b"original").await?;
    assert!(
        !signer
            .verify_blob(b"tampered", Some(signed.signature.as_slice()), None)
            .await?
    );
    Ok(())
}

#[tokio::test]
async fn test_empty_signature_and_bundle_are_omitted() -> Result<()> {
    let fx = fixture();
    let signer = fx.signer();

    // Neither option reaches the tool, which then refuses to verify.
    assert!(!signer.verify_blob(b"payload", Some(&b""[..]), None).await?);
    assert!(!signer.verify_blob(b"payload", None, Some(&b""[..])).await?);
    assert!(fx.scratch_is_empty());
    Ok(())
}

#[tokio::test]
async fn test_empty_payload_can_be_signed() -> Result<()> {
    let fx = fixture();
    let signer = fx.signer();

    let signed = signer.sign_blob(b"").await?;
    assert!(signer.verify_blob(b"", Some(signed.signature.as_slice()), None).await?);
    Ok(())
}

#[tokio::test]
async fn test_missing_private_key_reports_stderr() {
    let mut fx = fixture();
    fx.config.private_key = Some(fx.scratch.path().join("absent.key"));
    let signer = fx.signer();

    match signer.sign_blob(b"payload").await {
        Err(Error::Signing(msg)) => {
            assert!(msg.contains("no such file or directory"), "stderr lost: {msg}");
        }
        other => panic!("Expected signing error, got {other:?}"),
    }
    assert!(fx.scratch_is_empty());
}

#[tokio::test]
async fn test_wrong_password_fails() {
    let mut fx = fixture();
    fx.config.password = Some(CosignPassword::new("wrong"));

    match fx.signer().sign_blob(b"payload").await {
        Err(Error::Signing(msg)) => assert!(msg.contains("decryption failed")),
        other => panic!("Expected signing error, got {other:?}"),
    }
    assert!(fx.scratch_is_empty());
}

#[tokio::test]
async fn test_unconfigured_keys() {
    let mut fx = fixture();
    fx.config.private_key = None;
    fx.config.public_key = None;
    let signer = fx.signer();

    assert!(matches!(
        signer.sign_blob(b"payload").await,
        Err(Error::Configuration(_))
    ));
    assert!(matches!(
        signer.verify_blob(b"payload", Some(&b"SIG-1"[..]), None).await,
        Err(Error::Configuration(_))
    ));
}

#[tokio::test]
async fn test_caller_output_paths_persist() -> Result<()> {
    let fx = fixture();
    let signer = fx.signer();
    let out = tempdir()?;
    let outputs = SigningOutputs {
        signature_path: Some(out.path().join("provenance.sig")),
        bundle_path: Some(out.path().join("provenance.bundle")),
        cleanup: true,
    };

    let signed = signer.sign_blob_with(b"payload", &outputs).await?;

    assert_eq!(signed.signature_path, outputs.signature_path);
    assert_eq!(signed.bundle_path, outputs.bundle_path);
    assert_eq!(fs::read(out.path().join("provenance.sig"))?, signed.signature);
    assert_eq!(
        fs::read_to_string(out.path().join("provenance.bundle"))?,
        signed.bundle
    );
    assert!(fx.scratch_is_empty());

    let payload = fx.scratch.path().join("payload.txt");
    fs::write(&payload, b"payload")?;
    assert!(
        signer
            .verify_blob_files(&payload, outputs.signature_path.as_deref(), None)
            .await?
    );
    assert!(
        signer
            .verify_blob_payload(b"payload", None, outputs.bundle_path.as_deref())
            .await?
    );
    Ok(())
}

#[tokio::test]
async fn test_outputs_kept_without_cleanup() -> Result<()> {
    let fx = fixture();
    let outputs = SigningOutputs {
        cleanup: false,
        ..SigningOutputs::default()
    };

    let signed = fx.signer().sign_blob_with(b"payload", &outputs).await?;

    let signature_path = signed.signature_path.expect("signature kept");
    let bundle_path = signed.bundle_path.expect("bundle kept");
    assert!(signature_path.starts_with(fx.scratch.path()));
    assert_eq!(fs::read(&signature_path)?, signed.signature);
    assert_eq!(fs::read_to_string(&bundle_path)?, signed.bundle);

    // Only the two outputs remain: no staged blob and no capture logs.
    assert_eq!(fs::read_dir(fx.scratch.path())?.count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_sign_file_leaves_blob_in_place() -> Result<()> {
    let fx = fixture();
    let blob_dir = tempdir()?;
    let blob = blob_dir.path().join("artifact.jar");
    fs::write(&blob, b"jar bytes")?;

    let signed = fx
        .signer()
        .sign_blob_file(&blob, &SigningOutputs::default())
        .await?;

    assert_eq!(fs::read(&blob)?, b"jar bytes");
    assert!(!signed.signature.is_empty());
    assert!(fx.scratch_is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_binary_is_tool_error() {
    let mut fx = fixture();
    fx.config.binary = fx.scratch.path().join("no-such-cosign");
    let signer = fx.signer();

    assert!(matches!(
        signer.sign_blob(b"payload").await,
        Err(Error::Tool(_))
    ));
    assert!(matches!(
        signer.verify_blob(b"payload", Some(&b"SIG-1"[..]), None).await,
        Err(Error::Tool(_))
    ));
    assert!(fx.scratch_is_empty());
}

#[tokio::test]
async fn test_noisy_tool_does_not_block() {
    let fx = fixture_with_tool(
        r#"#!/bin/sh
i=0
while [ $i -lt 20000 ]; do
  echo "progress line $i"
  echo "diagnostic line $i" >&2
  i=$((i+1))
done
echo "Error: gave up after noise" >&2
exit 1
"#,
    );

    match fx.signer().sign_blob(b"payload").await {
        Err(Error::Signing(msg)) => {
            assert!(msg.contains("diagnostic line 19999"));
            assert!(msg.contains("gave up after noise"));
        }
        other => panic!("Expected signing error, got {other:?}"),
    }
    assert!(fx.scratch_is_empty());
}

#[tokio::test]
async fn test_hung_tool_times_out() {
    let mut fx = fixture_with_tool("#!/bin/sh\nexec sleep 30\n");
    fx.config.timeout_secs = Some(1);

    match fx.signer().sign_blob(b"payload").await {
        Err(Error::Tool(msg)) => assert!(msg.contains("did not finish")),
        other => panic!("Expected tool error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_lingering_descendant_does_not_outlast_timeout() {
    // The background sleep inherits both pipes and outlives the tool.
    let mut fx = fixture_with_tool("#!/bin/sh\nsleep 10 &\necho boom >&2\nexit 1\n");
    fx.config.timeout_secs = Some(1);

    let started = std::time::Instant::now();
    let result = fx.signer().sign_blob(b"payload").await;
    let elapsed = started.elapsed();

    match result {
        Err(Error::Signing(msg)) => assert!(msg.contains("boom"), "stderr lost: {msg}"),
        other => panic!("Expected signing error, got {other:?}"),
    }
    assert!(elapsed < std::time::Duration::from_secs(4), "took {elapsed:?}");
    assert!(fx.scratch_is_empty());
}

#[tokio::test]
async fn test_lingering_descendant_after_successful_verify() -> Result<()> {
    let mut fx = fixture_with_tool("#!/bin/sh\nsleep 10 &\necho \"Verified OK\" >&2\n");
    fx.config.timeout_secs = Some(1);

    let started = std::time::Instant::now();
    let verified = fx
        .signer()
        .verify_blob(b"payload", Some(&b"SIG-1"[..]), None)
        .await?;

    assert!(verified);
    assert!(started.elapsed() < std::time::Duration::from_secs(4));
    Ok(())
}

#[tokio::test]
async fn test_signal_during_verify_is_tool_error() {
    let fx = fixture_with_tool("#!/bin/sh\nkill -9 $$\n");

    assert!(matches!(
        fx.signer()
            .verify_blob(b"payload", Some(&b"SIG-1"[..]), None)
            .await,
        Err(Error::Tool(_))
    ));
}

#[tokio::test]
async fn test_concurrent_signing() -> Result<()> {
    let fx = fixture();
    let signer = fx.signer();

    let (a, b, c) = tokio::join!(
        signer.sign_blob(b"first"),
        signer.sign_blob(b"second"),
        signer.sign_blob(b"third"),
    );
    let (a, b, c) = (a?, b?, c?);

    assert_ne!(a.signature, b.signature);
    assert_ne!(b.signature, c.signature);
    assert!(signer.verify_blob(b"second", Some(b.signature.as_slice()), None).await?);
    assert!(fx.scratch_is_empty());
    Ok(())
}

/// Round trip through a real `cosign` binary. Needs network access to the
/// public transparency log, so it only runs when `SENTINEL_COSIGN_E2E` is set.
#[tokio::test]
async fn test_real_cosign_round_trip() -> Result<()> {
    if std::env::var_os("SENTINEL_COSIGN_E2E").is_none() {
        eprintln!("SENTINEL_COSIGN_E2E not set, skipping");
        return Ok(());
    }

    let keys = tempdir()?;
    let generated = tokio::process::Command::new("cosign")
        .arg("generate-key-pair")
        .env("COSIGN_PASSWORD", PASSWORD)
        .current_dir(keys.path())
        .status()
        .await;
    match generated {
        Ok(status) if status.success() => {}
        _ => {
            eprintln!("cosign is not usable, skipping");
            return Ok(());
        }
    }

    let config = CosignConfig {
        private_key: Some(keys.path().join("cosign.key")),
        public_key: Some(keys.path().join("cosign.pub")),
        password: Some(CosignPassword::new(PASSWORD)),
        ..CosignConfig::default()
    };
    let signer = CosignSigner::new(&config);

    let signed = signer.sign_blob(b"real cosign payload").await?;
    assert!(
        signer
            .verify_blob(b"real cosign payload", None, Some(signed.bundle.as_bytes()))
            .await?
    );
    assert!(
        !signer
            .verify_blob(b"other payload", None, Some(signed.bundle.as_bytes()))
            .await?
    );
    Ok(())
}
