use crate::error::{Error, Result};
use crate::pnc::client::BuildSystemClient;
use crate::pnc::{Artifact, Build, BuildConfigurationRevision};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const BUILDS_DIR: &str = "builds";
const BUILD_CONFIG_REVISIONS_DIR: &str = "build-config-revisions";
const BUILT_ARTIFACTS_DIR: &str = "built-artifacts";
const DEPENDENCIES_DIR: &str = "dependencies";

/// Serves build records exported from PNC as JSON files:
///
/// ```text
/// <root>/builds/<build-id>.json
/// <root>/build-config-revisions/<config-id>-<rev>.json
/// <root>/built-artifacts/<build-id>.json      (JSON array)
/// <root>/dependencies/<build-id>.json         (JSON array)
/// ```
#[derive(Debug, Clone)]
pub struct FilesystemClient {
    base_path: PathBuf,
}

impl FilesystemClient {
    pub fn new<P: AsRef<Path>>(url: P) -> Result<Self> {
        let path_str = url.as_ref().to_string_lossy();
        let path = if path_str.starts_with("file://") {
            PathBuf::from(path_str.trim_start_matches("file://"))
        } else {
            PathBuf::from(path_str.to_string())
        };

        if !path.is_dir() {
            return Err(Error::Validation(format!(
                "Build record directory does not exist: {}",
                path.display()
            )));
        }

        Ok(Self { base_path: path })
    }

    fn record_path(&self, dir: &str, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(Error::Validation(format!("Invalid record key: '{key}'")));
        }
        Ok(self.base_path.join(dir).join(format!("{key}.json")))
    }

    // None when the record file does not exist
    fn read_record<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::client(
                    format!("Record {} could not be read", path.display()),
                    e,
                ));
            }
        };

        serde_json::from_str(&content).map(Some).map_err(|e| {
            Error::client(format!("Record {} is malformed", path.display()), e)
        })
    }
}

impl BuildSystemClient for FilesystemClient {
    fn get_build(&self, build_id: &str) -> Result<Option<Build>> {
        log::debug!("Fetching Build with id '{build_id}'");
        let build = self.read_record(&self.record_path(BUILDS_DIR, build_id)?)?;
        if build.is_none() {
            log::warn!("Build with id '{build_id}' was not found");
        }
        Ok(build)
    }

    fn get_build_config_revision(
        &self,
        build_config_id: &str,
        revision: i32,
    ) -> Result<Option<BuildConfigurationRevision>> {
        log::debug!(
            "Fetching BuildConfigRevision with id '{build_config_id}' and rev '{revision}'"
        );
        let key = format!("{build_config_id}-{revision}");
        let rev = self.read_record(&self.record_path(BUILD_CONFIG_REVISIONS_DIR, &key)?)?;
        if rev.is_none() {
            log::warn!(
                "BuildConfig with id '{build_config_id}' and rev '{revision}' was not found"
            );
        }
        Ok(rev)
    }

    fn get_built_artifacts(&self, build_id: &str) -> Result<Vec<Artifact>> {
        log::debug!("Fetching all built artifacts of build '{build_id}'");
        let path = self.record_path(BUILT_ARTIFACTS_DIR, build_id)?;
        Ok(self.read_record(&path)?.unwrap_or_default())
    }

    fn get_dependencies(&self, build_id: &str) -> Result<Vec<Artifact>> {
        log::debug!("Fetching all dependencies of build '{build_id}'");
        let path = self.record_path(DEPENDENCIES_DIR, build_id)?;
        Ok(self.read_record(&path)?.unwrap_or_default())
    }
}
