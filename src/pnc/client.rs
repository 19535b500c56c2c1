use crate::error::Result;
use crate::pnc::{Artifact, Build, BuildConfigurationRevision};

/// Read access to the build orchestrator.
///
/// A record that does not exist is `Ok(None)`. A transport or server failure
/// is [`crate::Error::Client`] and aborts provenance generation.
pub trait BuildSystemClient {
    fn get_build(&self, build_id: &str) -> Result<Option<Build>>;
    fn get_build_config_revision(
        &self,
        build_config_id: &str,
        revision: i32,
    ) -> Result<Option<BuildConfigurationRevision>>;
    fn get_built_artifacts(&self, build_id: &str) -> Result<Vec<Artifact>>;
    fn get_dependencies(&self, build_id: &str) -> Result<Vec<Artifact>>;
}
