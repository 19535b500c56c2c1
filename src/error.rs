use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Deployment misconfiguration: unregistered spec version, unknown build
    /// system, missing key path, unknown schema version.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The build system returned a record without a field the attestation needs.
    #[error("Missing upstream data: {0}")]
    MissingData(String),

    /// The build system could not be queried, or answered with an error.
    #[error("Build system client error: {message}")]
    Client {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// `sign-blob` exited with a non-zero status. Carries the captured stderr.
    #[error("Signing error: {0}")]
    Signing(String),

    /// The signing tool could not be launched, was killed, or timed out.
    #[error("Signing tool error: {0}")]
    Tool(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub fn client<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Client {
            message: message.into(),
            source: Box::new(source),
        }
    }

    pub fn missing(field: &str) -> Self {
        Error::MissingData(format!("required field '{field}' is absent"))
    }
}
