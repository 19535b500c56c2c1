pub mod commands;
pub mod handlers;
use crate::error::Error;

// Re-export commonly used items
pub use commands::{BlobCommands, ProvenanceCommands};
pub use handlers::{handle_blob_command, handle_provenance_command};

pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CLI_NAME: &str = "sentinel";

pub fn format_error(error: &Error) -> String {
    match error {
        Error::Io(err) => format!("IO error: {err}"),
        Error::Configuration(msg) => format!("Configuration error: {msg}"),
        Error::MissingData(msg) => format!("Missing build data: {msg}"),
        Error::Client { message, source } => format!("Build system error: {message}: {source}"),
        Error::Signing(msg) => format!("Signing error: {msg}"),
        Error::Tool(msg) => format!("Signing tool error: {msg}"),
        Error::Validation(msg) => format!("Validation error: {msg}"),
        Error::Serialization(msg) => format!("Serialization error: {msg}"),
        Error::InitializationError(msg) => format!("Initialization error: {msg}"),
        Error::Json(err) => format!("JSON error: {err}"),
        Error::Yaml(err) => format!("YAML error: {err}"),
    }
}
