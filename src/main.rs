use clap::{Parser, Subcommand};
use provenance_sentinel::cli::{
    self,
    commands::{BlobCommands, ProvenanceCommands},
};
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// SLSA provenance commands
    Provenance {
        #[command(subcommand)]
        command: ProvenanceCommands,
    },
    /// Cosign blob signing commands
    Blob {
        #[command(subcommand)]
        command: BlobCommands,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    if let Err(e) = provenance_sentinel::init_logging() {
        eprintln!("{}", cli::format_error(&e));
        return ExitCode::FAILURE;
    }

    // Parse command line arguments
    let cli = Cli::parse();

    // Handle commands
    let result = match cli.command {
        Commands::Provenance { command } => cli::handlers::handle_provenance_command(command).await,
        Commands::Blob { command } => cli::handlers::handle_blob_command(command).await,
    };

    // Format and display any errors
    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", cli::format_error(&e));
            ExitCode::from(2)
        }
    }
}
