//! Main application entry point.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use stickerboard_app::{
    App, AppConfig, AppError, DEFAULT_POLL_MS, DEFAULT_SERVER_URL, DEFAULT_TIMEOUT_SECS,
    read_document, write_document,
};
use stickerboard_core::DEFAULT_DOCUMENT_PATH;

#[derive(Parser, Debug)]
#[command(name = "stickerboard", about = "Headless Stickerboard canvas client")]
struct Cli {
    #[arg(long, env = "STICKERBOARD_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server_url: String,

    #[arg(long, env = "STICKERBOARD_DOCUMENT_PATH", default_value = DEFAULT_DOCUMENT_PATH)]
    document_path: String,

    #[arg(long, env = "STICKERBOARD_POLL_MS", default_value_t = DEFAULT_POLL_MS)]
    poll_ms: u64,

    #[arg(long, env = "STICKERBOARD_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow the shared document and log every version
    Watch {
        /// Stop after this many documents
        #[arg(long)]
        count: Option<usize>,
    },
    /// Replace the shared document with a JSON file
    Publish { file: PathBuf },
    /// Write the current shared document to a JSON file
    Export { file: PathBuf },
}

impl Cli {
    fn config(&self) -> AppConfig {
        AppConfig {
            server_url: self.server_url.clone(),
            document_path: self.document_path.clone(),
            poll_interval: Duration::from_millis(self.poll_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = cli.config();
    match cli.command {
        Command::Watch { count } => {
            App::connect(config)?.watch(count)?;
        }
        Command::Publish { file } => {
            // Validate before touching the store.
            let document = read_document(&file)?;
            App::connect(config)?.publish(document)?;
        }
        Command::Export { file } => {
            let document = App::connect(config)?.export()?;
            write_document(&file, &document)?;
            log::info!("Exported {} widgets to {}", document.len(), file.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting Stickerboard");

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
