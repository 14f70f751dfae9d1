//! driveocr - Optical character recognition with Google Drive.
//!
//! Uploads one local file to Drive as a Google Doc, prints the plain-text
//! export on stdout and deletes the remote copy.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

use driveocr_common::types::{DEFAULT_CREDENTIALS_PATH, DEFAULT_TOKEN_PATH};
use driveocr_common::{Error, OcrConfig};
use driveocr_pipeline::recognize;
use driveocr_storage::gdrive::{obtain_client, StdinCodeSource};

#[derive(Parser, Debug)]
#[command(name = "driveocr")]
#[command(about = "Optical character recognition with Google Drive")]
#[command(version)]
struct Cli {
    /// Credentials file path.
    #[arg(short, long, default_value = DEFAULT_CREDENTIALS_PATH)]
    credentials: PathBuf,

    /// Token file path.
    #[arg(short, long, default_value = DEFAULT_TOKEN_PATH)]
    token: PathBuf,

    /// File to recognize.
    #[arg(short, long)]
    file: PathBuf,

    /// OCR language hint (ISO 639-1, e.g. "en", "ja").
    #[arg(long)]
    lang: Option<String>,

    /// Give up waiting for the authorization code after this many seconds.
    #[arg(long, value_name = "SECS")]
    auth_timeout: Option<u64>,

    /// Open the authorization URL in the default browser.
    #[arg(long)]
    open_browser: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> OcrConfig {
        let mut config = OcrConfig::new(&self.credentials, &self.token)
            .with_open_browser(self.open_browser);
        if let Some(lang) = &self.lang {
            config = config.with_ocr_language(lang);
        }
        if let Some(secs) = self.auth_timeout {
            config = config.with_auth_timeout(Duration::from_secs(secs));
        }
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging; stdout carries only the recognized text
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli).await {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: &Cli) -> Result<String> {
    let config = cli.config();

    ensure_readable(&cli.file).await?;

    let code_source = StdinCodeSource::new()
        .with_timeout(config.auth_timeout())
        .with_open_browser(config.open_browser());
    let service = obtain_client(&config, Arc::new(code_source))
        .await
        .context("Can't setup client")?;

    let recognition = recognize(&service, &cli.file)
        .await
        .context("Can't recognize")?;

    if let Some(cleanup) = &recognition.cleanup_warning {
        warn!("Temporary Drive document was not deleted: {}", cleanup);
    }

    Ok(recognition.text)
}

/// Fail on an unreadable target before any authorization prompt.
async fn ensure_readable(path: &Path) -> Result<()> {
    tokio::fs::File::open(path)
        .await
        .map_err(|source| Error::LocalIo {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}

/// Map the root error kind to the process exit code.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<Error>().map(Error::exit_code).unwrap_or(1)
}
