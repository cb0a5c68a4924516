use clap::{Parser, Subcommand};
use log::error;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tube_publisher::commands::{self, history::DEFAULT_HISTORY_LIMIT, upload::UploadArgs};
use tube_publisher::config::{
    AppConfig, Pacing, DEFAULT_ELEMENT_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_PROCESSING_TIMEOUT_SECS, DEFAULT_SETTLE_MS,
};
use tube_publisher::platforms::youtube::upload::UploadError;

const EXIT_FAILURE: u8 = 1;
const EXIT_FILE_INPUT_MISSING: u8 = 3;

/// Upload and schedule YouTube videos through YouTube Studio
#[derive(Parser)]
#[command(name = "tube-publisher", version)]
#[command(about = "Upload and schedule YouTube videos by driving Chrome", long_about = None)]
struct Cli {
    /// Directory for the browser profile, cookies and upload history
    #[arg(long, global = true, env = "TUBE_PUBLISHER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Chrome binary to launch instead of the detected one
    #[arg(long, global = true, env = "TUBE_PUBLISHER_CHROME")]
    chrome: Option<PathBuf>,

    /// Run Chrome without a window
    #[arg(long, global = true, env = "TUBE_PUBLISHER_HEADLESS")]
    headless: bool,

    /// Pause after each page interaction, in milliseconds
    #[arg(long, global = true, default_value_t = DEFAULT_SETTLE_MS)]
    settle_ms: u64,

    /// How long to wait for an element to appear
    #[arg(long, global = true, default_value_t = DEFAULT_ELEMENT_TIMEOUT_SECS)]
    element_timeout_secs: u64,

    /// How long to wait for the video to finish uploading
    #[arg(long, global = true, default_value_t = DEFAULT_PROCESSING_TIMEOUT_SECS)]
    processing_timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List scheduled and public videos as timestamps
    Schedule {
        /// IANA time zone for the reported timestamps, e.g. Europe/Berlin
        timezone: Option<String>,
        /// Directory holding saved session cookies
        cookies_dir: Option<PathBuf>,
    },
    /// Upload a video, publishing it now or at its scheduled slot
    Upload {
        video: PathBuf,
        /// JSON file with title, description, tags and schedule
        #[arg(short, long)]
        metadata: Option<PathBuf>,
        #[arg(short, long)]
        thumbnail: Option<PathBuf>,
        /// Directory holding saved session cookies
        #[arg(long)]
        cookies_dir: Option<PathBuf>,
        /// Mark the video as made for kids
        #[arg(long)]
        made_for_kids: bool,
    },
    /// Show recorded upload attempts
    History {
        #[arg(short, long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,
    },
}

impl Cli {
    fn pacing(&self) -> Pacing {
        Pacing {
            settle: Duration::from_millis(self.settle_ms),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            element_timeout: Duration::from_secs(self.element_timeout_secs),
            processing_timeout: Duration::from_secs(self.processing_timeout_secs),
        }
    }

    fn config(&self, cookies_dir: Option<PathBuf>) -> anyhow::Result<AppConfig> {
        AppConfig::resolve(
            self.data_dir.clone(),
            cookies_dir,
            self.chrome.clone(),
            self.headless,
            self.pacing(),
        )
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Schedule {
            timezone,
            cookies_dir,
        } => {
            let config = cli.config(cookies_dir.clone())?;
            let report = commands::schedule::run(&config, timezone.as_deref()).await?;
            print_json(&report)
        }
        Commands::Upload {
            video,
            metadata,
            thumbnail,
            cookies_dir,
            made_for_kids,
        } => {
            let config = cli.config(cookies_dir.clone())?;
            let args = UploadArgs {
                video: video.clone(),
                metadata: metadata.clone(),
                thumbnail: thumbnail.clone(),
                made_for_kids: *made_for_kids,
            };
            let outcome = commands::upload::run(&config, args).await?;
            print_json(&outcome)
        }
        Commands::History { limit } => {
            let config = cli.config(None)?;
            let records = commands::history::run(&config, *limit)?;
            print_json(&records)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tube_publisher::init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            match e.downcast_ref::<UploadError>() {
                Some(UploadError::FileInputMissing(_)) => ExitCode::from(EXIT_FILE_INPUT_MISSING),
                _ => ExitCode::from(EXIT_FAILURE),
            }
        }
    }
}
