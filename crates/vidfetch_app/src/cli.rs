use std::path::PathBuf;

use clap::Parser;

/// Command line; every option overrides the config file.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "vidfetch",
    version,
    about = "Submit a video fetch job, wait for it and download the result"
)]
pub struct Cli {
    /// Video page URL (YouTube, Instagram, Twitter/X, ...).
    pub url: String,
    /// RON config file; defaults to ./vidfetch.ron when present.
    #[arg(long, short = 'c', env = "VIDFETCH_CONFIG")]
    pub config: Option<PathBuf>,
    /// Backend download API, e.g. http://localhost:8080/api/download.
    #[arg(long, env = "VIDFETCH_BASE_URL")]
    pub base_url: Option<String>,
    /// best, 720p, 480p or 360p.
    #[arg(long, short = 'q', env = "VIDFETCH_QUALITY")]
    pub quality: Option<String>,
    /// auto, mp4, webm or audio.
    #[arg(long, short = 'f', env = "VIDFETCH_FORMAT")]
    pub format: Option<String>,
    #[arg(long, short = 'o', env = "VIDFETCH_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,
    #[arg(long, env = "VIDFETCH_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,
    /// Stop once the job completes instead of downloading the file.
    #[arg(long)]
    pub no_retrieve: bool,
    #[arg(long, env = "VIDFETCH_LOG_LEVEL")]
    pub log_level: Option<String>,
    /// file, terminal or both.
    #[arg(long, env = "VIDFETCH_LOG_TO")]
    pub log_to: Option<String>,
    #[arg(long, env = "VIDFETCH_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}
