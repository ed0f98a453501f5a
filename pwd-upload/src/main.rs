//! CLI entry point. Runs the upload job once and maps the result to an exit
//! code a CI pipeline can gate the deploy on.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pwd_upload::config::Config;
use pwd_upload::crypto::passwords::HashParams;
use pwd_upload::job::{self, JobOptions, DEFAULT_CONTENT_DIR};
use pwd_upload::store::cloudflare::MAX_PAGE_SIZE;
use pwd_upload::store::CloudflareKv;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pwd-upload")]
#[command(about = "Hash protected post passwords and upload them to Workers KV", long_about = None)]
struct Cli {
    /// Run without uploading to KV
    #[arg(long)]
    dry: bool,

    /// Overwrite existing keys in KV
    #[arg(long)]
    force: bool,

    /// Directory holding the markdown posts
    #[arg(long, default_value = DEFAULT_CONTENT_DIR)]
    content_dir: PathBuf,

    /// Keys requested per list call (1-1000)
    #[arg(long, default_value_t = MAX_PAGE_SIZE)]
    page_size: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    let options = JobOptions {
        content_root: cli.content_dir,
        dry: cli.dry,
        force: cli.force,
        page_size: cli.page_size,
        hash_params: HashParams::default(),
    };

    match job::run(&config, &options, CloudflareKv::from_config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
