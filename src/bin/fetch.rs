use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use anyhow::Context;
use clap::Parser;
use page_fetch::config::Config;
use page_fetch::downloader;
use page_fetch::logging;
use page_fetch::models::PageRecord;

/// Downloads web pages locally and shows the metadata recorded for them
#[derive(Parser, Debug)]
#[command(name = "fetch", version, about, long_about = None)]
struct Args {
    /// URLs of the web pages to download
    #[arg(required_unless_present = "metadata")]
    urls: Vec<String>,

    /// Show the metadata of an already downloaded page instead of downloading
    #[arg(short, long, value_name = "URL", conflicts_with = "urls")]
    metadata: Option<String>,

    /// Path of the JSON metadata index
    #[arg(long, default_value = Config::STORE_FILE)]
    store: PathBuf,

    /// Directory the downloaded pages are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = Config::TIMEOUT_SECS)]
    timeout: u64,

    /// Log debug details to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {

    let args = Args::parse();

    if let Err(e) = logging::init_logging(args.verbose) {
        eprintln!("Error: can't initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {

    let config = Config {
        store_path: args.store,
        output_dir: args.output_dir,
        timeout: Duration::from_secs(args.timeout),
        ..Config::default()
    };

    // every url is checked before anything touches the disk
    let metadata_url = args.metadata.as_deref().map(downloader::validate_url).transpose()?;
    let urls = args
        .urls
        .iter()
        .map(|u| downloader::validate_url(u))
        .collect::<downloader::Result<Vec<_>>>()?;

    let store = config.store();
    store.initialize().context("can't create metadata file")?;

    let start = Instant::now();

    if let Some(url) = metadata_url {
        let record = store.get(url.as_str())?;
        print_record(&record);
    } else {
        std::fs::create_dir_all(&config.output_dir)
            .with_context(|| format!("can't create output directory {}", config.output_dir.display()))?;

        let downloader = config.downloader()?;
        let summary = downloader.download_pages(&urls).await?;
        println!("Download successful: {} page(s) downloaded", summary.total());
    }

    println!("Execution time: {:.6} seconds", start.elapsed().as_secs_f64());
    Ok(())
}

fn print_record(record: &PageRecord) {
    println!("site: {}", record.site);
    println!("num_links: {}", record.link_count);
    println!("images: {}", record.image_count);
    println!("last_fetch: {}", record.last_fetch);
}
