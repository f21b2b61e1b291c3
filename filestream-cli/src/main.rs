use std::path::Path;
use std::time::Duration;

use clap::Parser;
use error::AppError;
use filestream::{
    AppContext, DigestAlgorithm, DownloadError, DownloadRequest, Downloader, DownloaderConfig,
    HashProvider, ObjectSchema, OperatingSystem, Platform, Store,
};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use url::Url;

mod cli;
mod error;
mod utils;

use cli::CliArgs;
use utils::parse_header;
use utils::progress::ProgressManager;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        // Log the full error for debugging
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    // Parse command-line arguments
    let args = CliArgs::parse();

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    let context = AppContext::new();

    if args.platform {
        print_platform(&context)?;
        return Ok(());
    }

    let url = args
        .url
        .as_deref()
        .ok_or_else(|| AppError::InvalidInput("No URL given".to_string()))?;
    let url = Url::parse(url)?;

    let algorithm: DigestAlgorithm = args.algorithm.parse()?;
    let schema = match args.schema.as_str() {
        "direct" => ObjectSchema::Direct,
        "sharded" => ObjectSchema::HashSharded(algorithm),
        other => {
            return Err(AppError::InvalidInput(format!(
                "Invalid schema: '{other}'"
            )));
        }
    };

    let store = open_store(&context, &args, schema)?;
    info!(root = ?store.root(), schema = ?store.schema(), "Using store");

    // Create download configuration
    let timeout = Duration::from_secs(args.timeout);
    let config = {
        let mut builder = DownloaderConfig::builder()
            .with_connect_timeout(timeout)
            .with_read_timeout(timeout);

        for header in &args.headers {
            if let Some((name, value)) = parse_header(header) {
                debug!("Adding header: {}: {}", name, value);
                builder = builder.with_header(name, value);
            }
        }
        builder.build()
    };

    let downloader = Downloader::builder(store).config(config).build()?;

    let progress = if args.show_progress {
        ProgressManager::new(format!("Downloading {url}"))
    } else {
        ProgressManager::new_disabled()
    };

    let mut request = DownloadRequest::new(url.clone()).with_progress({
        let progress = progress.clone();
        move |read, total| progress.update(read, total)
    });
    if let Some(hash) = &args.hash {
        request = request.with_hash(HashProvider::new(hash.as_str(), algorithm));
    }
    if let Some(output) = &args.output {
        request = request.to_path(output);
    }

    let download = downloader.download(request);

    let result = tokio::select! {
        result = download.get() => result,
        _ = tokio::signal::ctrl_c() => {
            warn!(url = %url, "Interrupted, cancelling download");
            download.cancel(true);
            Err(DownloadError::Cancelled)
        }
    };

    match result {
        Ok(path) => {
            let size = artifact_size(&path)?;
            progress.finish(size);
            info!(path = %path.display(), "Artifact ready");
            println!("{}", path.display());
            Ok(())
        }
        Err(e) => {
            progress.abandon("Failed");
            Err(e.into())
        }
    }
}

/// Size in bytes of the artifact a download resolved to
fn artifact_size(path: &Path) -> Result<u64, AppError> {
    Ok(std::fs::metadata(path)?.len())
}

fn open_store(
    context: &AppContext,
    args: &CliArgs,
    schema: ObjectSchema,
) -> Result<Store, AppError> {
    let name = args
        .store_name
        .as_deref()
        .unwrap_or_else(|| context.global_store_name());

    let store = match &args.store_root {
        Some(root) => Store::new(root, name, schema)?,
        None => Store::new(context.local_storage()?, name, schema)?,
    };
    Ok(store)
}

fn print_platform(context: &AppContext) -> Result<(), AppError> {
    let platform = Platform::current();
    let os = OperatingSystem::current();

    println!("Platform:       {platform}");
    println!("Bit size:       {:?}", platform.arch.processor_type().bit_size());
    println!(
        "Native naming:  {}<name>{}",
        os.native_prefix(),
        os.native_extension()
    );
    println!("Local storage:  {}", context.local_storage()?.display());
    println!("Global store:   {}", context.global_store_name());
    Ok(())
}
