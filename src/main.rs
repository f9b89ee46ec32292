use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use media_file_helper::{
    create_router, AppState, BlockingPool, Config, Dispatcher, FileMaterializer,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "media-file-helper", about = "Permission-gated audio file bridge")]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/media-file-helper")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP bridge
    Serve,
    /// Check whether a file exists under the storage root
    Exists { filename: String },
    /// Write a base64 payload to a file unless it already exists
    Download(DownloadArgs),
}

#[derive(Args)]
struct DownloadArgs {
    filename: String,

    #[command(flatten)]
    payload: PayloadSource,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct PayloadSource {
    /// Base64 payload
    #[arg(long)]
    base64: Option<String>,

    /// File holding the base64 payload
    #[arg(long)]
    from_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config))?;

    info!("Media file helper v0.1.0 ({})", cfg.service.name);

    let storage = cfg.storage.platform_storage();
    info!(
        "Storage: external {} (mounted: {}), cache {}",
        storage.external_dir().display(),
        storage.is_external_mounted(),
        storage.cache_dir().display()
    );

    let materializer =
        FileMaterializer::new(Arc::new(storage)).with_chunk_size(cfg.storage.chunk_size);
    let dispatcher = Dispatcher::spawn(
        cfg.dispatcher.dispatcher_config(),
        Arc::new(cfg.permissions.memory_host()),
        materializer,
        Arc::new(BlockingPool::current()),
    );

    match cli.command {
        Command::Serve => {
            let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;

            info!("HTTP bridge listening on {}", addr);
            axum::serve(listener, create_router(AppState::new(dispatcher)))
                .await
                .context("HTTP server failed")?;
        }
        Command::Exists { filename } => match dispatcher.exists(&filename).await? {
            Some(path) => println!("{}", path.display()),
            None => println!("absent"),
        },
        Command::Download(args) => {
            let payload = match (args.payload.base64, args.payload.from_file) {
                (Some(payload), _) => payload,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read payload from {}", path.display()))?,
                (None, None) => anyhow::bail!("No payload given"),
            };

            let path = dispatcher
                .download_audio_file(&args.filename, &payload)
                .await?;
            println!("{}", path.display());
        }
    }

    Ok(())
}
