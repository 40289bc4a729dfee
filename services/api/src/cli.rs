use crate::infra::digest_service;
use crate::server;
use buybox::config::AppConfig;
use buybox::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use url::Url;

#[derive(Parser, Debug)]
#[command(
    name = "BuyBox",
    about = "Run the BuyBox marketplace API or build its site digest from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Crawl the public site once and print the `/api/llms` digest
    Digest(DigestArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DigestArgs {
    /// Crawl this site instead of the configured base URL
    #[arg(long)]
    pub(crate) base_url: Option<Url>,
    /// Override the configured page limit
    #[arg(long)]
    pub(crate) max_pages: Option<usize>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Digest(args) => run_digest(args).await,
    }
}

async fn run_digest(mut args: DigestArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(base_url) = args.base_url.take() {
        config.crawl.base_url = base_url;
    }
    if let Some(max_pages) = args.max_pages {
        config.crawl.max_pages = max_pages;
    }

    let digest = digest_service(&config)?.build().await?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(digest.body.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
