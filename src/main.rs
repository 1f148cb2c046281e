use std::io;
use std::path::PathBuf;

use clap::Parser;
use knav::app::App;
use knav::config::Config;
use knav::content::MemoryEngine;
use knav::error::AppResult;
use knav::history::AppFlavor;
use knav::telemetry;

/// Drive a knowledge-app navigation history from JSON actions on stdin.
#[derive(Debug, Parser)]
#[command(name = "knav", version)]
struct Cli {
    /// JSON array of content models served by the engine.
    #[arg(long)]
    content: PathBuf,

    /// Overrides the flavor from the config file.
    #[arg(long, value_enum)]
    flavor: Option<AppFlavor>,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = run(Cli::parse()).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    if let Some(flavor) = cli.flavor {
        config.app.flavor = flavor;
    }
    telemetry::init(&config.log);

    let engine = MemoryEngine::load_from_path(&cli.content)?;
    tracing::info!(models = engine.models().len(), path = %cli.content.display(), "content loaded");

    let mut app = App::from_memory_engine(config, engine);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    app.run(&mut out).await
}
