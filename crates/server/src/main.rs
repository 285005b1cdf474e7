use anyhow::Result;
use clap::Parser;
use speckle_mcp::{init_tracing, Settings, SpeckleArgs};
use std::process::ExitCode;

mod api;
mod config;

use config::AppState;

#[derive(Parser, Debug)]
#[command(name = "speckle-http")]
#[command(about = "HTTP mirror of the Speckle MCP tools", long_about = None)]
struct Args {
    #[command(flatten)]
    speckle: SpeckleArgs,

    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing("info,tower_http=debug");

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Failed to run Speckle HTTP server: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    tracing::info!("Starting Speckle HTTP server");

    let settings = Settings::from_args(&args.speckle)?;
    tracing::info!(server = %settings.speckle.server_url, "Using Speckle server");

    let state = AppState::new(&settings)?;

    let addr = format!("{}:{}", args.host, args.port);
    tracing::info!("Starting API server on {}", addr);

    api::serve(&addr, state).await
}
