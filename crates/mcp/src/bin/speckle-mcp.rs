// Standalone MCP server binary (stdio transport)

use anyhow::Result;
use clap::Parser;
use speckle_mcp::{init_tracing, speckle_tools, McpServer, Settings, SpeckleArgs, SpeckleService};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "speckle-mcp")]
#[command(about = "Speckle projects, versions and objects as MCP tools over stdio", long_about = None)]
struct Args {
    #[command(flatten)]
    speckle: SpeckleArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing("info");

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Failed to start Speckle MCP server: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    tracing::info!("Starting Speckle MCP server");

    let settings = Settings::from_args(&args.speckle)?;
    tracing::info!(server = %settings.speckle.server_url, "Using Speckle server");

    let service = Arc::new(SpeckleService::from_settings(&settings)?);
    let registry = speckle_tools(service);
    tracing::info!("Registered {} tools", registry.len());

    let server = McpServer::new(Arc::new(registry));
    server.run_stdio().await
}
