// MCP (Model Context Protocol) server exposing Speckle projects, versions
// and object graphs as tools for agent clients

pub mod config;
pub mod protocol;
pub mod server;
pub mod service;
pub mod tools;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, LimitsConfig, Settings, SpeckleArgs};
pub use server::McpServer;
pub use service::SpeckleService;
pub use tools::{speckle_tools, ToolRegistry};

/// Install the stderr log subscriber shared by both binaries.
///
/// `RUST_LOG` overrides `default_filter`. Stdout stays free for protocol
/// traffic.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
