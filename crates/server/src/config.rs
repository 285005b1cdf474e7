use anyhow::{Context, Result};
use speckle_mcp::{speckle_tools, Settings, SpeckleService, ToolRegistry};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub tools: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Result<Self> {
        let service = SpeckleService::from_settings(settings)
            .context("Failed to create Speckle service")?;

        Ok(Self::with_tools(speckle_tools(Arc::new(service))))
    }

    pub fn with_tools(tools: ToolRegistry) -> Self {
        Self {
            tools: Arc::new(tools),
        }
    }
}
