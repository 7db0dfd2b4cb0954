//! Engine configuration, loaded from an optional JSON file.

use crate::domain::layout::OutputLayout;
use crate::domain::sdk::SdkConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Record undefined dependencies on the depending module instead of failing it.
    pub allow_missing_dependencies: bool,
    pub layout: OutputLayout,
    pub sdk: SdkConfig,
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}
