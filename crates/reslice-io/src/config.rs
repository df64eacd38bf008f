use anyhow::{Context, Result};
use reslice_core::session::SessionConfig;
use std::fs;
use std::path::Path;

/// Load a session configuration from JSON. Missing fields take their defaults.
pub fn read_session_config<P: AsRef<Path>>(path: P) -> Result<SessionConfig> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read session config {}", path.display()))?;
    let config: SessionConfig = serde_json::from_str(&text)
        .with_context(|| format!("Invalid session config {}", path.display()))?;
    tracing::info!(path = %path.display(), view_mode = %config.view_mode, "loaded session config");
    Ok(config)
}

pub fn write_session_config<P: AsRef<Path>>(path: P, config: &SessionConfig) -> Result<()> {
    let path = path.as_ref();
    let text = serde_json::to_string_pretty(config).context("Failed to serialize session config")?;
    fs::write(path, text)
        .with_context(|| format!("Failed to write session config {}", path.display()))?;
    tracing::info!(path = %path.display(), "saved session config");
    Ok(())
}
